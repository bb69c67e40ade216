//! HTTP backend seam
//!
//! The client speaks to the recognizer through [`RecognizerBackend`] so that
//! tests can script replies and count calls without a socket.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::{TransportError, TransportResult};

/// Status and body of an HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        HttpReply {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 503, the recognizer's queue is full
    pub fn is_busy(&self) -> bool {
        self.status == 503
    }
}

/// Minimal HTTP surface used by the transport client
pub trait RecognizerBackend: Send + Sync + 'static {
    /// POST a JSON body
    fn post_json(&self, url: &str, body: String) -> impl Future<Output = TransportResult<HttpReply>> + Send;

    /// GET
    fn get(&self, url: &str) -> impl Future<Output = TransportResult<HttpReply>> + Send;
}

impl<B: RecognizerBackend> RecognizerBackend for Arc<B> {
    fn post_json(&self, url: &str, body: String) -> impl Future<Output = TransportResult<HttpReply>> + Send {
        (**self).post_json(url, body)
    }

    fn get(&self, url: &str) -> impl Future<Output = TransportResult<HttpReply>> + Send {
        (**self).get(url)
    }
}

/// reqwest-backed implementation
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
}

impl HttpBackend {
    /// Client with `timeout` applied to connecting and to each whole request
    pub fn new(timeout: Duration) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(HttpBackend { client })
    }

    async fn finish(response: reqwest::Response) -> TransportResult<HttpReply> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}

impl RecognizerBackend for HttpBackend {
    async fn post_json(&self, url: &str, body: String) -> TransportResult<HttpReply> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        Self::finish(response).await
    }

    async fn get(&self, url: &str) -> TransportResult<HttpReply> {
        let response = self.client.get(url).send().await?;
        Self::finish(response).await
    }
}
