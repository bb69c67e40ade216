//! Scripted recognizer backend
//!
//! Replies are queued per route and consumed in order; once a queue is empty
//! the route's fallback reply is used. Every call is recorded with the tokio
//! instant it arrived at, so paused-time tests can check retry spacing.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Deserialize;
use tokio::time::Instant;

use gestura_transport::{HttpReply, RecognizerBackend, TransportError, TransportResult};

/// Recognizer endpoint a call was addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `POST /features`
    Features,
    /// `GET /translation`
    Translation,
    /// `GET /`
    Probe,
}

impl Route {
    fn of(url: &str) -> Route {
        if url.ends_with("/features") {
            Route::Features
        } else if url.ends_with("/translation") {
            Route::Translation
        } else {
            Route::Probe
        }
    }
}

/// One scripted reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Status(u16, String),
    Fail(TransportError),
    /// Never answers; the client's timeout ends the attempt
    Hang,
}

impl ScriptedReply {
    pub fn ok(body: impl Into<String>) -> Self {
        ScriptedReply::Status(200, body.into())
    }

    pub fn busy() -> Self {
        ScriptedReply::Status(503, String::new())
    }

    pub fn gesture(label: &str, confidence: f32, class_id: i32) -> Self {
        let body = serde_json::json!({
            "gesture": label,
            "confidence": confidence,
            "class_id": class_id,
        });
        Self::ok(body.to_string())
    }

    pub fn unreachable() -> Self {
        ScriptedReply::Fail(TransportError::Connect("connection refused".to_string()))
    }
}

/// A call seen by the backend
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub route: Route,
    pub url: String,
    pub body: Option<String>,
    pub at: Instant,
}

#[derive(Deserialize)]
struct FeaturesBody {
    features: Vec<f32>,
}

/// Recognizer backend driven by a script
pub struct ScriptedBackend {
    queues: Mutex<HashMap<Route, VecDeque<ScriptedReply>>>,
    fallbacks: Mutex<HashMap<Route, ScriptedReply>>,
    latency: Mutex<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    /// Accepts every submission, never recognizes anything, always reachable
    pub fn new() -> Self {
        let fallbacks = HashMap::from([
            (Route::Features, ScriptedReply::ok(r#"{"status":"queued"}"#)),
            (Route::Translation, ScriptedReply::ok("{}")),
            (Route::Probe, ScriptedReply::ok("ok")),
        ]);
        ScriptedBackend {
            queues: Mutex::new(HashMap::new()),
            fallbacks: Mutex::new(fallbacks),
            latency: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a one-shot reply
    pub fn push(&self, route: Route, reply: ScriptedReply) -> &Self {
        self.queues.lock().entry(route).or_default().push_back(reply);
        self
    }

    /// Reply used once the route's queue is empty
    pub fn set_fallback(&self, route: Route, reply: ScriptedReply) -> &Self {
        self.fallbacks.lock().insert(route, reply);
        self
    }

    /// Delay applied before every reply
    pub fn set_latency(&self, latency: Duration) -> &Self {
        *self.latency.lock() = latency;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, route: Route) -> usize {
        self.calls.lock().iter().filter(|c| c.route == route).count()
    }

    /// Decoded feature payloads, in submission order
    pub fn feature_payloads(&self) -> Vec<Vec<f32>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| c.body.as_deref())
            .filter_map(|b| serde_json::from_str::<FeaturesBody>(b).ok())
            .map(|b| b.features)
            .collect()
    }

    async fn respond(&self, url: &str, body: Option<String>) -> TransportResult<HttpReply> {
        let route = Route::of(url);
        self.calls.lock().push(RecordedCall {
            route,
            url: url.to_string(),
            body,
            at: Instant::now(),
        });

        let queued = self.queues.lock().get_mut(&route).and_then(VecDeque::pop_front);
        let reply = match queued {
            Some(reply) => reply,
            None => self
                .fallbacks
                .lock()
                .get(&route)
                .cloned()
                .unwrap_or_else(|| ScriptedReply::Status(404, String::new())),
        };

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match reply {
            ScriptedReply::Status(status, body) => Ok(HttpReply::new(status, body)),
            ScriptedReply::Fail(e) => Err(e),
            ScriptedReply::Hang => std::future::pending().await,
        }
    }
}

impl RecognizerBackend for ScriptedBackend {
    async fn post_json(&self, url: &str, body: String) -> TransportResult<HttpReply> {
        self.respond(url, Some(body)).await
    }

    async fn get(&self, url: &str) -> TransportResult<HttpReply> {
        self.respond(url, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_fallback() {
        let backend = ScriptedBackend::new();
        backend.push(Route::Features, ScriptedReply::busy());

        let first = backend.post_json("http://h:1/features", "{}".into()).await.unwrap();
        let second = backend.post_json("http://h:1/features", "{}".into()).await.unwrap();
        assert!(first.is_busy());
        assert!(second.is_success());
        assert_eq!(backend.count(Route::Features), 2);
    }

    #[tokio::test]
    async fn test_routes_recorded() {
        let backend = ScriptedBackend::new();
        backend.get("http://h:1").await.unwrap();
        backend.get("http://h:1/translation").await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls[0].route, Route::Probe);
        assert_eq!(calls[1].route, Route::Translation);
        assert!(calls[1].body.is_none());
    }

    #[tokio::test]
    async fn test_feature_payloads_decoded() {
        let backend = ScriptedBackend::new();
        backend
            .post_json("http://h:1/features", r#"{"features":[0.5,0.25],"timestamp":"1"}"#.into())
            .await
            .unwrap();
        assert_eq!(backend.feature_payloads(), vec![vec![0.5, 0.25]]);
    }

    #[tokio::test]
    async fn test_failure_reply() {
        let backend = ScriptedBackend::new();
        backend.set_fallback(Route::Probe, ScriptedReply::unreachable());
        assert!(matches!(backend.get("http://h:1").await, Err(TransportError::Connect(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_applied() {
        let backend = ScriptedBackend::new();
        backend.set_latency(Duration::from_millis(250));
        let start = Instant::now();
        backend.get("http://h:1").await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(250));
    }
}
