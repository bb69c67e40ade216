//! HTTP recognizer stub
//!
//! A loopback axum server speaking the recognizer's wire protocol:
//!
//! ```text
//! GET  /             200 liveness
//! POST /features     503 while busy replies remain, else 200 and the payload length is recorded
//! GET  /translation  the configured gesture, or an empty one
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use gestura_core::{ServerConfig, NO_CLASS};

#[derive(Debug, Deserialize)]
struct FeaturesBody {
    features: Vec<f32>,
    timestamp: String,
}

#[derive(Debug, Clone)]
struct StubGesture {
    label: String,
    confidence: f32,
    class_id: i32,
}

#[derive(Default)]
struct StubState {
    busy_remaining: AtomicU32,
    gesture: Mutex<Option<StubGesture>>,
    received: Mutex<Vec<usize>>,
}

/// Running recognizer stub, stopped on drop
pub struct RecognizerStub {
    addr: SocketAddr,
    state: Arc<StubState>,
    task: JoinHandle<()>,
}

impl RecognizerStub {
    /// Bind an ephemeral loopback port and start serving
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(StubState::default());

        let app = Router::new()
            .route("/", get(probe))
            .route("/features", post(features))
            .route("/translation", get(translation))
            .with_state(state.clone());

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::warn!(error = %e, "recognizer stub stopped");
            }
        });
        tracing::debug!(%addr, "recognizer stub listening");

        Ok(RecognizerStub { addr, state, task })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(self.addr.ip().to_string(), self.addr.port())
    }

    /// Answer the next `count` submissions with 503
    pub fn set_busy(&self, count: u32) {
        self.state.busy_remaining.store(count, Ordering::SeqCst);
    }

    /// Gesture returned by `/translation`
    pub fn set_gesture(&self, label: &str, confidence: f32, class_id: i32) {
        *self.state.gesture.lock() = Some(StubGesture {
            label: label.to_string(),
            confidence,
            class_id,
        });
    }

    pub fn clear_gesture(&self) {
        *self.state.gesture.lock() = None;
    }

    /// Lengths of accepted feature payloads
    pub fn received(&self) -> Vec<usize> {
        self.state.received.lock().clone()
    }
}

impl Drop for RecognizerStub {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn probe() -> &'static str {
    "gesture recognizer stub"
}

async fn features(State(state): State<Arc<StubState>>, Json(body): Json<FeaturesBody>) -> (StatusCode, Json<Value>) {
    let busy = state
        .busy_remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if busy {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "queue full" })));
    }

    let len = body.features.len();
    tracing::trace!(len, timestamp = %body.timestamp, "features received");
    state.received.lock().push(len);
    (StatusCode::OK, Json(json!({ "status": "queued", "values": len })))
}

async fn translation(State(state): State<Arc<StubState>>) -> Json<Value> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default();
    let gesture = state.gesture.lock().clone();

    let body = match gesture {
        Some(g) => json!({
            "gesture": g.label,
            "confidence": g.confidence,
            "class_id": g.class_id,
            "server_timestamp_ms": now,
        }),
        None => json!({
            "gesture": "",
            "confidence": 0.0,
            "class_id": NO_CLASS,
            "server_timestamp_ms": now,
        }),
    };
    Json(body)
}
