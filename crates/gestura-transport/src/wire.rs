//! JSON wire format
//!
//! ```text
//! POST /features     {"features": [f32; 126 | 1260], "timestamp": "<ms>"}
//! GET  /translation  {"gesture": str, "confidence": num, "class_id": int, "server_timestamp_ms": int}
//! ```

use serde::Serialize;
use serde_json::Value;

use gestura_core::{Timestamp, TranslationResult, NO_CLASS};

/// Body of a feature submission
#[derive(Debug, Serialize)]
pub struct FeaturesRequest<'a> {
    pub features: &'a [f32],
    /// Client send time, milliseconds as a decimal string
    pub timestamp: String,
}

impl<'a> FeaturesRequest<'a> {
    pub fn new(features: &'a [f32], now: Timestamp) -> Self {
        FeaturesRequest {
            features,
            timestamp: now.as_millis().to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Parse a translation body
///
/// Each field falls back to its default independently when missing or of the
/// wrong type. A body that is not a JSON object yields `None`.
pub fn parse_translation(body: &str, now: Timestamp) -> Option<TranslationResult> {
    let value: Value = serde_json::from_str(body).ok()?;
    let obj = value.as_object()?;

    let gesture = obj.get("gesture").and_then(Value::as_str).unwrap_or_default();
    let confidence = obj.get("confidence").and_then(Value::as_f64).unwrap_or(0.0) as f32;
    let class_id = obj
        .get("class_id")
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or(NO_CLASS);
    let server_timestamp_ms = obj
        .get("server_timestamp_ms")
        .and_then(Value::as_i64)
        .unwrap_or(now.as_millis() as i64);

    Some(TranslationResult::new(gesture, confidence, class_id, server_timestamp_ms))
}
