//! Recognizer output

use crate::Timestamp;

/// Class id reported when nothing was recognized
pub const NO_CLASS: i32 = -1;

/// Classification result polled from the recognizer
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    /// Recognized gesture label, empty for "no gesture"
    pub gesture: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Recognizer class id, [`NO_CLASS`] for none
    pub class_id: i32,
    /// Server-side timestamp (ms since epoch)
    pub server_timestamp_ms: i64,
}

impl TranslationResult {
    pub fn new(gesture: impl Into<String>, confidence: f32, class_id: i32, server_timestamp_ms: i64) -> Self {
        Self {
            gesture: gesture.into(),
            confidence: confidence.clamp(0.0, 1.0),
            class_id,
            server_timestamp_ms,
        }
    }

    /// The "no gesture" result stamped at `now`
    pub fn empty(now: Timestamp) -> Self {
        Self {
            gesture: String::new(),
            confidence: 0.0,
            class_id: NO_CLASS,
            server_timestamp_ms: now.as_millis() as i64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.gesture.is_empty()
    }
}
