//! Error types for the gesture pipeline

use thiserror::Error;

/// Core gesture pipeline errors
#[derive(Error, Debug)]
pub enum GesturaError {
    // Input errors
    #[error("Invalid feature length: expected {expected}, got {actual}")]
    FeatureLength { expected: usize, actual: usize },

    // Configuration errors
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    // Runtime errors
    #[error("No async runtime available: {0}")]
    RuntimeUnavailable(String),

    #[error("Event channel closed")]
    ChannelClosed,

    #[error("Telemetry initialization failed: {0}")]
    Telemetry(String),

    // Transport errors
    #[error("Transport error: {0}")]
    TransportError(String),
}

/// Result type for gesture pipeline operations
pub type GesturaResult<T> = Result<T, GesturaError>;
