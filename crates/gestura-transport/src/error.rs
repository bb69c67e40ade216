//! Transport errors
//!
//! These never escape the client's public submit/poll operations; they are
//! carried inside outcomes and logged.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unreadable response body: {0}")]
    Body(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

impl From<TransportError> for gestura_core::GesturaError {
    fn from(e: TransportError) -> Self {
        gestura_core::GesturaError::TransportError(e.to_string())
    }
}
