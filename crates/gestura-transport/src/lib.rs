//! Gestura Transport Layer - HTTP client for the remote recognizer
//!
//! This crate provides:
//! - Local validation of feature payloads
//! - Debounced submission with bounded fixed-backoff retries
//! - Lenient polling of the recognition result
//! - Liveness probing
//! - A pluggable HTTP backend (reqwest by default)

pub mod backend;
pub mod cancel;
pub mod client;
pub mod debounce;
pub mod error;
pub mod wire;

pub use backend::{HttpBackend, HttpReply, RecognizerBackend};
pub use cancel::{Cancellation, CancellationHandle};
pub use client::*;
pub use debounce::{Debounce, DebounceSlot};
pub use error::{TransportError, TransportResult};
pub use wire::{parse_translation, FeaturesRequest};
