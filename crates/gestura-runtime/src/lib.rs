//! Gestura Runtime - Pipeline orchestration
//!
//! This crate drives one detection cycle per detector frame:
//! 1. Extract a feature vector (mirrored for the front camera)
//! 2. Offer it to the sequence buffer
//! 3. Once a window is ready, transmit it on the I/O runtime
//! 4. Poll the recognition and publish it for a limited display time
//!
//! A camera-facing change resets the whole cycle.

pub mod display;
pub mod event;
pub mod health;
pub mod pipeline;
pub mod telemetry;

pub use display::*;
pub use event::*;
pub use health::Availability;
pub use pipeline::*;
pub use telemetry::*;
