//! Gestura Sequence - Frame history and sequence assembly
//!
//! This crate implements the Sequence Buffer:
//! - Difference-gated admission with a starvation escape
//! - Capacity bound with FIFO eviction
//! - Inactivity window reset
//! - Padded sequence extraction with carry-over seed frames

pub mod buffer;
pub mod difference;

pub use buffer::*;
pub use difference::*;
