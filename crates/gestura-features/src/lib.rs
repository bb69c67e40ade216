//! Gestura Features - Detector output to fixed-length feature vectors
//!
//! This crate provides:
//! - Feature extraction (two hands, 126 values, camera mirroring)
//! - The noise floor shared by every stage that copies frames

pub mod extractor;
pub mod noise;

pub use extractor::*;
pub use noise::*;
