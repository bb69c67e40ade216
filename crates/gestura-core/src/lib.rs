//! Gestura Core - Fundamental types and primitives
//!
//! This crate defines the types shared by every pipeline stage:
//! - Keypoints (Landmark, Hand, KeypointSet, Detection)
//! - Encoded features (FeatureVector, Sequence)
//! - Recognizer output (TranslationResult)
//! - Time primitives (Timestamp, Clock)
//! - Configuration and errors

pub mod keypoint;
pub mod feature;
pub mod translation;
pub mod time;
pub mod config;
pub mod error;

pub use keypoint::*;
pub use feature::*;
pub use translation::*;
pub use time::*;
pub use config::*;
pub use error::*;
