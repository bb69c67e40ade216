//! Gestura Test Harness - Pipeline validation without a camera
//!
//! This crate provides:
//! - A scripted recognizer backend with call recording
//! - Seeded synthetic hand motion
//! - An HTTP recognizer stub on loopback
//! - End-to-end pipeline scenarios

pub mod integration;
pub mod mock;
pub mod stub_server;
pub mod synthetic;

pub use integration::*;
pub use mock::*;
pub use stub_server::*;
pub use synthetic::*;
