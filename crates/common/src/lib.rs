//! dashsub Common Utilities
//!
//! Shared infrastructure for all dashsub crates:
//! - Error types, result aliases and pipeline stages
//! - Clock utilities for monotonic and wall-clock conversions
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
