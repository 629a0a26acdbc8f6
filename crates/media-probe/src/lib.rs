//! dashsub Media Probe
//!
//! Discovers the frame grid parameters (frame rate, duration) of a video
//! file by shelling out to `ffprobe`. Raw elementary streams are probed by
//! counting decoded frames at a known hardware frame rate; muxed containers
//! are probed from their metadata.

pub mod probe;
pub mod runner;

pub use probe::*;
pub use runner::*;
