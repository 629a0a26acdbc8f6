//! dashsub Subtitles
//!
//! Renders annotation records as a SubRip (SRT) track, one block per
//! video frame, and writes it to disk in one step.

pub mod srt;

pub use srt::*;
