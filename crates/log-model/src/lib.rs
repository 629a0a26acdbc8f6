//! dashsub Log Model
//!
//! Defines the data contracts for drive logs:
//! - **Events:** Monotonic-timestamped events with a closed set of
//!   recognized payloads (vehicle state, GPS fix) plus a catch-all
//! - **Reader:** Sequential, single-pass JSONL log reader
//!
//! Monotonic timestamps are nanoseconds on the device clock; only GPS
//! fixes carry wall-clock time.

pub mod event;
pub mod reader;

pub use event::*;
pub use reader::*;
