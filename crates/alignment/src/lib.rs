//! dashsub Alignment
//!
//! Fuses independently sampled event streams onto a video frame grid:
//! - **Series:** Per-signal ordered samples extracted in one pass over a log
//! - **Resolver:** Nearest-sample lookup by monotonic time
//! - **Timeline:** Fixed-rate frame grid and one annotation record per frame

pub mod resolver;
pub mod series;
pub mod timeline;

pub use resolver::*;
pub use series::*;
pub use timeline::*;
