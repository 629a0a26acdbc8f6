//! Frame grid synthesis: one annotation record per video frame.
//!
//! Frame `i` sits at `first_mono + round(i * 1e9 / fps)` on the log's
//! monotonic clock and covers `[i / fps, (i + 1) / fps)` of the video.

use tracing::{debug, info, warn};

use dashsub_common::clock::{frame_offset_ns, DisplayOffset, MonoTimeNs};
use dashsub_common::error::{DashsubError, DashsubResult};
use dashsub_log_model::event::MS_TO_KMH;

use crate::resolver::nearest;
use crate::series::{GeoSeries, SpeedSeries};

/// Upper bound on grid size, about 46 hours of 60 fps video.
pub const MAX_FRAMES: u64 = 10_000_000;

/// Fixed-rate frame grid anchored to the log's monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGrid {
    fps: f64,
    duration_secs: f64,
    first_mono_ns: MonoTimeNs,
}

/// A single frame's position on both clocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSlot {
    /// 0-based frame number.
    pub index: u64,
    /// Nominal monotonic time of the frame (ns).
    pub nominal_time_ns: MonoTimeNs,
    /// Video-relative start time (seconds).
    pub start_secs: f64,
    /// Video-relative end time (seconds).
    pub end_secs: f64,
}

/// GPS part of an annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoAnnotation {
    pub latitude: f64,
    pub longitude: f64,
    /// Fix wall-clock time rendered in the display offset.
    pub local_time: String,
}

/// What to display during one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub index: u64,
    pub start_secs: f64,
    pub end_secs: f64,
    pub speed_kmh: f64,
    pub geo: Option<GeoAnnotation>,
}

impl AnnotationRecord {
    pub fn has_geo(&self) -> bool {
        self.geo.is_some()
    }
}

impl FrameGrid {
    pub fn new(fps: f64, duration_secs: f64, first_mono_ns: MonoTimeNs) -> DashsubResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(DashsubError::Other(anyhow::anyhow!(
                "frame rate must be positive, got {fps}"
            )));
        }
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(DashsubError::Other(anyhow::anyhow!(
                "duration must be non-negative, got {duration_secs}"
            )));
        }

        let frames = (duration_secs * fps).floor();
        if frames > MAX_FRAMES as f64 {
            return Err(DashsubError::Other(anyhow::anyhow!(
                "frame grid too large: {frames} frames (limit {MAX_FRAMES})"
            )));
        }
        // The last frame's nominal time must stay on the i64 clock.
        if frames >= 1.0 {
            let last_offset = ((frames - 1.0) * 1e9 / fps).round();
            let fits = last_offset < i64::MAX as f64
                && first_mono_ns.checked_add(last_offset as i64).is_some();
            if !fits {
                return Err(DashsubError::Other(anyhow::anyhow!(
                    "frame grid overflows the log clock: {frames} frames at {fps} fps from {first_mono_ns} ns"
                )));
            }
        }

        Ok(Self {
            fps,
            duration_secs,
            first_mono_ns,
        })
    }

    /// `floor(duration * fps)`.
    pub fn frame_count(&self) -> u64 {
        (self.duration_secs * self.fps).floor() as u64
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn slot(&self, index: u64) -> FrameSlot {
        FrameSlot {
            index,
            nominal_time_ns: self.first_mono_ns + frame_offset_ns(index, self.fps),
            start_secs: index as f64 / self.fps,
            end_secs: (index + 1) as f64 / self.fps,
        }
    }

    pub fn slots(&self) -> impl Iterator<Item = FrameSlot> + '_ {
        (0..self.frame_count()).map(|i| self.slot(i))
    }
}

/// Resolve every frame of `grid` against the speed and GPS series.
///
/// The speed series must be non-empty. An empty GPS series yields records
/// without geo data.
pub fn synthesize(
    speed: &SpeedSeries,
    geo: &GeoSeries,
    grid: &FrameGrid,
    offset: &DisplayOffset,
) -> DashsubResult<Vec<AnnotationRecord>> {
    if speed.is_empty() {
        return Err(DashsubError::NoSpeedData);
    }
    if geo.is_empty() {
        debug!("No GPS fixes, annotating speed only");
    }

    let mut records = Vec::with_capacity(grid.frame_count() as usize);
    let mut unrenderable_fixes = 0u64;

    for slot in grid.slots() {
        let speed_ms = nearest(speed, slot.nominal_time_ns)
            .map(|s| s.value)
            .ok_or(DashsubError::NoSpeedData)?;

        let geo_annotation = nearest(geo, slot.nominal_time_ns).and_then(|s| {
            let fix = s.value;
            match offset.format(fix.unix_timestamp_millis) {
                Some(local_time) => Some(GeoAnnotation {
                    latitude: fix.latitude,
                    longitude: fix.longitude,
                    local_time,
                }),
                None => {
                    unrenderable_fixes += 1;
                    None
                }
            }
        });

        records.push(AnnotationRecord {
            index: slot.index,
            start_secs: slot.start_secs,
            end_secs: slot.end_secs,
            speed_kmh: speed_ms * MS_TO_KMH,
            geo: geo_annotation,
        });
    }

    if unrenderable_fixes > 0 {
        warn!("{unrenderable_fixes} frame(s) had a GPS fix with an out-of-range wall time");
    }
    info!(
        "Synthesized {} records at {:.3} fps",
        records.len(),
        grid.fps()
    );
    Ok(records)
}
