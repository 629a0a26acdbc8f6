//! Clock and timing utilities for stream alignment.
//!
//! Log events are stamped with a device-local monotonic clock in
//! nanoseconds. GPS fixes additionally carry Unix epoch milliseconds.
//! This module provides utilities for:
//! - Converting between nanoseconds and seconds
//! - Mapping video frame indices onto the monotonic clock
//! - Rendering wall-clock time in a fixed display offset

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::error::{DashsubError, DashsubResult};

/// Monotonic timestamp in nanoseconds.
pub type MonoTimeNs = i64;

/// Unix epoch timestamp in milliseconds (UTC).
pub type UnixMillis = i64;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Convert a nanosecond value to seconds.
pub fn ns_to_secs(ns: MonoTimeNs) -> f64 {
    ns as f64 / NANOS_PER_SEC
}

/// Nominal monotonic offset of frame `index` at `fps`, rounded to the
/// nearest nanosecond.
pub fn frame_offset_ns(index: u64, fps: f64) -> MonoTimeNs {
    (index as f64 * NANOS_PER_SEC / fps).round() as MonoTimeNs
}

/// A fixed UTC offset used to display wall-clock time.
///
/// This is a static offset, not a timezone database entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOffset {
    offset: FixedOffset,
}

impl DisplayOffset {
    /// Build an offset from minutes east of UTC (negative = west).
    pub fn from_minutes(minutes: i32) -> DashsubResult<Self> {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                DashsubError::config(format!("UTC offset out of range: {minutes} minutes"))
            })?;
        Ok(Self { offset })
    }

    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Convert Unix epoch milliseconds into a date-time in this offset.
    ///
    /// Returns `None` when the value is outside chrono's representable range.
    pub fn localize(&self, wall_ms: UnixMillis) -> Option<DateTime<FixedOffset>> {
        DateTime::<Utc>::from_timestamp_millis(wall_ms).map(|dt| dt.with_timezone(&self.offset))
    }

    /// Render Unix epoch milliseconds as `YYYY-MM-DD HH:MM:SS` in this offset.
    pub fn format(&self, wall_ms: UnixMillis) -> Option<String> {
        self.localize(wall_ms)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
    }

    pub fn minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }
}

impl Default for DisplayOffset {
    fn default() -> Self {
        Self::utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ns_to_secs_conversion() {
        assert!((ns_to_secs(1_500_000_000) - 1.5).abs() < 1e-9);
        assert_eq!(ns_to_secs(0), 0.0);
    }

    #[test]
    fn test_frame_offset_rounds_to_nearest_ns() {
        assert_eq!(frame_offset_ns(0, 20.0), 0);
        assert_eq!(frame_offset_ns(1, 20.0), 50_000_000);
        // 1e9 / 30 = 33_333_333.33..
        assert_eq!(frame_offset_ns(1, 30.0), 33_333_333);
        // 2e9 / 30 = 66_666_666.67..
        assert_eq!(frame_offset_ns(2, 30.0), 66_666_667);
    }

    #[test]
    fn test_format_in_fixed_offset() {
        let brt = DisplayOffset::from_minutes(-180).unwrap();
        // 2024-01-15 12:00:00 UTC
        let ms = 1_705_320_000_000;
        assert_eq!(brt.format(ms).unwrap(), "2024-01-15 09:00:00");
        assert_eq!(DisplayOffset::utc().format(ms).unwrap(), "2024-01-15 12:00:00");
    }

    #[test]
    fn test_format_crosses_date_boundary() {
        let brt = DisplayOffset::from_minutes(-180).unwrap();
        // 2024-01-15 01:30:00.999 UTC
        let ms = 1_705_282_200_999;
        assert_eq!(brt.format(ms).unwrap(), "2024-01-14 22:30:00");
    }

    #[test]
    fn test_offset_out_of_range_is_config_error() {
        assert!(DisplayOffset::from_minutes(24 * 60).is_err());
        assert!(matches!(
            DisplayOffset::from_minutes(i32::MAX),
            Err(DashsubError::Config { .. })
        ));
        assert!(matches!(
            DisplayOffset::from_minutes(i32::MIN),
            Err(DashsubError::Config { .. })
        ));
        assert_eq!(DisplayOffset::from_minutes(-180).unwrap().minutes(), -180);
        assert_eq!(DisplayOffset::from_minutes(330).unwrap().minutes(), 330);
    }
}
