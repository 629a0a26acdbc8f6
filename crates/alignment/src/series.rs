//! Per-signal time series and the single-pass extractor that builds them.

use tracing::{debug, info, warn};

use dashsub_common::clock::{MonoTimeNs, UnixMillis};
use dashsub_common::error::{DashsubError, DashsubResult};
use dashsub_log_model::event::{EventPayload, GpsFix, LogEvent};

/// One timestamped value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<T> {
    pub mono_time_ns: MonoTimeNs,
    pub value: T,
}

/// Samples of one signal, sorted ascending by monotonic time.
///
/// An empty series is valid and means "no data of this kind".
#[derive(Debug, Clone, PartialEq)]
pub struct Series<T> {
    samples: Vec<Sample<T>>,
}

/// Ego speed in m/s.
pub type SpeedSeries = Series<f64>;

/// External GPS fixes.
pub type GeoSeries = Series<GpsFix>;

impl<T> Default for Series<T> {
    fn default() -> Self {
        Self {
            samples: Vec::new(),
        }
    }
}

impl<T> Series<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from samples that must already be sorted.
    ///
    /// Returns `None` if any timestamp decreases.
    pub fn from_sorted(samples: Vec<Sample<T>>) -> Option<Self> {
        let sorted = samples
            .windows(2)
            .all(|w| w[0].mono_time_ns <= w[1].mono_time_ns);
        sorted.then_some(Self { samples })
    }

    /// Append a sample. Rejects samples older than the current last one.
    fn try_push(&mut self, mono_time_ns: MonoTimeNs, value: T) -> Result<(), MonoTimeNs> {
        if let Some(last) = self.samples.last() {
            if mono_time_ns < last.mono_time_ns {
                return Err(last.mono_time_ns);
            }
        }
        self.samples.push(Sample {
            mono_time_ns,
            value,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample<T>] {
        &self.samples
    }

    pub fn first(&self) -> Option<&Sample<T>> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample<T>> {
        self.samples.last()
    }
}

impl Series<GpsFix> {
    /// Wall-clock time of the first GPS fix, i.e. when the recording started.
    pub fn first_wall_time(&self) -> Option<UnixMillis> {
        self.first().map(|s| s.value.unix_timestamp_millis)
    }
}

/// Counters collected while extracting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub events_read: u64,
    pub unrecognized: u64,
    pub malformed: u64,
    pub out_of_order: u64,
}

/// Series extracted from one log.
#[derive(Debug, Clone, Default)]
pub struct ExtractedStreams {
    pub speed: SpeedSeries,
    pub geo: GeoSeries,
    pub stats: ExtractStats,
}

impl ExtractedStreams {
    /// Monotonic time of the first speed sample, which anchors frame 0.
    pub fn first_speed_time(&self) -> DashsubResult<MonoTimeNs> {
        self.speed
            .first()
            .map(|s| s.mono_time_ns)
            .ok_or(DashsubError::NoSpeedData)
    }
}

/// Partition a log's events into a speed series and a GPS series.
///
/// Consumes `events` exactly once. Unrecognized kinds are ignored.
/// Malformed events and events that go back in time within their series
/// are logged and skipped. I/O errors from the reader are fatal.
pub fn extract<I>(events: I) -> DashsubResult<ExtractedStreams>
where
    I: IntoIterator<Item = DashsubResult<LogEvent>>,
{
    let mut out = ExtractedStreams::default();

    for item in events {
        let event = match item {
            Ok(event) => event,
            Err(e) if e.is_recoverable() => {
                warn!("Skipping event: {e}");
                out.stats.malformed += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        out.stats.events_read += 1;

        let t = event.mono_time_ns;
        let pushed = match event.payload {
            EventPayload::CarState(state) => out.speed.try_push(t, state.v_ego),
            EventPayload::GpsLocation(fix) => out.geo.try_push(t, fix),
            EventPayload::Unrecognized { .. } => {
                out.stats.unrecognized += 1;
                continue;
            }
        };

        if let Err(previous) = pushed {
            warn!(
                "Skipping out-of-order event at t={t}ns (previous sample at {previous}ns)"
            );
            out.stats.out_of_order += 1;
        }
    }

    debug!("Extraction stats: {:?}", out.stats);
    info!(
        "Extracted {} speed samples and {} GPS fixes",
        out.speed.len(),
        out.geo.len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(events: Vec<LogEvent>) -> Vec<DashsubResult<LogEvent>> {
        events.into_iter().map(Ok).collect()
    }

    #[test]
    fn test_partitions_by_kind() {
        let streams = extract(ok(vec![
            LogEvent::car_state(0, 1.0),
            LogEvent::gps(5, -23.5, -46.6, 1_000),
            LogEvent::unrecognized(7, "deviceState"),
            LogEvent::car_state(10, 2.0),
        ]))
        .unwrap();

        assert_eq!(streams.speed.len(), 2);
        assert_eq!(streams.speed.samples()[1].value, 2.0);
        assert_eq!(streams.geo.len(), 1);
        assert_eq!(streams.geo.first_wall_time(), Some(1_000));
        assert_eq!(streams.stats.events_read, 4);
        assert_eq!(streams.stats.unrecognized, 1);
        assert_eq!(streams.first_speed_time().unwrap(), 0);
    }

    #[test]
    fn test_malformed_events_are_skipped() {
        let streams = extract(vec![
            Ok(LogEvent::car_state(0, 1.0)),
            Err(DashsubError::malformed(2, "bad vEgo")),
            Ok(LogEvent::car_state(10, 2.0)),
        ])
        .unwrap();
        assert_eq!(streams.speed.len(), 2);
        assert_eq!(streams.stats.malformed, 1);
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped() {
        use dashsub_log_model::reader::LogReader;

        let log: &[u8] = b"{\"t\":0,\"type\":\"carState\",\"vEgo\":1.0}\n\
                           \xff\xfe garbage\n\
                           {\"t\":10,\"type\":\"carState\",\"vEgo\":2.0}\n";
        let streams = extract(LogReader::new(std::io::Cursor::new(log))).unwrap();
        assert_eq!(streams.speed.len(), 2);
        assert_eq!(streams.stats.malformed, 1);
        assert_eq!(streams.first_speed_time().unwrap(), 0);
    }

    #[test]
    fn test_io_error_is_fatal() {
        let result = extract(vec![
            Ok(LogEvent::car_state(0, 1.0)),
            Err(DashsubError::Io(std::io::Error::other("disk gone"))),
        ]);
        assert!(matches!(result, Err(DashsubError::Io(_))));
    }

    #[test]
    fn test_out_of_order_sample_is_dropped_per_series() {
        let streams = extract(ok(vec![
            LogEvent::car_state(100, 1.0),
            LogEvent::gps(50, 0.0, 0.0, 0),
            LogEvent::car_state(90, 9.0),
            LogEvent::car_state(100, 2.0),
        ]))
        .unwrap();

        // GPS at 50 is fine: ordering is checked per series.
        assert_eq!(streams.geo.len(), 1);
        let speeds: Vec<f64> = streams.speed.samples().iter().map(|s| s.value).collect();
        assert_eq!(speeds, vec![1.0, 2.0]);
        assert_eq!(streams.stats.out_of_order, 1);
    }

    #[test]
    fn test_no_speed_data() {
        let streams = extract(ok(vec![LogEvent::gps(0, 1.0, 2.0, 3)])).unwrap();
        assert!(matches!(
            streams.first_speed_time(),
            Err(DashsubError::NoSpeedData)
        ));
    }

    #[test]
    fn test_from_sorted_rejects_unsorted() {
        let sorted = vec![
            Sample { mono_time_ns: 0, value: 1 },
            Sample { mono_time_ns: 0, value: 2 },
            Sample { mono_time_ns: 5, value: 3 },
        ];
        assert!(Series::from_sorted(sorted).is_some());

        let unsorted = vec![
            Sample { mono_time_ns: 5, value: 1 },
            Sample { mono_time_ns: 0, value: 2 },
        ];
        assert!(Series::from_sorted(unsorted).is_none());
    }
}
