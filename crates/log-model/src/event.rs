//! Event types for the drive log stream.
//!
//! Each log line is a JSON object with a monotonic timestamp `t`, a
//! `type` discriminator and the payload fields of that type. Only the
//! kinds needed for annotation are decoded; everything else is kept as
//! [`EventPayload::Unrecognized`] so readers never fail on new kinds.

use serde::{Deserialize, Serialize};

use dashsub_common::clock::{MonoTimeNs, UnixMillis};
use dashsub_common::error::{DashsubError, DashsubResult};

/// Wire name of the vehicle state event.
pub const CAR_STATE_KIND: &str = "carState";

/// Wire name of the external GPS fix event.
pub const GPS_LOCATION_KIND: &str = "gpsLocationExternal";

/// Meters per second to kilometers per hour.
pub const MS_TO_KMH: f64 = 3.6;

/// A single log event with its monotonic timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    /// Monotonic nanoseconds on the device clock.
    pub mono_time_ns: MonoTimeNs,

    /// The event payload.
    pub payload: EventPayload,
}

/// Closed set of payload kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    CarState(CarState),
    GpsLocation(GpsFix),
    /// Any other kind. Carried by name only.
    Unrecognized { kind: String },
}

/// Vehicle state sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarState {
    /// Ego speed in m/s.
    #[serde(rename = "vEgo")]
    pub v_ego: f64,
}

/// GPS fix from the external receiver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Wall-clock time of the fix (Unix epoch ms, UTC).
    #[serde(rename = "unixTimestampMillis")]
    pub unix_timestamp_millis: UnixMillis,
}

/// Envelope shared by every log line.
#[derive(Debug, Deserialize)]
struct RawEvent {
    t: MonoTimeNs,
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    fields: serde_json::Map<String, serde_json::Value>,
}

impl CarState {
    /// Speed in km/h.
    pub fn speed_kmh(&self) -> f64 {
        self.v_ego * MS_TO_KMH
    }
}

impl EventPayload {
    /// Wire name of this payload kind.
    pub fn kind(&self) -> &str {
        match self {
            EventPayload::CarState(_) => CAR_STATE_KIND,
            EventPayload::GpsLocation(_) => GPS_LOCATION_KIND,
            EventPayload::Unrecognized { kind } => kind,
        }
    }
}

impl LogEvent {
    /// Create a vehicle state event.
    pub fn car_state(mono_time_ns: MonoTimeNs, v_ego: f64) -> Self {
        Self {
            mono_time_ns,
            payload: EventPayload::CarState(CarState { v_ego }),
        }
    }

    /// Create a GPS fix event.
    pub fn gps(
        mono_time_ns: MonoTimeNs,
        latitude: f64,
        longitude: f64,
        unix_timestamp_millis: UnixMillis,
    ) -> Self {
        Self {
            mono_time_ns,
            payload: EventPayload::GpsLocation(GpsFix {
                latitude,
                longitude,
                unix_timestamp_millis,
            }),
        }
    }

    /// Create an event of a kind the pipeline does not decode.
    pub fn unrecognized(mono_time_ns: MonoTimeNs, kind: impl Into<String>) -> Self {
        Self {
            mono_time_ns,
            payload: EventPayload::Unrecognized { kind: kind.into() },
        }
    }

    /// Decode a single JSONL line. `line_no` is 1-based and only used for
    /// error reporting.
    pub fn from_json_line(line: &str, line_no: u64) -> DashsubResult<Self> {
        let raw: RawEvent = serde_json::from_str(line)
            .map_err(|e| DashsubError::malformed(line_no, format!("invalid envelope: {e}")))?;

        let fields = serde_json::Value::Object(raw.fields);
        let payload = match raw.kind.as_str() {
            CAR_STATE_KIND => EventPayload::CarState(
                serde_json::from_value(fields)
                    .map_err(|e| DashsubError::malformed(line_no, format!("carState: {e}")))?,
            ),
            GPS_LOCATION_KIND => EventPayload::GpsLocation(
                serde_json::from_value(fields).map_err(|e| {
                    DashsubError::malformed(line_no, format!("gpsLocationExternal: {e}"))
                })?,
            ),
            _ => EventPayload::Unrecognized { kind: raw.kind },
        };

        Ok(Self {
            mono_time_ns: raw.t,
            payload,
        })
    }

    /// Encode as a single JSONL line (without trailing newline).
    pub fn to_json_line(&self) -> DashsubResult<String> {
        let mut object = match &self.payload {
            EventPayload::CarState(state) => into_object(serde_json::to_value(state)?),
            EventPayload::GpsLocation(fix) => into_object(serde_json::to_value(fix)?),
            EventPayload::Unrecognized { .. } => serde_json::Map::new(),
        };
        object.insert("t".to_string(), self.mono_time_ns.into());
        object.insert("type".to_string(), self.payload.kind().into());
        Ok(serde_json::to_string(&object)?)
    }
}

fn into_object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

/// Serialize events to JSONL format.
pub fn serialize_events(events: &[LogEvent]) -> DashsubResult<String> {
    let mut output = String::new();
    for event in events {
        output.push_str(&event.to_json_line()?);
        output.push('\n');
    }
    Ok(output)
}
