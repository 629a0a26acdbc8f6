//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DashsubError, DashsubResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Subtitle display settings.
    pub overlay: OverlayConfig,

    /// Media probing settings.
    pub probe: ProbeConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// How annotation lines are rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Fixed UTC offset used to display GPS wall-clock time, in minutes.
    pub utc_offset_minutes: i32,

    /// Wrap GPS display lines in `<font color="...">` when set.
    pub highlight_color: Option<String>,
}

/// External probe tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// ffprobe executable name or path.
    pub ffprobe_bin: String,

    /// Extensions (without dot) of raw elementary streams whose container
    /// carries no usable duration. These are probed by counting frames.
    pub raw_stream_extensions: Vec<String>,

    /// Hardware frame rate assumed for raw elementary streams.
    pub raw_stream_fps: f64,

    /// Kill the probe process after this many seconds. `None` blocks.
    pub timeout_secs: Option<u64>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "dashsub=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: -180,
            highlight_color: None,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_bin: "ffprobe".to_string(),
            raw_stream_extensions: vec!["hevc".to_string()],
            raw_stream_fps: 20.0,
            timeout_secs: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from an explicit path.
    ///
    /// Sections missing from the file keep their defaults.
    pub fn load(path: &Path) -> DashsubResult<Self> {
        if !path.exists() {
            return Err(DashsubError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| DashsubError::config(format!("Failed to read {path:?}: {e}")))?;
        serde_json::from_str(&content)
            .map_err(|e| DashsubError::config(format!("Failed to parse {path:?}: {e}")))
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&PathBuf>) -> DashsubResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
