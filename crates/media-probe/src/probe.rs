//! Frame rate and duration discovery.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use dashsub_common::config::ProbeConfig;
use dashsub_common::error::{DashsubError, DashsubResult};

use crate::runner::{CommandRunner, ProcessRunner};

const COUNT_FRAMES_ARGS: &[&str] = &[
    "-v",
    "0",
    "-count_frames",
    "-select_streams",
    "v:0",
    "-show_entries",
    "stream=nb_read_frames",
    "-of",
    "csv=p=0",
];

const FRAME_RATE_ARGS: &[&str] = &[
    "-v",
    "0",
    "-select_streams",
    "v:0",
    "-show_entries",
    "stream=r_frame_rate",
    "-of",
    "csv=p=0",
];

const DURATION_ARGS: &[&str] = &[
    "-v",
    "0",
    "-show_entries",
    "format=duration",
    "-of",
    "csv=p=0",
];

/// Frame grid parameters of a video file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    /// Frames per second.
    pub fps: f64,
    /// Total duration in seconds.
    pub duration_secs: f64,
}

/// How a file's grid parameters are discovered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeStrategy {
    /// Decode and count frames, assuming a fixed hardware frame rate.
    /// Used for raw streams whose container carries no reliable duration.
    CountedFrames { fps: f64 },
    /// Read `r_frame_rate` and `format=duration` from container metadata.
    Metadata,
}

impl MediaInfo {
    /// Validate probed values before they drive the frame grid.
    pub fn new(fps: f64, duration_secs: f64) -> DashsubResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(DashsubError::probe(format!("invalid frame rate: {fps}")));
        }
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(DashsubError::probe(format!(
                "invalid duration: {duration_secs}"
            )));
        }
        Ok(Self { fps, duration_secs })
    }
}

/// Probes video files through an external command runner.
pub struct MediaProber<R = ProcessRunner> {
    config: ProbeConfig,
    runner: R,
}

impl MediaProber<ProcessRunner> {
    /// Create a prober that runs `ffprobe` as a child process.
    pub fn from_config(config: ProbeConfig) -> Self {
        let runner = ProcessRunner::new(config.timeout_secs.map(Duration::from_secs));
        Self { config, runner }
    }
}

impl<R: CommandRunner> MediaProber<R> {
    pub fn with_runner(config: ProbeConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Pick the probing strategy from the file extension.
    pub fn strategy_for(&self, path: &Path) -> ProbeStrategy {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext {
            Some(ext)
                if self
                    .config
                    .raw_stream_extensions
                    .iter()
                    .any(|raw| raw.eq_ignore_ascii_case(&ext)) =>
            {
                ProbeStrategy::CountedFrames {
                    fps: self.config.raw_stream_fps,
                }
            }
            _ => ProbeStrategy::Metadata,
        }
    }

    /// Return the frame rate and duration of `path`.
    pub fn probe(&self, path: &Path) -> DashsubResult<MediaInfo> {
        if !path.is_file() {
            return Err(DashsubError::probe(format!(
                "media file not found: {}",
                path.display()
            )));
        }

        let strategy = self.strategy_for(path);
        debug!("Probing {} with {:?}", path.display(), strategy);

        let info = match strategy {
            ProbeStrategy::CountedFrames { fps } => {
                let frames = parse_frame_count(&self.ffprobe(COUNT_FRAMES_ARGS, path)?)?;
                MediaInfo::new(fps, frames as f64 / fps)?
            }
            ProbeStrategy::Metadata => {
                let rate = parse_frame_rate(&self.ffprobe(FRAME_RATE_ARGS, path)?)?;
                let duration = parse_duration(&self.ffprobe(DURATION_ARGS, path)?)?;
                MediaInfo::new(rate, duration)?
            }
        };

        info!(
            "Probed {}: {:.3} fps, {:.3}s",
            path.display(),
            info.fps,
            info.duration_secs
        );
        Ok(info)
    }

    fn ffprobe(&self, args: &[&str], path: &Path) -> DashsubResult<String> {
        let mut args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        args.push(path.to_string_lossy().into_owned());
        self.runner.run(&self.config.ffprobe_bin, &args)
    }
}

fn first_line(output: &str) -> Option<&str> {
    output.lines().map(str::trim).find(|line| !line.is_empty())
}

/// Parse a rational frame rate such as `30000/1001`.
///
/// A zero denominator means the numerator is already the rate. A bare
/// number without a slash is accepted as-is.
pub fn parse_frame_rate(output: &str) -> DashsubResult<f64> {
    let line = first_line(output)
        .ok_or_else(|| DashsubError::probe("empty frame rate output"))?;

    let parse = |s: &str| {
        s.trim()
            .parse::<i64>()
            .map_err(|e| DashsubError::probe(format!("unparseable frame rate {line:?}: {e}")))
    };

    match line.split_once('/') {
        Some((num, den)) => {
            let num = parse(num)?;
            let den = parse(den)?;
            if den == 0 {
                Ok(num as f64)
            } else {
                Ok(num as f64 / den as f64)
            }
        }
        None => line
            .parse::<f64>()
            .map_err(|e| DashsubError::probe(format!("unparseable frame rate {line:?}: {e}"))),
    }
}

/// Parse a `format=duration` value in seconds.
pub fn parse_duration(output: &str) -> DashsubResult<f64> {
    let line =
        first_line(output).ok_or_else(|| DashsubError::probe("empty duration output"))?;
    line.parse::<f64>()
        .map_err(|e| DashsubError::probe(format!("unparseable duration {line:?}: {e}")))
}

/// Parse a `stream=nb_read_frames` count.
pub fn parse_frame_count(output: &str) -> DashsubResult<u64> {
    let line =
        first_line(output).ok_or_else(|| DashsubError::probe("empty frame count output"))?;
    line.parse::<u64>()
        .map_err(|e| DashsubError::probe(format!("unparseable frame count {line:?}: {e}")))
}
