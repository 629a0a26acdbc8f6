//! Error types shared across dashsub crates.

use std::fmt;
use std::path::PathBuf;

/// Top-level error type for dashsub operations.
#[derive(Debug, thiserror::Error)]
pub enum DashsubError {
    /// Frame-rate/duration discovery failed or returned unparseable data.
    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("No speed events found in log")]
    NoSpeedData,

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A recognized event whose payload could not be decoded.
    #[error("Malformed event at line {line}: {message}")]
    MalformedEvent { line: u64, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using DashsubError.
pub type DashsubResult<T> = Result<T, DashsubError>;

impl DashsubError {
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn malformed(line: u64, msg: impl Into<String>) -> Self {
        Self::MalformedEvent {
            line,
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Whether the pipeline may continue after this error.
    ///
    /// Only malformed events are recoverable; they are logged and skipped.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedEvent { .. })
    }
}

/// Pipeline stage, used to tag fatal errors for diagnostics and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Probe,
    Extract,
    Synthesize,
    Serialize,
}

impl Stage {
    /// Process exit code reported when this stage fails.
    ///
    /// `2` is left to argument parsing errors.
    pub fn exit_code(self) -> i32 {
        match self {
            Stage::Probe => 3,
            Stage::Extract => 4,
            Stage::Synthesize => 5,
            Stage::Serialize => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Probe => "probe",
            Stage::Extract => "extract",
            Stage::Synthesize => "synthesize",
            Stage::Serialize => "serialize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fatal error annotated with the stage that produced it.
#[derive(Debug, thiserror::Error)]
#[error("error [{stage}]: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: DashsubError,
}

impl StageError {
    pub fn new(stage: Stage, source: DashsubError) -> Self {
        Self { stage, source }
    }

    pub fn exit_code(&self) -> i32 {
        self.stage.exit_code()
    }
}

/// Attach a pipeline stage to a fallible result.
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> Result<T, StageError>;
}

impl<T> StageContext<T> for DashsubResult<T> {
    fn stage(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|e| StageError::new(stage, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_and_nonzero() {
        let codes: Vec<i32> = [
            Stage::Probe,
            Stage::Extract,
            Stage::Synthesize,
            Stage::Serialize,
        ]
        .iter()
        .map(|s| s.exit_code())
        .collect();

        for (i, code) in codes.iter().enumerate() {
            assert_ne!(*code, 0);
            assert_ne!(*code, 2);
            assert!(!codes[i + 1..].contains(code));
        }
    }

    #[test]
    fn test_stage_error_message_names_stage() {
        let err: DashsubResult<()> = Err(DashsubError::NoSpeedData);
        let err = err.stage(Stage::Extract).unwrap_err();
        assert_eq!(err.to_string(), "error [extract]: No speed events found in log");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_only_malformed_events_are_recoverable() {
        assert!(DashsubError::malformed(3, "bad payload").is_recoverable());
        assert!(!DashsubError::probe("ffprobe missing").is_recoverable());
        assert!(!DashsubError::NoSpeedData.is_recoverable());
    }
}
