use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort a run.
///
/// `NotFound`, `Parse`, `InvalidRegion` and `Io` are the structural failures a
/// caller is expected to match on; the remaining variants wrap the underlying
/// library errors so their messages survive.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid region code `{0}`")]
    InvalidRegion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON decoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        PipelineError::Parse(msg.into())
    }

    /// Prefix a parse message with where it happened; other kinds pass through.
    pub(crate) fn located(self, location: impl std::fmt::Display) -> Self {
        match self {
            PipelineError::Parse(msg) => PipelineError::Parse(format!("{}: {}", location, msg)),
            other => other,
        }
    }

    /// Map an open failure to `NotFound` when the file is simply missing.
    pub(crate) fn from_open(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            PipelineError::NotFound { path: path.into() }
        } else {
            PipelineError::Io(err)
        }
    }
}

impl From<serde_yaml::Error> for PipelineError {
    fn from(err: serde_yaml::Error) -> Self {
        PipelineError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
