use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the hotel QA pipeline.
///
/// Dataset and configuration errors are fatal to the caller. The two model
/// errors are always absorbed by the LLM parser's regex fallback and never
/// reach the end user.
#[derive(Debug, Error)]
pub enum QaError {
    #[error("hotel dataset not found at {} or {}", primary.display(), fallback.display())]
    DatasetNotFound { primary: PathBuf, fallback: PathBuf },

    #[error("Missing required columns: {}\nAvailable: {}", missing.join(", "), available.join(", "))]
    SchemaInvalid {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model backend unavailable: {0}")]
    ModelBackendUnavailable(String),

    #[error("malformed model response: {0}")]
    MalformedModelResponse(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl QaError {
    /// True for the errors the LLM parser recovers from by falling back.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ModelBackendUnavailable(_) | Self::MalformedModelResponse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, QaError>;
