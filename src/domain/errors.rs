//! Domain errors for the run recorder.

use thiserror::Error;

/// Errors that can occur while recording a run.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The record service answered with a non-success status.
    #[error("Record API returned {status}: {detail}")]
    Api { status: u16, detail: String },

    /// The request never produced a usable response (connect, timeout, decode).
    #[error("Record API request failed: {0}")]
    Http(String),

    /// A lifecycle event arrived outside the scope that must enclose it.
    #[error("{event} event received with no open {scope}")]
    OutOfScope {
        event: &'static str,
        scope: &'static str,
    },

    /// Dynamic labels must be a list or a comma-separated string.
    #[error("Invalid label value: {0}")]
    InvalidLabels(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type RecordResult<T> = Result<T, RecordError>;

impl From<reqwest::Error> for RecordError {
    fn from(err: reqwest::Error) -> Self {
        RecordError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(err: serde_json::Error) -> Self {
        RecordError::Serialization(err.to_string())
    }
}
