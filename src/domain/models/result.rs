//! Result domain model.
//!
//! A result is the outcome of one task on one host, the leaf of the
//! recorded hierarchy. Loops and delegation can produce more than one per
//! host.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a task on a single host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Ok,
    Failed,
    Unreachable,
    Skipped,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
            Self::Unreachable => "unreachable",
            Self::Skipped => "skipped",
        }
    }

    /// Whether this outcome marks the owning task as failed, barring
    /// `ignore_errors`.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Unreachable)
    }
}

/// A result as stored by the record service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Server-assigned identifier.
    pub id: u64,
    pub status: ResultStatus,
    /// Host the task acted on.
    pub host: u64,
    /// Hosts the task was delegated to, if any.
    #[serde(default)]
    pub delegated_to: Vec<u64>,
    /// Parent task.
    pub task: u64,
    /// Parent run.
    pub run: u64,
    pub changed: bool,
    pub ignore_errors: bool,
    /// Normalized, sanitized module output.
    #[serde(default)]
    pub content: serde_json::Value,
    pub started: DateTime<Utc>,
    #[serde(default)]
    pub ended: Option<DateTime<Utc>>,
}
