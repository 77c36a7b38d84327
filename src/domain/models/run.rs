//! Run domain model.
//!
//! A run is one end-to-end execution of an automation playbook. It is the
//! root of the recorded hierarchy: plays, tasks, files and results all hang
//! off a run.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a recorded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The run is in progress.
    Running,
    /// The run finished with no failed or unreachable hosts.
    Completed,
    /// At least one host failed or was unreachable.
    Failed,
    /// The run was killed externally before completion.
    Expired,
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::Running
    }
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Expired => "expired",
        }
    }

    /// Terminal statuses are never overwritten, not even by a signal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// A run as stored by the record service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Server-assigned identifier.
    pub id: u64,
    /// Path of the playbook source file.
    pub path: String,
    /// Optional display name, set dynamically from play variables.
    #[serde(default)]
    pub name: Option<String>,
    pub status: RunStatus,
    pub started: DateTime<Utc>,
    #[serde(default)]
    pub ended: Option<DateTime<Utc>>,
    /// Sanitized invocation arguments.
    #[serde(default)]
    pub arguments: serde_json::Value,
    /// Labels currently attached to the run.
    #[serde(default)]
    pub labels: BTreeSet<String>,
    /// Hostname of the machine driving the run, when recorded.
    #[serde(default)]
    pub controller: Option<String>,
    /// User account driving the run, when recorded.
    #[serde(default)]
    pub user: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_is_the_only_non_terminal_status() {
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Expired.is_terminal());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RunStatus::Expired).unwrap(),
            "\"expired\""
        );
    }
}
