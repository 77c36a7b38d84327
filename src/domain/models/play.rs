//! Play domain model.
//!
//! A play is a named grouping of tasks within a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a recorded play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayStatus {
    Running,
    Completed,
}

impl PlayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }
}

/// A play as stored by the record service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Play {
    /// Server-assigned identifier.
    pub id: u64,
    /// Play name, truncated to the persisted field limit.
    pub name: String,
    /// Engine-assigned UUID, normalized to 36 characters.
    pub uuid: String,
    pub status: PlayStatus,
    pub started: DateTime<Utc>,
    #[serde(default)]
    pub ended: Option<DateTime<Utc>>,
    /// Parent run.
    pub run: u64,
}
