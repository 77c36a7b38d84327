//! Task domain model.
//!
//! A task is a unit of work within a play, instantiated once per target
//! host as a result record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a recorded task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// A task as stored by the record service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier.
    pub id: u64,
    /// Engine-assigned UUID, normalized to 36 characters. Loop iterations
    /// append suffixes to the base UUID; normalization strips them so every
    /// iteration maps to the same task record.
    pub uuid: String,
    /// Task name, truncated to the persisted field limit.
    pub name: String,
    /// Module or plugin the task invokes.
    pub action: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// File the task was defined in.
    pub file: u64,
    /// Line within that file.
    pub lineno: u32,
    /// True for tasks triggered by a notification rather than direct
    /// sequence.
    pub handler: bool,
    pub status: TaskStatus,
    pub started: DateTime<Utc>,
    #[serde(default)]
    pub ended: Option<DateTime<Utc>>,
    /// Parent play.
    pub play: u64,
    /// Parent run.
    pub run: u64,
}
