//! Port for the record-keeping service.
//!
//! The service exposes create/update primitives against fixed collections
//! (runs, plays, tasks, files, hosts, results). Creates are idempotent
//! upserts keyed by natural identity: host name within a run, task uuid,
//! file path within a run.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::RecordResult;
use crate::domain::models::{
    FileRecord, Host, Play, PlayStatus, ResultStatus, Run, RunStatus, Task, TaskResult, TaskStatus,
};

/// Request body for creating a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCreate {
    pub path: String,
    pub status: RunStatus,
    pub started: DateTime<Utc>,
    /// Sanitized invocation arguments.
    pub arguments: serde_json::Value,
    pub labels: Vec<String>,
    /// Version of this recorder.
    pub client_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Partial update of a run. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// Request body for creating a play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayCreate {
    pub run: u64,
    pub name: String,
    pub uuid: String,
    pub status: PlayStatus,
    pub started: DateTime<Utc>,
}

/// Partial update of a play.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PlayStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended: Option<DateTime<Utc>>,
}

/// Request body for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreate {
    pub run: u64,
    pub play: u64,
    pub file: u64,
    pub uuid: String,
    pub name: String,
    pub action: String,
    pub tags: Vec<String>,
    pub lineno: u32,
    pub handler: bool,
    pub status: TaskStatus,
    pub started: DateTime<Utc>,
}

/// Partial update of a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended: Option<DateTime<Utc>>,
}

/// Request body for registering a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCreate {
    pub run: u64,
    pub path: String,
    /// File content, or a placeholder when redacted or unreadable.
    pub content: String,
}

/// Request body for creating a host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostCreate {
    pub run: u64,
    pub name: String,
}

/// Partial update of a host (facts or aggregate counters).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unreachable: Option<u64>,
}

/// Request body for creating a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultCreate {
    pub run: u64,
    pub task: u64,
    pub host: u64,
    pub delegated_to: Vec<u64>,
    pub status: ResultStatus,
    pub changed: bool,
    pub ignore_errors: bool,
    /// Normalized, sanitized module output.
    pub content: serde_json::Value,
    pub started: DateTime<Utc>,
    pub ended: DateTime<Utc>,
}

/// Client port for the record-keeping service.
///
/// Every method returns the stored representation with its server-assigned
/// identifier. Implementations do not retry; callers decide whether a
/// failure is fatal.
#[async_trait]
pub trait RecordClient: Send + Sync {
    async fn create_run(&self, run: RunCreate) -> RecordResult<Run>;

    async fn patch_run(&self, id: u64, patch: RunPatch) -> RecordResult<Run>;

    async fn create_play(&self, play: PlayCreate) -> RecordResult<Play>;

    async fn patch_play(&self, id: u64, patch: PlayPatch) -> RecordResult<Play>;

    async fn create_task(&self, task: TaskCreate) -> RecordResult<Task>;

    async fn patch_task(&self, id: u64, patch: TaskPatch) -> RecordResult<Task>;

    async fn create_file(&self, file: FileCreate) -> RecordResult<FileRecord>;

    async fn create_host(&self, host: HostCreate) -> RecordResult<Host>;

    async fn patch_host(&self, id: u64, patch: HostPatch) -> RecordResult<Host>;

    async fn create_result(&self, result: ResultCreate) -> RecordResult<TaskResult>;
}
