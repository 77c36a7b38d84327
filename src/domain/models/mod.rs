//! Domain models for recorded runs.

pub mod config;
pub mod event;
pub mod file;
pub mod host;
pub mod play;
pub mod result;
pub mod run;
pub mod task;

pub use config::{ApiConfig, HostnameFormat, RecorderConfig};
pub use event::{
    HostStats, ItemEvent, PlayStartEvent, ResultEvent, RunEvent, RunStartEvent, StatsEvent,
    TaskStartEvent,
};
pub use file::FileRecord;
pub use host::Host;
pub use play::{Play, PlayStatus};
pub use result::{ResultStatus, TaskResult};
pub use run::{Run, RunStatus};
pub use task::{Task, TaskStatus};

use tracing::warn;

/// Maximum length of persisted name and label fields.
pub const FIELD_LIMIT: usize = 254;

/// Length engine UUIDs are normalized to. Loop iterations append suffixes
/// to the base UUID; everything past this is iteration noise.
pub const UUID_LENGTH: usize = 36;

/// Clamp a name or label to the persisted field limit, warning when the
/// value had to be cut.
pub fn clamp_field(field: &'static str, value: &str) -> String {
    if value.chars().count() <= FIELD_LIMIT {
        return value.to_string();
    }
    let clamped: String = value.chars().take(FIELD_LIMIT).collect();
    warn!(field, limit = FIELD_LIMIT, "value exceeds field limit, truncating");
    clamped
}

/// Normalize an engine UUID to its first 36 characters.
pub fn normalize_uuid(value: &str) -> String {
    value.chars().take(UUID_LENGTH).collect()
}
