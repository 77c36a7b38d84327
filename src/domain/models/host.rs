//! Host domain model.

use serde::{Deserialize, Serialize};

/// A host as stored by the record service, including its aggregate result
/// counters. Counters are zero until the run's final stats are recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    /// Server-assigned identifier.
    pub id: u64,
    /// Display name, truncated to the persisted field limit.
    pub name: String,
    /// Parent run.
    pub run: u64,
    /// Facts gathered for this host, after sanitization.
    #[serde(default)]
    pub facts: serde_json::Value,
    #[serde(default)]
    pub changed: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub ok: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub unreachable: u64,
}
