//! Lifecycle events consumed by the dispatcher.
//!
//! The automation engine exposes a host-specific hook surface; the serde
//! representation of [`RunEvent`] is the closed internal form those hooks
//! translate into. Events are tagged with an `event` field so a
//! newline-delimited JSON stream can be replayed directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One lifecycle event from the engine, in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunStart(RunStartEvent),
    PlayStart(PlayStartEvent),
    TaskStart(TaskStartEvent),
    /// A task triggered by a notification rather than direct sequence.
    HandlerTaskStart(TaskStartEvent),
    ResultOk(ResultEvent),
    ResultFailed(ResultEvent),
    ResultUnreachable(ResultEvent),
    ResultSkipped(ResultEvent),
    /// Loop-item outcome. Item events only feed the delegation cache; the
    /// aggregated top-level result event follows separately.
    ItemOk(ItemEvent),
    ItemFailed(ItemEvent),
    ItemSkipped(ItemEvent),
    /// Terminal per-host summary.
    RunStats(StatsEvent),
}

impl RunEvent {
    /// Event name as it appears on the wire, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RunStart(_) => "run_start",
            Self::PlayStart(_) => "play_start",
            Self::TaskStart(_) => "task_start",
            Self::HandlerTaskStart(_) => "handler_task_start",
            Self::ResultOk(_) => "result_ok",
            Self::ResultFailed(_) => "result_failed",
            Self::ResultUnreachable(_) => "result_unreachable",
            Self::ResultSkipped(_) => "result_skipped",
            Self::ItemOk(_) => "item_ok",
            Self::ItemFailed(_) => "item_failed",
            Self::ItemSkipped(_) => "item_skipped",
            Self::RunStats(_) => "run_stats",
        }
    }
}

/// Payload of the run-start event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStartEvent {
    /// Path of the playbook source file.
    pub path: String,
    /// Invocation arguments, unsanitized.
    #[serde(default)]
    pub arguments: serde_json::Value,
    /// Version of the engine driving the run, when the adapter knows it.
    #[serde(default)]
    pub engine_version: Option<String>,
}

/// Payload of the play-start event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayStartEvent {
    pub name: String,
    pub uuid: String,
    /// Play variables; dynamic run name and label overrides are read from
    /// here.
    #[serde(default)]
    pub variables: BTreeMap<String, serde_json::Value>,
    /// Source files referenced by this play.
    #[serde(default)]
    pub files: Vec<String>,
}

/// Payload of the task-start event (plain and handler variants).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStartEvent {
    pub name: String,
    pub uuid: String,
    pub action: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// `path:line` source location; absent when the engine cannot resolve
    /// it.
    #[serde(default)]
    pub location: Option<String>,
}

/// Payload of a per-host result event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEvent {
    pub host: String,
    pub task_uuid: String,
    #[serde(default)]
    pub changed: bool,
    #[serde(default)]
    pub ignore_errors: bool,
    /// Top-level delegation target. May still be an untemplated expression
    /// at this point; the delegation cache built from item events takes
    /// precedence.
    #[serde(default)]
    pub delegate_to: Option<String>,
    /// Raw module output.
    #[serde(default)]
    pub content: serde_json::Value,
}

/// Payload of a loop-item event. Carries the templated delegation target
/// that the aggregated result event cannot provide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEvent {
    pub task_uuid: String,
    #[serde(default)]
    pub delegate_to: Option<String>,
}

/// Aggregate counters for one host, reported at run end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostStats {
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

impl HostStats {
    /// Whether this host's counters fail the run.
    pub fn has_failure(&self) -> bool {
        self.failed > 0 || self.unreachable > 0
    }
}

/// Payload of the terminal run-stats event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsEvent {
    /// Per-host counters, keyed by host display name.
    pub hosts: BTreeMap<String, HostStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_round_trip_through_the_wire_tag() {
        let line = r#"{"event":"task_start","name":"Install packages","uuid":"a1b2","action":"package","tags":["setup"],"location":"site.yml:14"}"#;
        let event: RunEvent = serde_json::from_str(line).unwrap();
        match &event {
            RunEvent::TaskStart(task) => {
                assert_eq!(task.action, "package");
                assert_eq!(task.location.as_deref(), Some("site.yml:14"));
            }
            other => panic!("unexpected event: {}", other.name()),
        }
        let encoded = serde_json::to_value(&event).unwrap();
        assert_eq!(encoded["event"], "task_start");
    }

    #[test]
    fn stats_failure_detection() {
        let healthy = HostStats {
            ok: 3,
            changed: 1,
            ..Default::default()
        };
        let dark = HostStats {
            unreachable: 1,
            ..Default::default()
        };
        assert!(!healthy.has_failure());
        assert!(dark.has_failure());
    }
}
