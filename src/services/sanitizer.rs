//! Redaction of sensitive data before submission.
//!
//! Three independent policies: invocation arguments, gathered facts, and
//! registered file content. Each replaces matched data with a fixed
//! placeholder so the shape of the record survives while the value does
//! not.

use serde_json::{Map, Value};

use crate::domain::errors::RecordResult;
use crate::domain::models::RecorderConfig;

/// Placeholder stored in place of a redacted argument value.
pub const REDACTED_ARGUMENT: &str = "Not recorded, excluded by ignored_arguments";

/// Placeholder stored in place of a redacted fact value.
pub const REDACTED_FACT: &str = "Not recorded, excluded by ignored_facts";

/// Placeholder stored as content for files matching `ignored_files`.
pub const REDACTED_FILE: &str = "Not recorded, excluded by ignored_files";

/// Placeholder stored as result content when content recording is off.
pub const REDACTED_CONTENT: &str = "Not recorded, disabled by record_task_content";

/// The fact-redaction pattern that wipes the whole payload.
const ALL_FACTS: &str = "all";

/// Applies the configured redaction policies.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    ignored_arguments: Vec<String>,
    ignored_facts: Vec<String>,
    ignored_files: Vec<String>,
    record_task_content: bool,
}

impl Sanitizer {
    /// Build a sanitizer from the recorder configuration.
    ///
    /// The engine's own local temp directory joins the ignored file set
    /// here. It is configurable in the engine, so it arrives through
    /// config rather than as a constant.
    pub fn from_config(config: &RecorderConfig) -> Self {
        let mut ignored_files = config.ignored_files.clone();
        if let Some(tmp) = &config.engine_tmp_dir {
            if !tmp.is_empty() && !ignored_files.contains(tmp) {
                ignored_files.push(tmp.clone());
            }
        }
        Self {
            ignored_arguments: config.ignored_arguments.clone(),
            ignored_facts: config.ignored_facts.clone(),
            ignored_files,
            record_task_content: config.record_task_content,
        }
    }

    /// Redact matching keys from the run's invocation arguments.
    pub fn arguments(&self, arguments: &Value) -> Value {
        let Value::Object(map) = arguments else {
            return arguments.clone();
        };
        let redacted: Map<String, Value> = map
            .iter()
            .map(|(key, value)| {
                if self.ignored_arguments.iter().any(|ignored| ignored == key) {
                    (key.clone(), Value::String(REDACTED_ARGUMENT.to_string()))
                } else {
                    (key.clone(), value.clone())
                }
            })
            .collect();
        Value::Object(redacted)
    }

    /// Redact a fact payload. The `all` pattern replaces the payload
    /// wholesale; otherwise matching top-level keys are replaced per key.
    pub fn facts(&self, facts: &Value) -> Value {
        if self.ignored_facts.iter().any(|f| f == ALL_FACTS) {
            return Value::String(REDACTED_FACT.to_string());
        }
        let Value::Object(map) = facts else {
            return facts.clone();
        };
        let redacted: Map<String, Value> = map
            .iter()
            .map(|(key, value)| {
                if self.ignored_facts.iter().any(|ignored| ignored == key) {
                    (key.clone(), Value::String(REDACTED_FACT.to_string()))
                } else {
                    (key.clone(), value.clone())
                }
            })
            .collect();
        Value::Object(redacted)
    }

    /// Whether a path matches one of the ignored file patterns.
    pub fn is_ignored_file(&self, path: &str) -> bool {
        self.ignored_files
            .iter()
            .any(|pattern| !pattern.is_empty() && path.contains(pattern.as_str()))
    }

    /// Content to register for a source file. Ignored paths get the
    /// redaction placeholder without touching the filesystem; unreadable
    /// files get a local placeholder so registration still proceeds.
    pub async fn file_content(&self, path: &str) -> String {
        if self.is_ignored_file(path) {
            return REDACTED_FILE.to_string();
        }
        match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!(path, error = %err, "source file unreadable, storing placeholder");
                format!("Unable to read {path}")
            }
        }
    }

    /// Result content as it should be stored: either the content-disabled
    /// placeholder or the normalized payload.
    pub fn result_content(&self, content: &Value) -> RecordResult<Value> {
        if !self.record_task_content {
            return Ok(Value::String(REDACTED_CONTENT.to_string()));
        }
        Ok(normalize(content))
    }
}

/// Rewrite a JSON value with recursively sorted object keys, giving the
/// stored content a deterministic serialization. Object keys are strings,
/// so the ordering is always defined.
fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let sorted: Map<String, Value> = keys
                .into_iter()
                .map(|key| (key.clone(), normalize(&map[key])))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sanitizer(config: RecorderConfig) -> Sanitizer {
        Sanitizer::from_config(&config)
    }

    #[test]
    fn ignored_arguments_are_replaced() {
        let config = RecorderConfig {
            ignored_arguments: vec!["extra_vars".to_string()],
            ..Default::default()
        };
        let arguments = json!({"extra_vars": {"token": "hunter2"}, "check": false});
        let sanitized = sanitizer(config).arguments(&arguments);
        assert_eq!(sanitized["extra_vars"], REDACTED_ARGUMENT);
        assert_eq!(sanitized["check"], false);
    }

    #[test]
    fn fact_pattern_all_wipes_the_payload() {
        let config = RecorderConfig {
            ignored_facts: vec!["all".to_string()],
            ..Default::default()
        };
        let facts = json!({"os_family": "Debian", "secret": "value"});
        let sanitized = sanitizer(config).facts(&facts);
        assert_eq!(sanitized, Value::String(REDACTED_FACT.to_string()));
    }

    #[test]
    fn fact_redaction_is_per_key_otherwise() {
        let config = RecorderConfig {
            ignored_facts: vec!["secret".to_string()],
            ..Default::default()
        };
        let facts = json!({"os_family": "Debian", "secret": "value"});
        let sanitized = sanitizer(config).facts(&facts);
        assert_eq!(sanitized["secret"], REDACTED_FACT);
        assert_eq!(sanitized["os_family"], "Debian");
    }

    #[test]
    fn engine_tmp_dir_joins_ignored_files() {
        let config = RecorderConfig {
            ignored_files: vec!["vault".to_string()],
            engine_tmp_dir: Some("/home/user/.engine/tmp".to_string()),
            ..Default::default()
        };
        let s = sanitizer(config);
        assert!(s.is_ignored_file("/srv/group_vars/vault.yml"));
        assert!(s.is_ignored_file("/home/user/.engine/tmp/payload.yml"));
        assert!(!s.is_ignored_file("/srv/site.yml"));
    }

    #[tokio::test]
    async fn ignored_file_content_skips_the_filesystem() {
        let config = RecorderConfig {
            ignored_files: vec!["does-not-exist".to_string()],
            ..Default::default()
        };
        let content = sanitizer(config)
            .file_content("/nowhere/does-not-exist.yml")
            .await;
        assert_eq!(content, REDACTED_FILE);
    }

    #[tokio::test]
    async fn unreadable_file_gets_a_placeholder() {
        let content = sanitizer(RecorderConfig::default())
            .file_content("/nowhere/missing.yml")
            .await;
        assert!(content.starts_with("Unable to read"));
    }

    #[test]
    fn content_recording_can_be_disabled() {
        let config = RecorderConfig {
            record_task_content: false,
            ..Default::default()
        };
        let stored = sanitizer(config)
            .result_content(&json!({"rc": 0}))
            .unwrap();
        assert_eq!(stored, Value::String(REDACTED_CONTENT.to_string()));
    }

    #[test]
    fn normalization_sorts_keys_recursively() {
        let content = json!({"zeta": {"b": 1, "a": 2}, "alpha": [{"y": 1, "x": 2}]});
        let normalized = sanitizer(RecorderConfig::default())
            .result_content(&content)
            .unwrap();
        let rendered = serde_json::to_string(&normalized).unwrap();
        assert_eq!(
            rendered,
            r#"{"alpha":[{"x":2,"y":1}],"zeta":{"a":2,"b":1}}"#
        );
    }
}
