//! The event dispatcher: a sequential state machine turning lifecycle
//! events into record API calls.
//!
//! One dispatcher instance owns the context of one run (current run, play,
//! task, identity caches, label set, worker pools). The engine drives it
//! synchronously, one event at a time; genuine parallelism only happens
//! inside the executors for leaf submissions. Structural calls (run, play,
//! task creation and their closing patches) stay on the dispatch path and
//! propagate failures, aborting recording for the run — the automation run
//! itself is unaffected, recording is secondary telemetry.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::errors::{RecordError, RecordResult};
use crate::domain::models::{
    clamp_field, normalize_uuid, FileRecord, Host, ItemEvent, Play, PlayStartEvent, PlayStatus,
    RecorderConfig, ResultEvent, ResultStatus, Run, RunEvent, RunStartEvent, RunStatus,
    StatsEvent, Task, TaskStartEvent, TaskStatus,
};
use crate::domain::ports::{
    FileCreate, HostCreate, HostPatch, PlayCreate, PlayPatch, RecordClient, ResultCreate,
    RunCreate, RunPatch, TaskCreate, TaskPatch,
};
use crate::services::{controller, executor_for, Executor, IdentityCache, Sanitizer};

/// Play variable carrying a dynamic run name override.
const RUN_NAME_VAR: &str = "runscribe_run_name";

/// Play variable carrying dynamic run labels.
const RUN_LABELS_VAR: &str = "runscribe_run_labels";

/// Key under which fact-gathering modules report their payload.
const FACTS_KEY: &str = "facts";

/// Per-run event dispatcher.
///
/// There is no process-wide state: several dispatchers can record several
/// runs in one process without touching each other.
pub struct Dispatcher {
    client: Arc<dyn RecordClient>,
    config: RecorderConfig,
    sanitizer: Sanitizer,
    /// Controller hostname in the configured format, resolved once.
    controller_hostname: Option<String>,

    run: Option<Run>,
    play: Option<Play>,
    task: Option<Task>,
    /// Set when a result with a qualifying failure arrives, so the closing
    /// patch cannot be downgraded by later retried results.
    task_failed: bool,

    files: IdentityCache<FileRecord>,
    hosts: IdentityCache<Host>,
    tasks: IdentityCache<Task>,
    /// Task uuid to delegated host names, populated by item events whose
    /// delegation target is already templated.
    delegation: HashMap<String, Vec<String>>,
    /// Label set last patched onto the run.
    labels: BTreeSet<String>,

    run_pool: Box<dyn Executor>,
    task_pool: Option<Box<dyn Executor>>,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn RecordClient>, config: RecorderConfig) -> Self {
        let sanitizer = Sanitizer::from_config(&config);
        let controller_hostname = controller::hostname(config.localhost_as_hostname_format);
        Self {
            client,
            sanitizer,
            controller_hostname,
            run: None,
            play: None,
            task: None,
            task_failed: false,
            files: IdentityCache::new(),
            hosts: IdentityCache::new(),
            tasks: IdentityCache::new(),
            delegation: HashMap::new(),
            labels: BTreeSet::new(),
            run_pool: executor_for(config.callback_threads),
            task_pool: None,
            config,
        }
    }

    /// The run currently being recorded, if any.
    pub fn active_run(&self) -> Option<&Run> {
        self.run.as_ref()
    }

    /// Consume one lifecycle event. Events must arrive in engine order.
    pub async fn handle_event(&mut self, event: RunEvent) -> RecordResult<()> {
        debug!(event = event.name(), "dispatching lifecycle event");
        match event {
            RunEvent::RunStart(start) => self.run_start(start).await,
            RunEvent::PlayStart(play) => self.play_start(play).await,
            RunEvent::TaskStart(task) => self.task_start(task, false).await,
            RunEvent::HandlerTaskStart(task) => self.task_start(task, true).await,
            RunEvent::ResultOk(result) => self.result(result, ResultStatus::Ok).await,
            RunEvent::ResultFailed(result) => self.result(result, ResultStatus::Failed).await,
            RunEvent::ResultUnreachable(result) => {
                self.result(result, ResultStatus::Unreachable).await
            }
            RunEvent::ResultSkipped(result) => self.result(result, ResultStatus::Skipped).await,
            RunEvent::ItemOk(item) | RunEvent::ItemFailed(item) | RunEvent::ItemSkipped(item) => {
                self.cache_delegation(item);
                Ok(())
            }
            RunEvent::RunStats(stats) => self.run_stats(stats).await,
        }
    }

    /// Mark an in-flight run expired after a termination signal.
    ///
    /// Best effort: one patch, no retry, and outstanding pooled work is
    /// not awaited. Terminal statuses are left alone.
    pub async fn on_terminate(&mut self) {
        let Some(run) = &self.run else { return };
        if run.status.is_terminal() {
            return;
        }
        let patch = RunPatch {
            status: Some(RunStatus::Expired),
            ended: Some(Utc::now()),
            ..Default::default()
        };
        match self.client.patch_run(run.id, patch).await {
            Ok(updated) => {
                warn!(run = updated.id, "run marked expired after termination signal");
                self.run = Some(updated);
            }
            Err(err) => {
                warn!(error = %err, "could not mark run expired");
            }
        }
    }

    async fn run_start(&mut self, event: RunStartEvent) -> RecordResult<()> {
        let labels = self.initial_labels(&event.arguments);
        let run = self
            .client
            .create_run(RunCreate {
                path: event.path.clone(),
                status: RunStatus::Running,
                started: Utc::now(),
                arguments: self.sanitizer.arguments(&event.arguments),
                labels: labels.iter().cloned().collect(),
                client_version: env!("CARGO_PKG_VERSION").to_string(),
                engine_version: event.engine_version,
                controller: controller::resolve_controller(&self.config),
                user: controller::resolve_user(&self.config),
            })
            .await?;
        info!(run = run.id, path = %run.path, "run recording started");

        self.labels = labels;
        self.run_pool = executor_for(self.config.callback_threads);

        // Register the playbook source itself, off the dispatch path. The
        // create is an idempotent upsert, so a later cached reference to
        // the same path stays consistent.
        let client = Arc::clone(&self.client);
        let sanitizer = self.sanitizer.clone();
        let path = event.path;
        let run_id = run.id;
        self.run = Some(run);
        self.run_pool
            .submit(
                "run source file",
                Box::pin(async move {
                    let content = sanitizer.file_content(&path).await;
                    client
                        .create_file(FileCreate {
                            run: run_id,
                            path,
                            content,
                        })
                        .await
                        .map(|_| ())
                }),
            )
            .await
    }

    async fn play_start(&mut self, event: PlayStartEvent) -> RecordResult<()> {
        self.close_task().await?;
        self.close_play().await?;
        let run_id = self.require_run("play_start")?;

        self.apply_dynamic_overrides(&event, run_id).await?;

        for path in &event.files {
            self.register_play_file(path).await?;
        }

        let play = self
            .client
            .create_play(PlayCreate {
                run: run_id,
                name: clamp_field("play name", &event.name),
                uuid: normalize_uuid(&event.uuid),
                status: PlayStatus::Running,
                started: Utc::now(),
            })
            .await?;
        debug!(play = play.id, name = %play.name, "play started");
        self.play = Some(play);
        Ok(())
    }

    async fn task_start(&mut self, event: TaskStartEvent, handler: bool) -> RecordResult<()> {
        self.close_task().await?;
        let run_id = self.require_run("task_start")?;
        let play_id = self
            .play
            .as_ref()
            .map(|play| play.id)
            .ok_or(RecordError::OutOfScope {
                event: "task_start",
                scope: "play",
            })?;

        let run_path = self.run.as_ref().map(|run| run.path.clone()).unwrap_or_default();
        let (path, lineno) = parse_location(event.location.as_deref(), &run_path);
        let file = self.get_or_create_file(&path).await?;

        let uuid = normalize_uuid(&event.uuid);
        let client = Arc::clone(&self.client);
        let name = clamp_field("task name", &event.name);
        let create = TaskCreate {
            run: run_id,
            play: play_id,
            file: file.id,
            uuid: uuid.clone(),
            name,
            action: event.action.clone(),
            tags: event.tags.clone(),
            lineno,
            handler,
            status: TaskStatus::Running,
            started: Utc::now(),
        };
        let task = self
            .tasks
            .get_or_create(&uuid, move || async move { client.create_task(create).await })
            .await?;

        // A failure recorded on an earlier reference to this task sticks.
        self.task_failed = task.status == TaskStatus::Failed;
        self.task = Some(task);
        self.task_pool = Some(executor_for(self.config.callback_threads));
        Ok(())
    }

    async fn result(&mut self, event: ResultEvent, status: ResultStatus) -> RecordResult<()> {
        let run_id = self.require_run(status.as_str())?;
        let task = self.task.clone().ok_or(RecordError::OutOfScope {
            event: "result",
            scope: "task",
        })?;

        if status.is_failure() && !event.ignore_errors {
            self.task_failed = true;
            if let Some(cached) = self.tasks.get_mut(&task.uuid) {
                cached.status = TaskStatus::Failed;
            }
            if let Some(open) = &mut self.task {
                open.status = TaskStatus::Failed;
            }
        }

        let host = {
            let name = self.effective_host_name(&event.host);
            self.get_or_create_host(&name, run_id).await?
        };

        let mut delegated = Vec::new();
        let mut delegated_names = self.delegation.remove(&task.uuid).unwrap_or_default();
        if delegated_names.is_empty() {
            if let Some(target) = &event.delegate_to {
                delegated_names.push(target.clone());
            }
        }
        for name in delegated_names {
            let name = self.effective_host_name(&name);
            let record = self.get_or_create_host(&name, run_id).await?;
            delegated.push(record.id);
        }

        // Facts ride along with the result submission when the action
        // gathers them.
        let facts = if is_fact_gathering(&task.action) {
            event.content.get(FACTS_KEY).cloned()
        } else {
            None
        };

        let client = Arc::clone(&self.client);
        let sanitizer = self.sanitizer.clone();
        let raw_content = event.content;
        let host_id = host.id;
        let create_shell = ResultCreate {
            run: run_id,
            task: task.id,
            host: host_id,
            delegated_to: delegated,
            status,
            changed: event.changed,
            ignore_errors: event.ignore_errors,
            content: Value::Null,
            started: task.started,
            ended: Utc::now(),
        };

        let Some(pool) = self.task_pool.as_mut() else {
            return Err(RecordError::OutOfScope {
                event: "result",
                scope: "task",
            });
        };
        pool.submit(
            "result",
            Box::pin(async move {
                let mut create = create_shell;
                create.content = sanitizer.result_content(&raw_content)?;
                client.create_result(create).await?;
                if let Some(payload) = facts {
                    let patch = HostPatch {
                        facts: Some(sanitizer.facts(&payload)),
                        ..Default::default()
                    };
                    client.patch_host(host_id, patch).await?;
                }
                Ok(())
            }),
        )
        .await
    }

    async fn run_stats(&mut self, event: StatsEvent) -> RecordResult<()> {
        self.close_task().await?;
        self.close_play().await?;
        let run_id = self.require_run("run_stats")?;

        let mut run_failed = false;
        for (name, stats) in &event.hosts {
            run_failed = run_failed || stats.has_failure();
            let host = {
                let name = self.effective_host_name(name);
                self.get_or_create_host(&name, run_id).await?
            };
            let client = Arc::clone(&self.client);
            let patch = HostPatch {
                facts: None,
                changed: Some(stats.changed),
                failed: Some(stats.failed),
                ok: Some(stats.ok),
                skipped: Some(stats.skipped),
                unreachable: Some(stats.unreachable),
            };
            self.run_pool
                .submit(
                    "host counters",
                    Box::pin(async move {
                        client.patch_host(host.id, patch).await.map(|_| ())
                    }),
                )
                .await?;
        }

        // The one and only run pool drain: everything submitted over the
        // run's lifetime completes before the final patch.
        self.run_pool.drain().await;

        let status = if run_failed {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
        let patched = self
            .client
            .patch_run(
                run_id,
                RunPatch {
                    status: Some(status),
                    ended: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        info!(run = patched.id, status = status.as_str(), "run recording finished");
        self.run = Some(patched);
        Ok(())
    }

    /// Drain the task pool, then issue the closing patch. No-op when no
    /// task is open.
    async fn close_task(&mut self) -> RecordResult<()> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        if let Some(mut pool) = self.task_pool.take() {
            pool.drain().await;
        }
        let status = if self.task_failed {
            TaskStatus::Failed
        } else {
            TaskStatus::Completed
        };
        let ended = Utc::now();
        self.client
            .patch_task(
                task.id,
                TaskPatch {
                    status: Some(status),
                    ended: Some(ended),
                },
            )
            .await?;
        if let Some(cached) = self.tasks.get_mut(&task.uuid) {
            cached.status = status;
            cached.ended = Some(ended);
        }
        self.task_failed = false;
        Ok(())
    }

    /// Patch the open play to completed, off the dispatch path. Plays need
    /// no drain of their own.
    async fn close_play(&mut self) -> RecordResult<()> {
        let Some(play) = self.play.take() else {
            return Ok(());
        };
        let client = Arc::clone(&self.client);
        self.run_pool
            .submit(
                "play close",
                Box::pin(async move {
                    client
                        .patch_play(
                            play.id,
                            PlayPatch {
                                status: Some(PlayStatus::Completed),
                                ended: Some(Utc::now()),
                            },
                        )
                        .await
                        .map(|_| ())
                }),
            )
            .await
    }

    /// Apply dynamic run name and label overrides read from play
    /// variables, patching the run only when something changed.
    async fn apply_dynamic_overrides(
        &mut self,
        event: &PlayStartEvent,
        run_id: u64,
    ) -> RecordResult<()> {
        let mut patch = RunPatch::default();

        if let Some(value) = event.variables.get(RUN_NAME_VAR) {
            let name = clamp_field("run name", &render_label(value));
            let current = self.run.as_ref().and_then(|run| run.name.as_deref());
            if current != Some(name.as_str()) {
                patch.name = Some(name);
            }
        }

        let mut labels = self.labels.clone();
        if let Some(value) = event.variables.get(RUN_LABELS_VAR) {
            for label in parse_labels(value)? {
                labels.insert(clamp_field("label", &label));
            }
        }
        if labels != self.labels {
            patch.labels = Some(labels.iter().cloned().collect());
        }

        if patch.name.is_some() || patch.labels.is_some() {
            let patched = self.client.patch_run(run_id, patch).await?;
            self.run = Some(patched);
            self.labels = labels;
        }
        Ok(())
    }

    /// Register one file referenced by a play. Ignored paths skip the
    /// existence check and are registered with placeholder content; other
    /// paths are registered only when they exist.
    async fn register_play_file(&mut self, path: &str) -> RecordResult<()> {
        if !self.sanitizer.is_ignored_file(path)
            && !tokio::fs::try_exists(path).await.unwrap_or(false)
        {
            return Ok(());
        }
        self.get_or_create_file(path).await.map(|_| ())
    }

    async fn get_or_create_file(&mut self, path: &str) -> RecordResult<FileRecord> {
        let run_id = self.require_run("file registration")?;
        let client = Arc::clone(&self.client);
        let sanitizer = self.sanitizer.clone();
        let owned = path.to_string();
        self.files
            .get_or_create(path, move || async move {
                let content = sanitizer.file_content(&owned).await;
                client
                    .create_file(FileCreate {
                        run: run_id,
                        path: owned,
                        content,
                    })
                    .await
            })
            .await
    }

    async fn get_or_create_host(&mut self, name: &str, run_id: u64) -> RecordResult<Host> {
        let clamped = clamp_field("host name", name);
        let client = Arc::clone(&self.client);
        let create = HostCreate {
            run: run_id,
            name: clamped.clone(),
        };
        self.hosts
            .get_or_create(&clamped, move || async move { client.create_host(create).await })
            .await
    }

    fn cache_delegation(&mut self, item: ItemEvent) {
        let Some(target) = item.delegate_to else { return };
        let entry = self
            .delegation
            .entry(normalize_uuid(&item.task_uuid))
            .or_default();
        if !entry.contains(&target) {
            entry.push(target);
        }
    }

    /// Default labels plus `key:value` labels derived from configured
    /// invocation arguments.
    fn initial_labels(&self, arguments: &Value) -> BTreeSet<String> {
        let mut labels: BTreeSet<String> = self
            .config
            .default_labels
            .iter()
            .map(|label| clamp_field("label", label))
            .collect();
        if let Value::Object(map) = arguments {
            for key in &self.config.argument_labels {
                if let Some(value) = map.get(key) {
                    let label = format!("{key}:{}", render_label(value));
                    labels.insert(clamp_field("label", &label));
                }
            }
        }
        labels
    }

    fn effective_host_name(&self, name: &str) -> String {
        if self.config.localhost_as_hostname && matches!(name, "localhost" | "127.0.0.1") {
            if let Some(controller) = &self.controller_hostname {
                return controller.clone();
            }
        }
        name.to_string()
    }

    fn require_run(&self, event: &'static str) -> RecordResult<u64> {
        self.run
            .as_ref()
            .map(|run| run.id)
            .ok_or(RecordError::OutOfScope { event, scope: "run" })
    }
}

/// Resolve a `path:line` source location, falling back to the run's own
/// path at line 1 when the engine could not provide one.
fn parse_location(location: Option<&str>, fallback_path: &str) -> (String, u32) {
    if let Some(location) = location {
        if let Some((path, line)) = location.rsplit_once(':') {
            if let Ok(lineno) = line.parse::<u32>() {
                if !path.is_empty() {
                    return (path.to_string(), lineno);
                }
            }
        }
    }
    (fallback_path.to_string(), 1)
}

/// Whether an action gathers facts, in plain or collection-qualified form.
fn is_fact_gathering(action: &str) -> bool {
    let last = action.rsplit('.').next().unwrap_or(action);
    matches!(last, "setup" | "gather_facts")
}

/// Render a variable value as label text.
fn render_label(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Parse a dynamic label value: a list of scalars or a comma-separated
/// string. Anything else is a caller error.
fn parse_labels(value: &Value) -> RecordResult<Vec<String>> {
    match value {
        Value::Array(items) => Ok(items.iter().map(render_label).collect()),
        Value::String(text) => Ok(text
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect()),
        other => Err(RecordError::InvalidLabels(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn location_parsing_handles_the_happy_path() {
        assert_eq!(
            parse_location(Some("roles/common/tasks/main.yml:27"), "site.yml"),
            ("roles/common/tasks/main.yml".to_string(), 27)
        );
    }

    #[test]
    fn location_parsing_falls_back_to_the_run_path() {
        assert_eq!(parse_location(None, "site.yml"), ("site.yml".to_string(), 1));
        assert_eq!(
            parse_location(Some("no line number"), "site.yml"),
            ("site.yml".to_string(), 1)
        );
    }

    #[test]
    fn fact_gathering_detection_accepts_qualified_actions() {
        assert!(is_fact_gathering("setup"));
        assert!(is_fact_gathering("gather_facts"));
        assert!(is_fact_gathering("builtin.setup"));
        assert!(!is_fact_gathering("command"));
        assert!(!is_fact_gathering("my_setup"));
    }

    #[test]
    fn labels_parse_from_lists_and_strings() {
        let expected: Vec<String> = vec!["dev".to_string(), "deploy".to_string()];
        assert_eq!(parse_labels(&json!(["dev", "deploy"])).unwrap(), expected);
        assert_eq!(parse_labels(&json!("dev, deploy")).unwrap(), expected);
    }

    #[test]
    fn malformed_labels_are_fatal() {
        let err = parse_labels(&json!({"not": "labels"})).unwrap_err();
        assert!(matches!(err, RecordError::InvalidLabels(_)));
    }
}
