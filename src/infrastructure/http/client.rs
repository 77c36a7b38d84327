//! HTTP implementation of the record client port.
//!
//! Wraps the record service's REST API, providing typed methods for the
//! collections the dispatcher writes to. Creates are idempotent upserts on
//! the server side, so retried or duplicated creates converge on the same
//! record. The client enforces the configured per-call timeout and makes
//! no retries of its own.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::domain::errors::{RecordError, RecordResult};
use crate::domain::models::{ApiConfig, FileRecord, Host, Play, Run, Task, TaskResult};
use crate::domain::ports::{
    FileCreate, HostCreate, HostPatch, PlayCreate, PlayPatch, RecordClient, ResultCreate,
    RunCreate, RunPatch, TaskCreate, TaskPatch,
};

/// API prefix shared by every collection.
const API_PREFIX: &str = "/api/v1";

/// HTTP client for the record service.
#[derive(Debug, Clone)]
pub struct HttpRecordClient {
    http: Client,
    endpoint: String,
    token: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl HttpRecordClient {
    /// Build a client from API connection parameters.
    pub fn new(api: &ApiConfig) -> RecordResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .map_err(|err| RecordError::Config(format!("HTTP client setup failed: {err}")))?;
        Ok(Self {
            http,
            endpoint: api.endpoint.trim_end_matches('/').to_string(),
            token: api.token.clone(),
            username: api.username.clone(),
            password: api.password.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}{}", self.endpoint, API_PREFIX, path);
        let mut request = self.http.request(method, url);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        } else if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }
        request
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> RecordResult<T> {
        let response = self.request(method, path).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RecordError::Api {
                status: status.as_u16(),
                detail: truncate_detail(&detail),
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Err(RecordError::Http(format!(
                "expected a representation from {path}, got 204"
            )));
        }
        Ok(response.json::<T>().await?)
    }

    async fn create<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> RecordResult<T> {
        self.send(Method::POST, path, body).await
    }

    async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> RecordResult<T> {
        self.send(Method::PATCH, path, body).await
    }
}

/// Keep error details log-sized.
fn truncate_detail(detail: &str) -> String {
    const LIMIT: usize = 512;
    if detail.chars().count() <= LIMIT {
        detail.to_string()
    } else {
        detail.chars().take(LIMIT).collect()
    }
}

#[async_trait]
impl RecordClient for HttpRecordClient {
    async fn create_run(&self, run: RunCreate) -> RecordResult<Run> {
        self.create("/runs", &run).await
    }

    async fn patch_run(&self, id: u64, patch: RunPatch) -> RecordResult<Run> {
        self.patch(&format!("/runs/{id}"), &patch).await
    }

    async fn create_play(&self, play: PlayCreate) -> RecordResult<Play> {
        self.create("/plays", &play).await
    }

    async fn patch_play(&self, id: u64, patch: PlayPatch) -> RecordResult<Play> {
        self.patch(&format!("/plays/{id}"), &patch).await
    }

    async fn create_task(&self, task: TaskCreate) -> RecordResult<Task> {
        self.create("/tasks", &task).await
    }

    async fn patch_task(&self, id: u64, patch: TaskPatch) -> RecordResult<Task> {
        self.patch(&format!("/tasks/{id}"), &patch).await
    }

    async fn create_file(&self, file: FileCreate) -> RecordResult<FileRecord> {
        self.create("/files", &file).await
    }

    async fn create_host(&self, host: HostCreate) -> RecordResult<Host> {
        self.create("/hosts", &host).await
    }

    async fn patch_host(&self, id: u64, patch: HostPatch) -> RecordResult<Host> {
        self.patch(&format!("/hosts/{id}"), &patch).await
    }

    async fn create_result(&self, result: ResultCreate) -> RecordResult<TaskResult> {
        self.create("/results", &result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trailing_slash_is_normalized() {
        let api = ApiConfig {
            endpoint: "http://records.example.com/".to_string(),
            ..Default::default()
        };
        let client = HttpRecordClient::new(&api).unwrap();
        assert_eq!(client.endpoint, "http://records.example.com");
    }

    #[test]
    fn detail_truncation_keeps_errors_log_sized() {
        let long = "x".repeat(2000);
        assert_eq!(truncate_detail(&long).len(), 512);
        assert_eq!(truncate_detail("short"), "short");
    }
}
