//! Integration tests for the HTTP record client against a mock server.

use chrono::Utc;
use mockito::{Matcher, Server};
use serde_json::json;

use runscribe::domain::models::{ApiConfig, RunStatus};
use runscribe::domain::ports::{RecordClient, RunCreate, RunPatch};
use runscribe::infrastructure::http::HttpRecordClient;
use runscribe::RecordError;

fn run_body() -> String {
    json!({
        "id": 7,
        "path": "site.yml",
        "status": "running",
        "started": "2026-08-06T12:00:00Z",
        "arguments": {},
        "labels": ["nightly"]
    })
    .to_string()
}

fn create_request() -> RunCreate {
    RunCreate {
        path: "site.yml".to_string(),
        status: RunStatus::Running,
        started: Utc::now(),
        arguments: json!({}),
        labels: vec!["nightly".to_string()],
        client_version: "0.1.0".to_string(),
        engine_version: None,
        controller: None,
        user: None,
    }
}

#[tokio::test]
async fn create_run_decodes_the_stored_representation() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/runs")
        .match_header("content-type", "application/json")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(run_body())
        .create_async()
        .await;

    let api = ApiConfig {
        endpoint: server.url(),
        ..Default::default()
    };
    let client = HttpRecordClient::new(&api).expect("client setup");

    let run = client.create_run(create_request()).await.expect("create");
    assert_eq!(run.id, 7);
    assert_eq!(run.path, "site.yml");
    assert_eq!(run.status, RunStatus::Running);
    assert!(run.labels.contains("nightly"));

    mock.assert_async().await;
}

#[tokio::test]
async fn token_auth_sends_a_bearer_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/runs")
        .match_header("authorization", "Bearer test-token")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(run_body())
        .create_async()
        .await;

    let api = ApiConfig {
        endpoint: server.url(),
        token: Some("test-token".to_string()),
        ..Default::default()
    };
    let client = HttpRecordClient::new(&api).expect("client setup");
    client.create_run(create_request()).await.expect("create");

    mock.assert_async().await;
}

#[tokio::test]
async fn basic_auth_is_used_without_a_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/runs")
        .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(run_body())
        .create_async()
        .await;

    let api = ApiConfig {
        endpoint: server.url(),
        username: Some("recorder".to_string()),
        password: Some("secret".to_string()),
        ..Default::default()
    };
    let client = HttpRecordClient::new(&api).expect("client setup");
    client.create_run(create_request()).await.expect("create");

    mock.assert_async().await;
}

#[tokio::test]
async fn non_success_statuses_surface_as_api_errors() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("PATCH", "/api/v1/runs/7")
        .with_status(502)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let api = ApiConfig {
        endpoint: server.url(),
        ..Default::default()
    };
    let client = HttpRecordClient::new(&api).expect("client setup");

    let err = client
        .patch_run(7, RunPatch::default())
        .await
        .expect_err("502 should fail");
    match err {
        RecordError::Api { status, detail } => {
            assert_eq!(status, 502);
            assert!(detail.contains("upstream unavailable"));
        }
        other => panic!("expected an API error, got {other}"),
    }
}

#[tokio::test]
async fn connection_failures_surface_as_http_errors() {
    let api = ApiConfig {
        // Discard port: nothing listens here.
        endpoint: "http://127.0.0.1:9".to_string(),
        timeout_secs: 1,
        ..Default::default()
    };
    let client = HttpRecordClient::new(&api).expect("client setup");

    let err = client
        .patch_run(1, RunPatch::default())
        .await
        .expect_err("connect should fail");
    assert!(matches!(err, RecordError::Http(_)));
}
