//! HTTP remote against a mock task API

use assert_matches::assert_matches;
use serde_json::json;
use std::sync::Arc;
use tasksync::client::auth::{SessionAuth, UserInfo};
use tasksync::client::remote::{HttpRemote, RemoteError, RemoteSource};
use tasksync::client::sync::{ConnectivityMonitor, SyncError};
use tasksync::client::OfflineContext;
use tasksync::shared::SyncConfig;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> SyncConfig {
    SyncConfig::builder()
        .server_url(server.uri())
        .build()
        .expect("mock server url is valid")
}

fn signed_in() -> Arc<SessionAuth> {
    Arc::new(SessionAuth::signed_in("test-token", UserInfo::new("u1", "dana")))
}

#[tokio::test]
async fn test_fetch_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "title": "Inspect valve", "status": "pending" },
            { "id": 2, "title": "Replace filter", "status": "done" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let remote = HttpRemote::new(&config_for(&server), signed_in());
    let tasks = assert_ok!(remote.fetch_tasks().await);

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, "1");
    assert_eq!(tasks[1].status, "done");
}

#[tokio::test]
async fn test_fetch_accepts_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tasks": [{ "id": "srv-9", "title": "Read meter" }],
            "total": 1
        })))
        .mount(&server)
        .await;

    let remote = HttpRemote::new(&config_for(&server), signed_in());
    let tasks = assert_ok!(remote.fetch_tasks().await);
    assert_eq!(tasks[0].id, "srv-9");
}

#[tokio::test]
async fn test_fetch_tolerates_null_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 5,
            "title": "Flush line",
            "status": null,
            "notes": null,
            "created_at": null,
            "updated_at": "2026-10-01T08:00:00Z"
        }])))
        .mount(&server)
        .await;

    let remote = HttpRemote::new(&config_for(&server), signed_in());
    let tasks = assert_ok!(remote.fetch_tasks().await);

    assert_eq!(tasks[0].status, "pending");
    assert!(tasks[0].notes.is_empty());
    assert_eq!(tasks[0].updated_at.to_rfc3339(), "2026-10-01T08:00:00+00:00");
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;

    let remote = HttpRemote::new(&config_for(&server), signed_in());
    assert_matches!(
        remote.fetch_tasks().await,
        Err(RemoteError::Status { status: 401, body }) if body == "token expired"
    );
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let remote = HttpRemote::new(&config_for(&server), signed_in());
    assert_matches!(remote.fetch_tasks().await, Err(RemoteError::Decode(_)));
}

#[tokio::test]
async fn test_anonymous_session_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let remote = HttpRemote::new(&config_for(&server), Arc::new(SessionAuth::new()));
    assert_matches!(remote.fetch_tasks().await, Err(RemoteError::NotAuthenticated));
}

#[tokio::test]
async fn test_context_sync_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "title": "a" },
            { "id": 2, "title": "b" },
            { "id": 3, "title": "c" }
        ])))
        .mount(&server)
        .await;

    let context = OfflineContext::builder(config_for(&server))
        .auth(signed_in())
        .connectivity(Arc::new(ConnectivityMonitor::new(true)))
        .build()
        .unwrap();

    let report = assert_ok!(context.sync().await);
    assert_eq!(report.synced_entities, 3);
    assert_eq!(context.cache().len(), 3);
}

#[tokio::test]
async fn test_unreachable_server_is_remote_failure() {
    let server = MockServer::start().await;
    let config = config_for(&server);
    drop(server);

    let context = OfflineContext::builder(config).auth(signed_in()).build().unwrap();

    assert_matches!(context.sync().await, Err(SyncError::RemoteRequestFailed { .. }));
    assert!(!context.coordinator().is_syncing());
}
