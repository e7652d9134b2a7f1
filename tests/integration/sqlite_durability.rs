//! Offline state survives a restart on SQLite storage

use crate::common::{server_tasks, test_config, StubRemote};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tasksync::client::auth::SessionAuth;
use tasksync::client::local_db::SqliteStore;
use tasksync::client::offline::MutationKind;
use tasksync::client::sync::ConnectivityMonitor;
use tasksync::client::OfflineContext;
use tasksync::shared::{LogRetention, TaskDraft, TaskPatch};
use tempfile::TempDir;

async fn open_context(dir: &TempDir, remote: StubRemote, online: bool) -> OfflineContext {
    let store = SqliteStore::open(dir.path().join("offline.db"), "tasksync")
        .await
        .expect("failed to open sqlite store");
    OfflineContext::builder(test_config(LogRetention::Retain))
        .sqlite(Arc::new(store))
        .remote(Arc::new(remote))
        .auth(Arc::new(SessionAuth::new()))
        .connectivity(Arc::new(ConnectivityMonitor::new(online)))
        .build()
        .expect("failed to build offline context")
}

#[tokio::test]
async fn test_pending_log_and_cache_survive_restart() {
    let dir = TempDir::new().unwrap();

    let first = open_context(&dir, StubRemote::default(), false).await;
    let id = first.log().record_create(TaskDraft::new("Check pump"));
    first.log().record_update(&id, TaskPatch::status("done"));
    first.dispose().await;
    drop(first);

    let second = open_context(&dir, StubRemote::default(), false).await;
    let kinds: Vec<MutationKind> = second.log().records().into_iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![MutationKind::Create, MutationKind::Update]);
    assert_eq!(second.cache().get(&id).map(|t| t.status), Some("done".to_string()));
    assert_eq!(second.summary().pending_actions, 2);
    second.dispose().await;
}

#[tokio::test]
async fn test_last_sync_survives_restart() {
    let dir = TempDir::new().unwrap();

    let first = open_context(&dir, StubRemote::new(server_tasks(3)), true).await;
    let report = assert_ok!(first.sync().await);
    first.dispose().await;
    drop(first);

    let second = open_context(&dir, StubRemote::default(), false).await;
    let summary = second.summary();
    assert_eq!(summary.local_entities, 3);
    assert_eq!(
        summary.last_sync.map(|at| at.timestamp_millis()),
        Some(report.completed_at.timestamp_millis())
    );
    second.dispose().await;
}

#[tokio::test]
async fn test_clear_offline_data_is_durable() {
    let dir = TempDir::new().unwrap();

    let first = open_context(&dir, StubRemote::new(server_tasks(2)), true).await;
    assert_ok!(first.sync().await);
    first.log().record_create(TaskDraft::new("a"));
    first.clear_offline_data();
    first.dispose().await;
    drop(first);

    let second = open_context(&dir, StubRemote::default(), false).await;
    let summary = second.summary();
    assert_eq!(summary.pending_actions, 0);
    assert_eq!(summary.local_entities, 0);
    assert!(summary.last_sync.is_none());
    second.dispose().await;
}
