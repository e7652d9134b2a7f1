//! Behavioural guarantees of the sync engine

use crate::common::{server_tasks, Harness, StubRemote};
use std::sync::Arc;
use tasksync::client::local_db::{KeyValueStore, MemoryStore, TASKS_KEY};
use tasksync::client::offline::{is_local_id, MutationKind};
use tasksync::client::sync::SyncError;
use tasksync::shared::{LogRetention, TaskDraft, TaskPatch};

#[tokio::test]
async fn test_successful_sync_never_grows_pending_count() {
    for retention in [LogRetention::Retain, LogRetention::DiscardOnSync] {
        let harness = Harness::with_store(
            false,
            StubRemote::new(server_tasks(2)),
            Arc::new(MemoryStore::new()),
            retention,
        );
        let log = harness.context.log();
        let id = log.record_create(TaskDraft::new("a"));
        log.record_update(&id, TaskPatch::title("b"));
        log.record_note_append(&id, "c");
        let before = harness.context.summary().pending_actions;

        harness.go_online();
        let report = assert_ok!(harness.context.sync().await);

        let after = harness.context.summary().pending_actions;
        assert!(after <= before, "{:?}: {} > {}", retention, after, before);
        assert_eq!(report.remaining_pending_mutations, after);
    }
}

#[tokio::test]
async fn test_discard_policy_empties_log() {
    let harness = Harness::with_store(
        true,
        StubRemote::default(),
        Arc::new(MemoryStore::new()),
        LogRetention::DiscardOnSync,
    );
    harness.context.log().record_create(TaskDraft::new("a"));

    let report = assert_ok!(harness.context.sync().await);
    assert_eq!(report.remaining_pending_mutations, 0);
    assert_eq!(harness.context.summary().pending_actions, 0);
}

#[tokio::test]
async fn test_corrupt_collection_reads_as_empty() {
    let store = Arc::new(MemoryStore::with_entries([(TASKS_KEY, "{not json")]));
    let harness = Harness::with_store(false, StubRemote::default(), store, LogRetention::Retain);

    assert!(harness.context.cache().get_all().is_empty());
    assert_eq!(harness.context.summary().local_entities, 0);

    // The cache stays usable and overwrites the bad payload.
    let id = harness.context.log().record_create(TaskDraft::new("a"));
    assert_eq!(harness.context.cache().get_all().len(), 1);
    assert!(harness.store.get_item(TASKS_KEY).unwrap().contains(&id));
}

#[tokio::test]
async fn test_second_sync_while_first_in_flight_is_rejected() {
    let (remote, gate) = StubRemote::gated(server_tasks(3));
    let harness = Harness::new(true, remote);
    let coordinator = harness.context.coordinator().clone();

    let first = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.sync().await }
    });
    gate.entered().await;
    assert!(coordinator.is_syncing());
    assert!(harness.context.summary().sync_in_progress);

    assert_eq!(coordinator.sync().await, Err(SyncError::SyncInProgress));
    assert!(coordinator.is_syncing());

    gate.release();
    let report = assert_ok!(first.await.unwrap());
    assert_eq!(report.synced_entities, 3);
    assert_eq!(harness.remote.calls(), 1);
    assert!(!coordinator.is_syncing());
    assert_eq!(coordinator.metrics().rejected_syncs, 1);
}

#[tokio::test]
async fn test_cancelled_sync_releases_in_flight_flag() {
    let (remote, gate) = StubRemote::gated(server_tasks(1));
    let harness = Harness::new(true, remote);
    let coordinator = harness.context.coordinator().clone();

    let first = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.sync().await }
    });
    gate.entered().await;
    first.abort();
    let _ = first.await;

    assert!(!coordinator.is_syncing());
    assert!(harness.context.coordinator().last_sync().is_none());

    let metrics = coordinator.metrics();
    assert_eq!(metrics.total_syncs, 1);
    assert_eq!(metrics.cancelled_syncs, 1);
    assert_eq!(metrics.failed_syncs, 0);
    assert_eq!(metrics.in_flight(), 0);
}

#[tokio::test]
async fn test_offline_sync_makes_no_request() {
    let harness = Harness::new(false, StubRemote::new(server_tasks(3)));
    harness.context.log().record_create(TaskDraft::new("a"));

    for _ in 0..3 {
        assert_eq!(harness.context.sync().await, Err(SyncError::ConnectivityUnavailable));
    }

    assert_eq!(harness.remote.calls(), 0);
    assert_eq!(harness.context.cache().len(), 1);
    assert!(harness.context.summary().last_sync.is_none());
}

#[tokio::test]
async fn test_optimistic_create_adds_one_record() {
    let harness = Harness::new(false, StubRemote::default());
    let before = harness.context.cache().get_all().len();

    let id = harness.context.log().record_create(TaskDraft::new("Check pump"));

    assert!(is_local_id(&id));
    assert_eq!(harness.context.cache().get_all().len(), before + 1);
    let records = harness.context.log().records_for(&id);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, MutationKind::Create);
}

#[tokio::test]
async fn test_clear_offline_data_resets_summary() {
    let harness = Harness::new(true, StubRemote::new(server_tasks(2)));
    assert_ok!(harness.context.sync().await);
    harness.context.log().record_create(TaskDraft::new("a"));

    harness.context.clear_offline_data();

    let summary = harness.context.summary();
    assert_eq!(summary.pending_actions, 0);
    assert_eq!(summary.local_entities, 0);
    assert!(summary.last_sync.is_none());
    assert!(harness.store.get_item(TASKS_KEY).is_none());
}
