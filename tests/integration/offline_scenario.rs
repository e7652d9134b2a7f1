//! A field worker's offline session, start to finish

use crate::common::{server_tasks, Harness, StubRemote};
use pretty_assertions::assert_eq;
use tasksync::client::offline::{is_local_id, MutationKind, LOCAL_ID_PREFIX};
use tasksync::client::sync::SyncError;
use tasksync::shared::{TaskDraft, TaskPatch};

#[tokio::test]
async fn test_create_offline_then_sync_when_back_online() {
    let harness = Harness::new(true, StubRemote::new(server_tasks(3)));
    let context = &harness.context;

    let id = context.log().record_create(TaskDraft::new("Check pump"));
    assert!(id.starts_with(LOCAL_ID_PREFIX));
    assert_eq!(context.cache().get_all().len(), 1);
    assert_eq!(context.summary().pending_actions, 1);

    harness.go_offline();
    assert_err!(context.sync().await, SyncError::ConnectivityUnavailable);
    assert_eq!(harness.remote.calls(), 0);

    harness.go_online();
    let report = assert_ok!(context.sync().await);
    assert_eq!(report.synced_entities, 3);
    assert_eq!(harness.remote.calls(), 1);

    let summary = context.summary();
    assert_recent!(summary.last_sync, 5);
    assert!(summary.is_online);
    assert!(!summary.sync_in_progress);
    assert_eq!(summary.local_entities, 3);
}

#[tokio::test]
async fn test_offline_edits_are_visible_immediately() {
    let harness = Harness::new(false, StubRemote::default());
    let log = harness.context.log();

    let id = log.record_create(TaskDraft::new("Check pump").with_priority("high"));
    log.record_update(&id, TaskPatch::status("in_progress"));
    let note = log.record_note_append(&id, "Pressure looks low");

    let task = harness.context.cache().get(&id).unwrap();
    assert_eq!(task.status, "in_progress");
    assert_eq!(task.priority.as_deref(), Some("high"));
    assert_eq!(task.notes, vec![note]);
    assert_eq!(task.notes[0].author_name.as_deref(), Some("dana"));

    log.record_delete(&id);
    assert!(harness.context.cache().get(&id).is_none());

    let kinds: Vec<MutationKind> = log.records().into_iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            MutationKind::Create,
            MutationKind::Update,
            MutationKind::AddNote,
            MutationKind::Delete
        ]
    );
    assert_eq!(harness.context.summary().pending_actions, 4);
}

#[tokio::test]
async fn test_failed_sync_leaves_staleness_visible() {
    let harness = Harness::new(true, StubRemote::failing(503));
    let context = &harness.context;
    context.log().record_create(TaskDraft::new("Check pump"));

    let err = context.sync().await.unwrap_err();
    assert_contains!(err.to_string(), "503");

    let summary = context.summary();
    assert!(summary.last_sync.is_none());
    assert_eq!(summary.pending_actions, 1);
    assert_eq!(summary.local_entities, 1);
    assert!(!summary.sync_in_progress);

    harness.remote.fail_with(None);
    harness.remote.set_tasks(server_tasks(2));
    assert_ok!(context.sync().await);
    assert_recent!(context.summary().last_sync, 5);
}

#[tokio::test]
async fn test_server_snapshot_links_offline_ids() {
    let harness = Harness::new(true, StubRemote::default());
    let context = &harness.context;
    let local_id = context.log().record_create(TaskDraft::new("Check pump"));
    assert!(is_local_id(&local_id));

    let mut echoed = server_tasks(1).remove(0);
    echoed.local_ref = Some(local_id.clone());
    harness.remote.set_tasks(vec![echoed]);

    assert_ok!(context.sync().await);
    assert_eq!(context.coordinator().resolve_id(&local_id), "srv-1");
    assert!(context.cache().contains("srv-1"));
    assert!(!context.cache().contains(&local_id));
}
