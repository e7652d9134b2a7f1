//! Property-based tests for the pending mutation log

use crate::common::{server_tasks, Harness, StubRemote};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tasksync::client::local_db::MemoryStore;
use tasksync::client::offline::MutationKind;
use tasksync::client::OfflineContext;
use tasksync::shared::{LogRetention, TaskDraft, TaskPatch};

#[derive(Debug, Clone)]
enum Op {
    Create(String),
    Update(usize, String),
    Delete(usize),
    Note(usize, String),
}

impl Op {
    fn kind(&self) -> MutationKind {
        match self {
            Op::Create(_) => MutationKind::Create,
            Op::Update(..) => MutationKind::Update,
            Op::Delete(_) => MutationKind::Delete,
            Op::Note(..) => MutationKind::AddNote,
        }
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z ]{1,12}".prop_map(Op::Create),
        (any::<usize>(), prop::sample::select(vec!["pending", "in_progress", "done"]))
            .prop_map(|(i, s)| Op::Update(i, s.to_string())),
        any::<usize>().prop_map(Op::Delete),
        (any::<usize>(), "[a-z]{1,8}").prop_map(|(i, c)| Op::Note(i, c)),
    ]
}

/// Target chosen by `apply` for index `i`; `None` means an uncached id
fn pick(ids: &[String], i: usize) -> Option<String> {
    ids.get(i % (ids.len() + 1)).cloned()
}

/// Apply `ops` and return the ids created, in order
fn apply(context: &OfflineContext, ops: &[Op]) -> Vec<String> {
    let log = context.log();
    let mut ids: Vec<String> = Vec::new();
    // Unknown targets exercise the uncached path.
    let target = |ids: &[String], i: usize| pick(ids, i).unwrap_or_else(|| "srv-404".to_string());

    for op in ops {
        match op {
            Op::Create(title) => ids.push(log.record_create(TaskDraft::new(title.clone()))),
            Op::Update(i, status) => {
                log.record_update(&target(&ids, *i), TaskPatch::status(status.clone()));
            }
            Op::Delete(i) => {
                log.record_delete(&target(&ids, *i));
            }
            Op::Note(i, content) => {
                log.record_note_append(&target(&ids, *i), content.clone());
            }
        }
    }
    ids
}

proptest! {
    #[test]
    fn test_records_come_back_in_append_order(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let harness = Harness::new(false, StubRemote::default());
        apply(&harness.context, &ops);

        let kinds: Vec<MutationKind> = harness.context.log().records().into_iter().map(|r| r.kind).collect();
        let expected: Vec<MutationKind> = ops.iter().map(Op::kind).collect();
        prop_assert_eq!(kinds, expected);
    }

    #[test]
    fn test_cache_reflects_latest_mutation(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let harness = Harness::new(false, StubRemote::default());
        let ids = apply(&harness.context, &ops);

        let mut expected_status: HashMap<String, Option<String>> = HashMap::new();
        let mut seen: Vec<String> = Vec::new();
        let mut created = ids.iter();
        for op in &ops {
            match op {
                Op::Create(_) => {
                    let id = created.next().unwrap().clone();
                    expected_status.insert(id.clone(), Some("pending".to_string()));
                    seen.push(id);
                }
                Op::Update(i, status) => {
                    if let Some(id) = pick(&seen, *i) {
                        if let Some(entry) = expected_status.get_mut(&id) {
                            if entry.is_some() {
                                *entry = Some(status.clone());
                            }
                        }
                    }
                }
                Op::Delete(i) => {
                    if let Some(id) = pick(&seen, *i) {
                        expected_status.insert(id, None);
                    }
                }
                Op::Note(..) => {}
            }
        }

        for (id, status) in expected_status {
            prop_assert_eq!(harness.context.cache().get(&id).map(|t| t.status), status);
        }
    }

    #[test]
    fn test_sync_never_increases_pending(
        ops in prop::collection::vec(op_strategy(), 0..30),
        remote_count in 0usize..5,
        discard in any::<bool>(),
    ) {
        let retention = if discard { LogRetention::DiscardOnSync } else { LogRetention::Retain };
        let harness = Harness::with_store(
            false,
            StubRemote::new(server_tasks(remote_count)),
            Arc::new(MemoryStore::new()),
            retention,
        );
        apply(&harness.context, &ops);
        let before = harness.context.summary().pending_actions;

        harness.go_online();
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let report = runtime.block_on(harness.context.sync()).unwrap();

        let after = harness.context.summary().pending_actions;
        prop_assert!(after <= before);
        prop_assert_eq!(report.synced_entities, remote_count);
        prop_assert_eq!(harness.context.cache().len(), remote_count);
    }
}
