//! # Pending Mutation Log
//!
//! Ordered, append-only record of user actions taken against the local
//! cache that the authoritative store has not confirmed yet.
//!
//! ## Behaviour
//!
//! - **Optimistic**: every `record_*` call applies its change to the
//!   `LocalEntityCache` first, so the UI sees it without waiting on the
//!   network.
//! - **One unit**: the cache edit and the log append happen under the same
//!   lock. Storage failures are logged and never block the caller.
//! - **FIFO**: records are read back in the order they were appended.
//! - **Persistent**: the log is stored under `pending_mutations` and
//!   survives restarts.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tasksync::client::offline::PendingMutationLog;
//! use tasksync::shared::{TaskDraft, TaskPatch};
//!
//! # fn example(log: &PendingMutationLog) {
//! let id = log.record_create(TaskDraft::new("Check pump"));
//! log.record_update(&id, TaskPatch::status("in_progress"));
//! log.record_note_append(&id, "Pressure looks low");
//! assert_eq!(log.len(), 3);
//! # }
//! ```

use crate::client::auth::AuthProvider;
use crate::client::local_db::{KeyValueStore, LocalEntityCache, StorageError, PENDING_MUTATIONS_KEY};
use crate::client::offline::local_id::mint_local_id;
use crate::shared::{TaskDraft, TaskNote, TaskPatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Kind of user action a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    AddNote,
}

/// One offline-originated operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub kind: MutationKind,
    /// Task the operation applies to; the minted local id for `Create`
    pub target_id: String,
    /// Task snapshot for `Create`, patch for `Update`, note for `AddNote`
    #[serde(default)]
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl MutationRecord {
    fn new(kind: MutationKind, target_id: impl Into<String>, payload: Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            target_id: target_id.into(),
            payload,
            timestamp,
        }
    }
}

/// Append-only log of optimistic mutations
#[derive(Debug)]
pub struct PendingMutationLog {
    store: Arc<dyn KeyValueStore>,
    cache: Arc<LocalEntityCache>,
    auth: Arc<dyn AuthProvider>,
    records: Mutex<VecDeque<MutationRecord>>,
}

impl PendingMutationLog {
    /// Create a log over `store`, loading any records it already holds
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        cache: Arc<LocalEntityCache>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let records = load_records(store.as_ref());
        if !records.is_empty() {
            tracing::info!(pending = records.len(), "restored pending mutations");
        }
        Self {
            store,
            cache,
            auth,
            records: Mutex::new(records),
        }
    }

    /// Create a task under a fresh local-origin id and return the id
    pub fn record_create(&self, draft: TaskDraft) -> String {
        let mut records = self.lock();
        let now = Utc::now();
        let id = mint_local_id();
        let task = draft.into_task(id.clone(), now);
        let payload = to_payload(&task);

        self.cache.upsert_local(task);
        records.push_back(MutationRecord::new(MutationKind::Create, id.clone(), payload, now));
        self.persist(&records);

        tracing::debug!(task_id = %id, pending = records.len(), "recorded create");
        id
    }

    /// Merge `patch` into the cached task
    ///
    /// The record is appended even if the task is not cached. Returns
    /// whether the cache held the task.
    pub fn record_update(&self, target_id: &str, patch: TaskPatch) -> bool {
        let mut records = self.lock();
        let now = Utc::now();
        let applied = self.cache.update_local(target_id, |task| patch.apply_to(task, now));
        if !applied {
            tracing::debug!(task_id = %target_id, "update for uncached task, recording only");
        }

        records.push_back(MutationRecord::new(
            MutationKind::Update,
            target_id,
            to_payload(&patch),
            now,
        ));
        self.persist(&records);
        applied
    }

    /// Remove the cached task; returns whether it was cached
    ///
    /// Earlier records for the task are kept.
    pub fn record_delete(&self, target_id: &str) -> bool {
        let mut records = self.lock();
        let now = Utc::now();
        let removed = self.cache.remove_local(target_id);

        records.push_back(MutationRecord::new(MutationKind::Delete, target_id, Value::Null, now));
        self.persist(&records);
        removed
    }

    /// Append a note authored by the current user to the cached task
    pub fn record_note_append(&self, target_id: &str, content: impl Into<String>) -> TaskNote {
        let mut records = self.lock();
        let now = Utc::now();
        let author = self.auth.current_user();
        let note = TaskNote {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            author_id: author.as_ref().map(|user| user.id.clone()),
            author_name: author.map(|user| user.username),
            created_at: now,
        };

        let attached = self.cache.update_local(target_id, |task| {
            task.notes.push(note.clone());
            task.updated_at = now;
        });
        if !attached {
            tracing::debug!(task_id = %target_id, "note for uncached task, recording only");
        }

        records.push_back(MutationRecord::new(
            MutationKind::AddNote,
            target_id,
            to_payload(&note),
            now,
        ));
        self.persist(&records);
        note
    }

    /// Number of pending records
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all records, oldest first
    pub fn records(&self) -> Vec<MutationRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Records that reference `target_id`, oldest first
    pub fn records_for(&self, target_id: &str) -> Vec<MutationRecord> {
        self.lock()
            .iter()
            .filter(|record| record.target_id == target_id)
            .cloned()
            .collect()
    }

    /// Drop the `count` oldest records; returns how many were dropped
    pub fn retire_front(&self, count: usize) -> usize {
        let mut records = self.lock();
        let count = count.min(records.len());
        if count > 0 {
            records.drain(..count);
            self.persist(&records);
        }
        count
    }

    /// Drop every record
    pub fn clear(&self) {
        let mut records = self.lock();
        records.clear();
        if let Err(e) = self.store.remove_item(PENDING_MUTATIONS_KEY) {
            tracing::warn!(error = %e, "failed to clear persisted mutation log");
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<MutationRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, records: &VecDeque<MutationRecord>) {
        let json = match serde_json::to_string(records) {
            Ok(json) => json,
            Err(e) => {
                let error = StorageError::Serialization {
                    key: PENDING_MUTATIONS_KEY.to_string(),
                    message: e.to_string(),
                };
                tracing::error!(error = %error, "mutation log write failed, keeping in-memory log");
                return;
            }
        };
        if let Err(e) = self.store.set_item(PENDING_MUTATIONS_KEY, json) {
            tracing::error!(error = %e, "mutation log write failed, keeping in-memory log");
        }
    }
}

fn to_payload<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "mutation payload is not representable as JSON");
        Value::Null
    })
}

fn load_records(store: &dyn KeyValueStore) -> VecDeque<MutationRecord> {
    let Some(raw) = store.get_item(PENDING_MUTATIONS_KEY) else {
        return VecDeque::new();
    };
    match serde_json::from_str(&raw) {
        Ok(records) => records,
        Err(e) => {
            let error = StorageError::corrupt(PENDING_MUTATIONS_KEY, e);
            tracing::error!(error = %error, "pending mutation log is unreadable, starting empty");
            VecDeque::new()
        }
    }
}
