//! # Local Entity Cache
//!
//! Last known task collection plus the last-sync stamp, kept in memory and
//! persisted through a `KeyValueStore`.
//!
//! ## Failure semantics
//!
//! - A persisted collection that cannot be parsed is logged and treated as
//!   empty. Reading the cache never fails.
//! - A write that cannot be persisted is logged and swallowed. The change
//!   has already been applied in memory and stays visible for the session.
//!
//! All operations are synchronous and never suspend.

use super::{KeyValueStore, StorageError, LAST_SYNC_KEY, TASKS_KEY};
use crate::shared::Task;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct CacheState {
    tasks: Vec<Task>,
    last_sync: Option<DateTime<Utc>>,
}

/// Durable cache of the task collection
#[derive(Debug)]
pub struct LocalEntityCache {
    store: Arc<dyn KeyValueStore>,
    state: Mutex<CacheState>,
}

impl LocalEntityCache {
    /// Create a cache over `store`, loading whatever it already holds
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let state = load_state(store.as_ref());
        tracing::debug!(tasks = state.tasks.len(), last_sync = ?state.last_sync, "entity cache loaded");
        Self {
            store,
            state: Mutex::new(state),
        }
    }

    /// Replace the whole collection and stamp the last-sync time to now
    ///
    /// Entries sharing an id collapse into one, keeping the later value.
    pub fn save_all(&self, tasks: Vec<Task>) -> DateTime<Utc> {
        let now = Utc::now();
        let mut state = self.lock();
        state.tasks = dedupe_by_id(tasks);
        state.last_sync = Some(now);
        self.persist_tasks(&state.tasks);
        self.persist(LAST_SYNC_KEY, now.to_rfc3339());
        now
    }

    /// Stored collection; empty when nothing usable was persisted
    pub fn get_all(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    /// Look up a task by id
    pub fn get(&self, id: &str) -> Option<Task> {
        self.lock().tasks.iter().find(|task| task.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().tasks.iter().any(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert `task`, replacing any entry with the same id in place
    pub fn upsert_local(&self, task: Task) {
        let mut state = self.lock();
        match state.tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(existing) => *existing = task,
            None => state.tasks.push(task),
        }
        self.persist_tasks(&state.tasks);
    }

    /// Apply `edit` to the task with `id`
    ///
    /// Returns `false` and writes nothing when no such task is cached.
    pub fn update_local(&self, id: &str, edit: impl FnOnce(&mut Task)) -> bool {
        let mut state = self.lock();
        let Some(task) = state.tasks.iter_mut().find(|task| task.id == id) else {
            return false;
        };
        edit(task);
        self.persist_tasks(&state.tasks);
        true
    }

    /// Remove the task with `id`; returns whether one was removed
    pub fn remove_local(&self, id: &str) -> bool {
        let mut state = self.lock();
        let before = state.tasks.len();
        state.tasks.retain(|task| task.id != id);
        let removed = state.tasks.len() != before;
        if removed {
            self.persist_tasks(&state.tasks);
        }
        removed
    }

    /// Time of the last successful `save_all`
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.lock().last_sync
    }

    /// Drop every task and the last-sync stamp, in memory and in storage
    pub fn clear(&self) {
        let mut state = self.lock();
        *state = CacheState::default();
        for key in [TASKS_KEY, LAST_SYNC_KEY] {
            if let Err(e) = self.store.remove_item(key) {
                tracing::warn!(key, error = %e, "failed to clear cached value");
            }
        }
    }

    /// Backing store, shared with the other persisted offline state
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Re-read the persisted payload, discarding the in-memory view
    pub fn reload(&self) {
        let loaded = load_state(self.store.as_ref());
        *self.lock() = loaded;
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist_tasks(&self, tasks: &[Task]) {
        match serde_json::to_string(tasks) {
            Ok(json) => self.persist(TASKS_KEY, json),
            Err(e) => {
                let error = StorageError::Serialization {
                    key: TASKS_KEY.to_string(),
                    message: e.to_string(),
                };
                tracing::error!(error = %error, "cache write failed, keeping in-memory state");
            }
        }
    }

    fn persist(&self, key: &str, value: String) {
        if let Err(e) = self.store.set_item(key, value) {
            tracing::error!(key, error = %e, "cache write failed, keeping in-memory state");
        }
    }
}

fn load_state(store: &dyn KeyValueStore) -> CacheState {
    let tasks = match store.get_item(TASKS_KEY) {
        None => Vec::new(),
        Some(raw) => match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => dedupe_by_id(tasks),
            Err(e) => {
                let error = StorageError::corrupt(TASKS_KEY, e);
                tracing::error!(error = %error, "cached task collection is unreadable, starting empty");
                Vec::new()
            }
        },
    };

    let last_sync = store.get_item(LAST_SYNC_KEY).and_then(|raw| {
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(stamp) => Some(stamp.with_timezone(&Utc)),
            Err(e) => {
                let error = StorageError::corrupt(LAST_SYNC_KEY, e);
                tracing::warn!(error = %error, "ignoring unreadable last-sync stamp");
                None
            }
        }
    });

    CacheState { tasks, last_sync }
}

/// Collapse duplicate ids: first position wins, last value wins
fn dedupe_by_id(tasks: Vec<Task>) -> Vec<Task> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(tasks.len());
    let mut unique: Vec<Task> = Vec::with_capacity(tasks.len());
    for task in tasks {
        match positions.get(&task.id) {
            Some(&index) => unique[index] = task,
            None => {
                positions.insert(task.id.clone(), unique.len());
                unique.push(task);
            }
        }
    }
    unique
}
