//! Local-to-server id mapping
//!
//! When the authoritative snapshot echoes a task's `local_ref`, the local
//! id it was created under is linked to the server-issued id. Links are
//! persisted under `id_map` so they outlive the process.

use crate::client::local_db::{KeyValueStore, StorageError, ID_MAP_KEY};
use crate::client::offline::is_local_id;
use crate::shared::Task;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdMap {
    links: HashMap<String, String>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links persisted in `store`; empty when absent or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(raw) = store.get_item(ID_MAP_KEY) else {
            return Self::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            let error = StorageError::corrupt(ID_MAP_KEY, e);
            tracing::warn!(error = %error, "ignoring unreadable id map");
            Self::new()
        })
    }

    /// Write the links to `store`; failures are logged
    pub fn persist(&self, store: &dyn KeyValueStore) {
        let result = serde_json::to_string(self)
            .map_err(|e| StorageError::Serialization {
                key: ID_MAP_KEY.to_string(),
                message: e.to_string(),
            })
            .and_then(|json| store.set_item(ID_MAP_KEY, json));
        if let Err(e) = result {
            tracing::error!(error = %e, "failed to persist id map");
        }
    }

    pub fn link(&mut self, local_id: impl Into<String>, server_id: impl Into<String>) {
        self.links.insert(local_id.into(), server_id.into());
    }

    /// Record links for every task whose `local_ref` names a local id;
    /// returns how many new links were added
    pub fn absorb(&mut self, tasks: &[Task]) -> usize {
        let mut added = 0;
        for task in tasks {
            let Some(local_ref) = task.local_ref.as_deref() else {
                continue;
            };
            if !is_local_id(local_ref) || local_ref == task.id {
                continue;
            }
            if self.links.insert(local_ref.to_string(), task.id.clone()).is_none() {
                added += 1;
            }
        }
        added
    }

    /// Server id for `id`, or `id` itself when it has no link
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.links.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn clear(&mut self) {
        self.links.clear();
    }
}
