//! # Local Storage Module
//!
//! Durable, namespaced key-value storage for the offline engine and the
//! entity cache built on top of it.
//!
//! ## Architecture
//!
//! - **`KeyValueStore`**: synchronous get/set/remove over string values.
//!   Reads and writes never suspend, so optimistic edits stay instantaneous.
//! - **`SqliteStore`**: SQLite-backed store. Rows are loaded into memory on
//!   open and every write is persisted by a background writer task.
//! - **`MemoryStore`**: ephemeral store with an optional byte quota, used by
//!   tests and by hosts that do not want persistence.
//! - **`LocalEntityCache`**: the task collection and last-sync stamp.
//!
//! ## Keys
//!
//! | key                 | value                                  |
//! |---------------------|----------------------------------------|
//! | `tasks`             | JSON array of tasks                    |
//! | `pending_mutations` | JSON array of mutation records         |
//! | `last_sync`         | RFC 3339 timestamp                     |
//! | `id_map`            | JSON object, local id to server id     |
//!
//! `SqliteStore` prefixes every key with its namespace, so several engines
//! can share one database file.

pub mod cache;
pub mod memory;
pub mod sqlite;

pub use cache::LocalEntityCache;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::fmt::Debug;
use thiserror::Error;

/// Key holding the cached task collection
pub const TASKS_KEY: &str = "tasks";
/// Key holding the pending mutation log
pub const PENDING_MUTATIONS_KEY: &str = "pending_mutations";
/// Key holding the last successful sync timestamp
pub const LAST_SYNC_KEY: &str = "last_sync";
/// Key holding local-to-server id links
pub const ID_MAP_KEY: &str = "id_map";

/// Synchronous namespaced key-value storage
pub trait KeyValueStore: Send + Sync + Debug {
    /// Current value for `key`, if any
    fn get_item(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`
    ///
    /// An error means the value could not be made durable.
    fn set_item(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Remove `key`; removing a missing key is not an error
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage failures
///
/// None of these reach callers of cache or log operations; they are logged
/// and the in-memory state stays authoritative for the session.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Persisted payload could not be parsed
    #[error("corrupt payload under '{key}': {message}")]
    Corrupt { key: String, message: String },

    /// Writing would exceed the store's byte quota
    #[error("storage quota exceeded writing '{key}': {needed} bytes needed, {limit} allowed")]
    QuotaExceeded { key: String, needed: usize, limit: usize },

    /// Value could not be serialized
    #[error("failed to serialize '{key}': {message}")]
    Serialization { key: String, message: String },

    /// Background writer is gone (store closed)
    #[error("storage writer is closed")]
    WriterClosed,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    pub fn corrupt(key: impl Into<String>, message: impl ToString) -> Self {
        Self::Corrupt {
            key: key.into(),
            message: message.to_string(),
        }
    }
}
