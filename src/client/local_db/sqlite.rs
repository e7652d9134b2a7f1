//! # SQLite Key-Value Store
//!
//! Durable `KeyValueStore` backed by a single `kv_store` table.
//!
//! Opening the store loads every row of its namespace into memory, so reads
//! are plain map lookups. Writes update the in-memory map immediately and
//! are queued to a background writer task that persists them in order.
//! A failed write is logged by the writer; the in-memory value stays.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tasksync::client::local_db::{KeyValueStore, SqliteStore};
//!
//! # async fn example() -> Result<(), tasksync::client::local_db::StorageError> {
//! let store = SqliteStore::open("/tmp/tasksync/offline.db", "tasksync").await?;
//! store.set_item("last_sync", "2026-10-17T09:00:00Z".to_string())?;
//! store.flush().await?;
//! # Ok(())
//! # }
//! ```

use super::{KeyValueStore, StorageError};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

#[derive(Debug)]
enum WriteCommand {
    Put { key: String, value: String },
    Delete { key: String },
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// SQLite-backed namespaced key-value store
#[derive(Debug)]
pub struct SqliteStore {
    namespace: String,
    entries: Mutex<HashMap<String, String>>,
    writer: mpsc::UnboundedSender<WriteCommand>,
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open or create the database file at `path`
    ///
    /// Uses WAL mode; the parent directory is created if needed.
    pub async fn open(path: impl AsRef<Path>, namespace: impl Into<String>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        Self::with_pool(pool, namespace.into()).await
    }

    /// Open a private in-memory database
    pub async fn open_in_memory(namespace: impl Into<String>) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // A second connection would see a different, empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool, namespace.into()).await
    }

    async fn with_pool(pool: SqlitePool, namespace: String) -> Result<Self, StorageError> {
        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        // Byte-range scan: `;` sorts right after `:`, so the range covers
        // exactly the keys under this namespace whatever its characters.
        let prefix = format!("{}:", namespace);
        let upper = format!("{};", namespace);
        let rows = sqlx::query("SELECT key, value FROM kv_store WHERE key >= ?1 AND key < ?2")
            .bind(&prefix)
            .bind(&upper)
            .fetch_all(&pool)
            .await?;

        let mut entries = HashMap::with_capacity(rows.len());
        for row in rows {
            let key: String = row.try_get("key")?;
            let value: String = row.try_get("value")?;
            if let Some(local) = key.strip_prefix(&prefix) {
                entries.insert(local.to_string(), value);
            }
        }
        tracing::debug!(namespace = %namespace, keys = entries.len(), "loaded local store");

        let (writer, commands) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(pool.clone(), commands));

        Ok(Self {
            namespace,
            entries: Mutex::new(entries),
            writer,
            pool,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Wait until every write issued so far has reached the database
    pub async fn flush(&self) -> Result<(), StorageError> {
        let (done, wait) = oneshot::channel();
        self.writer
            .send(WriteCommand::Flush(done))
            .map_err(|_| StorageError::WriterClosed)?;
        wait.await.map_err(|_| StorageError::WriterClosed)
    }

    /// Persist pending writes, stop the writer and close the connection pool
    ///
    /// Later writes still update the in-memory map but return
    /// `StorageError::WriterClosed`.
    pub async fn close(&self) -> Result<(), StorageError> {
        let (done, wait) = oneshot::channel();
        if self.writer.send(WriteCommand::Shutdown(done)).is_ok() {
            // An Err here means the writer already stopped.
            let _ = wait.await;
        }
        self.pool.close().await;
        Ok(())
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn send(&self, command: WriteCommand) -> Result<(), StorageError> {
        self.writer.send(command).map_err(|_| StorageError::WriterClosed)
    }
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.insert(key.to_string(), value.clone());
        }
        self.send(WriteCommand::Put {
            key: self.scoped(key),
            value,
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.remove(key);
        }
        self.send(WriteCommand::Delete { key: self.scoped(key) })
    }
}

/// Persist queued writes in order until shutdown or until every sender is gone
async fn run_writer(pool: SqlitePool, mut commands: mpsc::UnboundedReceiver<WriteCommand>) {
    while let Some(command) = commands.recv().await {
        match command {
            WriteCommand::Put { key, value } => {
                let result = sqlx::query(
                    "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)",
                )
                .bind(&key)
                .bind(&value)
                .bind(chrono::Utc::now().to_rfc3339())
                .execute(&pool)
                .await;

                if let Err(e) = result {
                    tracing::error!(key = %key, bytes = value.len(), error = %e, "failed to persist value");
                }
            }
            WriteCommand::Delete { key } => {
                let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
                    .bind(&key)
                    .execute(&pool)
                    .await;

                if let Err(e) = result {
                    tracing::error!(key = %key, error = %e, "failed to delete value");
                }
            }
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
            WriteCommand::Shutdown(done) => {
                commands.close();
                let _ = done.send(());
                break;
            }
        }
    }
    tracing::debug!("local store writer stopped");
}
