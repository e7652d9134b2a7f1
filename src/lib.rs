//! tasksync - Offline-First Task Sync
//!
//! Keeps a field worker's task list usable without a network connection.
//!
//! # Overview
//!
//! - Edits (create, update, delete, add note) apply to a durable local
//!   cache immediately and are appended to a pending mutation log
//! - A sync coordinator pulls the authoritative task collection when
//!   online, never running two syncs at once
//! - A status reporter shows connectivity, pending actions, local task
//!   count and the last sync time, with a manual "Sync now" trigger
//!
//! # Module Structure
//!
//! - **`shared`** - Task types, configuration and shared errors
//! - **`client`** - The offline engine and its egui status panel
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tasksync::client::{auth::SessionAuth, OfflineContext};
//! use tasksync::shared::{SyncConfig, TaskDraft};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let context = OfflineContext::bootstrap(SyncConfig::from_env()?, Arc::new(SessionAuth::from_env())).await?;
//! context.start();
//!
//! let id = context.log().record_create(TaskDraft::new("Check pump"));
//! match context.sync().await {
//!     Ok(report) => println!("synced {} tasks", report.synced_entities),
//!     Err(e) => println!("still offline: {} ({} pending)", e, context.log().len()),
//! }
//! println!("{} resolves to {}", id, context.coordinator().resolve_id(&id));
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Cache and log operations are synchronous and guarded by `std::sync`
//! locks; only the remote read suspends. Everything is `Send + Sync` and
//! shared by `Arc`.

/// Shared types and configuration
pub mod shared;

/// Offline engine
pub mod client;
