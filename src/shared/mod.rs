//! Shared Module
//!
//! Types used by the offline engine and by anything talking to the task
//! API: the task entity and its edit payloads, configuration, and shared
//! error types.

/// Task entity, drafts and patches
pub mod task;

/// Shared error types
pub mod error;

/// Engine configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{ConfigError, LogRetention, SyncConfig, SyncConfigBuilder};
pub use error::SharedError;
pub use task::{Task, TaskDraft, TaskNote, TaskPatch};
