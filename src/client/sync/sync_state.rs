//! # Sync State
//!
//! Outcome types shared by the coordinator, the scheduler and the status
//! reporter.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Why a sync attempt did not complete
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Offline; no request was issued
    #[error("Cannot sync while offline")]
    ConnectivityUnavailable,

    /// Another sync is in flight; it was left untouched
    #[error("Sync already in progress")]
    SyncInProgress,

    #[error("Remote request failed: {message}")]
    RemoteRequestFailed { message: String },
}

impl SyncError {
    /// Whether the attempt was turned away before reaching the remote
    pub fn is_rejection(&self) -> bool {
        matches!(self, SyncError::ConnectivityUnavailable | SyncError::SyncInProgress)
    }
}

/// Result of a successful sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Tasks received from the authoritative store
    pub synced_entities: usize,
    /// Records left in the pending mutation log afterwards
    pub remaining_pending_mutations: usize,
    pub completed_at: DateTime<Utc>,
}

/// Broadcast to observers for every sync attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Started,
    Completed(SyncReport),
    Failed { message: String },
    Rejected(SyncError),
}

impl SyncEvent {
    /// Whether this event ends an attempt
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SyncEvent::Started)
    }
}
