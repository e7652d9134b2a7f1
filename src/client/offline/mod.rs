//! # Offline Editing
//!
//! Lets the user keep working while disconnected. Every action is applied
//! to the local cache immediately and recorded in the pending mutation log.
//!
//! ## Key Components
//!
//! - `queue.rs`: the pending mutation log and its record types
//! - `local_id.rs`: local-origin identifiers for tasks created offline

pub mod local_id;
pub mod queue;

// Re-export main types
pub use local_id::{is_local_id, mint_local_id, LOCAL_ID_PREFIX};
pub use queue::{MutationKind, MutationRecord, PendingMutationLog};
