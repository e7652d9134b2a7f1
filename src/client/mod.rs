//! # Offline Client
//!
//! Offline-first engine for the task list: edits apply to a local cache at
//! once and are recorded in a pending log, and a coordinator pulls the
//! authoritative collection whenever connectivity allows.
//!
//! ## Modules
//!
//! - `local_db`: key-value storage and the local entity cache
//! - `offline`: pending mutation log and local ids
//! - `sync`: connectivity monitor, coordinator, scheduler and metrics
//! - `status`: status summary, mount points and the egui panel
//! - `remote`: the authoritative task source
//! - `auth`: bearer token and current user
//! - `context`: wiring for one engine instance
//! - `logging`: tracing setup

pub mod auth;
pub mod context;
pub mod local_db;
pub mod logging;
pub mod offline;
pub mod remote;
pub mod status;
pub mod sync;

pub use context::{OfflineContext, OfflineContextBuilder};
