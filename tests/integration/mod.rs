//! Integration tests
//!
//! End-to-end behaviour of the offline engine over its public API

mod connectivity_probe;
mod http_remote;
mod offline_scenario;
mod sqlite_durability;
mod sync_guarantees;
