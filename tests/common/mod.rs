//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - A scriptable stand-in for the remote task source
//! - Engine fixtures wired over in-memory storage
//! - Custom assertion macros

pub mod fixtures;

// Re-export commonly used utilities
pub use fixtures::*;
pub use stub_remote::*;
