//! Shared error type for the task data model
//!
//! Raised when a value built by the host (a draft typed into the UI, a patch)
//! is rejected before it reaches the cache or the mutation log.
use thiserror::Error;

/// A task field that cannot be accepted as given
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("invalid {field}: {message}")]
    ValidationError { field: String, message: String },
}

impl SharedError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Name of the rejected field
    pub fn field(&self) -> &str {
        match self {
            Self::ValidationError { field, .. } => field,
        }
    }
}
