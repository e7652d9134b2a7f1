//! Remote Task Source
//!
//! The sync coordinator reads the authoritative task collection through the
//! `RemoteSource` trait. `HttpRemote` is the production implementation; tests
//! substitute stubs.

use crate::client::auth::AuthProvider;
use crate::shared::{SyncConfig, Task};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failure to obtain the authoritative collection
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),
}

/// Authoritative store of the task collection
#[async_trait]
pub trait RemoteSource: Send + Sync + Debug {
    /// Fetch the full task collection for the current user
    async fn fetch_tasks(&self) -> Result<Vec<Task>, RemoteError>;
}

/// Accepts both a bare array and the `{ "tasks": [...] }` envelope
#[derive(Deserialize)]
#[serde(untagged)]
enum TaskListResponse {
    Bare(Vec<Task>),
    Envelope { tasks: Vec<Task> },
}

impl TaskListResponse {
    fn into_tasks(self) -> Vec<Task> {
        match self {
            TaskListResponse::Bare(tasks) | TaskListResponse::Envelope { tasks } => tasks,
        }
    }
}

/// Task source backed by the REST API
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    tasks_url: String,
    auth: Arc<dyn AuthProvider>,
}

impl HttpRemote {
    pub fn new(config: &SyncConfig, auth: Arc<dyn AuthProvider>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to build HTTP client, using defaults");
                Client::new()
            });
        Self::with_client(client, config.tasks_url(), auth)
    }

    pub fn with_client(client: Client, tasks_url: impl Into<String>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            client,
            tasks_url: tasks_url.into(),
            auth,
        }
    }

    pub fn tasks_url(&self) -> &str {
        &self.tasks_url
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, RemoteError> {
        let token = self.auth.bearer_token().ok_or(RemoteError::NotAuthenticated)?;

        tracing::debug!(url = %self.tasks_url, "fetching task collection");
        let response = self
            .client
            .get(&self.tasks_url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let list: TaskListResponse =
            serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(list.into_tasks())
    }
}
