//! Authentication Collaborator
//!
//! The session itself (login, token refresh) lives outside the offline
//! engine. The engine only needs two things from it: the bearer token for
//! the remote read and the identity stamped on locally authored notes.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::RwLock;

/// User information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserInfo {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            email: None,
        }
    }
}

/// Source of the bearer credential and current user
pub trait AuthProvider: Send + Sync + Debug {
    /// Bearer token for remote requests, if signed in
    fn bearer_token(&self) -> Option<String>;

    /// Currently signed-in user, if any
    fn current_user(&self) -> Option<UserInfo>;
}

/// Authentication state
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub token: Option<String>,
    pub user: Option<UserInfo>,
}

impl AuthState {
    pub fn authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// In-process session fed by the host's login flow
#[derive(Debug, Default)]
pub struct SessionAuth {
    state: RwLock<AuthState>,
}

impl SessionAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session that is already signed in
    pub fn signed_in(token: impl Into<String>, user: UserInfo) -> Self {
        let session = Self::new();
        session.sign_in(token, user);
        session
    }

    /// Session seeded from `TASKSYNC_TOKEN`, `TASKSYNC_USER_ID` and
    /// `TASKSYNC_USERNAME`
    pub fn from_env() -> Self {
        let session = Self::new();
        if let Ok(token) = std::env::var("TASKSYNC_TOKEN") {
            let user = std::env::var("TASKSYNC_USER_ID").ok().map(|id| {
                let username = std::env::var("TASKSYNC_USERNAME").unwrap_or_else(|_| id.clone());
                UserInfo::new(id, username)
            });
            let mut state = session.write();
            state.token = Some(token);
            state.user = user;
        }
        session
    }

    pub fn sign_in(&self, token: impl Into<String>, user: UserInfo) {
        let mut state = self.write();
        state.token = Some(token.into());
        state.user = Some(user);
        tracing::info!("session signed in");
    }

    /// Clear the token and user (logout)
    pub fn sign_out(&self) {
        *self.write() = AuthState::default();
        tracing::info!("session signed out");
    }

    pub fn state(&self) -> AuthState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, AuthState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl AuthProvider for SessionAuth {
    fn bearer_token(&self) -> Option<String> {
        self.state.read().unwrap_or_else(|e| e.into_inner()).token.clone()
    }

    fn current_user(&self) -> Option<UserInfo> {
        self.state.read().unwrap_or_else(|e| e.into_inner()).user.clone()
    }
}
