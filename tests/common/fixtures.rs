//! Engine fixtures
//!
//! Builds an `OfflineContext` over in-memory storage with a stub remote and
//! a connectivity monitor the test controls.

use super::stub_remote::StubRemote;
use chrono::Utc;
use std::sync::Arc;
use tasksync::client::auth::{SessionAuth, UserInfo};
use tasksync::client::local_db::MemoryStore;
use tasksync::client::sync::ConnectivityMonitor;
use tasksync::client::OfflineContext;
use tasksync::shared::{LogRetention, SyncConfig, Task, TaskDraft};

/// Server-side task with a fixed id
pub fn server_task(id: &str, title: &str) -> Task {
    TaskDraft::new(title).into_task(id.to_string(), Utc::now())
}

/// `count` server tasks with ids `srv-1..=srv-count`
pub fn server_tasks(count: usize) -> Vec<Task> {
    (1..=count)
        .map(|n| server_task(&format!("srv-{}", n), &format!("Task {}", n)))
        .collect()
}

pub fn test_config(retention: LogRetention) -> SyncConfig {
    SyncConfig::builder()
        .log_retention(retention)
        .build()
        .expect("test config is valid")
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub remote: Arc<StubRemote>,
    pub context: OfflineContext,
}

impl Harness {
    pub fn new(online: bool, remote: StubRemote) -> Self {
        Self::with_store(online, remote, Arc::new(MemoryStore::new()), LogRetention::Retain)
    }

    pub fn with_store(online: bool, remote: StubRemote, store: Arc<MemoryStore>, retention: LogRetention) -> Self {
        let connectivity = Arc::new(ConnectivityMonitor::new(online));
        let remote = Arc::new(remote);
        let context = OfflineContext::builder(test_config(retention))
            .store(store.clone())
            .remote(remote.clone())
            .auth(Arc::new(SessionAuth::signed_in("test-token", UserInfo::new("u1", "dana"))))
            .connectivity(connectivity.clone())
            .build()
            .expect("failed to build offline context");

        Self {
            store,
            connectivity,
            remote,
            context,
        }
    }

    pub fn go_offline(&self) {
        self.connectivity.set_online(false);
    }

    pub fn go_online(&self) {
        self.connectivity.set_online(true);
    }
}
