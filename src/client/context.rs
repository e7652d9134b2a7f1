//! # Offline Context
//!
//! Owns one wired-up instance of the offline engine: storage, cache,
//! mutation log, connectivity, coordinator and status reporter. Built once
//! at bootstrap and shared by `Arc`; `dispose()` stops everything it
//! started so tests can run side by side.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tasksync::client::auth::SessionAuth;
//! use tasksync::client::OfflineContext;
//! use tasksync::shared::{SyncConfig, TaskDraft};
//!
//! # async fn example() -> Result<(), tasksync::shared::ConfigError> {
//! let config = SyncConfig::from_env()?;
//! let context = OfflineContext::bootstrap(config, Arc::new(SessionAuth::from_env())).await?;
//! context.start();
//!
//! context.log().record_create(TaskDraft::new("Check pump"));
//! println!("{}", context.summary());
//!
//! context.dispose().await;
//! # Ok(())
//! # }
//! ```

use crate::client::auth::{AuthProvider, SessionAuth};
use crate::client::local_db::{KeyValueStore, LocalEntityCache, MemoryStore, SqliteStore};
use crate::client::offline::PendingMutationLog;
use crate::client::remote::{HttpRemote, RemoteSource};
use crate::client::status::{MountRegistry, StatusReporter, StatusSummary};
use crate::client::sync::{
    spawn_probe, ConnectivityMonitor, ConnectivityProbe, HttpProbe, SyncCoordinator, SyncError,
    SyncReport, SyncScheduler,
};
use crate::shared::{ConfigError, SyncConfig};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Wired-up offline engine
#[derive(Debug)]
pub struct OfflineContext {
    config: SyncConfig,
    store: Arc<dyn KeyValueStore>,
    sqlite: Option<Arc<SqliteStore>>,
    auth: Arc<dyn AuthProvider>,
    connectivity: Arc<ConnectivityMonitor>,
    cache: Arc<LocalEntityCache>,
    log: Arc<PendingMutationLog>,
    coordinator: Arc<SyncCoordinator>,
    mounts: Arc<MountRegistry>,
    reporter: Arc<StatusReporter>,
    probe: Option<Arc<dyn ConnectivityProbe>>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl OfflineContext {
    pub fn builder(config: SyncConfig) -> OfflineContextBuilder {
        OfflineContextBuilder::new(config)
    }

    /// Production wiring: SQLite storage at `config.db_path`, the HTTP
    /// remote and an HTTP health probe
    pub async fn bootstrap(config: SyncConfig, auth: Arc<dyn AuthProvider>) -> Result<Self, ConfigError> {
        let store = SqliteStore::open(&config.db_path, config.namespace.clone())
            .await
            .map_err(|e| ConfigError::Storage(e.to_string()))?;
        tracing::info!(db = %config.db_path.display(), namespace = %config.namespace, "offline store opened");

        let probe = Arc::new(HttpProbe::new(config.health_url()));
        Self::builder(config)
            .sqlite(Arc::new(store))
            .auth(auth)
            .probe(probe)
            .build()
    }

    /// Start the scheduler, the status refresh loop and the probe
    ///
    /// Calling `start` on a running context does nothing.
    pub fn start(&self) {
        let mut background = self.lock_background();
        if !background.is_empty() {
            return;
        }

        background.push(SyncScheduler::new(self.config.sync_interval).spawn(self.coordinator.clone()));
        background.push(self.reporter.spawn_refresh(self.config.status_refresh_interval));
        if let Some(probe) = &self.probe {
            background.push(spawn_probe(
                self.connectivity.clone(),
                probe.clone(),
                self.config.probe_interval,
            ));
        }
        tracing::info!(tasks = background.len(), "offline engine started");
    }

    pub fn is_running(&self) -> bool {
        !self.lock_background().is_empty()
    }

    /// Manual sync, refreshing the status summary afterwards
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        self.reporter.sync_now().await
    }

    /// Recompute and render the status summary
    pub fn summary(&self) -> StatusSummary {
        self.reporter.force_update()
    }

    /// Drop the cached collection, the pending log and the last-sync stamp
    pub fn clear_offline_data(&self) {
        self.cache.clear();
        self.log.clear();
        self.coordinator.clear_id_map();
        self.reporter.force_update();
        tracing::info!("offline data cleared");
    }

    /// Stop background work and flush durable storage
    pub async fn dispose(&self) {
        let handles: Vec<JoinHandle<()>> = self.lock_background().drain(..).collect();
        for handle in handles {
            handle.abort();
            // Cancelled is the expected outcome.
            let _ = handle.await;
        }

        if let Some(sqlite) = &self.sqlite {
            if let Err(e) = sqlite.close().await {
                tracing::warn!(error = %e, "failed to close offline store");
            }
        }
        tracing::info!("offline engine disposed");
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn cache(&self) -> &Arc<LocalEntityCache> {
        &self.cache
    }

    pub fn log(&self) -> &Arc<PendingMutationLog> {
        &self.log
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    pub fn mounts(&self) -> &Arc<MountRegistry> {
        &self.mounts
    }

    pub fn reporter(&self) -> &Arc<StatusReporter> {
        &self.reporter
    }

    fn lock_background(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.background.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Builder for `OfflineContext`
///
/// Every collaborator is optional. The defaults are an in-memory store, an
/// anonymous session, the HTTP remote, an online monitor and a fresh mount
/// registry.
pub struct OfflineContextBuilder {
    config: SyncConfig,
    store: Option<Arc<dyn KeyValueStore>>,
    sqlite: Option<Arc<SqliteStore>>,
    remote: Option<Arc<dyn RemoteSource>>,
    auth: Option<Arc<dyn AuthProvider>>,
    connectivity: Option<Arc<ConnectivityMonitor>>,
    mounts: Option<Arc<MountRegistry>>,
    probe: Option<Arc<dyn ConnectivityProbe>>,
}

impl OfflineContextBuilder {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            store: None,
            sqlite: None,
            remote: None,
            auth: None,
            connectivity: None,
            mounts: None,
            probe: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self.sqlite = None;
        self
    }

    /// Durable store; closed by `dispose`
    pub fn sqlite(mut self, store: Arc<SqliteStore>) -> Self {
        self.store = Some(store.clone() as Arc<dyn KeyValueStore>);
        self.sqlite = Some(store);
        self
    }

    pub fn remote(mut self, remote: Arc<dyn RemoteSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn connectivity(mut self, connectivity: Arc<ConnectivityMonitor>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    pub fn mounts(mut self, mounts: Arc<MountRegistry>) -> Self {
        self.mounts = Some(mounts);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn build(self) -> Result<OfflineContext, ConfigError> {
        self.config.validate()?;
        let config = self.config;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>);
        let auth = self
            .auth
            .unwrap_or_else(|| Arc::new(SessionAuth::new()) as Arc<dyn AuthProvider>);
        let remote = self
            .remote
            .unwrap_or_else(|| Arc::new(HttpRemote::new(&config, auth.clone())) as Arc<dyn RemoteSource>);
        let connectivity = self
            .connectivity
            .unwrap_or_else(|| Arc::new(ConnectivityMonitor::default()));
        let mounts = self.mounts.unwrap_or_default();

        let cache = Arc::new(LocalEntityCache::new(store.clone()));
        let log = Arc::new(PendingMutationLog::new(store.clone(), cache.clone(), auth.clone()));
        let coordinator = Arc::new(
            SyncCoordinator::new(connectivity.clone(), remote, cache.clone(), log.clone())
                .with_retention(config.log_retention),
        );
        let reporter = Arc::new(StatusReporter::bind(
            &mounts,
            config.mount_point.as_deref(),
            coordinator.clone(),
        )?);

        Ok(OfflineContext {
            config,
            store,
            sqlite: self.sqlite,
            auth,
            connectivity,
            cache,
            log,
            coordinator,
            mounts,
            reporter,
            probe: self.probe,
            background: Mutex::new(Vec::new()),
        })
    }
}
