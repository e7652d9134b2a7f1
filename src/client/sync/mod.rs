//! # Sync Coordinator
//!
//! Reconciles the local cache with the authoritative task collection.
//!
//! ## Architecture
//!
//! The coordinator ties together:
//! - **Network Monitor**: refuses to sync while offline
//! - **Remote Source**: one authenticated read per attempt
//! - **Entity Cache**: replaced wholesale by the authoritative snapshot
//! - **Mutation Log**: reported, and optionally retired, after a sync
//! - **Scheduler**: timer and reconnect triggers
//! - **Metrics**: attempt counters and timings
//!
//! ## State machine
//!
//! `Idle -> Syncing -> Idle`. The in-flight flag is an atomic claimed with
//! compare-exchange and released by a guard, so a second `sync()` while one
//! is running is turned away and a dropped or panicking attempt never
//! leaves the flag set.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tasksync::client::sync::{SyncCoordinator, SyncError};
//!
//! # async fn example(coordinator: &SyncCoordinator) {
//! match coordinator.sync().await {
//!     Ok(report) => println!("synced {} tasks", report.synced_entities),
//!     Err(SyncError::ConnectivityUnavailable) => println!("offline"),
//!     Err(e) => println!("sync failed: {}", e),
//! }
//! # }
//! ```

pub mod id_map;
pub mod metrics;
pub mod network_monitor;
pub mod scheduler;
pub mod sync_state;

pub use id_map::IdMap;
pub use metrics::SyncMetrics;
pub use network_monitor::{spawn_probe, ConnectivityMonitor, ConnectivityProbe, HttpProbe, Subscription};
pub use scheduler::SyncScheduler;
pub use sync_state::{SyncError, SyncEvent, SyncReport};

use crate::client::local_db::{KeyValueStore, LocalEntityCache, ID_MAP_KEY};
use crate::client::offline::PendingMutationLog;
use crate::client::remote::RemoteSource;
use crate::shared::LogRetention;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

/// Releases the in-flight flag when the attempt ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Books the outcome of a started attempt; one dropped unsettled counts as cancelled
struct Attempt<'a> {
    metrics: &'a Mutex<SyncMetrics>,
    started: Instant,
    settled: bool,
}

impl<'a> Attempt<'a> {
    fn begin(metrics: &'a Mutex<SyncMetrics>) -> Self {
        let started = lock_or_recover(metrics).record_sync_start();
        Self {
            metrics,
            started,
            settled: false,
        }
    }

    fn succeeded(mut self, tasks_synced: usize) {
        self.settled = true;
        lock_or_recover(self.metrics).record_sync_success(self.started, tasks_synced);
    }

    fn failed(mut self, message: String) {
        self.settled = true;
        lock_or_recover(self.metrics).record_sync_failure(self.started, message);
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::info!("sync cancelled before the remote answered");
            lock_or_recover(self.metrics).record_sync_cancelled(self.started);
        }
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Single-flight reconciliation with the authoritative store
#[derive(Debug)]
pub struct SyncCoordinator {
    connectivity: Arc<ConnectivityMonitor>,
    remote: Arc<dyn RemoteSource>,
    cache: Arc<LocalEntityCache>,
    log: Arc<PendingMutationLog>,
    retention: LogRetention,
    in_progress: AtomicBool,
    id_map: Mutex<IdMap>,
    metrics: Mutex<SyncMetrics>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncCoordinator {
    pub fn new(
        connectivity: Arc<ConnectivityMonitor>,
        remote: Arc<dyn RemoteSource>,
        cache: Arc<LocalEntityCache>,
        log: Arc<PendingMutationLog>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let id_map = IdMap::load(cache.store().as_ref());
        Self {
            connectivity,
            remote,
            cache,
            log,
            retention: LogRetention::default(),
            in_progress: AtomicBool::new(false),
            id_map: Mutex::new(id_map),
            metrics: Mutex::new(SyncMetrics::new()),
            events,
        }
    }

    /// What happens to the mutation log after a successful sync
    pub fn with_retention(mut self, retention: LogRetention) -> Self {
        self.retention = retention;
        self
    }

    /// Pull the authoritative collection and replace the local cache
    ///
    /// Fails fast with `ConnectivityUnavailable` while offline and with
    /// `SyncInProgress` while another attempt is running. Neither issues a
    /// request or changes state.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        if !self.connectivity.is_online() {
            return Err(self.reject(SyncError::ConnectivityUnavailable));
        }
        let Some(_in_flight) = InFlight::acquire(&self.in_progress) else {
            return Err(self.reject(SyncError::SyncInProgress));
        };

        // Records appended after this point stay in the log under any policy.
        let pending_at_start = self.log.len();
        let attempt = Attempt::begin(&self.metrics);
        self.emit(SyncEvent::Started);
        tracing::info!(pending = pending_at_start, "sync started");

        let tasks = match self.remote.fetch_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "sync failed");
                attempt.failed(message.clone());
                self.emit(SyncEvent::Failed {
                    message: message.clone(),
                });
                return Err(SyncError::RemoteRequestFailed { message });
            }
        };

        let synced_entities = tasks.len();
        let linked = {
            let mut id_map = self.lock_id_map();
            let linked = id_map.absorb(&tasks);
            if linked > 0 {
                id_map.persist(self.cache.store().as_ref());
            }
            linked
        };
        let completed_at = self.cache.save_all(tasks);

        if self.retention == LogRetention::DiscardOnSync {
            let retired = self.log.retire_front(pending_at_start);
            tracing::debug!(retired, "retired synced mutations");
        }

        let report = SyncReport {
            synced_entities,
            remaining_pending_mutations: self.log.len(),
            completed_at,
        };
        attempt.succeeded(synced_entities);
        tracing::info!(
            synced = report.synced_entities,
            remaining = report.remaining_pending_mutations,
            linked,
            "sync completed"
        );
        self.emit(SyncEvent::Completed(report.clone()));
        Ok(report)
    }

    pub fn is_syncing(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Completion time of the last successful sync
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.cache.last_sync()
    }

    pub fn retention(&self) -> LogRetention {
        self.retention
    }

    /// Snapshot of the attempt counters
    pub fn metrics(&self) -> SyncMetrics {
        self.lock_metrics().clone()
    }

    /// Server id for a local-origin id once a sync has linked them
    pub fn resolve_id(&self, id: &str) -> String {
        self.lock_id_map().resolve(id).to_string()
    }

    /// Forget every id link, in memory and in storage
    pub fn clear_id_map(&self) {
        self.lock_id_map().clear();
        if let Err(e) = self.cache.store().remove_item(ID_MAP_KEY) {
            tracing::warn!(error = %e, "failed to clear persisted id map");
        }
    }

    /// Receive an event for every sync attempt
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
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

    fn reject(&self, error: SyncError) -> SyncError {
        tracing::debug!(reason = %error, "sync rejected");
        self.lock_metrics().record_rejected();
        self.emit(SyncEvent::Rejected(error.clone()));
        error
    }

    fn emit(&self, event: SyncEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn lock_metrics(&self) -> MutexGuard<'_, SyncMetrics> {
        lock_or_recover(&self.metrics)
    }

    fn lock_id_map(&self) -> MutexGuard<'_, IdMap> {
        lock_or_recover(&self.id_map)
    }
}
