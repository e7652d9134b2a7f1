//! # Sync Scheduler
//!
//! Background loop that triggers `SyncCoordinator::sync` on a timer and on
//! every offline to online transition. Timer ticks while offline are
//! skipped. Overlap with manual syncs is handled by the coordinator.

use super::{SyncCoordinator, SyncError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Periodic and reconnect-driven sync trigger
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    interval: Duration,
    sync_on_reconnect: bool,
}

impl SyncScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            sync_on_reconnect: true,
        }
    }

    /// Disable the opportunistic sync on reconnect
    pub fn without_reconnect_sync(mut self) -> Self {
        self.sync_on_reconnect = false;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the loop until the handle is aborted
    pub fn spawn(self, coordinator: Arc<SyncCoordinator>) -> JoinHandle<()> {
        // Subscribe before spawning so no edge is missed.
        let online = coordinator.connectivity().watch();
        tokio::spawn(async move { self.run(coordinator, online).await })
    }

    async fn run(self, coordinator: Arc<SyncCoordinator>, mut online: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(interval = ?self.interval, "sync scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if coordinator.is_online() {
                        run_once(&coordinator, "timer").await;
                    } else {
                        tracing::trace!("offline, skipping scheduled sync");
                    }
                }
                changed = online.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let is_online = *online.borrow_and_update();
                    if is_online && self.sync_on_reconnect {
                        run_once(&coordinator, "reconnect").await;
                    }
                }
            }
        }
        tracing::debug!("sync scheduler stopped");
    }
}

async fn run_once(coordinator: &SyncCoordinator, trigger: &'static str) {
    match coordinator.sync().await {
        Ok(report) => {
            tracing::debug!(trigger, synced = report.synced_entities, "scheduled sync done");
        }
        Err(SyncError::SyncInProgress) | Err(SyncError::ConnectivityUnavailable) => {
            tracing::trace!(trigger, "scheduled sync skipped");
        }
        Err(e) => {
            tracing::warn!(trigger, error = %e, "scheduled sync failed");
        }
    }
}
