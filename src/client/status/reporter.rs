//! Status reporter
//!
//! Keeps a human-facing summary of the offline engine current and forwards
//! manual sync requests to the coordinator.

use super::mount::{MountRegistry, StatusSurface};
use crate::client::sync::{SyncCoordinator, SyncError, SyncReport};
use crate::shared::ConfigError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Snapshot of the engine as shown to the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub is_online: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub pending_actions: usize,
    pub sync_in_progress: bool,
    pub local_entities: usize,
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} pending | {} tasks | ",
            if self.is_online { "Online" } else { "Offline" },
            self.pending_actions,
            self.local_entities
        )?;
        match self.last_sync {
            Some(at) => write!(f, "last sync {}", at.format("%Y-%m-%d %H:%M:%S UTC"))?,
            None => write!(f, "never synced")?,
        }
        if self.sync_in_progress {
            write!(f, " | syncing")?;
        }
        Ok(())
    }
}

/// Binds the summary to a mount point and keeps it fresh
#[derive(Debug)]
pub struct StatusReporter {
    coordinator: Arc<SyncCoordinator>,
    surface: Arc<StatusSurface>,
}

impl StatusReporter {
    /// Bind to `mount_point`, or to a freshly mounted default container
    ///
    /// Naming a mount point that is not registered is a configuration
    /// error.
    pub fn bind(
        registry: &MountRegistry,
        mount_point: Option<&str>,
        coordinator: Arc<SyncCoordinator>,
    ) -> Result<Self, ConfigError> {
        let surface = match mount_point {
            Some(name) => registry
                .get(name)
                .ok_or_else(|| ConfigError::MissingMountPoint(name.to_string()))?,
            None => registry.mount_default(),
        };
        tracing::debug!(mount = surface.name(), "status reporter bound");

        let reporter = Self { coordinator, surface };
        reporter.force_update();
        Ok(reporter)
    }

    pub fn show(&self) {
        self.surface.set_visible(true);
    }

    pub fn hide(&self) {
        self.surface.set_visible(false);
    }

    pub fn is_visible(&self) -> bool {
        self.surface.is_visible()
    }

    pub fn surface(&self) -> &Arc<StatusSurface> {
        &self.surface
    }

    /// Compute the summary from the engine's current state
    pub fn summary(&self) -> StatusSummary {
        StatusSummary {
            is_online: self.coordinator.is_online(),
            last_sync: self.coordinator.last_sync(),
            pending_actions: self.coordinator.log().len(),
            sync_in_progress: self.coordinator.is_syncing(),
            local_entities: self.coordinator.cache().len(),
        }
    }

    /// Recompute the summary and re-render it
    pub fn force_update(&self) -> StatusSummary {
        let summary = self.summary();
        self.surface.render(&summary);
        summary
    }

    /// Manual sync trigger; the summary is refreshed afterwards either way
    pub async fn sync_now(&self) -> Result<SyncReport, SyncError> {
        let result = self.coordinator.sync().await;
        if let Err(e) = &result {
            tracing::info!(error = %e, "manual sync did not complete");
        }
        self.force_update();
        result
    }

    /// Refresh on a timer, on connectivity edges and on sync events
    pub fn spawn_refresh(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let reporter = Arc::clone(self);
        let mut online = self.coordinator.connectivity().watch();
        let mut events = self.coordinator.events();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = online.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let _ = online.borrow_and_update();
                    }
                    event = events.recv() => match event {
                        Ok(_) | Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => break,
                    },
                }
                reporter.force_update();
            }
            tracing::debug!("status refresh stopped");
        })
    }
}
