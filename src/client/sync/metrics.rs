//! # Sync Metrics
//!
//! Counters and timings for sync attempts.
//!
//! ## Features
//!
//! - **Outcome counts**: successes, failures, cancellations and rejected
//!   attempts. Every started attempt ends in exactly one of the first three.
//! - **Timing**: last and rolling average duration of completed syncs
//! - **Volume**: total tasks received from the remote

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncMetrics {
    /// Attempts that reached the remote
    pub total_syncs: u64,
    pub successful_syncs: u64,
    pub failed_syncs: u64,
    /// Attempts dropped before the remote answered
    pub cancelled_syncs: u64,
    /// Attempts rejected while offline or already syncing
    pub rejected_syncs: u64,
    pub average_sync_duration: Duration,
    pub last_sync_duration: Option<Duration>,
    pub total_tasks_synced: u64,
    pub last_error: Option<String>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of an attempt; returns the start instant
    pub fn record_sync_start(&mut self) -> Instant {
        self.total_syncs += 1;
        Instant::now()
    }

    pub fn record_sync_success(&mut self, started: Instant, tasks_synced: usize) {
        let duration = started.elapsed();
        self.last_sync_duration = Some(duration);
        self.successful_syncs += 1;
        self.total_tasks_synced += tasks_synced as u64;
        self.last_error = None;

        // Rolling average over successful syncs
        let successes = u32::try_from(self.successful_syncs).unwrap_or(u32::MAX);
        let total_duration = self.average_sync_duration * (successes - 1) + duration;
        self.average_sync_duration = total_duration / successes;
    }

    pub fn record_sync_failure(&mut self, started: Instant, error: impl Into<String>) {
        self.last_sync_duration = Some(started.elapsed());
        self.failed_syncs += 1;
        self.last_error = Some(error.into());
    }

    pub fn record_sync_cancelled(&mut self, started: Instant) {
        self.last_sync_duration = Some(started.elapsed());
        self.cancelled_syncs += 1;
    }

    /// Started attempts that have not finished yet
    pub fn in_flight(&self) -> u64 {
        self.total_syncs
            .saturating_sub(self.successful_syncs + self.failed_syncs + self.cancelled_syncs)
    }

    pub fn record_rejected(&mut self) {
        self.rejected_syncs += 1;
    }

    /// Share of finished attempts that succeeded
    pub fn success_rate(&self) -> f64 {
        let finished = self.successful_syncs + self.failed_syncs + self.cancelled_syncs;
        if finished == 0 {
            0.0
        } else {
            self.successful_syncs as f64 / finished as f64
        }
    }
}
