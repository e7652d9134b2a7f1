//! # Network Monitor
//!
//! Normalizes host connectivity signals into one boolean and notifies
//! subscribers on every transition edge.
//!
//! ## Features
//!
//! - **Edge-triggered**: reporting the same state twice notifies nobody
//! - **Push subscriptions**: callbacks with an unsubscribe handle
//! - **Async observers**: a `watch` receiver for background loops
//! - **Host adapters**: `ConnectivityProbe` implementations feed the
//!   monitor; `HttpProbe` checks a health endpoint on an interval
//!
//! The monitor does not guard against flapping. Overlapping sync attempts
//! are prevented by the coordinator's single-flight guard.

use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

type Listener = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Connectivity state with edge notifications
pub struct ConnectivityMonitor {
    state: watch::Sender<bool>,
    listeners: Arc<Mutex<Listeners>>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (state, _) = watch::channel(initially_online);
        Self {
            state,
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    /// Current connectivity state
    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Report the host's connectivity; returns whether this was an edge
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            if online {
                tracing::info!("connectivity restored");
            } else {
                tracing::warn!("connectivity lost, working offline");
            }
            // Call outside the lock so listeners may subscribe or unsubscribe.
            let listeners: Vec<Listener> = {
                let guard = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
                guard.entries.iter().map(|(_, listener)| listener.clone()).collect()
            };
            for listener in listeners {
                listener(online);
            }
        }
        changed
    }

    /// Call `listener` with the new state on every edge
    ///
    /// The subscription ends when the returned handle is dropped or
    /// `unsubscribe` is called.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(&self, listener: impl Fn(bool) + Send + Sync + 'static) -> Subscription {
        let mut guard = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let id = guard.next_id;
        guard.next_id += 1;
        guard.entries.push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Receiver that observes every edge
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner()).entries.len()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("online", &self.is_online())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Handle returned by `ConnectivityMonitor::subscribe`
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Stop receiving notifications
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            let mut guard = listeners.lock().unwrap_or_else(|e| e.into_inner());
            guard.entries.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Host-specific source of connectivity signals
#[async_trait]
pub trait ConnectivityProbe: Send + Sync + fmt::Debug {
    /// Whether the remote is reachable right now
    async fn check(&self) -> bool;
}

/// Probe that treats any HTTP response from a health endpoint as online
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to build probe client, using defaults");
                reqwest::Client::new()
            });
        Self::with_client(client, url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn check(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) => {
                tracing::trace!(status = %response.status(), "connectivity probe answered");
                true
            }
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "connectivity probe failed");
                false
            }
        }
    }
}

/// Run `probe` every `interval` and feed the result into `monitor`
pub fn spawn_probe(
    monitor: Arc<ConnectivityMonitor>,
    probe: Arc<dyn ConnectivityProbe>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let online = probe.check().await;
            monitor.set_online(online);
        }
    })
}
