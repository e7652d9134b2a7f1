//! Mount points for the status summary
//!
//! A `StatusSurface` is the container the reporter renders into. Hosts
//! register surfaces by name in a `MountRegistry`; the desktop panel reads
//! the rendered state back out of it.

use super::StatusSummary;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Name of the container created when no mount point is given
pub const DEFAULT_MOUNT: &str = "offline-status";

#[derive(Debug)]
struct SurfaceState {
    visible: bool,
    content: String,
    summary: Option<StatusSummary>,
    renders: u64,
}

/// Render target for the status summary
#[derive(Debug)]
pub struct StatusSurface {
    name: String,
    state: Mutex<SurfaceState>,
}

impl StatusSurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(SurfaceState {
                visible: true,
                content: String::new(),
                summary: None,
                renders: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_visible(&self) -> bool {
        self.lock().visible
    }

    pub fn set_visible(&self, visible: bool) {
        self.lock().visible = visible;
    }

    /// Replace the rendered content with `summary`
    pub fn render(&self, summary: &StatusSummary) {
        let mut state = self.lock();
        state.content = summary.to_string();
        state.summary = Some(summary.clone());
        state.renders += 1;
    }

    /// Last rendered text
    pub fn content(&self) -> String {
        self.lock().content.clone()
    }

    /// Last rendered summary
    pub fn summary(&self) -> Option<StatusSummary> {
        self.lock().summary.clone()
    }

    pub fn render_count(&self) -> u64 {
        self.lock().renders
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Named surfaces a reporter can bind to
#[derive(Debug, Default)]
pub struct MountRegistry {
    surfaces: Mutex<HashMap<String, Arc<StatusSurface>>>,
}

impl MountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a surface under `name`, returning the existing one if any
    pub fn register(&self, name: &str) -> Arc<StatusSurface> {
        self.lock()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(StatusSurface::new(name)))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<StatusSurface>> {
        self.lock().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Create (or reuse) the default container
    pub fn mount_default(&self) -> Arc<StatusSurface> {
        self.register(DEFAULT_MOUNT)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<StatusSurface>>> {
        self.surfaces.lock().unwrap_or_else(|e| e.into_inner())
    }
}
