//! # Status Reporting
//!
//! Observable summary of the offline engine plus a manual sync trigger.
//!
//! - `reporter.rs`: computes and renders the summary
//! - `mount.rs`: named render targets
//! - `panel.rs`: egui panel for the desktop binary

pub mod mount;
pub mod panel;
pub mod reporter;

pub use mount::{MountRegistry, StatusSurface, DEFAULT_MOUNT};
pub use panel::{render_status_panel, PanelAction};
pub use reporter::{StatusReporter, StatusSummary};
