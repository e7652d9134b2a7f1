//! Tracing setup for binaries and manual test runs.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "tasksync=info";

/// Install the global fmt subscriber
///
/// Honours `RUST_LOG` and falls back to `DEFAULT_FILTER`. Calling this more
/// than once is harmless; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    let filter = EnvFilter::try_new(&env_filter).unwrap_or_else(|e| {
        eprintln!("[STARTUP] Invalid RUST_LOG {:?} ({}), using {}", env_filter, e, DEFAULT_FILTER);
        EnvFilter::new(DEFAULT_FILTER)
    });

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
    {
        tracing::debug!(filter = %env_filter, "tracing initialized");
    }
}
