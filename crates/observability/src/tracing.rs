//! Subscriber setup for the service binaries.

use tracing_subscriber::EnvFilter;

/// Default directive when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

/// Install the global JSON subscriber.
///
/// Filtering comes from `RUST_LOG`; repeated calls are no-ops so tests can
/// call this freely.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .json()
        .try_init();
}
