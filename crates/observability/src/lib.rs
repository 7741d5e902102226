//! `supplynet-observability` — logging/tracing setup shared by the binaries.

pub mod tracing;

/// Initialize process-wide observability. Idempotent.
pub fn init() {
    tracing::init();
}
