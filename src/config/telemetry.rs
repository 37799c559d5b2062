//! Tracing subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global tracing subscriber, filtered by `RUST_LOG` with an
/// `info` default. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .ok();
}
