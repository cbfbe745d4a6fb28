//! `entsheet_log` v1:
//! Host-side `tracing` subscriber setup for entsheet exports.
//!
//! The export library only emits events; applications call [`init`] once at
//! startup and tests call [`init_test`].

use tracing_subscriber::{EnvFilter, fmt};

/// Default filter directive when `RUST_LOG` is unset.
pub const C_FILTER_DEFAULT: &str = "info";

/// Install the global fmt subscriber.
///
/// Reads `RUST_LOG` (e.g. `RUST_LOG=entsheet_io_xlsx=debug`), falling back to
/// [`C_FILTER_DEFAULT`]. Calling twice is a no-op.
pub fn init() {
    let filter = derive_env_filter(None);

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .try_init();
}

/// Install a `debug` subscriber that writes through the test harness capture.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Build the env filter, preferring `RUST_LOG`, then `fallback`, then the default.
pub fn derive_env_filter(fallback: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback.unwrap_or(C_FILTER_DEFAULT)))
}
