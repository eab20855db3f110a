//! Tracing subscriber setup for applications using the SDK
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is left to the application. These helpers read the filter from
//! `RUST_LOG`, e.g. `RUST_LOG=qianfan_core=debug`.

use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install a human-readable subscriber
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .try_init();
}

/// Install a JSON subscriber for log aggregation
pub fn init_json_tracing() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter())
        .try_init();
}
