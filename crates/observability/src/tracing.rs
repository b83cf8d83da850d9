//! Tracing/logging initialization.
//!
//! This is a library workspace, so the default output is compact console
//! lines; the embedding service decides whether to layer JSON logging on
//! top.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// Honors `RUST_LOG`; defaults to `metergrid=info`. Safe to call multiple
/// times (subsequent calls are no-ops).
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("metergrid=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init();
}
