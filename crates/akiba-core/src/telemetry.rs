//! Tracing bootstrap.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured logging for binaries and integration harnesses.
///
/// Honors `RUST_LOG`; defaults to debug for the akiba crates.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "akiba=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!("Tracing initialized");
}
