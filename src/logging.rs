//! Centralized logging setup

use tracing_subscriber::EnvFilter;

/// Initialize logging to stdout
///
/// The log level comes from the RUST_LOG environment variable and defaults
/// to "info" if unset. Safe to call only once per process.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
