//! `tracing` subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Installs a stderr `fmt` subscriber.
///
/// `RUST_LOG` wins over the configured level; `verbose` raises the configured
/// level to `info` when it is quieter.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let level = if verbose && matches!(config.level.as_str(), "warn" | "error" | "off") {
        "info"
    } else {
        config.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A second call (tests, embedding in another binary) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
