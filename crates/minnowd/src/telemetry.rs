//! Logging initialization for the Minnow daemon.
//!
//! Plain `tracing-subscriber` with an `fmt` layer, filtered by `RUST_LOG` or
//! the configured level. Output is human-readable text or one JSON object per
//! line carrying the current span (the `request` span holds the
//! request id and path).

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Logging configuration taken from the `[log]` section.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log level filter (e.g. `"info"`, `"minnow_registry=debug"`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

/// Initialize the global subscriber.
///
/// Call this once at startup, before any `tracing` events are emitted.
pub fn init(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(false)
            .init(),
    }
}
