//! Structured logging infrastructure for F2FAuth.
//!
//! This module provides centralized logging initialization with support
//! for structured JSON output and environment-based configuration.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

fn filter_or(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the logging system with structured output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// Returns `false` when a global subscriber was already installed.
///
/// # Example
/// ```no_run
/// use f2fauth_core::logging;
///
/// logging::init();
/// tracing::info!("Application started");
/// ```
pub fn init() -> bool {
    init_with_level("info")
}

/// Initialize the logging system with JSON output for production environments.
///
/// This format is suitable for log aggregation systems and structured log analysis.
/// Log level can be configured via the `RUST_LOG` environment variable.
///
/// # Example
/// ```no_run
/// use f2fauth_core::logging;
///
/// logging::init_json();
/// tracing::info!(service = "auth-server", "Service started");
/// ```
pub fn init_json() -> bool {
    init_json_with_level("info")
}

/// Initialize from the `[logging]` section of the configuration.
pub fn init_from_config(config: &LoggingConfig) -> bool {
    if config.json {
        init_json_with_level(&config.level)
    } else {
        init_with_level(&config.level)
    }
}

fn init_with_level(level: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter_or(level))
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init()
        .is_ok()
}

fn init_json_with_level(level: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter_or(level))
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .try_init()
        .is_ok()
}
