//! Logging pipeline with JSON/compact formats
//!
//! Configured from the environment:
//! - `SB_LOG_FORMAT`: `json` or `compact` (default)
//! - `SB_LOG_LEVEL`: filter directive; falls back to `RUST_LOG`, then `info`
//! - `SB_LOG_TIMESTAMP`: `0` drops timestamps
//!
//! Output always goes to stderr so `app build` can print the configuration on
//! stdout.

use anyhow::{anyhow, Result};
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGING_CONFIG: OnceLock<LoggingConfig> = OnceLock::new();

/// Logging configuration from environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive
    pub level: String,
    pub timestamp: bool,
}

/// Supported log output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable compact format
    Compact,
    /// Machine-readable JSON format
    Json,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let format = match std::env::var("SB_LOG_FORMAT").as_deref().unwrap_or("compact") {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        };

        let level = std::env::var("SB_LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());

        let timestamp = std::env::var("SB_LOG_TIMESTAMP").as_deref() != Ok("0");

        Self {
            format,
            level,
            timestamp,
        }
    }
}

/// Initialize the global subscriber. Fails when called twice.
pub fn init_logging() -> Result<()> {
    let config = LoggingConfig::from_env();
    LOGGING_CONFIG
        .set(config.clone())
        .map_err(|_| anyhow!("logging already initialized"))?;

    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("invalid log filter {:?}: {e}", config.level))?;

    let layer = match (config.format, config.timestamp) {
        (LogFormat::Json, true) => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        (LogFormat::Json, false) => fmt::layer()
            .json()
            .without_time()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        (LogFormat::Compact, true) => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        (LogFormat::Compact, false) => fmt::layer()
            .compact()
            .without_time()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(env_filter))
        .try_init()
        .map_err(|e| anyhow!("install subscriber: {e}"))?;

    tracing::debug!(
        format = ?config.format,
        level = %config.level,
        "logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // env vars are process-global; keep every case in one test
    #[test]
    fn logging_config_from_env() {
        std::env::remove_var("SB_LOG_FORMAT");
        std::env::remove_var("SB_LOG_LEVEL");
        std::env::remove_var("RUST_LOG");
        std::env::remove_var("SB_LOG_TIMESTAMP");
        let config = LoggingConfig::from_env();
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.level, "info");
        assert!(config.timestamp);

        std::env::set_var("RUST_LOG", "sb_config=trace");
        assert_eq!(LoggingConfig::from_env().level, "sb_config=trace");

        std::env::set_var("SB_LOG_FORMAT", "json");
        std::env::set_var("SB_LOG_LEVEL", "debug");
        std::env::set_var("SB_LOG_TIMESTAMP", "0");
        let config = LoggingConfig::from_env();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "debug");
        assert!(!config.timestamp);

        std::env::remove_var("SB_LOG_FORMAT");
        std::env::remove_var("SB_LOG_LEVEL");
        std::env::remove_var("RUST_LOG");
        std::env::remove_var("SB_LOG_TIMESTAMP");
    }
}
