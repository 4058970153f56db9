//! Tracing subscriber setup

use crate::config::{ConfigError, ConfigResult, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG` when set, otherwise from the configured level
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global fmt subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> ConfigResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(config.with_target)
        .with_ansi(config.ansi)
        .try_init()
        .map_err(|err| ConfigError::Invalid(format!("logging already initialized: {}", err)))
}
