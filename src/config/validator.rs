//! Configuration validator for kernel32-adapter

use super::loader::{Config, ConfigError, LibraryConfig, LoggingConfig};
use super::ConfigResult;

/// Levels accepted in `[logging] level`
pub const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> ConfigResult<()> {
        Self::validate_library(&config.library)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    fn validate_library(library: &LibraryConfig) -> ConfigResult<()> {
        if library.path.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Library path cannot be empty".to_string(),
            ));
        }

        if !library.path.to_lowercase().ends_with(".dll") {
            return Err(ConfigError::Invalid(format!(
                "Library path must name a .dll: {}",
                library.path
            )));
        }

        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, LOG_LEVELS
            )));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    ConfigValidator::validate(config)
}
