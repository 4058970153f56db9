//! Configuration loader for kernel32-adapter
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use super::ConfigResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File read by [`load_config`]
pub const DEFAULT_CONFIG_FILE: &str = "kernel32-adapter.toml";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_library")]
    pub library: LibraryConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

/// Which library the call table is resolved against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default = "default_library_path")]
    pub path: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level or `EnvFilter` directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_with_target")]
    pub with_target: bool,
    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Loads configuration from file
    pub fn load(&self) -> ConfigResult<Config> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration or returns defaults if the file is missing or unreadable
    pub fn load_or_default(&self) -> Config {
        self.load().unwrap_or_default()
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads [`DEFAULT_CONFIG_FILE`] from the working directory. A missing file
/// yields the defaults; a malformed one is an error.
pub fn load_config() -> ConfigResult<Config> {
    match ConfigLoader::new(DEFAULT_CONFIG_FILE).load() {
        Err(ConfigError::FileNotFound(_)) => Ok(Config::default()),
        other => other,
    }
}

// Default functions for serde
fn default_library() -> LibraryConfig {
    LibraryConfig {
        path: default_config().library.path,
    }
}

fn default_logging() -> LoggingConfig {
    let defaults = default_config();
    LoggingConfig {
        level: defaults.logging.level,
        with_target: defaults.logging.with_target,
        ansi: defaults.logging.ansi,
    }
}

fn default_library_path() -> String {
    default_config().library.path
}

fn default_log_level() -> String {
    default_config().logging.level
}

fn default_with_target() -> bool {
    default_config().logging.with_target
}

fn default_ansi() -> bool {
    default_config().logging.ansi
}

impl Default for Config {
    fn default() -> Self {
        Config {
            library: default_library(),
            logging: default_logging(),
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        default_library()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        default_logging()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.library.path, "kernel32.dll");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file() {
        let loader = ConfigLoader::new("nonexistent.toml");
        let result = loader.load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_or_default() {
        let loader = ConfigLoader::new("nonexistent.toml");
        let config = loader.load_or_default();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let mut config = Config::default();
        config.library.path = "C:\\Windows\\System32\\kernel32.dll".to_string();
        config.logging.with_target = true;
        let loader = ConfigLoader::new(&config_path);

        loader.save(&config).unwrap();
        assert!(config_path.exists());

        let loaded = loader.load().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
            [logging]
            level = "trace"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.level, "trace");
        // Check defaults are applied
        assert!(config.logging.ansi);
        assert_eq!(config.library.path, "kernel32.dll");
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "[library\npath = ").unwrap();

        let loader = ConfigLoader::new(&config_path);
        assert!(matches!(loader.load(), Err(ConfigError::TomlParse(_))));
        assert_eq!(loader.load_or_default(), Config::default());
    }
}
