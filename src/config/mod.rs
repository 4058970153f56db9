//! Configuration module for kernel32-adapter
//!
//! Provides configuration loading, validation, and default settings:
//! which library the call table is resolved against, and how logging is set up.

mod defaults;
mod loader;
mod validator;

pub use defaults::{default_config, ConfigDefaults};
pub use loader::{load_config, ConfigLoader, DEFAULT_CONFIG_FILE};
pub use validator::{validate_config, ConfigValidator, LOG_LEVELS};

// Re-export the configuration structures
pub use loader::{Config, LibraryConfig, LoggingConfig};

// Configuration-related error type
pub use loader::ConfigError;

// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;
