//! Default configuration values for kernel32-adapter

use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub library: LibraryDefaults,
    pub logging: LoggingDefaults,
}

/// Default library configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryDefaults {
    pub path: String,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
    pub with_target: bool,
    pub ansi: bool,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        library: LibraryDefaults {
            path: "kernel32.dll".to_string(),
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
            with_target: false,
            ansi: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert_eq!(config.library.path, "kernel32.dll");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.with_target);
        assert!(config.logging.ansi);
    }

    #[test]
    fn test_defaults_serialize() {
        let json = serde_json::to_value(default_config()).unwrap();
        assert_eq!(json["library"]["path"], "kernel32.dll");
        assert_eq!(json["logging"]["level"], "info");
    }
}
