//! Integration tests for configuration files and serialized reports

use kernel32_adapter::config::{
    validate_config, Config, ConfigError, ConfigLoader, LibraryConfig,
};
use kernel32_adapter::process::enumerate_modules;
use kernel32_adapter::{FakeKernel32, Kernel32};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kernel32-adapter.toml");
    fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

    let config = ConfigLoader::new(&path).load().unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.library, LibraryConfig::default());
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let loader = ConfigLoader::new(dir.path().join("saved.toml"));

    let mut config = Config::default();
    config.library.path = "C:\\Windows\\System32\\kernel32.dll".to_string();
    config.logging.ansi = false;
    loader.save(&config).unwrap();

    assert_eq!(loader.load().unwrap(), config);
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[library]\npath = \"kernel32.so\"\n").unwrap();

    let config = ConfigLoader::new(&path).load().unwrap();
    let err = validate_config(&config).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    fs::write(&path, "[library\npath = ").unwrap();
    assert!(matches!(
        ConfigLoader::new(&path).load(),
        Err(ConfigError::TomlParse(_))
    ));
    assert_eq!(ConfigLoader::new(&path).load_or_default(), Config::default());
}

#[test]
fn test_module_report_serializes() {
    let k32 = Kernel32::new(FakeKernel32::new());
    let modules = enumerate_modules(&k32, 0).unwrap();

    let json = serde_json::to_value(&modules).unwrap();
    assert_eq!(json[0]["name"], "app.exe");
    assert_eq!(json[0]["base_address"], 0x0040_0000);
    assert_eq!(json[1]["name"], "KERNEL32.DLL");
}
