//! Unit tests for config file parsing.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use satchel::{AppConfig, AppError};
use std::path::PathBuf;

#[test]
fn test_empty_config_is_default() {
    let config = AppConfig::from_toml("").unwrap();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.vault.max_name_length, 256);
}

#[test]
fn test_full_config() {
    let text = r#"
database = "/var/lib/satchel/vault.redb"
content_dir = "/var/lib/satchel/content"

[vault]
max_name_length = 64

[logging]
format = "json"
"#;
    let config = AppConfig::from_toml(text).unwrap();

    assert_eq!(config.database, PathBuf::from("/var/lib/satchel/vault.redb"));
    assert_eq!(config.content_dir, PathBuf::from("/var/lib/satchel/content"));
    assert_eq!(config.vault.max_name_length, 64);
    assert_eq!(config.vault.max_description_length, 4096);
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.logging.filter, "satchel=info,satchel_core=info");
}

#[test]
fn test_malformed_config() {
    let result = AppConfig::from_toml("database = [");
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn test_explicit_path_must_exist() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("nope.toml");
    assert!(matches!(
        AppConfig::load(Some(&missing)),
        Err(AppError::Config(_))
    ));
}

#[test]
fn test_load_from_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("satchel.toml");
    std::fs::write(&path, "database = \"other.redb\"\n").unwrap();

    let config = AppConfig::load(Some(&path)).unwrap();
    assert_eq!(config.database, PathBuf::from("other.redb"));
}
