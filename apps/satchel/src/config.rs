//! # Config File
//!
//! `satchel.toml` holds the paths of a vault and its limits:
//!
//! ```toml
//! database = "satchel.redb"
//! content_dir = "satchel-content"
//!
//! [vault]
//! max_name_length = 256
//! max_description_length = 4096
//!
//! [logging]
//! format = "text"      # or "json"
//! filter = "satchel=info"
//! ```
//!
//! Every key is optional. Command-line flags win over the file.

use crate::AppError;
use satchel_core::VaultConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "satchel.toml";

/// Logging section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `text` or `json`.
    pub format: String,
    /// `tracing_subscriber::EnvFilter` directive.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            filter: "satchel=info,satchel_core=info".to_string(),
        }
    }
}

/// The whole config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: PathBuf,
    pub content_dir: PathBuf,
    pub vault: VaultConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("satchel.redb"),
            content_dir: PathBuf::from("satchel-content"),
            vault: VaultConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Load the config.
    ///
    /// An explicit path must exist. Without one, `satchel.toml` in the working
    /// directory is used if present, and the defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, AppError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }
}
