//! # satchel
//!
//! Command-line front end for a satchel document vault.
//!
//! - `cli`: argument parsing and command implementations
//! - `config`: the `satchel.toml` file and the settings resolved from it
//! - `error`: errors the binary reports before exiting

pub mod cli;
pub mod config;
pub mod error;

pub use config::{AppConfig, LoggingConfig};
pub use error::AppError;
