//! Errors of the binary.

use satchel_core::{ContentError, SatchelError};
use thiserror::Error;

/// Anything a command can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    /// The vault rejected the operation.
    #[error(transparent)]
    Vault(#[from] SatchelError),

    /// The config file is missing or malformed.
    #[error("Config error: {0}")]
    Config(String),

    /// A local file could not be read or written.
    #[error("I/O error: {0}")]
    Io(String),

    /// Arguments that parse but do not make sense together.
    #[error("Usage error: {0}")]
    Usage(String),
}

impl From<ContentError> for AppError {
    fn from(e: ContentError) -> Self {
        Self::Vault(SatchelError::Content(e))
    }
}
