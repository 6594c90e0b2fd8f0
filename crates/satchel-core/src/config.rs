//! # Vault Configuration
//!
//! Runtime limits applied by every store. Deserializable so the binary can
//! read it from the `[vault]` section of its config file.

use crate::SatchelError;
use crate::primitives::{DEFAULT_MAX_DESCRIPTION_LENGTH, DEFAULT_MAX_NAME_LENGTH};
use serde::{Deserialize, Serialize};

/// Limits enforced before any store access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Maximum length in bytes of a name, predicate or property key.
    pub max_name_length: usize,
    /// Maximum length in bytes of a description or narration.
    pub max_description_length: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            max_description_length: DEFAULT_MAX_DESCRIPTION_LENGTH,
        }
    }
}

impl VaultConfig {
    /// Validate a name: non-empty, within `max_name_length`, no NUL bytes.
    ///
    /// `what` names the field in the error message.
    pub fn check_name(&self, what: &str, name: &str) -> Result<(), SatchelError> {
        if name.trim().is_empty() {
            return Err(SatchelError::InvalidArgument(format!(
                "{} must not be empty",
                what
            )));
        }
        if name.len() > self.max_name_length {
            return Err(SatchelError::InvalidArgument(format!(
                "{} exceeds {} bytes",
                what, self.max_name_length
            )));
        }
        // NUL terminates text components of storage keys
        if name.contains('\0') {
            return Err(SatchelError::InvalidArgument(format!(
                "{} must not contain NUL",
                what
            )));
        }
        Ok(())
    }

    /// Validate a description. Empty is allowed.
    pub fn check_description(&self, what: &str, text: &str) -> Result<(), SatchelError> {
        if text.len() > self.max_description_length {
            return Err(SatchelError::InvalidArgument(format!(
                "{} exceeds {} bytes",
                what, self.max_description_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_rejected() {
        let config = VaultConfig::default();
        assert!(config.check_name("aspect name", "").is_err());
        assert!(config.check_name("aspect name", "   ").is_err());
    }

    #[test]
    fn oversize_name_rejected() {
        let config = VaultConfig {
            max_name_length: 4,
            ..VaultConfig::default()
        };
        assert!(config.check_name("name", "four").is_ok());
        assert!(matches!(
            config.check_name("name", "fives"),
            Err(SatchelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn nul_rejected() {
        let config = VaultConfig::default();
        assert!(config.check_name("name", "a\0b").is_err());
    }

    #[test]
    fn empty_description_allowed() {
        let config = VaultConfig::default();
        assert!(config.check_description("description", "").is_ok());
    }
}
