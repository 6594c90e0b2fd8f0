//! # Fixed Primitives
//!
//! Compiled-in constants of the vault. Tunable limits live in
//! [`crate::config::VaultConfig`]; everything here is immutable at runtime.

/// Default maximum length (in bytes) of any entity name.
///
/// Applies to aspect, aspect group, briefcase and collection names,
/// predicate text and schema-free property keys.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 256;

/// Default maximum length (in bytes) of a description or narration.
pub const DEFAULT_MAX_DESCRIPTION_LENGTH: usize = 4096;

/// Name of the reserved Global Briefcase.
pub const GLOBAL_BRIEFCASE_NAME: &str = "Global";

/// Description of the reserved Global Briefcase.
pub const GLOBAL_BRIEFCASE_DESCRIPTION: &str = "Default briefcase of every document";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_name_fits_default_limit() {
        assert!(GLOBAL_BRIEFCASE_NAME.len() <= DEFAULT_MAX_NAME_LENGTH);
    }
}
