//! # Version Store
//!
//! Append-only history of a file's content. Versions are numbered from 1 per
//! file and a version row is never overwritten: the next number is derived
//! from the last one and written with an `Insert`, so two writers racing for
//! the same number cannot both commit.

use crate::storage::{Key, Persistence, Statement, Table, encode};
use crate::types::require_id;
use crate::vault::Vault;
use crate::{DocumentId, DocumentType, FileVersion, ResourceKind, SatchelError};
use chrono::{DateTime, Utc};

/// Handle to the version history of one vault.
pub struct Versions<'a, P: Persistence> {
    vault: &'a Vault<P>,
}

impl<'a, P: Persistence> Versions<'a, P> {
    pub(crate) fn new(vault: &'a Vault<P>) -> Self {
        Self { vault }
    }

    /// Build the row for the next version without executing it.
    pub(crate) fn next_version(
        &self,
        file: DocumentId,
        content_hash: &str,
        comment: &str,
        location: &str,
    ) -> Result<(u32, Statement), SatchelError> {
        let number = self.last_version_number(file)?.checked_add(1).ok_or_else(|| {
            SatchelError::InvalidArgument(format!("file {} has no version numbers left", file))
        })?;
        let version = FileVersion {
            file,
            number,
            content_hash: content_hash.to_string(),
            comment: comment.to_string(),
            location: location.to_string(),
            saved_at: Utc::now(),
        };
        let statement = Statement::insert(
            Table::FileVersions,
            Key::of(&[file.0, u64::from(number)]),
            encode(&version)?,
        );
        Ok((number, statement))
    }

    /// Append a version record. Returns the new version number.
    pub fn save_as_next_version(
        &self,
        file: DocumentId,
        content_hash: &str,
        comment: &str,
        location: &str,
    ) -> Result<u32, SatchelError> {
        self.vault.config().check_description("version comment", comment)?;
        self.vault.registry().require_type(file, DocumentType::File)?;
        let (number, statement) = self.next_version(file, content_hash, comment, location)?;
        self.vault.execute(&[statement])?;
        tracing::debug!(file = %file, version = number, "saved version");
        Ok(number)
    }

    /// Highest saved version number, or 0 when the file has no history.
    pub fn last_version_number(&self, file: DocumentId) -> Result<u32, SatchelError> {
        require_id(file.0, ResourceKind::Document)?;
        Ok(self
            .vault
            .ids_under(Table::FileVersions, &Key::of(&[file.0]), 1)?
            .last()
            .map_or(0, |&n| n as u32))
    }

    /// Whether a version slot at or before `n` exists: `n <= last`.
    ///
    /// Slot 0 is the live content and always exists. Numbers are appended
    /// without gaps, so for `n >= 1` this is whether row `n` was written.
    pub fn version_exists(&self, file: DocumentId, n: u32) -> Result<bool, SatchelError> {
        Ok(n <= self.last_version_number(file)?)
    }

    /// One version record.
    pub fn version(&self, file: DocumentId, n: u32) -> Result<FileVersion, SatchelError> {
        require_id(file.0, ResourceKind::Document)?;
        self.vault.require(
            Table::FileVersions,
            &Key::of(&[file.0, u64::from(n)]),
            ResourceKind::Version,
            format!("{}@{}", file, n),
        )
    }

    /// Every version of a file, oldest first.
    pub fn history(&self, file: DocumentId) -> Result<Vec<FileVersion>, SatchelError> {
        require_id(file.0, ResourceKind::Document)?;
        self.vault.fetch_all(Table::FileVersions, &Key::of(&[file.0]))
    }

    /// `(comment, saved_at)` of every version, oldest first.
    pub fn history_log(&self, file: DocumentId) -> Result<Vec<(String, DateTime<Utc>)>, SatchelError> {
        Ok(self
            .history(file)?
            .into_iter()
            .map(|v| (v.comment, v.saved_at))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::{DocumentId, MemoryStore, Note, SatchelError, Vault};

    fn file(vault: &Vault<MemoryStore>) -> DocumentId {
        vault
            .files()
            .new_file("report.pdf", "", b"v0", "pw")
            .expect("file")
    }

    #[test]
    fn empty_history_is_zero_not_error() {
        let vault = Vault::in_memory().expect("vault");
        let f = file(&vault);
        assert_eq!(vault.versions().last_version_number(f).expect("last"), 0);
        assert!(vault.versions().version_exists(f, 0).expect("exists"));
        assert!(!vault.versions().version_exists(f, 1).expect("exists"));
        assert!(vault.versions().history_log(f).expect("log").is_empty());
    }

    #[test]
    fn three_saves_give_three_versions() {
        let vault = Vault::in_memory().expect("vault");
        let f = file(&vault);
        for i in 1..=3u32 {
            let n = vault
                .versions()
                .save_as_next_version(f, "hash", &format!("rev {}", i), "loc")
                .expect("save");
            assert_eq!(n, i);
        }

        assert_eq!(vault.versions().last_version_number(f).expect("last"), 3);
        assert!(vault.versions().version_exists(f, 3).expect("exists"));
        assert!(!vault.versions().version_exists(f, 4).expect("exists"));

        let log = vault.versions().history_log(f).expect("log");
        let comments: Vec<&str> = log.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(comments, vec!["rev 1", "rev 2", "rev 3"]);
        assert!(log.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn version_exists_is_at_or_below_last() {
        let vault = Vault::in_memory().expect("vault");
        let f = file(&vault);
        vault
            .versions()
            .save_as_next_version(f, "hash", "first", "loc")
            .expect("save");

        for n in 0..=1 {
            assert!(vault.versions().version_exists(f, n).expect("exists"));
        }
        assert!(!vault.versions().version_exists(f, 2).expect("exists"));
        assert!(matches!(
            vault.versions().version_exists(DocumentId(0), 0),
            Err(SatchelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn versions_only_for_files() {
        let vault = Vault::in_memory().expect("vault");
        let note = vault.documents().new_note(&Note::default()).expect("note");
        assert!(matches!(
            vault.versions().save_as_next_version(note, "h", "", "loc"),
            Err(SatchelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn missing_version_reports_version_kind() {
        let vault = Vault::in_memory().expect("vault");
        let f = file(&vault);
        assert!(matches!(
            vault.versions().version(f, 1),
            Err(SatchelError::NonExistentResource {
                kind: crate::ResourceKind::Version,
                ..
            })
        ));
    }
}
