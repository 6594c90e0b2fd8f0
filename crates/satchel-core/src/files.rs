//! # Bytestream
//!
//! File documents: the metadata row lives in the vault, the bytes live in
//! the content storage collaborator under an opaque location token.
//!
//! Replacing a file's content first snapshots the live content as the next
//! version, so the history always holds every earlier state.

use crate::indexer::DocumentChange;
use crate::storage::{Key, Persistence, Statement, Table, encode};
use crate::vault::Vault;
use crate::{DocumentId, DocumentType, FileRecord, ResourceKind, SatchelError};
use chrono::Utc;

/// Hex BLAKE3 digest of a payload.
pub fn content_hash(payload: &[u8]) -> String {
    blake3::hash(payload).to_hex().to_string()
}

/// Handle to the file documents of one vault.
pub struct Bytestream<'a, P: Persistence> {
    vault: &'a Vault<P>,
}

impl<'a, P: Persistence> Bytestream<'a, P> {
    pub(crate) fn new(vault: &'a Vault<P>) -> Self {
        Self { vault }
    }

    /// Store a new file. Returns its document identifier.
    pub fn new_file(
        &self,
        name: &str,
        narration: &str,
        payload: &[u8],
        passphrase: &str,
    ) -> Result<DocumentId, SatchelError> {
        let config = self.vault.config();
        config.check_name("file name", name)?;
        config.check_description("narration", narration)?;

        let (id, mut statements) = self.vault.registry().registration(DocumentType::File)?;
        let location = self.vault.content().store_bytes(payload, passphrase)?;
        let record = FileRecord {
            id,
            name: name.to_string(),
            narration: narration.to_string(),
            size: payload.len() as u64,
            content_hash: content_hash(payload),
            location,
            modified_at: Utc::now(),
        };
        self.commit_stored(&record.location, || {
            statements.push(Statement::insert(
                Table::Files,
                Key::of(&[id.0]),
                encode(&record)?,
            ));
            Ok(statements)
        })?;
        tracing::debug!(file = %id, name, size = record.size, "created file");
        self.vault.notify(id, DocumentChange::Created);
        Ok(id)
    }

    pub fn get(&self, file: DocumentId) -> Result<FileRecord, SatchelError> {
        self.vault.registry().require_type(file, DocumentType::File)?;
        self.vault
            .require(Table::Files, &Key::of(&[file.0]), ResourceKind::Document, file)
    }

    /// Every file record in identifier order.
    pub fn list(&self) -> Result<Vec<FileRecord>, SatchelError> {
        self.vault.fetch_all(Table::Files, &Key::new())
    }

    /// Replace a file's content.
    ///
    /// The current content is recorded as the next version with `comment`;
    /// returns that version's number.
    pub fn update_content(
        &self,
        file: DocumentId,
        payload: &[u8],
        passphrase: &str,
        comment: &str,
    ) -> Result<u32, SatchelError> {
        self.vault.config().check_description("version comment", comment)?;
        let mut record = self.get(file)?;

        let (number, snapshot) = self.vault.versions().next_version(
            file,
            &record.content_hash,
            comment,
            &record.location,
        )?;
        let location = self.vault.content().store_bytes(payload, passphrase)?;
        record.size = payload.len() as u64;
        record.content_hash = content_hash(payload);
        record.location = location;
        record.modified_at = Utc::now();

        self.commit_stored(&record.location, || {
            Ok(vec![
                snapshot,
                Statement::upsert(Table::Files, Key::of(&[file.0]), encode(&record)?),
            ])
        })?;
        tracing::debug!(file = %file, version = number, size = record.size, "updated file content");
        self.vault.notify(file, DocumentChange::Updated);
        Ok(number)
    }

    /// Live content of a file.
    pub fn retrieve(&self, file: DocumentId, passphrase: &str) -> Result<Vec<u8>, SatchelError> {
        let record = self.get(file)?;
        Ok(self
            .vault
            .content()
            .retrieve_bytes(&record.location, passphrase)?)
    }

    /// Content of version `n` of a file.
    pub fn retrieve_version(
        &self,
        file: DocumentId,
        n: u32,
        passphrase: &str,
    ) -> Result<Vec<u8>, SatchelError> {
        self.vault.registry().require_type(file, DocumentType::File)?;
        let version = self.vault.versions().version(file, n)?;
        Ok(self
            .vault
            .content()
            .retrieve_bytes(&version.location, passphrase)?)
    }

    pub fn rename(&self, file: DocumentId, name: &str) -> Result<(), SatchelError> {
        self.vault.config().check_name("file name", name)?;
        self.modify(file, |record| record.name = name.to_string())
    }

    pub fn set_narration(&self, file: DocumentId, narration: &str) -> Result<(), SatchelError> {
        self.vault.config().check_description("narration", narration)?;
        self.modify(file, |record| record.narration = narration.to_string())
    }

    /// Delete a file, its history and its stored bytes.
    pub fn delete(&self, file: DocumentId) -> Result<(), SatchelError> {
        self.vault.registry().require_type(file, DocumentType::File)?;
        self.vault.registry().delete(file)
    }

    fn modify(
        &self,
        file: DocumentId,
        change: impl FnOnce(&mut FileRecord),
    ) -> Result<(), SatchelError> {
        let mut record = self.get(file)?;
        change(&mut record);
        record.modified_at = Utc::now();
        self.vault.execute(&[Statement::upsert(
            Table::Files,
            Key::of(&[file.0]),
            encode(&record)?,
        )])?;
        self.vault.notify(file, DocumentChange::Updated);
        Ok(())
    }

    /// Build and execute the statements recording freshly stored bytes.
    ///
    /// Any failure discards the bytes at `location`.
    fn commit_stored(
        &self,
        location: &str,
        build: impl FnOnce() -> Result<Vec<Statement>, SatchelError>,
    ) -> Result<(), SatchelError> {
        let result = build().and_then(|statements| self.vault.execute(&statements));
        if let Err(e) = result {
            self.discard(location);
            return Err(e);
        }
        Ok(())
    }

    fn discard(&self, location: &str) {
        if let Err(e) = self.vault.content().delete_bytes(location) {
            tracing::warn!(location, error = %e, "could not discard uncommitted content");
        }
    }
}
