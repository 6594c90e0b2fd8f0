//! # Structured Documents
//!
//! Notes, URLs, vCards and schema-free documents. Each kind is a serde
//! record stored in its own table next to the registry row; the shared
//! lifecycle lives in one generic implementation over [`DocumentContent`].

use crate::config::VaultConfig;
use crate::indexer::DocumentChange;
use crate::registry::content_table;
use crate::storage::{Key, Persistence, Statement, encode};
use crate::vault::Vault;
use crate::{
    DocumentId, DocumentType, Note, ResourceKind, SatchelError, SchemaFreeDoc, UrlRecord, VCard,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A document kind whose whole content is one stored record.
pub trait DocumentContent: Serialize + DeserializeOwned {
    const TYPE: DocumentType;

    /// Check the record against the vault limits before it is written.
    fn validate(&self, config: &VaultConfig) -> Result<(), SatchelError>;
}

impl DocumentContent for Note {
    const TYPE: DocumentType = DocumentType::Note;

    fn validate(&self, config: &VaultConfig) -> Result<(), SatchelError> {
        config.check_description("note title", &self.title)
    }
}

impl DocumentContent for UrlRecord {
    const TYPE: DocumentType = DocumentType::Url;

    fn validate(&self, config: &VaultConfig) -> Result<(), SatchelError> {
        if self.url.contains(char::is_whitespace) {
            return Err(SatchelError::InvalidArgument(
                "url must not contain whitespace".to_string(),
            ));
        }
        config.check_description("url title", &self.title)
    }
}

impl DocumentContent for VCard {
    const TYPE: DocumentType = DocumentType::VCard;

    fn validate(&self, _config: &VaultConfig) -> Result<(), SatchelError> {
        Ok(())
    }
}

impl DocumentContent for SchemaFreeDoc {
    const TYPE: DocumentType = DocumentType::SchemaFreeDoc;

    fn validate(&self, config: &VaultConfig) -> Result<(), SatchelError> {
        for (key, value) in &self.properties {
            config.check_name("property key", key)?;
            config.check_description("property value", value)?;
        }
        Ok(())
    }
}

/// Handle to the structured documents of one vault.
pub struct Documents<'a, P: Persistence> {
    vault: &'a Vault<P>,
}

impl<'a, P: Persistence> Documents<'a, P> {
    pub(crate) fn new(vault: &'a Vault<P>) -> Self {
        Self { vault }
    }

    // =========================================================================
    // GENERIC LIFECYCLE
    // =========================================================================

    /// Register a new document holding `content`.
    pub fn create<T: DocumentContent>(&self, content: &T) -> Result<DocumentId, SatchelError> {
        content.validate(self.vault.config())?;
        let (id, mut statements) = self.vault.registry().registration(T::TYPE)?;
        statements.push(Statement::insert(
            content_table(T::TYPE),
            Key::of(&[id.0]),
            encode(content)?,
        ));
        self.vault.execute(&statements)?;
        tracing::debug!(document = %id, doc_type = T::TYPE.name(), "created document");
        self.vault.notify(id, DocumentChange::Created);
        Ok(id)
    }

    pub fn get<T: DocumentContent>(&self, id: DocumentId) -> Result<T, SatchelError> {
        self.vault.registry().require_type(id, T::TYPE)?;
        self.vault.require(
            content_table(T::TYPE),
            &Key::of(&[id.0]),
            ResourceKind::Document,
            id,
        )
    }

    /// Replace the content of an existing document.
    pub fn update<T: DocumentContent>(&self, id: DocumentId, content: &T) -> Result<(), SatchelError> {
        content.validate(self.vault.config())?;
        self.vault.registry().require_type(id, T::TYPE)?;
        self.vault.execute(&[Statement::upsert(
            content_table(T::TYPE),
            Key::of(&[id.0]),
            encode(content)?,
        )])?;
        tracing::debug!(document = %id, doc_type = T::TYPE.name(), "updated document");
        self.vault.notify(id, DocumentChange::Updated);
        Ok(())
    }

    /// Identifiers of every document of kind `T`.
    pub fn list<T: DocumentContent>(&self) -> Result<Vec<DocumentId>, SatchelError> {
        self.vault.registry().list(Some(T::TYPE))
    }

    /// Delete a document of kind `T` with the full registry cascade.
    pub fn delete<T: DocumentContent>(&self, id: DocumentId) -> Result<(), SatchelError> {
        self.vault.registry().require_type(id, T::TYPE)?;
        self.vault.registry().delete(id)
    }

    // =========================================================================
    // PER-KIND SHORTHANDS
    // =========================================================================

    pub fn new_note(&self, note: &Note) -> Result<DocumentId, SatchelError> {
        self.create(note)
    }

    pub fn note(&self, id: DocumentId) -> Result<Note, SatchelError> {
        self.get(id)
    }

    pub fn new_url(&self, url: &UrlRecord) -> Result<DocumentId, SatchelError> {
        self.create(url)
    }

    pub fn url(&self, id: DocumentId) -> Result<UrlRecord, SatchelError> {
        self.get(id)
    }

    pub fn new_vcard(&self, card: &VCard) -> Result<DocumentId, SatchelError> {
        self.create(card)
    }

    pub fn vcard(&self, id: DocumentId) -> Result<VCard, SatchelError> {
        self.get(id)
    }

    pub fn new_sfd(&self, doc: &SchemaFreeDoc) -> Result<DocumentId, SatchelError> {
        self.create(doc)
    }

    pub fn sfd(&self, id: DocumentId) -> Result<SchemaFreeDoc, SatchelError> {
        self.get(id)
    }

    /// Set one property of a schema-free document.
    pub fn set_property(&self, id: DocumentId, key: &str, value: &str) -> Result<(), SatchelError> {
        let mut doc: SchemaFreeDoc = self.get(id)?;
        doc.properties.insert(key.to_string(), value.to_string());
        self.update(id, &doc)
    }

    /// Remove one property. Returns whether it was present.
    pub fn remove_property(&self, id: DocumentId, key: &str) -> Result<bool, SatchelError> {
        let mut doc: SchemaFreeDoc = self.get(id)?;
        if doc.properties.remove(key).is_none() {
            return Ok(false);
        }
        self.update(id, &doc)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::{IndexError, Indexer};
    use crate::{MemoryStore, VaultConfig};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingIndexer(Arc<Mutex<Vec<(DocumentId, DocumentChange)>>>);

    impl Indexer for RecordingIndexer {
        fn notify(&self, document: DocumentId, change: DocumentChange) -> Result<(), IndexError> {
            self.0.lock().expect("lock").push((document, change));
            Ok(())
        }
    }

    #[test]
    fn note_round_trips_through_store() {
        let vault = Vault::in_memory().expect("vault");
        let note = Note {
            title: "groceries".into(),
            body: "milk".into(),
        };
        let id = vault.documents().new_note(&note).expect("create");
        assert_eq!(vault.documents().note(id).expect("get"), note);
        assert_eq!(vault.documents().list::<Note>().expect("list"), vec![id]);
    }

    #[test]
    fn wrong_kind_is_invalid_argument() {
        let vault = Vault::in_memory().expect("vault");
        let id = vault.documents().new_note(&Note::default()).expect("create");
        assert!(matches!(
            vault.documents().url(id),
            Err(SatchelError::InvalidArgument(_))
        ));
        assert!(matches!(
            vault.documents().delete::<UrlRecord>(id),
            Err(SatchelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn sfd_properties() {
        let vault = Vault::in_memory().expect("vault");
        let id = vault.documents().new_sfd(&SchemaFreeDoc::default()).expect("create");

        vault.documents().set_property(id, "colour", "red").expect("set");
        vault.documents().set_property(id, "size", "L").expect("set");
        assert!(vault.documents().remove_property(id, "size").expect("remove"));
        assert!(!vault.documents().remove_property(id, "size").expect("remove"));

        let doc = vault.documents().sfd(id).expect("get");
        assert_eq!(doc.properties.len(), 1);
        assert_eq!(doc.properties.get("colour").map(String::as_str), Some("red"));
        assert!(matches!(
            vault.documents().set_property(id, "", "x"),
            Err(SatchelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn url_with_whitespace_rejected() {
        let vault = Vault::in_memory().expect("vault");
        let bad = UrlRecord {
            url: "http://a b".into(),
            title: String::new(),
        };
        assert!(matches!(
            vault.documents().new_url(&bad),
            Err(SatchelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn lifecycle_notifies_indexer() {
        let indexer = RecordingIndexer::default();
        let vault = Vault::new(MemoryStore::new(), VaultConfig::default())
            .expect("vault")
            .with_indexer(indexer.clone());

        let id = vault.documents().new_vcard(&VCard::default()).expect("create");
        vault
            .documents()
            .update(id, &VCard {
                raw: "BEGIN:VCARD".into(),
            })
            .expect("update");
        vault.documents().delete::<VCard>(id).expect("delete");

        let seen = indexer.0.lock().expect("lock").clone();
        assert_eq!(
            seen,
            vec![
                (id, DocumentChange::Created),
                (id, DocumentChange::Updated),
                (id, DocumentChange::Deleted),
            ]
        );
    }
}
