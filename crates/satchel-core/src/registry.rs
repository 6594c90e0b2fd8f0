//! # Document Registry
//!
//! The root of every other record: document identity, type tag and
//! retention metadata.
//!
//! Type-specific "new" operations register their document through
//! [`DocumentRegistry::registration`] in the same transaction as their own
//! row. Deletion goes through [`DocumentRegistry::delete`], which removes
//! every row that refers to the document in one transaction.

use crate::indexer::DocumentChange;
use crate::storage::{Key, Persistence, Sequence, Statement, Table, encode};
use crate::types::require_id;
use crate::vault::Vault;
use crate::{
    BriefcaseId, DocumentId, DocumentRecord, DocumentType, FileRecord, FileVersion, ResourceKind,
    SatchelError,
};
use chrono::{DateTime, Utc};

/// Table holding the type-specific row of a document.
pub(crate) const fn content_table(doc_type: DocumentType) -> Table {
    match doc_type {
        DocumentType::File => Table::Files,
        DocumentType::Note => Table::Notes,
        DocumentType::Url => Table::Urls,
        DocumentType::VCard => Table::VCards,
        DocumentType::SchemaFreeDoc => Table::SchemaFreeDocs,
    }
}

/// Handle to the registry of one vault.
pub struct DocumentRegistry<'a, P: Persistence> {
    vault: &'a Vault<P>,
}

impl<'a, P: Persistence> DocumentRegistry<'a, P> {
    pub(crate) fn new(vault: &'a Vault<P>) -> Self {
        Self { vault }
    }

    /// Allocate an identifier and build the statements that register it.
    ///
    /// The document starts in the Global Briefcase.
    pub(crate) fn registration(
        &self,
        doc_type: DocumentType,
    ) -> Result<(DocumentId, Vec<Statement>), SatchelError> {
        let id = DocumentId(self.vault.store().next_identifier(Sequence::Document)?);
        let record = DocumentRecord {
            id,
            doc_type,
            created_at: Utc::now(),
            delete_after: None,
        };
        let statements = vec![
            Statement::insert(Table::Documents, Key::of(&[id.0]), encode(&record)?),
            Statement::upsert(
                Table::DocumentBriefcase,
                Key::of(&[id.0]),
                encode(&BriefcaseId::GLOBAL)?,
            ),
            Statement::link(
                Table::BriefcaseDocuments,
                Key::of(&[BriefcaseId::GLOBAL.0, id.0]),
            ),
        ];
        Ok((id, statements))
    }

    /// Get a document's registry row.
    pub fn get(&self, id: DocumentId) -> Result<DocumentRecord, SatchelError> {
        require_id(id.0, ResourceKind::Document)?;
        self.vault
            .require(Table::Documents, &Key::of(&[id.0]), ResourceKind::Document, id)
    }

    /// Whether a document is registered.
    pub fn exists(&self, id: DocumentId) -> Result<bool, SatchelError> {
        require_id(id.0, ResourceKind::Document)?;
        Ok(self.vault.store().contains(Table::Documents, &Key::of(&[id.0]))?)
    }

    /// Get a document's type tag.
    pub fn document_type(&self, id: DocumentId) -> Result<DocumentType, SatchelError> {
        Ok(self.get(id)?.doc_type)
    }

    /// Get a document's row, requiring a specific type.
    pub(crate) fn require_type(
        &self,
        id: DocumentId,
        doc_type: DocumentType,
    ) -> Result<DocumentRecord, SatchelError> {
        let record = self.get(id)?;
        if record.doc_type != doc_type {
            return Err(SatchelError::InvalidArgument(format!(
                "document {} is a {}, not a {}",
                id, record.doc_type, doc_type
            )));
        }
        Ok(record)
    }

    /// List documents, optionally restricted to one type.
    pub fn list(&self, doc_type: Option<DocumentType>) -> Result<Vec<DocumentId>, SatchelError> {
        let records: Vec<DocumentRecord> =
            self.vault.fetch_all(Table::Documents, &Key::new())?;
        Ok(records
            .into_iter()
            .filter(|r| doc_type.is_none_or(|t| r.doc_type == t))
            .map(|r| r.id)
            .collect())
    }

    // =========================================================================
    // RETENTION
    // =========================================================================

    /// Schedule (or with `None`, cancel) the deletion of a document.
    pub fn set_deletion_date(
        &self,
        id: DocumentId,
        delete_after: Option<DateTime<Utc>>,
    ) -> Result<(), SatchelError> {
        let mut record = self.get(id)?;
        record.delete_after = delete_after;
        self.vault.execute(&[Statement::upsert(
            Table::Documents,
            Key::of(&[id.0]),
            encode(&record)?,
        )])?;
        tracing::debug!(document = %id, ?delete_after, "set deletion date");
        Ok(())
    }

    /// Documents whose deletion date is at or before `now`.
    pub fn expired_documents(&self, now: DateTime<Utc>) -> Result<Vec<DocumentId>, SatchelError> {
        let records: Vec<DocumentRecord> =
            self.vault.fetch_all(Table::Documents, &Key::new())?;
        Ok(records
            .into_iter()
            .filter(|r| r.delete_after.is_some_and(|at| at <= now))
            .map(|r| r.id)
            .collect())
    }

    // =========================================================================
    // DELETION
    // =========================================================================

    /// Delete a document and every row that refers to it, atomically.
    ///
    /// Stored bytes of a file (live content and every version) are removed
    /// from content storage after the commit; failures there are logged.
    pub fn delete(&self, id: DocumentId) -> Result<(), SatchelError> {
        let record = self.get(id)?;

        let locations = if record.doc_type == DocumentType::File {
            self.file_locations(id)?
        } else {
            Vec::new()
        };

        let mut statements = Vec::new();
        statements.extend(self.aspect_cleanup(id)?);
        statements.extend(self.briefcase_cleanup(id)?);
        statements.extend(self.collection_cleanup(id)?);
        statements.extend(self.bookmark_cleanup(&record));
        statements.extend(self.version_cleanup(id));
        statements.extend(self.relation_cleanup(id)?);
        statements.push(Statement::delete(
            content_table(record.doc_type),
            Key::of(&[id.0]),
        ));
        statements.push(Statement::delete(Table::Documents, Key::of(&[id.0])));

        let affected = self.vault.execute(&statements)?;
        tracing::debug!(document = %id, doc_type = %record.doc_type, affected, "deleted document");

        for location in locations {
            if let Err(e) = self.vault.content().delete_bytes(&location) {
                tracing::warn!(document = %id, location, error = %e, "orphaned content");
            }
        }

        self.vault.notify(id, DocumentChange::Deleted);
        Ok(())
    }

    fn file_locations(&self, id: DocumentId) -> Result<Vec<String>, SatchelError> {
        let mut locations = Vec::new();
        if let Some(file) = self
            .vault
            .fetch::<FileRecord>(Table::Files, &Key::of(&[id.0]))?
        {
            locations.push(file.location);
        }
        let versions: Vec<FileVersion> =
            self.vault.fetch_all(Table::FileVersions, &Key::of(&[id.0]))?;
        locations.extend(versions.into_iter().map(|v| v.location));
        Ok(locations)
    }

    fn aspect_cleanup(&self, id: DocumentId) -> Result<Vec<Statement>, SatchelError> {
        let mut statements: Vec<Statement> = self
            .vault
            .ids_under(Table::DocumentAspects, &Key::of(&[id.0]), 1)?
            .into_iter()
            .map(|aspect| Statement::delete(Table::AspectDocuments, Key::of(&[aspect, id.0])))
            .collect();
        statements.push(Statement::delete_prefix(
            Table::DocumentAspects,
            Key::of(&[id.0]),
        ));
        Ok(statements)
    }

    fn briefcase_cleanup(&self, id: DocumentId) -> Result<Vec<Statement>, SatchelError> {
        let mut statements = Vec::new();
        if let Some(briefcase) = self
            .vault
            .fetch::<BriefcaseId>(Table::DocumentBriefcase, &Key::of(&[id.0]))?
        {
            statements.push(Statement::delete(
                Table::BriefcaseDocuments,
                Key::of(&[briefcase.0, id.0]),
            ));
        }
        statements.push(Statement::delete(
            Table::DocumentBriefcase,
            Key::of(&[id.0]),
        ));
        Ok(statements)
    }

    fn collection_cleanup(&self, id: DocumentId) -> Result<Vec<Statement>, SatchelError> {
        let mut statements: Vec<Statement> = self
            .vault
            .ids_under(Table::DocumentCollections, &Key::of(&[id.0]), 1)?
            .into_iter()
            .map(|collection| {
                Statement::delete(Table::CollectionDocuments, Key::of(&[collection, id.0]))
            })
            .collect();
        statements.push(Statement::delete_prefix(
            Table::DocumentCollections,
            Key::of(&[id.0]),
        ));
        Ok(statements)
    }

    fn bookmark_cleanup(&self, record: &DocumentRecord) -> Vec<Statement> {
        vec![Statement::delete(
            Table::Bookmarks,
            Key::of(&[record.doc_type.code(), record.id.0]),
        )]
    }

    fn version_cleanup(&self, id: DocumentId) -> Vec<Statement> {
        vec![Statement::delete_prefix(
            Table::FileVersions,
            Key::of(&[id.0]),
        )]
    }

    fn relation_cleanup(&self, id: DocumentId) -> Result<Vec<Statement>, SatchelError> {
        let mut statements = Vec::new();

        // Relations where the document is the subject: (id, object, predicate)
        for row in self.vault.store().scan(Table::Relations, &Key::of(&[id.0]))? {
            if let (Some(object), Some(predicate)) = (row.key.id_at(1), row.key.id_at(2)) {
                statements.push(Statement::delete(
                    Table::RelationsByObject,
                    Key::of(&[object, id.0, predicate]),
                ));
                statements.push(Statement::delete(
                    Table::RelationsByPredicate,
                    Key::of(&[predicate, id.0, object]),
                ));
            }
        }
        statements.push(Statement::delete_prefix(Table::Relations, Key::of(&[id.0])));

        // Relations where the document is the object: (id, subject, predicate)
        for row in self
            .vault
            .store()
            .scan(Table::RelationsByObject, &Key::of(&[id.0]))?
        {
            if let (Some(subject), Some(predicate)) = (row.key.id_at(1), row.key.id_at(2)) {
                statements.push(Statement::delete(
                    Table::Relations,
                    Key::of(&[subject, id.0, predicate]),
                ));
                statements.push(Statement::delete(
                    Table::RelationsByPredicate,
                    Key::of(&[predicate, subject, id.0]),
                ));
            }
        }
        statements.push(Statement::delete_prefix(
            Table::RelationsByObject,
            Key::of(&[id.0]),
        ));
        Ok(statements)
    }
}
