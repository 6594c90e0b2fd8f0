//! Collections: non-exclusive, user-named groupings of documents.

use super::rename_statements;
use crate::storage::{Key, Persistence, Sequence, Statement, Table, encode};
use crate::types::require_id;
use crate::vault::Vault;
use crate::{Collection, CollectionId, DocumentId, ResourceKind, SatchelError};

/// Handle to the collections of one vault.
pub struct Collections<'a, P: Persistence> {
    vault: &'a Vault<P>,
}

impl<'a, P: Persistence> Collections<'a, P> {
    pub(crate) fn new(vault: &'a Vault<P>) -> Self {
        Self { vault }
    }

    pub fn create(&self, name: &str, description: &str) -> Result<CollectionId, SatchelError> {
        let config = self.vault.config();
        config.check_name("collection name", name)?;
        config.check_description("collection description", description)?;
        if self.find_by_name(name)?.is_some() {
            return Err(SatchelError::DuplicateName(name.to_string()));
        }

        let id = CollectionId(self.vault.store().next_identifier(Sequence::Collection)?);
        let collection = Collection {
            id,
            name: name.to_string(),
            description: description.to_string(),
        };
        self.vault.execute_unique(
            &[
                Statement::insert(Table::CollectionNames, Key::name(name), encode(&id)?),
                Statement::insert(Table::Collections, Key::of(&[id.0]), encode(&collection)?),
            ],
            name,
        )?;
        tracing::debug!(collection = %id, name, "created collection");
        Ok(id)
    }

    pub fn get(&self, id: CollectionId) -> Result<Collection, SatchelError> {
        require_id(id.0, ResourceKind::Collection)?;
        self.vault.require(
            Table::Collections,
            &Key::of(&[id.0]),
            ResourceKind::Collection,
            id,
        )
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<CollectionId>, SatchelError> {
        self.vault.fetch(Table::CollectionNames, &Key::name(name))
    }

    pub fn list(&self) -> Result<Vec<Collection>, SatchelError> {
        self.vault.fetch_all(Table::Collections, &Key::new())
    }

    pub fn rename(&self, id: CollectionId, name: &str) -> Result<(), SatchelError> {
        self.vault.config().check_name("collection name", name)?;
        let mut collection = self.get(id)?;
        if collection.name == name {
            return Ok(());
        }
        let mut statements =
            rename_statements(Table::CollectionNames, &collection.name, name, &id)?;
        collection.name = name.to_string();
        statements.push(Statement::upsert(
            Table::Collections,
            Key::of(&[id.0]),
            encode(&collection)?,
        ));
        self.vault.execute_unique(&statements, name)?;
        Ok(())
    }

    /// Delete a collection. Member documents are untouched.
    pub fn delete(&self, id: CollectionId) -> Result<(), SatchelError> {
        let collection = self.get(id)?;

        let mut statements: Vec<Statement> = self
            .vault
            .ids_under(Table::CollectionDocuments, &Key::of(&[id.0]), 1)?
            .into_iter()
            .map(|doc| Statement::delete(Table::DocumentCollections, Key::of(&[doc, id.0])))
            .collect();
        statements.push(Statement::delete_prefix(
            Table::CollectionDocuments,
            Key::of(&[id.0]),
        ));
        statements.push(Statement::delete(
            Table::CollectionNames,
            Key::name(&collection.name),
        ));
        statements.push(Statement::delete(Table::Collections, Key::of(&[id.0])));

        self.vault.execute(&statements)?;
        tracing::debug!(collection = %id, "deleted collection");
        Ok(())
    }

    // =========================================================================
    // MEMBERSHIP
    // =========================================================================

    /// Add a document. Adding it twice is a no-op success.
    pub fn add(&self, collection: CollectionId, document: DocumentId) -> Result<(), SatchelError> {
        require_id(collection.0, ResourceKind::Collection)?;
        require_id(document.0, ResourceKind::Document)?;
        self.get(collection)?;
        self.vault.registry().get(document)?;
        self.vault.execute(&[
            Statement::link(
                Table::DocumentCollections,
                Key::of(&[document.0, collection.0]),
            ),
            Statement::link(
                Table::CollectionDocuments,
                Key::of(&[collection.0, document.0]),
            ),
        ])?;
        Ok(())
    }

    /// Remove a document. Returns the number of memberships removed.
    pub fn remove(&self, collection: CollectionId, document: DocumentId) -> Result<u64, SatchelError> {
        require_id(collection.0, ResourceKind::Collection)?;
        require_id(document.0, ResourceKind::Document)?;
        let affected = self.vault.execute(&[
            Statement::delete(
                Table::DocumentCollections,
                Key::of(&[document.0, collection.0]),
            ),
            Statement::delete(
                Table::CollectionDocuments,
                Key::of(&[collection.0, document.0]),
            ),
        ])?;
        Ok(u64::from(affected > 0))
    }

    pub fn contains(&self, collection: CollectionId, document: DocumentId) -> Result<bool, SatchelError> {
        require_id(collection.0, ResourceKind::Collection)?;
        require_id(document.0, ResourceKind::Document)?;
        Ok(self.vault.store().contains(
            Table::CollectionDocuments,
            &Key::of(&[collection.0, document.0]),
        )?)
    }

    /// Collections a document belongs to.
    pub fn collections_of(&self, document: DocumentId) -> Result<Vec<CollectionId>, SatchelError> {
        require_id(document.0, ResourceKind::Document)?;
        Ok(self
            .vault
            .ids_under(Table::DocumentCollections, &Key::of(&[document.0]), 1)?
            .into_iter()
            .map(CollectionId)
            .collect())
    }

    pub fn documents_in(&self, collection: CollectionId) -> Result<Vec<DocumentId>, SatchelError> {
        self.get(collection)?;
        Ok(self
            .vault
            .ids_under(Table::CollectionDocuments, &Key::of(&[collection.0]), 1)?
            .into_iter()
            .map(DocumentId)
            .collect())
    }

    /// Add every document to every collection, one transaction per pair.
    pub fn add_to_multiple(
        &self,
        collections: &[CollectionId],
        documents: &[DocumentId],
    ) -> Result<usize, SatchelError> {
        let mut added = 0usize;
        for &collection in collections {
            added = added.saturating_add(self.add_documents_to(collection, documents)?);
        }
        Ok(added)
    }

    /// Add several documents to one collection, one transaction each.
    pub fn add_documents_to(
        &self,
        collection: CollectionId,
        documents: &[DocumentId],
    ) -> Result<usize, SatchelError> {
        for &document in documents {
            self.add(collection, document)?;
        }
        Ok(documents.len())
    }
}
