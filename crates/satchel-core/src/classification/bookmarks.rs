//! Bookmarks: a per-type favourites list. Only files, notes and URLs qualify.

use crate::storage::{Key, Persistence, Statement, Table};
use crate::vault::Vault;
use crate::{DocumentId, DocumentType, SatchelError};

pub struct Bookmarks<'a, P: Persistence> {
    vault: &'a Vault<P>,
}

fn require_bookmarkable(doc_type: DocumentType) -> Result<(), SatchelError> {
    if !doc_type.is_bookmarkable() {
        return Err(SatchelError::InvalidArgument(format!(
            "{} documents cannot be bookmarked",
            doc_type
        )));
    }
    Ok(())
}

impl<'a, P: Persistence> Bookmarks<'a, P> {
    pub(crate) fn new(vault: &'a Vault<P>) -> Self {
        Self { vault }
    }

    pub fn bookmark(&self, document: DocumentId) -> Result<(), SatchelError> {
        let doc_type = self.vault.registry().document_type(document)?;
        require_bookmarkable(doc_type)?;
        self.vault.execute(&[Statement::link(
            Table::Bookmarks,
            Key::of(&[doc_type.code(), document.0]),
        )])?;
        Ok(())
    }

    /// Returns the number of bookmarks removed.
    pub fn unbookmark(&self, document: DocumentId) -> Result<u64, SatchelError> {
        let doc_type = self.vault.registry().document_type(document)?;
        self.vault.execute(&[Statement::delete(
            Table::Bookmarks,
            Key::of(&[doc_type.code(), document.0]),
        )])
    }

    pub fn is_bookmarked(&self, document: DocumentId) -> Result<bool, SatchelError> {
        let doc_type = self.vault.registry().document_type(document)?;
        Ok(self
            .vault
            .store()
            .contains(Table::Bookmarks, &Key::of(&[doc_type.code(), document.0]))?)
    }

    /// Bookmarked documents of one type.
    pub fn bookmarked(&self, doc_type: DocumentType) -> Result<Vec<DocumentId>, SatchelError> {
        require_bookmarkable(doc_type)?;
        Ok(self
            .vault
            .ids_under(Table::Bookmarks, &Key::of(&[doc_type.code()]), 1)?
            .into_iter()
            .map(DocumentId)
            .collect())
    }
}
