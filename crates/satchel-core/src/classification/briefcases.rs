//! Briefcases: exclusive containers. Every document is in exactly one.
//!
//! The Global Briefcase (id 1) is seeded by the vault, cannot be deleted or
//! renamed, and takes back every document whose briefcase goes away.

use super::rename_statements;
use crate::storage::{Key, Persistence, Sequence, Statement, Table, encode};
use crate::types::require_id;
use crate::vault::Vault;
use crate::{Briefcase, BriefcaseId, DocumentId, ResourceKind, SatchelError};

/// Handle to the briefcases of one vault.
pub struct Briefcases<'a, P: Persistence> {
    vault: &'a Vault<P>,
}

impl<'a, P: Persistence> Briefcases<'a, P> {
    pub(crate) fn new(vault: &'a Vault<P>) -> Self {
        Self { vault }
    }

    /// Create a briefcase. Names are unique across the vault.
    pub fn create(&self, name: &str, description: &str) -> Result<BriefcaseId, SatchelError> {
        let config = self.vault.config();
        config.check_name("briefcase name", name)?;
        config.check_description("briefcase description", description)?;
        if self.find_by_name(name)?.is_some() {
            return Err(SatchelError::DuplicateName(name.to_string()));
        }

        let id = BriefcaseId(self.vault.store().next_identifier(Sequence::Briefcase)?);
        let briefcase = Briefcase {
            id,
            name: name.to_string(),
            description: description.to_string(),
        };
        self.vault.execute_unique(
            &[
                Statement::insert(Table::BriefcaseNames, Key::name(name), encode(&id)?),
                Statement::insert(Table::Briefcases, Key::of(&[id.0]), encode(&briefcase)?),
            ],
            name,
        )?;
        tracing::debug!(briefcase = %id, name, "created briefcase");
        Ok(id)
    }

    pub fn get(&self, id: BriefcaseId) -> Result<Briefcase, SatchelError> {
        require_id(id.0, ResourceKind::Briefcase)?;
        self.vault.require(
            Table::Briefcases,
            &Key::of(&[id.0]),
            ResourceKind::Briefcase,
            id,
        )
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<BriefcaseId>, SatchelError> {
        self.vault.fetch(Table::BriefcaseNames, &Key::name(name))
    }

    /// All briefcases, Global first.
    pub fn list(&self) -> Result<Vec<Briefcase>, SatchelError> {
        self.vault.fetch_all(Table::Briefcases, &Key::new())
    }

    pub fn rename(&self, id: BriefcaseId, name: &str) -> Result<(), SatchelError> {
        if id.is_global() {
            return Err(SatchelError::InvalidArgument(
                "the Global Briefcase cannot be renamed".to_string(),
            ));
        }
        self.vault.config().check_name("briefcase name", name)?;
        let mut briefcase = self.get(id)?;
        if briefcase.name == name {
            return Ok(());
        }
        let mut statements =
            rename_statements(Table::BriefcaseNames, &briefcase.name, name, &id)?;
        briefcase.name = name.to_string();
        statements.push(Statement::upsert(
            Table::Briefcases,
            Key::of(&[id.0]),
            encode(&briefcase)?,
        ));
        self.vault.execute_unique(&statements, name)?;
        Ok(())
    }

    /// Delete a briefcase. Its documents move to the Global Briefcase.
    pub fn delete(&self, id: BriefcaseId) -> Result<(), SatchelError> {
        if id.is_global() {
            return Err(SatchelError::InvalidArgument(
                "the Global Briefcase cannot be deleted".to_string(),
            ));
        }
        let briefcase = self.get(id)?;

        let documents = self
            .vault
            .ids_under(Table::BriefcaseDocuments, &Key::of(&[id.0]), 1)?;
        let mut statements = Vec::with_capacity(documents.len().saturating_mul(2).saturating_add(3));
        for doc in &documents {
            statements.push(Statement::upsert(
                Table::DocumentBriefcase,
                Key::of(&[*doc]),
                encode(&BriefcaseId::GLOBAL)?,
            ));
            statements.push(Statement::link(
                Table::BriefcaseDocuments,
                Key::of(&[BriefcaseId::GLOBAL.0, *doc]),
            ));
        }
        statements.push(Statement::delete_prefix(
            Table::BriefcaseDocuments,
            Key::of(&[id.0]),
        ));
        statements.push(Statement::delete(
            Table::BriefcaseNames,
            Key::name(&briefcase.name),
        ));
        statements.push(Statement::delete(Table::Briefcases, Key::of(&[id.0])));

        self.vault.execute(&statements)?;
        tracing::debug!(briefcase = %id, moved = documents.len(), "deleted briefcase");
        Ok(())
    }

    // =========================================================================
    // MEMBERSHIP
    // =========================================================================

    /// Move a document into a briefcase, leaving whichever one held it.
    pub fn move_to_briefcase(
        &self,
        document: DocumentId,
        briefcase: BriefcaseId,
    ) -> Result<(), SatchelError> {
        require_id(document.0, ResourceKind::Document)?;
        require_id(briefcase.0, ResourceKind::Briefcase)?;
        let current = self.containing_briefcase(document)?;
        self.get(briefcase)?;
        if current == briefcase {
            return Ok(());
        }
        self.vault.execute(&[
            Statement::delete(
                Table::BriefcaseDocuments,
                Key::of(&[current.0, document.0]),
            ),
            Statement::upsert(
                Table::DocumentBriefcase,
                Key::of(&[document.0]),
                encode(&briefcase)?,
            ),
            Statement::link(
                Table::BriefcaseDocuments,
                Key::of(&[briefcase.0, document.0]),
            ),
        ])?;
        tracing::debug!(document = %document, from = %current, to = %briefcase, "moved document");
        Ok(())
    }

    /// Send a document back to the Global Briefcase.
    pub fn remove_from_briefcase(&self, document: DocumentId) -> Result<(), SatchelError> {
        self.move_to_briefcase(document, BriefcaseId::GLOBAL)
    }

    /// The briefcase currently holding a document.
    pub fn containing_briefcase(&self, document: DocumentId) -> Result<BriefcaseId, SatchelError> {
        self.vault.registry().get(document)?;
        Ok(self
            .vault
            .fetch(Table::DocumentBriefcase, &Key::of(&[document.0]))?
            .unwrap_or(BriefcaseId::GLOBAL))
    }

    pub fn documents_in(&self, briefcase: BriefcaseId) -> Result<Vec<DocumentId>, SatchelError> {
        self.get(briefcase)?;
        Ok(self
            .vault
            .ids_under(Table::BriefcaseDocuments, &Key::of(&[briefcase.0]), 1)?
            .into_iter()
            .map(DocumentId)
            .collect())
    }

    /// Move several documents, one transaction each.
    ///
    /// Stops at the first failure; documents moved before it stay moved.
    pub fn move_documents(
        &self,
        documents: &[DocumentId],
        briefcase: BriefcaseId,
    ) -> Result<usize, SatchelError> {
        for (moved, &document) in documents.iter().enumerate() {
            if let Err(e) = self.move_to_briefcase(document, briefcase) {
                tracing::warn!(document = %document, moved, error = %e, "bulk move stopped");
                return Err(e);
            }
        }
        Ok(documents.len())
    }
}

#[cfg(test)]
mod tests {
    use crate::{BriefcaseId, DocumentId, MemoryStore, Note, SatchelError, Vault};

    fn setup() -> (Vault<MemoryStore>, DocumentId) {
        let vault = Vault::in_memory().expect("vault");
        let doc = vault.documents().new_note(&Note::default()).expect("note");
        (vault, doc)
    }

    #[test]
    fn zero_briefcase_rejected_before_lookup() {
        let (vault, _) = setup();
        assert!(matches!(
            vault.briefcases().move_to_briefcase(DocumentId(99), BriefcaseId(0)),
            Err(SatchelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn first_user_briefcase_gets_id_two() {
        let (vault, _) = setup();
        assert_eq!(vault.briefcases().create("Work", "").expect("create"), BriefcaseId(2));
    }

    #[test]
    fn global_cannot_be_deleted_or_renamed() {
        let (vault, _) = setup();
        assert!(matches!(
            vault.briefcases().delete(BriefcaseId::GLOBAL),
            Err(SatchelError::InvalidArgument(_))
        ));
        assert!(matches!(
            vault.briefcases().rename(BriefcaseId::GLOBAL, "Other"),
            Err(SatchelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn global_name_is_taken() {
        let (vault, _) = setup();
        assert!(matches!(
            vault.briefcases().create("Global", ""),
            Err(SatchelError::DuplicateName(_))
        ));
    }

    #[test]
    fn move_is_exclusive() {
        let (vault, doc) = setup();
        let work = vault.briefcases().create("Work", "").expect("work");
        let home = vault.briefcases().create("Home", "").expect("home");

        vault.briefcases().move_to_briefcase(doc, work).expect("move");
        vault.briefcases().move_to_briefcase(doc, home).expect("move");

        assert_eq!(vault.briefcases().containing_briefcase(doc).expect("bc"), home);
        assert!(vault.briefcases().documents_in(work).expect("work").is_empty());
        assert!(vault
            .briefcases()
            .documents_in(BriefcaseId::GLOBAL)
            .expect("global")
            .is_empty());
        assert_eq!(vault.briefcases().documents_in(home).expect("home"), vec![doc]);
    }

    #[test]
    fn delete_returns_documents_to_global() {
        let (vault, doc) = setup();
        let work = vault.briefcases().create("Work", "").expect("work");
        vault.briefcases().move_to_briefcase(doc, work).expect("move");

        vault.briefcases().delete(work).expect("delete");

        assert_eq!(
            vault.briefcases().containing_briefcase(doc).expect("bc"),
            BriefcaseId::GLOBAL
        );
        assert!(vault.briefcases().find_by_name("Work").expect("find").is_none());
        assert!(matches!(
            vault.briefcases().get(work),
            Err(SatchelError::NonExistentResource { .. })
        ));
    }

    #[test]
    fn remove_from_briefcase_goes_global() {
        let (vault, doc) = setup();
        let work = vault.briefcases().create("Work", "").expect("work");
        vault.briefcases().move_to_briefcase(doc, work).expect("move");

        vault.briefcases().remove_from_briefcase(doc).expect("remove");

        assert_eq!(
            vault.briefcases().containing_briefcase(doc).expect("bc"),
            BriefcaseId::GLOBAL
        );
    }

    #[test]
    fn move_documents_stops_at_missing_document() {
        let (vault, doc) = setup();
        let work = vault.briefcases().create("Work", "").expect("work");

        let result = vault
            .briefcases()
            .move_documents(&[doc, DocumentId(404)], work);

        assert!(result.is_err());
        assert_eq!(vault.briefcases().containing_briefcase(doc).expect("bc"), work);
    }
}
