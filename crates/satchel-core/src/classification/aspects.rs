//! Aspects: user-defined tags applied to documents many-to-many.

use super::rename_statements;
use crate::storage::{Key, Persistence, Sequence, Statement, Table, encode};
use crate::types::require_id;
use crate::vault::Vault;
use crate::{Aspect, AspectId, DocumentId, ResourceKind, SatchelError};

/// Handle to the aspects of one vault.
pub struct Aspects<'a, P: Persistence> {
    vault: &'a Vault<P>,
}

impl<'a, P: Persistence> Aspects<'a, P> {
    pub(crate) fn new(vault: &'a Vault<P>) -> Self {
        Self { vault }
    }

    /// Create an aspect. Names are unique across the vault.
    pub fn create(&self, name: &str, description: &str) -> Result<AspectId, SatchelError> {
        let config = self.vault.config();
        config.check_name("aspect name", name)?;
        config.check_description("aspect description", description)?;
        if self.find_by_name(name)?.is_some() {
            return Err(SatchelError::DuplicateName(name.to_string()));
        }

        let id = AspectId(self.vault.store().next_identifier(Sequence::Aspect)?);
        let aspect = Aspect {
            id,
            name: name.to_string(),
            description: description.to_string(),
            group: None,
        };
        self.vault.execute_unique(
            &[
                Statement::insert(Table::AspectNames, Key::name(name), encode(&id)?),
                Statement::insert(Table::Aspects, Key::of(&[id.0]), encode(&aspect)?),
            ],
            name,
        )?;
        tracing::debug!(aspect = %id, name, "created aspect");
        Ok(id)
    }

    pub fn get(&self, id: AspectId) -> Result<Aspect, SatchelError> {
        require_id(id.0, ResourceKind::Aspect)?;
        self.vault
            .require(Table::Aspects, &Key::of(&[id.0]), ResourceKind::Aspect, id)
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<AspectId>, SatchelError> {
        self.vault.fetch(Table::AspectNames, &Key::name(name))
    }

    /// All aspects in identifier order.
    pub fn list(&self) -> Result<Vec<Aspect>, SatchelError> {
        self.vault.fetch_all(Table::Aspects, &Key::new())
    }

    pub fn rename(&self, id: AspectId, name: &str) -> Result<(), SatchelError> {
        self.vault.config().check_name("aspect name", name)?;
        let mut aspect = self.get(id)?;
        if aspect.name == name {
            return Ok(());
        }
        let mut statements = rename_statements(Table::AspectNames, &aspect.name, name, &id)?;
        aspect.name = name.to_string();
        statements.push(Statement::upsert(
            Table::Aspects,
            Key::of(&[id.0]),
            encode(&aspect)?,
        ));
        self.vault.execute_unique(&statements, name)?;
        tracing::debug!(aspect = %id, name, "renamed aspect");
        Ok(())
    }

    pub fn set_description(&self, id: AspectId, description: &str) -> Result<(), SatchelError> {
        self.vault
            .config()
            .check_description("aspect description", description)?;
        let mut aspect = self.get(id)?;
        aspect.description = description.to_string();
        self.vault.execute(&[Statement::upsert(
            Table::Aspects,
            Key::of(&[id.0]),
            encode(&aspect)?,
        )])?;
        Ok(())
    }

    /// Delete an aspect together with every document join and its group membership.
    pub fn delete(&self, id: AspectId) -> Result<(), SatchelError> {
        let aspect = self.get(id)?;

        let mut statements: Vec<Statement> = self
            .vault
            .ids_under(Table::AspectDocuments, &Key::of(&[id.0]), 1)?
            .into_iter()
            .map(|doc| Statement::delete(Table::DocumentAspects, Key::of(&[doc, id.0])))
            .collect();
        statements.push(Statement::delete_prefix(
            Table::AspectDocuments,
            Key::of(&[id.0]),
        ));
        if let Some(group) = aspect.group {
            statements.push(Statement::delete(
                Table::AspectGroupMembers,
                Key::of(&[group.0, id.0]),
            ));
        }
        statements.push(Statement::delete(Table::AspectNames, Key::name(&aspect.name)));
        statements.push(Statement::delete(Table::Aspects, Key::of(&[id.0])));

        let affected = self.vault.execute(&statements)?;
        tracing::debug!(aspect = %id, affected, "deleted aspect");
        Ok(())
    }

    // =========================================================================
    // DOCUMENT JOINS
    // =========================================================================

    /// Tag a document. Re-applying an existing aspect is a no-op success.
    pub fn apply(&self, aspect: AspectId, document: DocumentId) -> Result<(), SatchelError> {
        require_id(aspect.0, ResourceKind::Aspect)?;
        require_id(document.0, ResourceKind::Document)?;
        self.get(aspect)?;
        self.vault.registry().get(document)?;
        self.vault.execute(&[
            Statement::link(Table::DocumentAspects, Key::of(&[document.0, aspect.0])),
            Statement::link(Table::AspectDocuments, Key::of(&[aspect.0, document.0])),
        ])?;
        tracing::debug!(aspect = %aspect, document = %document, "applied aspect");
        Ok(())
    }

    /// Untag a document. Returns the number of joins removed (0 if it was not tagged).
    pub fn unapply(&self, aspect: AspectId, document: DocumentId) -> Result<u64, SatchelError> {
        require_id(aspect.0, ResourceKind::Aspect)?;
        require_id(document.0, ResourceKind::Document)?;
        let affected = self.vault.execute(&[
            Statement::delete(Table::DocumentAspects, Key::of(&[document.0, aspect.0])),
            Statement::delete(Table::AspectDocuments, Key::of(&[aspect.0, document.0])),
        ])?;
        Ok(u64::from(affected > 0))
    }

    pub fn is_applied(&self, aspect: AspectId, document: DocumentId) -> Result<bool, SatchelError> {
        require_id(aspect.0, ResourceKind::Aspect)?;
        require_id(document.0, ResourceKind::Document)?;
        Ok(self.vault.store().contains(
            Table::DocumentAspects,
            &Key::of(&[document.0, aspect.0]),
        )?)
    }

    /// Aspects carried by a document.
    pub fn aspects_on(&self, document: DocumentId) -> Result<Vec<AspectId>, SatchelError> {
        require_id(document.0, ResourceKind::Document)?;
        Ok(self
            .vault
            .ids_under(Table::DocumentAspects, &Key::of(&[document.0]), 1)?
            .into_iter()
            .map(AspectId)
            .collect())
    }

    /// Documents tagged with an aspect.
    pub fn documents_with(&self, aspect: AspectId) -> Result<Vec<DocumentId>, SatchelError> {
        require_id(aspect.0, ResourceKind::Aspect)?;
        Ok(self
            .vault
            .ids_under(Table::AspectDocuments, &Key::of(&[aspect.0]), 1)?
            .into_iter()
            .map(DocumentId)
            .collect())
    }

    /// Apply every aspect to every document, one transaction per pair.
    ///
    /// Stops at the first failure; pairs applied before it stay applied.
    pub fn apply_to_multiple(
        &self,
        aspects: &[AspectId],
        documents: &[DocumentId],
    ) -> Result<usize, SatchelError> {
        let mut applied = 0usize;
        for &aspect in aspects {
            for &document in documents {
                self.apply(aspect, document)?;
                applied = applied.saturating_add(1);
            }
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use crate::{AspectId, DocumentId, MemoryStore, Note, SatchelError, Vault};

    fn setup() -> (Vault<MemoryStore>, DocumentId) {
        let vault = Vault::in_memory().expect("vault");
        let doc = vault
            .documents()
            .new_note(&Note::default())
            .expect("note");
        (vault, doc)
    }

    #[test]
    fn zero_ids_rejected_before_lookup() {
        let (vault, _) = setup();
        assert!(matches!(
            vault.aspects().apply(AspectId(99), DocumentId(0)),
            Err(SatchelError::InvalidArgument(_))
        ));
        assert!(matches!(
            vault.aspects().is_applied(AspectId(0), DocumentId(99)),
            Err(SatchelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn create_rejects_duplicate_name() {
        let (vault, _) = setup();
        vault.aspects().create("urgent", "").expect("create");
        assert!(matches!(
            vault.aspects().create("urgent", "again"),
            Err(SatchelError::DuplicateName(_))
        ));
    }

    #[test]
    fn create_rejects_empty_and_oversize() {
        let (vault, _) = setup();
        assert!(matches!(
            vault.aspects().create("", ""),
            Err(SatchelError::InvalidArgument(_))
        ));
        let long = "x".repeat(vault.config().max_name_length + 1);
        assert!(matches!(
            vault.aspects().create(&long, ""),
            Err(SatchelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn apply_and_unapply_update_both_directions() {
        let (vault, doc) = setup();
        let aspect = vault.aspects().create("tax", "").expect("create");

        vault.aspects().apply(aspect, doc).expect("apply");
        assert_eq!(vault.aspects().documents_with(aspect).expect("docs"), vec![doc]);
        assert_eq!(vault.aspects().aspects_on(doc).expect("aspects"), vec![aspect]);

        assert_eq!(vault.aspects().unapply(aspect, doc).expect("unapply"), 1);
        assert!(vault.aspects().documents_with(aspect).expect("docs").is_empty());
        assert!(vault.aspects().aspects_on(doc).expect("aspects").is_empty());
    }

    #[test]
    fn reapply_is_noop_and_reunapply_returns_zero() {
        let (vault, doc) = setup();
        let aspect = vault.aspects().create("tax", "").expect("create");

        vault.aspects().apply(aspect, doc).expect("apply");
        vault.aspects().apply(aspect, doc).expect("reapply");
        assert_eq!(vault.aspects().documents_with(aspect).expect("docs").len(), 1);

        assert_eq!(vault.aspects().unapply(aspect, doc).expect("unapply"), 1);
        assert_eq!(vault.aspects().unapply(aspect, doc).expect("unapply"), 0);
    }

    #[test]
    fn apply_missing_aspect_fails() {
        let (vault, doc) = setup();
        assert!(matches!(
            vault.aspects().apply(AspectId(99), doc),
            Err(SatchelError::NonExistentResource { .. })
        ));
    }

    #[test]
    fn delete_cascades_to_joins_and_frees_name() {
        let (vault, doc) = setup();
        let aspect = vault.aspects().create("tax", "").expect("create");
        vault.aspects().apply(aspect, doc).expect("apply");

        vault.aspects().delete(aspect).expect("delete");

        assert!(vault.aspects().aspects_on(doc).expect("aspects").is_empty());
        assert!(vault.aspects().find_by_name("tax").expect("find").is_none());
        vault.aspects().create("tax", "").expect("name is free again");
    }

    #[test]
    fn rename_checks_uniqueness() {
        let (vault, _) = setup();
        let a = vault.aspects().create("a", "").expect("create");
        vault.aspects().create("b", "").expect("create");

        assert!(matches!(
            vault.aspects().rename(a, "b"),
            Err(SatchelError::DuplicateName(_))
        ));
        vault.aspects().rename(a, "c").expect("rename");
        assert_eq!(vault.aspects().find_by_name("c").expect("find"), Some(a));
        assert!(vault.aspects().find_by_name("a").expect("find").is_none());
    }

    #[test]
    fn apply_to_multiple_covers_cross_product() {
        let (vault, doc) = setup();
        let other = vault.documents().new_note(&Note::default()).expect("note");
        let a = vault.aspects().create("a", "").expect("create");
        let b = vault.aspects().create("b", "").expect("create");

        let applied = vault
            .aspects()
            .apply_to_multiple(&[a, b], &[doc, other])
            .expect("bulk");

        assert_eq!(applied, 4);
        assert_eq!(vault.aspects().aspects_on(other).expect("aspects"), vec![a, b]);
    }

    #[test]
    fn apply_to_multiple_keeps_earlier_pairs_on_failure() {
        let (vault, doc) = setup();
        let a = vault.aspects().create("a", "").expect("create");

        let result = vault
            .aspects()
            .apply_to_multiple(&[a, AspectId(77)], &[doc]);

        assert!(result.is_err());
        assert!(vault.aspects().is_applied(a, doc).expect("applied"));
    }
}
