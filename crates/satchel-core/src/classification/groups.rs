//! Aspect groups: a forest of folders that aspects can be filed into.
//!
//! Sibling names are expected to be distinct, but this is advisory: callers
//! check with [`AspectGroups::exists_at_level`] before creating.

use crate::storage::{Key, Persistence, Sequence, Statement, Table, encode};
use crate::types::require_id;
use crate::vault::Vault;
use crate::{AspectGroup, AspectGroupId, AspectId, ResourceKind, SatchelError};

/// Handle to the aspect groups of one vault.
pub struct AspectGroups<'a, P: Persistence> {
    vault: &'a Vault<P>,
}

impl<'a, P: Persistence> AspectGroups<'a, P> {
    pub(crate) fn new(vault: &'a Vault<P>) -> Self {
        Self { vault }
    }

    /// Create a group under `parent` (`AspectGroupId::ROOT` for a top-level group).
    pub fn create(
        &self,
        parent: AspectGroupId,
        name: &str,
        description: &str,
    ) -> Result<AspectGroupId, SatchelError> {
        let config = self.vault.config();
        config.check_name("aspect group name", name)?;
        config.check_description("aspect group description", description)?;
        if !parent.is_root() {
            self.get(parent)?;
        }

        let id = AspectGroupId(self.vault.store().next_identifier(Sequence::AspectGroup)?);
        let group = AspectGroup {
            id,
            parent,
            name: name.to_string(),
            description: description.to_string(),
        };
        self.vault.execute(&[
            Statement::insert(Table::AspectGroups, Key::of(&[id.0]), encode(&group)?),
            Statement::link(Table::AspectGroupChildren, Key::of(&[parent.0, id.0])),
        ])?;
        tracing::debug!(group = %id, parent = %parent, name, "created aspect group");
        Ok(id)
    }

    /// Whether a direct child of `parent` is already called `name`.
    pub fn exists_at_level(&self, parent: AspectGroupId, name: &str) -> Result<bool, SatchelError> {
        Ok(self.children(parent)?.iter().any(|g| g.name == name))
    }

    pub fn get(&self, id: AspectGroupId) -> Result<AspectGroup, SatchelError> {
        require_id(id.0, ResourceKind::AspectGroup)?;
        self.vault.require(
            Table::AspectGroups,
            &Key::of(&[id.0]),
            ResourceKind::AspectGroup,
            id,
        )
    }

    /// Direct children of `parent`.
    pub fn children(&self, parent: AspectGroupId) -> Result<Vec<AspectGroup>, SatchelError> {
        self.vault
            .ids_under(Table::AspectGroupChildren, &Key::of(&[parent.0]), 1)?
            .into_iter()
            .map(|id| self.get(AspectGroupId(id)))
            .collect()
    }

    /// File an aspect into a group, or with `ROOT`, take it out of its group.
    pub fn assign_aspect(&self, aspect: AspectId, group: AspectGroupId) -> Result<(), SatchelError> {
        let mut record = self.vault.aspects().get(aspect)?;
        if !group.is_root() {
            self.get(group)?;
        }

        let mut statements = Vec::new();
        if let Some(old) = record.group {
            statements.push(Statement::delete(
                Table::AspectGroupMembers,
                Key::of(&[old.0, aspect.0]),
            ));
        }
        if group.is_root() {
            record.group = None;
        } else {
            record.group = Some(group);
            statements.push(Statement::link(
                Table::AspectGroupMembers,
                Key::of(&[group.0, aspect.0]),
            ));
        }
        statements.push(Statement::upsert(
            Table::Aspects,
            Key::of(&[aspect.0]),
            encode(&record)?,
        ));
        self.vault.execute(&statements)?;
        Ok(())
    }

    /// Aspects filed directly into `group`.
    pub fn aspects_in_group(&self, group: AspectGroupId) -> Result<Vec<AspectId>, SatchelError> {
        self.get(group)?;
        Ok(self
            .vault
            .ids_under(Table::AspectGroupMembers, &Key::of(&[group.0]), 1)?
            .into_iter()
            .map(AspectId)
            .collect())
    }

    /// Delete an empty group. A group with child groups or aspects is rejected.
    pub fn delete(&self, id: AspectGroupId) -> Result<(), SatchelError> {
        let group = self.get(id)?;
        if !self.children(id)?.is_empty() {
            return Err(SatchelError::InvalidArgument(format!(
                "aspect group {} has child groups",
                id
            )));
        }
        if !self.aspects_in_group(id)?.is_empty() {
            return Err(SatchelError::InvalidArgument(format!(
                "aspect group {} still holds aspects",
                id
            )));
        }
        self.vault.execute(&[
            Statement::delete(Table::AspectGroupChildren, Key::of(&[group.parent.0, id.0])),
            Statement::delete(Table::AspectGroups, Key::of(&[id.0])),
        ])?;
        tracing::debug!(group = %id, "deleted aspect group");
        Ok(())
    }
}
