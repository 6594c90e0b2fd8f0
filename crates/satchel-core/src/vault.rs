//! # Vault
//!
//! The session object for one user's document store.
//!
//! A `Vault` owns the persistence backend, the limits, and the two external
//! collaborators (content storage and indexer). Every store is a cheap handle
//! borrowed from it, so there is no process-wide state: two vaults never share
//! anything.
//!
//! ## Storage Backends
//!
//! - `Vault<MemoryStore>`: volatile, via [`Vault::in_memory`]
//! - `Vault<RedbStore>`: persistent, via [`Vault::open`]

use crate::classification::{AspectGroups, Aspects, Bookmarks, Briefcases, Collections};
use crate::config::VaultConfig;
use crate::content::{ContentStorage, MemoryContentStorage};
use crate::documents::Documents;
use crate::duplicates::DuplicateDetector;
use crate::files::Bytestream;
use crate::indexer::{DocumentChange, Indexer, NoopIndexer};
use crate::primitives::{GLOBAL_BRIEFCASE_DESCRIPTION, GLOBAL_BRIEFCASE_NAME};
use crate::registry::DocumentRegistry;
use crate::relations::Relations;
use crate::storage::{
    Key, MemoryStore, Persistence, RedbStore, Statement, StorageError, Table, decode, encode,
};
use crate::versions::Versions;
use crate::{Briefcase, BriefcaseId, DocumentId, ResourceKind, SatchelError};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;

/// One user's document vault.
pub struct Vault<P: Persistence> {
    store: P,
    config: VaultConfig,
    content: Box<dyn ContentStorage>,
    indexer: Box<dyn Indexer>,
}

impl<P: Persistence> fmt::Debug for Vault<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Vault<MemoryStore> {
    /// Create a volatile vault with default limits.
    pub fn in_memory() -> Result<Self, SatchelError> {
        Self::new(MemoryStore::new(), VaultConfig::default())
    }
}

impl Vault<RedbStore> {
    /// Open or create a persistent vault at the given path.
    pub fn open(path: impl AsRef<Path>, config: VaultConfig) -> Result<Self, SatchelError> {
        let store = RedbStore::open(path)?;
        Self::new(store, config)
    }
}

impl<P: Persistence> Vault<P> {
    /// Wrap a persistence backend.
    ///
    /// Seeds the Global Briefcase on first use. Content goes to memory and
    /// index notifications are dropped until replaced with
    /// [`Vault::with_content_storage`] and [`Vault::with_indexer`].
    pub fn new(store: P, config: VaultConfig) -> Result<Self, SatchelError> {
        let vault = Self {
            store,
            config,
            content: Box::new(MemoryContentStorage::new()),
            indexer: Box::new(NoopIndexer),
        };
        vault.bootstrap()?;
        Ok(vault)
    }

    /// Replace the content storage collaborator.
    #[must_use]
    pub fn with_content_storage(mut self, content: impl ContentStorage + 'static) -> Self {
        self.content = Box::new(content);
        self
    }

    /// Replace the indexing collaborator.
    #[must_use]
    pub fn with_indexer(mut self, indexer: impl Indexer + 'static) -> Self {
        self.indexer = Box::new(indexer);
        self
    }

    fn bootstrap(&self) -> Result<(), SatchelError> {
        let global = Key::of(&[BriefcaseId::GLOBAL.0]);
        if self.store.contains(Table::Briefcases, &global)? {
            return Ok(());
        }
        let record = Briefcase {
            id: BriefcaseId::GLOBAL,
            name: GLOBAL_BRIEFCASE_NAME.to_string(),
            description: GLOBAL_BRIEFCASE_DESCRIPTION.to_string(),
        };
        self.store.execute(&[
            Statement::upsert(Table::Briefcases, global, encode(&record)?),
            Statement::upsert(
                Table::BriefcaseNames,
                Key::name(GLOBAL_BRIEFCASE_NAME),
                encode(&BriefcaseId::GLOBAL)?,
            ),
        ])?;
        tracing::debug!("seeded global briefcase");
        Ok(())
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// The persistence backend.
    pub fn store(&self) -> &P {
        &self.store
    }

    /// The active limits.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// The content storage collaborator.
    pub fn content(&self) -> &dyn ContentStorage {
        self.content.as_ref()
    }

    // =========================================================================
    // STORE HANDLES
    // =========================================================================

    pub fn registry(&self) -> DocumentRegistry<'_, P> {
        DocumentRegistry::new(self)
    }

    pub fn aspects(&self) -> Aspects<'_, P> {
        Aspects::new(self)
    }

    pub fn aspect_groups(&self) -> AspectGroups<'_, P> {
        AspectGroups::new(self)
    }

    pub fn briefcases(&self) -> Briefcases<'_, P> {
        Briefcases::new(self)
    }

    pub fn collections(&self) -> Collections<'_, P> {
        Collections::new(self)
    }

    pub fn bookmarks(&self) -> Bookmarks<'_, P> {
        Bookmarks::new(self)
    }

    pub fn relations(&self) -> Relations<'_, P> {
        Relations::new(self)
    }

    pub fn versions(&self) -> Versions<'_, P> {
        Versions::new(self)
    }

    pub fn files(&self) -> Bytestream<'_, P> {
        Bytestream::new(self)
    }

    pub fn documents(&self) -> Documents<'_, P> {
        Documents::new(self)
    }

    pub fn duplicates(&self) -> DuplicateDetector<'_, P> {
        DuplicateDetector::new(self)
    }

    // =========================================================================
    // SHARED HELPERS
    // =========================================================================

    /// Execute statements in one transaction.
    pub(crate) fn execute(&self, statements: &[Statement]) -> Result<u64, SatchelError> {
        Ok(self.store.execute(statements)?)
    }

    /// Execute statements, reporting an `Insert` conflict as `DuplicateName`.
    pub(crate) fn execute_unique(
        &self,
        statements: &[Statement],
        name: &str,
    ) -> Result<u64, SatchelError> {
        match self.store.execute(statements) {
            Err(StorageError::Conflict(_)) => Err(SatchelError::DuplicateName(name.to_string())),
            other => Ok(other?),
        }
    }

    /// Load and decode a record, if present.
    pub(crate) fn fetch<T: DeserializeOwned>(
        &self,
        table: Table,
        key: &Key,
    ) -> Result<Option<T>, SatchelError> {
        match self.store.get(table, key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load and decode a record, failing with `NonExistentResource` if absent.
    pub(crate) fn require<T: DeserializeOwned>(
        &self,
        table: Table,
        key: &Key,
        kind: ResourceKind,
        id: impl fmt::Display,
    ) -> Result<T, SatchelError> {
        self.fetch(table, key)?
            .ok_or_else(|| SatchelError::missing(kind, id))
    }

    /// Decode every row under `prefix`.
    pub(crate) fn fetch_all<T: DeserializeOwned>(
        &self,
        table: Table,
        prefix: &Key,
    ) -> Result<Vec<T>, SatchelError> {
        self.store
            .scan(table, prefix)?
            .iter()
            .map(|row| decode(&row.value).map_err(SatchelError::from))
            .collect()
    }

    /// Collect the identifier component at `index` of every key under `prefix`.
    pub(crate) fn ids_under(
        &self,
        table: Table,
        prefix: &Key,
        index: usize,
    ) -> Result<Vec<u64>, SatchelError> {
        Ok(self
            .store
            .scan(table, prefix)?
            .iter()
            .filter_map(|row| row.key.id_at(index))
            .collect())
    }

    /// Pass a committed change to the indexer. Failures are logged only.
    pub(crate) fn notify(&self, document: DocumentId, change: DocumentChange) {
        if let Err(e) = self.indexer.notify(document, change) {
            tracing::warn!(document = %document, ?change, error = %e, "indexer notification failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::IndexError;

    struct FailingIndexer;

    impl Indexer for FailingIndexer {
        fn notify(&self, _: DocumentId, _: DocumentChange) -> Result<(), IndexError> {
            Err(IndexError("offline".to_string()))
        }
    }

    #[test]
    fn global_briefcase_seeded() {
        let vault = Vault::in_memory().expect("vault");
        let global = vault.briefcases().get(BriefcaseId::GLOBAL).expect("global");
        assert_eq!(global.name, GLOBAL_BRIEFCASE_NAME);
    }

    #[test]
    fn bootstrap_is_idempotent() {
        let vault = Vault::in_memory().expect("vault");
        vault.bootstrap().expect("second bootstrap");
        assert_eq!(vault.briefcases().list().expect("list").len(), 1);
    }

    #[test]
    fn indexer_failure_does_not_fail_operation() {
        let vault = Vault::in_memory()
            .expect("vault")
            .with_indexer(FailingIndexer);
        let note = vault
            .documents()
            .new_note(&crate::Note {
                title: "t".into(),
                body: "b".into(),
            })
            .expect("note survives indexer failure");
        assert!(vault.registry().exists(note).expect("exists"));
    }
}
