//! # Persistence Port
//!
//! The transactional key/attribute store the vault runs on.
//!
//! Every table maps an order-preserving byte [`Key`] to a `postcard`-encoded
//! value. Mutations are expressed as typed [`Statement`]s and applied through
//! [`Persistence::execute`], which commits the whole slice atomically or not
//! at all. There is no query language and no string building: a statement is
//! its parameters.
//!
//! Two backends implement the port:
//! - [`MemoryStore`]: `BTreeMap` tables (fast, volatile)
//! - [`RedbStore`]: `redb` database (ACID, persistent)

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use thiserror::Error;

// =============================================================================
// TABLES
// =============================================================================

/// Every table the vault stores rows in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    /// doc -> DocumentRecord
    Documents,
    /// name -> AspectId
    AspectNames,
    /// aspect -> Aspect
    Aspects,
    /// group -> AspectGroup
    AspectGroups,
    /// (parent, group) -> ()
    AspectGroupChildren,
    /// (group, aspect) -> ()
    AspectGroupMembers,
    /// (doc, aspect) -> ()
    DocumentAspects,
    /// (aspect, doc) -> ()
    AspectDocuments,
    /// briefcase -> Briefcase
    Briefcases,
    /// name -> BriefcaseId
    BriefcaseNames,
    /// doc -> BriefcaseId
    DocumentBriefcase,
    /// (briefcase, doc) -> ()
    BriefcaseDocuments,
    /// collection -> Collection
    Collections,
    /// name -> CollectionId
    CollectionNames,
    /// (doc, collection) -> ()
    DocumentCollections,
    /// (collection, doc) -> ()
    CollectionDocuments,
    /// (type code, doc) -> ()
    Bookmarks,
    /// predicate -> Predicate
    Predicates,
    /// text -> PredicateId
    PredicateNames,
    /// (subject, object, predicate) -> ()
    Relations,
    /// (object, subject, predicate) -> ()
    RelationsByObject,
    /// (predicate, subject, object) -> ()
    RelationsByPredicate,
    /// (file, version) -> FileVersion
    FileVersions,
    /// file -> FileRecord
    Files,
    /// doc -> Note
    Notes,
    /// doc -> UrlRecord
    Urls,
    /// doc -> VCard
    VCards,
    /// doc -> SchemaFreeDoc
    SchemaFreeDocs,
    /// sequence name -> last issued id (u64 big-endian)
    Sequences,
}

impl Table {
    /// All tables, created up front by persistent backends.
    pub const ALL: [Self; 29] = [
        Self::Documents,
        Self::AspectNames,
        Self::Aspects,
        Self::AspectGroups,
        Self::AspectGroupChildren,
        Self::AspectGroupMembers,
        Self::DocumentAspects,
        Self::AspectDocuments,
        Self::Briefcases,
        Self::BriefcaseNames,
        Self::DocumentBriefcase,
        Self::BriefcaseDocuments,
        Self::Collections,
        Self::CollectionNames,
        Self::DocumentCollections,
        Self::CollectionDocuments,
        Self::Bookmarks,
        Self::Predicates,
        Self::PredicateNames,
        Self::Relations,
        Self::RelationsByObject,
        Self::RelationsByPredicate,
        Self::FileVersions,
        Self::Files,
        Self::Notes,
        Self::Urls,
        Self::VCards,
        Self::SchemaFreeDocs,
        Self::Sequences,
    ];

    /// On-disk table name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Documents => "documents",
            Self::AspectNames => "aspect_names",
            Self::Aspects => "aspects",
            Self::AspectGroups => "aspect_groups",
            Self::AspectGroupChildren => "aspect_group_children",
            Self::AspectGroupMembers => "aspect_group_members",
            Self::DocumentAspects => "document_aspects",
            Self::AspectDocuments => "aspect_documents",
            Self::Briefcases => "briefcases",
            Self::BriefcaseNames => "briefcase_names",
            Self::DocumentBriefcase => "document_briefcase",
            Self::BriefcaseDocuments => "briefcase_documents",
            Self::Collections => "collections",
            Self::CollectionNames => "collection_names",
            Self::DocumentCollections => "document_collections",
            Self::CollectionDocuments => "collection_documents",
            Self::Bookmarks => "bookmarks",
            Self::Predicates => "predicates",
            Self::PredicateNames => "predicate_names",
            Self::Relations => "relations",
            Self::RelationsByObject => "relations_by_object",
            Self::RelationsByPredicate => "relations_by_predicate",
            Self::FileVersions => "file_versions",
            Self::Files => "files",
            Self::Notes => "notes",
            Self::Urls => "urls",
            Self::VCards => "vcards",
            Self::SchemaFreeDocs => "schema_free_docs",
            Self::Sequences => "sequences",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// SEQUENCES
// =============================================================================

/// Surrogate identifier sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sequence {
    Document,
    Aspect,
    AspectGroup,
    Briefcase,
    Collection,
    Predicate,
}

impl Sequence {
    /// Key of the sequence row.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Aspect => "aspect",
            Self::AspectGroup => "aspect_group",
            Self::Briefcase => "briefcase",
            Self::Collection => "collection",
            Self::Predicate => "predicate",
        }
    }

    /// Last issued value before the first call. Briefcase 1 is the Global Briefcase.
    #[must_use]
    pub const fn floor(self) -> u64 {
        match self {
            Self::Briefcase => 1,
            _ => 0,
        }
    }
}

// =============================================================================
// KEYS
// =============================================================================

/// An order-preserving row key.
///
/// Identifier components are encoded big-endian so that byte order equals
/// numeric order, which makes `(a, *)` a contiguous prefix range.
/// Text components are NUL-terminated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Key(Vec<u8>);

impl Key {
    /// Empty key (the prefix of every row).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Key made of identifier components only.
    #[must_use]
    pub fn of(ids: &[u64]) -> Self {
        ids.iter().fold(Self::new(), |key, &id| key.id(id))
    }

    /// Key made of a single text component.
    #[must_use]
    pub fn name(text: &str) -> Self {
        Self::new().text(text)
    }

    /// Append an identifier component.
    #[must_use]
    pub fn id(mut self, id: u64) -> Self {
        self.0.extend_from_slice(&id.to_be_bytes());
        self
    }

    /// Append a text component.
    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.0.extend_from_slice(text.as_bytes());
        self.0.push(0);
        self
    }

    /// Rebuild a key read back from a backend.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decode the identifier component at `index`.
    ///
    /// Only meaningful for keys built from identifier components.
    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<u64> {
        let start = index.checked_mul(8)?;
        let bytes: [u8; 8] = self.0.get(start..start.checked_add(8)?)?.try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }

    /// Whether `prefix` is a byte prefix of this key.
    #[must_use]
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

// =============================================================================
// STATEMENTS & QUERIES
// =============================================================================

/// A parameterized mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Insert a new row. Fails with [`StorageError::Conflict`] if the key exists.
    Insert { table: Table, key: Key, value: Vec<u8> },
    /// Insert or overwrite a row.
    Upsert { table: Table, key: Key, value: Vec<u8> },
    /// Remove one row. Affects 0 rows if absent.
    Delete { table: Table, key: Key },
    /// Remove every row whose key starts with `prefix`.
    DeletePrefix { table: Table, prefix: Key },
}

impl Statement {
    pub fn insert(table: Table, key: Key, value: Vec<u8>) -> Self {
        Self::Insert { table, key, value }
    }

    pub fn upsert(table: Table, key: Key, value: Vec<u8>) -> Self {
        Self::Upsert { table, key, value }
    }

    /// Insert a join/index row that carries no payload.
    pub fn link(table: Table, key: Key) -> Self {
        Self::Upsert {
            table,
            key,
            value: Vec::new(),
        }
    }

    pub fn delete(table: Table, key: Key) -> Self {
        Self::Delete { table, key }
    }

    pub fn delete_prefix(table: Table, prefix: Key) -> Self {
        Self::DeletePrefix { table, prefix }
    }
}

/// A read against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// At most one row with exactly this key.
    Get { table: Table, key: Key },
    /// Every row whose key starts with `prefix`, in key order.
    Scan { table: Table, prefix: Key },
}

/// A row returned by a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: Key,
    pub value: Vec<u8>,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised by a persistence backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An `Insert` hit an existing key; the transaction was not committed.
    #[error("Row already exists in {0}")]
    Conflict(Table),

    /// The backend could not execute the request.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A stored value could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(String),
}

/// Convert any backend error into [`StorageError::Backend`].
pub(crate) fn backend(error: impl fmt::Display) -> StorageError {
    StorageError::Backend(error.to_string())
}

// =============================================================================
// CODEC
// =============================================================================

/// Encode a record for storage.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    postcard::to_allocvec(value).map_err(|e| StorageError::Codec(e.to_string()))
}

/// Decode a stored record.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    postcard::from_bytes(bytes).map_err(|e| StorageError::Codec(e.to_string()))
}

// =============================================================================
// PERSISTENCE TRAIT
// =============================================================================

/// The Persistence trait is the only way the vault touches storage.
///
/// `execute` is all-or-nothing: either every statement is applied and
/// committed, or none is. Reads are not transactional and see the latest
/// committed state.
pub trait Persistence {
    /// Apply `statements` in order inside one transaction.
    ///
    /// Returns the total number of rows affected.
    fn execute(&self, statements: &[Statement]) -> Result<u64, StorageError>;

    /// Run a read.
    fn query(&self, query: &Query) -> Result<Vec<Row>, StorageError>;

    /// Issue the next identifier of `sequence`. Never returns a value twice.
    fn next_identifier(&self, sequence: Sequence) -> Result<u64, StorageError>;

    /// Fetch the value stored under `key`.
    fn get(&self, table: Table, key: &Key) -> Result<Option<Vec<u8>>, StorageError> {
        let rows = self.query(&Query::Get {
            table,
            key: key.clone(),
        })?;
        Ok(rows.into_iter().next().map(|row| row.value))
    }

    /// Fetch every row under `prefix`.
    fn scan(&self, table: Table, prefix: &Key) -> Result<Vec<Row>, StorageError> {
        self.query(&Query::Scan {
            table,
            prefix: prefix.clone(),
        })
    }

    /// Whether a row exists under `key`.
    fn contains(&self, table: Table, key: &Key) -> Result<bool, StorageError> {
        Ok(self.get(table, key)?.is_some())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_order_matches_numeric_order() {
        assert!(Key::of(&[2, 1]) < Key::of(&[10, 0]));
        assert!(Key::of(&[1, u64::MAX]) < Key::of(&[2, 0]));
    }

    #[test]
    fn key_components_decode() {
        let key = Key::of(&[7, 42, 9]);
        assert_eq!(key.id_at(0), Some(7));
        assert_eq!(key.id_at(1), Some(42));
        assert_eq!(key.id_at(2), Some(9));
        assert_eq!(key.id_at(3), None);
    }

    #[test]
    fn key_prefix() {
        assert!(Key::of(&[3, 4]).starts_with(&Key::of(&[3])));
        assert!(!Key::of(&[4, 3]).starts_with(&Key::of(&[3])));
        assert!(Key::of(&[3]).starts_with(&Key::new()));
    }

    #[test]
    fn text_keys_do_not_prefix_each_other() {
        assert!(!Key::name("work").starts_with(&Key::name("wo")));
    }

    #[test]
    fn table_names_unique() {
        let names: std::collections::BTreeSet<_> = Table::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), Table::ALL.len());
    }

    #[test]
    fn briefcase_sequence_starts_after_global() {
        assert_eq!(Sequence::Briefcase.floor(), 1);
        assert_eq!(Sequence::Aspect.floor(), 0);
    }
}
