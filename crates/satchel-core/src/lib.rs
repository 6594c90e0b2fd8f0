//! # satchel-core
//!
//! The document vault engine for Satchel.
//!
//! A vault holds a user's documents (files, notes, URLs, vCards and
//! schema-free property bags) and the ways they are organised:
//! - aspects (tags) filed into aspect groups
//! - briefcases (exclusive containers, with the Global Briefcase as default)
//! - collections (non-exclusive groupings) and bookmarks
//! - directed relations between documents
//! - file version history and duplicate detection
//!
//! ## Architectural Constraints
//!
//! - Synchronous: no async, no network dependencies
//! - Every mutation, cascades included, is one transaction through the
//!   [`Persistence`] port
//! - No process-wide state: every store is a handle borrowed from a [`Vault`]

// =============================================================================
// MODULES
// =============================================================================

pub mod classification;
pub mod config;
pub mod content;
pub mod documents;
pub mod duplicates;
pub mod files;
pub mod filter;
pub mod indexer;
pub mod primitives;
pub mod registry;
pub mod relations;
pub mod storage;
pub mod types;
pub mod vault;
pub mod versions;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Aspect, AspectGroup, AspectGroupId, AspectId, Briefcase, BriefcaseId, Collection,
    CollectionId, DocumentId, DocumentRecord, DocumentType, FileRecord, FileVersion, Note,
    Predicate, PredicateId, Relation, ResourceKind, SatchelError, SchemaFreeDoc, UrlRecord, VCard,
};

// =============================================================================
// RE-EXPORTS: Stores
// =============================================================================

pub use classification::{AspectGroups, Aspects, Bookmarks, Briefcases, Collections};
pub use documents::{DocumentContent, Documents};
pub use duplicates::{DuplicateDetector, SimilarityScore};
pub use files::{Bytestream, content_hash};
pub use registry::DocumentRegistry;
pub use relations::Relations;
pub use vault::Vault;
pub use versions::Versions;

// =============================================================================
// RE-EXPORTS: Ports & Backends
// =============================================================================

pub use config::VaultConfig;
pub use content::{ContentError, ContentStorage, DirectoryContentStorage, MemoryContentStorage};
pub use indexer::{DocumentChange, IndexError, Indexer, NoopIndexer, TracingIndexer};
pub use storage::{MemoryStore, Persistence, RedbStore, StorageError};
