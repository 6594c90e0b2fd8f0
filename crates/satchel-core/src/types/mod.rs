//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the vault:
//! - Identifiers (`DocumentId`, `AspectId`, `BriefcaseId`, ...)
//! - The document type tag (`DocumentType`)
//! - Entity records persisted by the stores
//! - Error types (`SatchelError`, `ResourceKind`)
//!
//! ## Identifier Rules
//!
//! All identifiers are non-zero `u64` surrogates issued by the persistence
//! port. Zero is reserved: it means "root" for aspect groups and is rejected
//! as `InvalidArgument` everywhere else.

use crate::content::ContentError;
use crate::storage::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            /// Get the raw identifier value.
            #[must_use]
            pub const fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a document in the registry, shared by every document type.
    DocumentId
);
define_id!(
    /// Identifier of an aspect (a user-defined tag).
    AspectId
);
define_id!(
    /// Identifier of an aspect group. `AspectGroupId::ROOT` is the forest root.
    AspectGroupId
);
define_id!(
    /// Identifier of a briefcase. `BriefcaseId::GLOBAL` always exists.
    BriefcaseId
);
define_id!(
    /// Identifier of a collection.
    CollectionId
);
define_id!(
    /// Identifier of a relation predicate.
    PredicateId
);

impl AspectGroupId {
    /// The implicit root of the aspect group forest.
    pub const ROOT: Self = Self(0);

    /// Whether this is the forest root.
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

impl BriefcaseId {
    /// The reserved Global Briefcase. Never deleted; default home of every document.
    pub const GLOBAL: Self = Self(1);

    /// Whether this is the Global Briefcase.
    #[must_use]
    pub const fn is_global(self) -> bool {
        self.0 == 1
    }
}

/// Reject the reserved zero identifier before any store access.
pub(crate) fn require_id(raw: u64, kind: ResourceKind) -> Result<(), SatchelError> {
    if raw == 0 {
        return Err(SatchelError::InvalidArgument(format!(
            "{} identifier must be non-zero",
            kind
        )));
    }
    Ok(())
}

// =============================================================================
// DOCUMENT TYPE
// =============================================================================

/// The type tag every registered document carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    File,
    Note,
    Url,
    VCard,
    SchemaFreeDoc,
}

impl DocumentType {
    /// All document types in registry order.
    pub const ALL: [Self; 5] = [
        Self::File,
        Self::Note,
        Self::Url,
        Self::VCard,
        Self::SchemaFreeDoc,
    ];

    /// Stable numeric code used inside storage keys.
    #[must_use]
    pub const fn code(self) -> u64 {
        match self {
            Self::File => 1,
            Self::Note => 2,
            Self::Url => 3,
            Self::VCard => 4,
            Self::SchemaFreeDoc => 5,
        }
    }

    /// Lowercase name, as accepted by `FromStr`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Note => "note",
            Self::Url => "url",
            Self::VCard => "vcard",
            Self::SchemaFreeDoc => "sfd",
        }
    }

    /// Only files, notes and urls keep bookmark sets.
    #[must_use]
    pub const fn is_bookmarkable(self) -> bool {
        matches!(self, Self::File | Self::Note | Self::Url)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DocumentType {
    type Err = SatchelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| SatchelError::InvalidArgument(format!("unknown document type: {}", s)))
    }
}

// =============================================================================
// ENTITY RECORDS
// =============================================================================

/// Registry row: identity, type tag and retention metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub doc_type: DocumentType,
    pub created_at: DateTime<Utc>,
    /// When set and in the past, the document is due for the retention sweep.
    pub delete_after: Option<DateTime<Utc>>,
}

/// A user-defined tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aspect {
    pub id: AspectId,
    pub name: String,
    pub description: String,
    /// Owning group, if the aspect has been filed into one.
    pub group: Option<AspectGroupId>,
}

/// A folder in the aspect group forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectGroup {
    pub id: AspectGroupId,
    pub parent: AspectGroupId,
    pub name: String,
    pub description: String,
}

/// An exclusive container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Briefcase {
    pub id: BriefcaseId,
    pub name: String,
    pub description: String,
}

/// A non-exclusive grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub description: String,
}

/// A verb in the relation vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub id: PredicateId,
    pub text: String,
}

/// A directed subject–predicate–object triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub subject: DocumentId,
    pub object: DocumentId,
    pub predicate: PredicateId,
}

/// A historical snapshot of a file's content. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileVersion {
    pub file: DocumentId,
    /// 1-based, monotonic per file.
    pub number: u32,
    pub content_hash: String,
    pub comment: String,
    /// Content storage token. Recorded, never interpreted.
    pub location: String,
    pub saved_at: DateTime<Utc>,
}

/// Live state of a file document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: DocumentId,
    pub name: String,
    pub narration: String,
    pub size: u64,
    /// Hex BLAKE3 digest of the live content.
    pub content_hash: String,
    pub location: String,
    pub modified_at: DateTime<Utc>,
}

/// A free-text note.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub body: String,
}

/// A saved web address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UrlRecord {
    pub url: String,
    pub title: String,
}

/// A contact card kept as its raw vCard text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VCard {
    pub raw: String,
}

/// An open key/value property bag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaFreeDoc {
    pub properties: BTreeMap<String, String>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// What kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Document,
    Aspect,
    AspectGroup,
    Briefcase,
    Collection,
    Predicate,
    Relation,
    Version,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Document => "document",
            Self::Aspect => "aspect",
            Self::AspectGroup => "aspect group",
            Self::Briefcase => "briefcase",
            Self::Collection => "collection",
            Self::Predicate => "predicate",
            Self::Relation => "relation",
            Self::Version => "version",
        })
    }
}

/// Errors that can occur in the vault.
///
/// - Validation errors are raised before any store access
/// - Existence errors are raised before any mutation
/// - Persistence failures wrap the backend error and are never swallowed
#[derive(Debug, Error)]
pub enum SatchelError {
    /// Empty, oversize or zero-valued input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced entity does not exist.
    #[error("No such {kind}: {id}")]
    NonExistentResource { kind: ResourceKind, id: String },

    /// A uniqueness constraint would be violated.
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// The persistence port rejected or could not execute a statement.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] StorageError),

    /// The content storage collaborator failed.
    #[error("Content storage failure: {0}")]
    Content(#[from] ContentError),
}

impl SatchelError {
    /// Shorthand for a `NonExistentResource` error.
    pub fn missing(kind: ResourceKind, id: impl fmt::Display) -> Self {
        Self::NonExistentResource {
            kind,
            id: id.to_string(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_type_codes_are_distinct() {
        let codes: std::collections::BTreeSet<_> =
            DocumentType::ALL.iter().map(|t| t.code()).collect();
        assert_eq!(codes.len(), DocumentType::ALL.len());
    }

    #[test]
    fn document_type_parses_case_insensitive() {
        assert_eq!("VCard".parse::<DocumentType>().ok(), Some(DocumentType::VCard));
        assert_eq!("sfd".parse::<DocumentType>().ok(), Some(DocumentType::SchemaFreeDoc));
        assert!("pdf".parse::<DocumentType>().is_err());
    }

    #[test]
    fn reserved_ids() {
        assert!(AspectGroupId::ROOT.is_root());
        assert!(BriefcaseId::GLOBAL.is_global());
        assert!(!BriefcaseId(2).is_global());
    }

    #[test]
    fn zero_id_rejected() {
        assert!(matches!(
            require_id(0, ResourceKind::Aspect),
            Err(SatchelError::InvalidArgument(_))
        ));
        assert!(require_id(7, ResourceKind::Aspect).is_ok());
    }

    #[test]
    fn bookmarkable_types() {
        assert!(DocumentType::Url.is_bookmarkable());
        assert!(!DocumentType::VCard.is_bookmarkable());
    }
}
