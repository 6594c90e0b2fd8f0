//! # Indexing Port
//!
//! Fire-and-forget notifications to an external full-text indexer.
//!
//! The vault calls the indexer after a transaction has committed. An indexer
//! error is logged and dropped; it never undoes the change it reports.

use crate::DocumentId;
use thiserror::Error;

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentChange {
    Created,
    Updated,
    Deleted,
}

/// An indexer failure.
#[derive(Debug, Error)]
#[error("Indexer error: {0}")]
pub struct IndexError(pub String);

/// The indexing collaborator.
pub trait Indexer: Send + Sync {
    /// Report a committed change.
    fn notify(&self, document: DocumentId, change: DocumentChange) -> Result<(), IndexError>;
}

/// An indexer that discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIndexer;

impl Indexer for NoopIndexer {
    fn notify(&self, _document: DocumentId, _change: DocumentChange) -> Result<(), IndexError> {
        Ok(())
    }
}

/// An indexer that only traces notifications at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingIndexer;

impl Indexer for TracingIndexer {
    fn notify(&self, document: DocumentId, change: DocumentChange) -> Result<(), IndexError> {
        tracing::debug!(document = %document, ?change, "index notification");
        Ok(())
    }
}
