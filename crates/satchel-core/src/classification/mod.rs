//! # Classification Store
//!
//! Aspects and aspect groups, briefcases, collections and bookmarks.
//!
//! Join tables are kept in both directions (`(doc, x)` and `(x, doc)`) so that
//! "what is on this document" and "which documents carry this" are both a
//! single prefix scan. Both directions are always written and removed in the
//! same transaction.

mod aspects;
mod bookmarks;
mod briefcases;
mod collections;
mod groups;

pub use aspects::Aspects;
pub use bookmarks::Bookmarks;
pub use briefcases::Briefcases;
pub use collections::Collections;
pub use groups::AspectGroups;

use crate::storage::{Key, Statement, Table, encode};
use crate::SatchelError;
use serde::Serialize;

/// Statements moving a unique-name index entry from `old` to `new`.
///
/// The new entry is an `Insert`, so a taken name aborts the transaction.
fn rename_statements<I: Serialize>(
    names: Table,
    old: &str,
    new: &str,
    id: &I,
) -> Result<Vec<Statement>, SatchelError> {
    Ok(vec![
        Statement::insert(names, Key::name(new), encode(id)?),
        Statement::delete(names, Key::name(old)),
    ])
}
