//! # In-memory Storage
//!
//! `BTreeMap` tables behind a lock. Volatile; used for tests and scratch
//! vaults. A transaction works on a copy of the tables and swaps it in only
//! after every statement succeeded.
//!
//! Copying means every `execute` costs time proportional to the whole store,
//! not to the rows it touches. Use [`RedbStore`](super::RedbStore) for
//! anything larger than a test fixture.

use super::{Key, Persistence, Query, Row, Sequence, Statement, StorageError, Table, backend};
use std::collections::BTreeMap;
use std::sync::RwLock;

type Tables = BTreeMap<Table, BTreeMap<Vec<u8>, Vec<u8>>>;

/// A volatile persistence backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(tables: &mut Tables, statement: &Statement) -> Result<u64, StorageError> {
        match statement {
            Statement::Insert { table, key, value } => {
                let rows = tables.entry(*table).or_default();
                if rows.contains_key(key.as_bytes()) {
                    return Err(StorageError::Conflict(*table));
                }
                rows.insert(key.as_bytes().to_vec(), value.clone());
                Ok(1)
            }
            Statement::Upsert { table, key, value } => {
                tables
                    .entry(*table)
                    .or_default()
                    .insert(key.as_bytes().to_vec(), value.clone());
                Ok(1)
            }
            Statement::Delete { table, key } => Ok(tables
                .get_mut(table)
                .and_then(|rows| rows.remove(key.as_bytes()))
                .map_or(0, |_| 1)),
            Statement::DeletePrefix { table, prefix } => {
                let Some(rows) = tables.get_mut(table) else {
                    return Ok(0);
                };
                let doomed: Vec<Vec<u8>> = rows
                    .range(prefix.as_bytes().to_vec()..)
                    .map(|(k, _)| k)
                    .take_while(|k| k.starts_with(prefix.as_bytes()))
                    .cloned()
                    .collect();
                for key in &doomed {
                    rows.remove(key);
                }
                Ok(doomed.len() as u64)
            }
        }
    }
}

impl Persistence for MemoryStore {
    fn execute(&self, statements: &[Statement]) -> Result<u64, StorageError> {
        let mut guard = self.tables.write().map_err(backend)?;
        let mut working = guard.clone();
        let mut affected = 0u64;
        for statement in statements {
            affected = affected.saturating_add(Self::apply(&mut working, statement)?);
        }
        *guard = working;
        Ok(affected)
    }

    fn query(&self, query: &Query) -> Result<Vec<Row>, StorageError> {
        let guard = self.tables.read().map_err(backend)?;
        match query {
            Query::Get { table, key } => Ok(guard
                .get(table)
                .and_then(|rows| rows.get(key.as_bytes()))
                .map(|value| Row {
                    key: key.clone(),
                    value: value.clone(),
                })
                .into_iter()
                .collect()),
            Query::Scan { table, prefix } => {
                let Some(rows) = guard.get(table) else {
                    return Ok(Vec::new());
                };
                Ok(rows
                    .range(prefix.as_bytes().to_vec()..)
                    .take_while(|(k, _)| k.starts_with(prefix.as_bytes()))
                    .map(|(k, v)| Row {
                        key: Key::from_bytes(k.clone()),
                        value: v.clone(),
                    })
                    .collect())
            }
        }
    }

    fn next_identifier(&self, sequence: Sequence) -> Result<u64, StorageError> {
        let mut guard = self.tables.write().map_err(backend)?;
        let rows = guard.entry(Table::Sequences).or_default();
        let key = Key::name(sequence.name());
        let last = rows
            .get(key.as_bytes())
            .and_then(|bytes| <[u8; 8]>::try_from(bytes.as_slice()).ok())
            .map(u64::from_be_bytes)
            .unwrap_or(sequence.floor());
        let next = last
            .checked_add(1)
            .ok_or_else(|| StorageError::Backend(format!("{} sequence exhausted", sequence.name())))?;
        rows.insert(key.as_bytes().to_vec(), next.to_be_bytes().to_vec());
        Ok(next)
    }
}

// =============================================================================
// TESTS
// =============================================================================
