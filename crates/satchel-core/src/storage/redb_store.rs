//! # redb-backed Storage
//!
//! A disk-backed persistence backend using the redb embedded database:
//! - ACID transactions (one write transaction per `execute`)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Every [`Table`] is a redb table of raw byte keys to raw byte values.

use super::{Key, Persistence, Query, Row, Sequence, Statement, StorageError, Table, backend};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use std::path::Path;

fn definition(table: Table) -> TableDefinition<'static, &'static [u8], &'static [u8]> {
    TableDefinition::new(table.name())
}

/// A persistent store backed by a redb database file.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(backend)?;

        // Initialize tables so that readers never hit a missing table
        let write_txn = db.begin_write().map_err(backend)?;
        for table in Table::ALL {
            let _ = write_txn.open_table(definition(table)).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;

        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<bool, StorageError> {
        self.db.compact().map_err(backend)
    }

    fn apply(txn: &WriteTransaction, statement: &Statement) -> Result<u64, StorageError> {
        match statement {
            Statement::Insert { table, key, value } => {
                let mut rows = txn.open_table(definition(*table)).map_err(backend)?;
                let exists = rows.get(key.as_bytes()).map_err(backend)?.is_some();
                if exists {
                    return Err(StorageError::Conflict(*table));
                }
                rows.insert(key.as_bytes(), value.as_slice())
                    .map_err(backend)?;
                Ok(1)
            }
            Statement::Upsert { table, key, value } => {
                let mut rows = txn.open_table(definition(*table)).map_err(backend)?;
                rows.insert(key.as_bytes(), value.as_slice())
                    .map_err(backend)?;
                Ok(1)
            }
            Statement::Delete { table, key } => {
                let mut rows = txn.open_table(definition(*table)).map_err(backend)?;
                let removed = rows.remove(key.as_bytes()).map_err(backend)?.is_some();
                Ok(u64::from(removed))
            }
            Statement::DeletePrefix { table, prefix } => {
                let mut rows = txn.open_table(definition(*table)).map_err(backend)?;
                let mut doomed = Vec::new();
                for entry in rows.range(prefix.as_bytes()..).map_err(backend)? {
                    let (key, _) = entry.map_err(backend)?;
                    let bytes = key.value();
                    if !bytes.starts_with(prefix.as_bytes()) {
                        break;
                    }
                    doomed.push(bytes.to_vec());
                }
                for key in &doomed {
                    rows.remove(key.as_slice()).map_err(backend)?;
                }
                Ok(doomed.len() as u64)
            }
        }
    }
}

impl Persistence for RedbStore {
    fn execute(&self, statements: &[Statement]) -> Result<u64, StorageError> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        let mut affected = 0u64;
        for statement in statements {
            // An early return drops `write_txn`, which aborts it.
            affected = affected.saturating_add(Self::apply(&write_txn, statement)?);
        }
        write_txn.commit().map_err(backend)?;
        Ok(affected)
    }

    fn query(&self, query: &Query) -> Result<Vec<Row>, StorageError> {
        let read_txn = self.db.begin_read().map_err(backend)?;
        match query {
            Query::Get { table, key } => {
                let rows = read_txn.open_table(definition(*table)).map_err(backend)?;
                let value = rows
                    .get(key.as_bytes())
                    .map_err(backend)?
                    .map(|guard| guard.value().to_vec());
                Ok(value
                    .map(|value| Row {
                        key: key.clone(),
                        value,
                    })
                    .into_iter()
                    .collect())
            }
            Query::Scan { table, prefix } => {
                let rows = read_txn.open_table(definition(*table)).map_err(backend)?;
                let mut result = Vec::new();
                for entry in rows.range(prefix.as_bytes()..).map_err(backend)? {
                    let (key, value) = entry.map_err(backend)?;
                    let bytes = key.value();
                    if !bytes.starts_with(prefix.as_bytes()) {
                        break;
                    }
                    result.push(Row {
                        key: Key::from_bytes(bytes.to_vec()),
                        value: value.value().to_vec(),
                    });
                }
                Ok(result)
            }
        }
    }

    fn next_identifier(&self, sequence: Sequence) -> Result<u64, StorageError> {
        let key = Key::name(sequence.name());
        let write_txn = self.db.begin_write().map_err(backend)?;
        let next = {
            let mut rows = write_txn
                .open_table(definition(Table::Sequences))
                .map_err(backend)?;
            let last = rows
                .get(key.as_bytes())
                .map_err(backend)?
                .and_then(|guard| <[u8; 8]>::try_from(guard.value()).ok())
                .map(u64::from_be_bytes)
                .unwrap_or(sequence.floor());
            let next = last.checked_add(1).ok_or_else(|| {
                StorageError::Backend(format!("{} sequence exhausted", sequence.name()))
            })?;
            let encoded = next.to_be_bytes();
            rows.insert(key.as_bytes(), encoded.as_slice())
                .map_err(backend)?;
            next
        };
        write_txn.commit().map_err(backend)?;
        Ok(next)
    }
}
