//! Persistent Store on redb
//!
//! A [`Store`] backed by [redb](https://docs.rs/redb), a pure-Rust embedded
//! B-tree database. All keys live in one table of raw byte strings, so redb's
//! own key order is the byte-lexicographic order the scan engine relies on.
//!
//! ## Transactions
//!
//! - Every mutating call is exactly one write transaction. A batch write is
//!   one transaction too, which is what makes MSET atomic.
//! - `WriteOptions::sync` picks the commit durability: `Immediate` waits for
//!   the fsync, `None` leaves the commit to be persisted by a later durable
//!   one.
//! - Reads open a short read transaction. Key iteration opens one per page,
//!   so a long walk never pins an old snapshot.

use crate::storage::store::{KeyIter, PagedKeys, Store, StoreError, StoreResult, WriteOptions};
use bytes::Bytes;
use redb::{Database, Durability, ReadableTable, Table, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("keyspace");

type KeyspaceTable<'txn> = Table<'txn, &'static [u8], &'static [u8]>;

/// An ordered key-value store persisted to a single redb file.
pub struct RedbStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Opens or creates a database at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(StoreError::storage)?;

        // Make sure the table exists so read transactions can always open it.
        let write_txn = db.begin_write().map_err(StoreError::storage)?;
        {
            let _table = write_txn.open_table(TABLE).map_err(StoreError::storage)?;
        }
        write_txn.commit().map_err(StoreError::storage)?;

        debug!(path = %path.display(), "Opened redb store");
        Ok(Self { db: Arc::new(db) })
    }

    /// Runs `f` against the keyspace table inside one write transaction.
    fn write_with<F>(&self, opts: WriteOptions, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut KeyspaceTable<'_>) -> Result<(), redb::StorageError>,
    {
        let mut write_txn = self.db.begin_write().map_err(StoreError::storage)?;
        write_txn.set_durability(durability(opts));
        {
            let mut table = write_txn.open_table(TABLE).map_err(StoreError::storage)?;
            f(&mut table).map_err(StoreError::storage)?;
        }
        write_txn.commit().map_err(StoreError::storage)
    }
}

fn durability(opts: WriteOptions) -> Durability {
    if opts.sync {
        Durability::Immediate
    } else {
        Durability::None
    }
}

impl Store for RedbStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Bytes>> {
        let read_txn = self.db.begin_read().map_err(StoreError::storage)?;
        let table = read_txn.open_table(TABLE).map_err(StoreError::storage)?;

        let value = table.get(key).map_err(StoreError::storage)?;
        Ok(value.map(|guard| Bytes::copy_from_slice(guard.value())))
    }

    fn put(&self, key: &[u8], value: &[u8], opts: WriteOptions) -> StoreResult<()> {
        self.write_with(opts, |table| table.insert(key, value).map(|_| ()))
    }

    fn delete(&self, key: &[u8], opts: WriteOptions) -> StoreResult<()> {
        self.write_with(opts, |table| table.remove(key).map(|_| ()))
    }

    fn batch_write(&self, puts: &[(Bytes, Bytes)], opts: WriteOptions) -> StoreResult<()> {
        self.write_with(opts, |table| {
            for (key, value) in puts {
                table.insert(key.as_ref(), value.as_ref())?;
            }
            Ok(())
        })
    }

    fn multi_get(&self, keys: &[Bytes]) -> Vec<StoreResult<Option<Bytes>>> {
        // One read transaction for the whole batch, so every key sees the
        // same snapshot.
        let read_txn = match self.db.begin_read().map_err(StoreError::storage) {
            Ok(txn) => txn,
            Err(e) => return keys.iter().map(|_| Err(e.clone())).collect(),
        };

        match read_txn.open_table(TABLE).map_err(StoreError::storage) {
            Ok(table) => keys
                .iter()
                .map(|key| {
                    table
                        .get(key.as_ref())
                        .map(|v| v.map(|guard| Bytes::copy_from_slice(guard.value())))
                        .map_err(StoreError::storage)
                })
                .collect(),
            Err(e) => keys.iter().map(|_| Err(e.clone())).collect(),
        }
    }

    fn keys_from(&self, start: Option<&[u8]>) -> StoreResult<KeyIter<'_>> {
        let db = Arc::clone(&self.db);
        Ok(Box::new(PagedKeys::new(start, move |seek, limit| {
            let read_txn = db.begin_read().map_err(StoreError::storage)?;
            let table = read_txn.open_table(TABLE).map_err(StoreError::storage)?;

            let mut keys = Vec::with_capacity(limit);
            let range = table
                .range::<&[u8]>(seek.bounds())
                .map_err(StoreError::storage)?;
            for entry in range.take(limit) {
                let (key, _) = entry.map_err(StoreError::storage)?;
                keys.push(Bytes::copy_from_slice(key.value()));
            }
            Ok(keys)
        })))
    }

    fn clear_all(&self, opts: WriteOptions) -> StoreResult<()> {
        let mut write_txn = self.db.begin_write().map_err(StoreError::storage)?;
        write_txn.set_durability(durability(opts));
        write_txn.delete_table(TABLE).map_err(StoreError::storage)?;
        {
            let _table = write_txn.open_table(TABLE).map_err(StoreError::storage)?;
        }
        write_txn.commit().map_err(StoreError::storage)
    }
}
