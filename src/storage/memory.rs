//! In-Memory Ordered Store
//!
//! A [`Store`] backed by a `BTreeMap` behind a single `RwLock`. It keeps keys
//! in byte-lexicographic order, which is all the scan engine needs, and is
//! used by the test suite, the benchmarks and `--in-memory` mode.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │               MemoryStore                │
//! │  ┌────────────────────────────────────┐  │
//! │  │  RwLock<BTreeMap<Bytes, Bytes>>    │  │
//! │  └────────────────────────────────────┘  │
//! │     ▲ readers: get, multi_get, pages     │
//! │     ▲ writer:  put, delete, batch, clear │
//! └──────────────────────────────────────────┘
//! ```
//!
//! A batch write takes the write lock once, so other connections observe all
//! of it or none of it. Key iteration re-takes the read lock for every page
//! instead of pinning it for the whole walk.
//!
//! Durability options are accepted and ignored: nothing here survives a
//! restart.

use crate::storage::store::{KeyIter, PagedKeys, Store, StoreError, StoreResult, WriteOptions};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Map = BTreeMap<Bytes, Bytes>;

/// An ordered key-value store that lives entirely in memory.
///
/// # Example
///
/// ```
/// use keyspan::storage::{MemoryStore, Store, WriteOptions};
///
/// let store = MemoryStore::new();
/// store.put(b"name", b"Ariz", WriteOptions::durable()).unwrap();
/// assert_eq!(store.get(b"name").unwrap().as_deref(), Some(&b"Ariz"[..]));
/// ```
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Map>,

    /// Statistics: number of mutating calls that reached the map
    write_count: AtomicU64,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("keys", &self.len())
            .field("writes", &self.write_count())
            .finish()
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys currently stored.
    pub fn len(&self) -> usize {
        self.data.read().map(|map| map.len()).unwrap_or(0)
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of mutating calls (put, delete, batch, clear) applied so far.
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Map>> {
        self.data
            .read()
            .map_err(|_| StoreError::Storage("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Map>> {
        let guard = self
            .data
            .write()
            .map_err(|_| StoreError::Storage("memory store lock poisoned".to_string()))?;
        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(guard)
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Bytes>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8], _opts: WriteOptions) -> StoreResult<()> {
        self.write()?
            .insert(Bytes::copy_from_slice(key), Bytes::copy_from_slice(value));
        Ok(())
    }

    fn delete(&self, key: &[u8], _opts: WriteOptions) -> StoreResult<()> {
        self.write()?.remove(key);
        Ok(())
    }

    fn batch_write(&self, puts: &[(Bytes, Bytes)], _opts: WriteOptions) -> StoreResult<()> {
        let mut data = self.write()?;
        for (key, value) in puts {
            data.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn multi_get(&self, keys: &[Bytes]) -> Vec<StoreResult<Option<Bytes>>> {
        match self.read() {
            Ok(data) => keys.iter().map(|key| Ok(data.get(key).cloned())).collect(),
            Err(e) => keys.iter().map(|_| Err(e.clone())).collect(),
        }
    }

    fn keys_from(&self, start: Option<&[u8]>) -> StoreResult<KeyIter<'_>> {
        Ok(Box::new(PagedKeys::new(start, move |seek, limit| {
            let data = self.read()?;
            Ok(data
                .range::<[u8], _>(seek.bounds())
                .take(limit)
                .map(|(key, _)| key.clone())
                .collect())
        })))
    }

    fn clear_all(&self, _opts: WriteOptions) -> StoreResult<()> {
        self.write()?.clear();
        Ok(())
    }
}
