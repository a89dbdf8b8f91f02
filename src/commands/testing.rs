//! A store wrapper that fails on request, for exercising error paths.

use crate::storage::{KeyIter, MemoryStore, Store, StoreError, StoreResult, WriteOptions};
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const NO_LIMIT: usize = usize::MAX;

#[derive(Debug)]
pub struct FaultyStore {
    inner: MemoryStore,
    fail_batches: AtomicBool,
    fail_reads: AtomicBool,
    iter_budget: AtomicUsize,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_batches: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            iter_budget: AtomicUsize::new(NO_LIMIT),
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Every batch write fails before touching the data.
    pub fn fail_batches(&self) {
        self.fail_batches.store(true, Ordering::SeqCst);
    }

    /// Every point read fails.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Iterators yield `n` keys, then an error.
    pub fn fail_iteration_after(&self, n: usize) {
        self.iter_budget.store(n, Ordering::SeqCst);
    }

    fn injected() -> StoreError {
        StoreError::Storage("injected failure".into())
    }
}

impl Store for FaultyStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Bytes>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8], opts: WriteOptions) -> StoreResult<()> {
        self.inner.put(key, value, opts)
    }

    fn delete(&self, key: &[u8], opts: WriteOptions) -> StoreResult<()> {
        self.inner.delete(key, opts)
    }

    fn batch_write(&self, puts: &[(Bytes, Bytes)], opts: WriteOptions) -> StoreResult<()> {
        if self.fail_batches.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.batch_write(puts, opts)
    }

    fn keys_from(&self, start: Option<&[u8]>) -> StoreResult<KeyIter<'_>> {
        let budget = self.iter_budget.load(Ordering::SeqCst);
        let keys = self.inner.keys_from(start)?;
        if budget == NO_LIMIT {
            return Ok(keys);
        }
        let failing = keys
            .take(budget)
            .chain(std::iter::once(Err(Self::injected())));
        Ok(Box::new(failing))
    }

    fn clear_all(&self, opts: WriteOptions) -> StoreResult<()> {
        self.inner.clear_all(opts)
    }
}
