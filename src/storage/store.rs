//! Store Contract
//!
//! The executor never talks to a concrete database. It talks to the [`Store`]
//! trait, which is the narrow surface it needs from an ordered key-value
//! store: point reads and writes, an atomic batch write, a batched read, a
//! forward key iterator and a full-keyspace clear.
//!
//! ## Iteration
//!
//! Iterators are expressed as fallible Rust iterators over keys. Seeking is
//! done when the iterator is created (`keys_from(Some(start))`), stepping is
//! `next()`, and the iterator's status is the `Err` item it yields when the
//! backend fails. A clean end of keyspace is simply `None`.
//!
//! Both bundled adapters walk the keyspace in pages (see [`PagedKeys`]). No
//! snapshot is held across pages, so a key written or deleted during a walk
//! may or may not be observed.

use bytes::Bytes;
use std::ops::Bound;
use thiserror::Error;

/// Number of keys fetched per page by [`PagedKeys`].
pub const PAGE_SIZE: usize = 128;

/// Errors reported by a store adapter.
///
/// A missing key is never an error; reads return `Ok(None)` instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend failed (I/O, corruption, poisoned lock, ...)
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    /// Wraps any displayable backend error.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        StoreError::Storage(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A forward iterator over keys in byte-lexicographic order.
pub type KeyIter<'a> = Box<dyn Iterator<Item = StoreResult<Bytes>> + Send + 'a>;

/// Durability of a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// When set, the write does not return until the store reports the data
    /// persisted to stable storage.
    pub sync: bool,
}

impl WriteOptions {
    /// A write that waits for persistence.
    pub fn durable() -> Self {
        Self { sync: true }
    }

    /// A write that may be buffered by the store.
    pub fn relaxed() -> Self {
        Self { sync: false }
    }
}

/// An ordered, byte-keyed store.
///
/// Implementations must be safe to share across connections; all
/// cross-connection isolation is the implementation's responsibility.
pub trait Store: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Bytes>>;

    /// Writes `key -> value`.
    fn put(&self, key: &[u8], value: &[u8], opts: WriteOptions) -> StoreResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn delete(&self, key: &[u8], opts: WriteOptions) -> StoreResult<()>;

    /// Applies every put in `puts`, in order, as one atomic unit.
    fn batch_write(&self, puts: &[(Bytes, Bytes)], opts: WriteOptions) -> StoreResult<()>;

    /// Looks up several keys at once. The result has one entry per key, in
    /// input order.
    fn multi_get(&self, keys: &[Bytes]) -> Vec<StoreResult<Option<Bytes>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Returns an iterator positioned at the first key `>= start`, or at the
    /// very first key when `start` is `None`.
    fn keys_from(&self, start: Option<&[u8]>) -> StoreResult<KeyIter<'_>>;

    /// Removes every key.
    fn clear_all(&self, opts: WriteOptions) -> StoreResult<()>;
}

/// Where the next page of a walk begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seek {
    /// The first key in the store.
    First,
    /// The first key `>= key`.
    AtOrAfter(Bytes),
    /// The first key `> key`.
    After(Bytes),
}

impl Seek {
    /// The seek position as a pair of range bounds, for `BTreeMap::range`-style
    /// APIs.
    pub fn bounds(&self) -> (Bound<&[u8]>, Bound<&[u8]>) {
        match self {
            Seek::First => (Bound::Unbounded, Bound::Unbounded),
            Seek::AtOrAfter(key) => (Bound::Included(key.as_ref()), Bound::Unbounded),
            Seek::After(key) => (Bound::Excluded(key.as_ref()), Bound::Unbounded),
        }
    }
}

/// A key iterator that pulls the keyspace one page at a time.
///
/// `fetch(seek, limit)` must return at most `limit` keys in ascending order,
/// starting at `seek`. A short page marks the end of the keyspace. After the
/// first error the iterator is exhausted.
pub struct PagedKeys<F> {
    fetch: F,
    seek: Seek,
    page: std::vec::IntoIter<Bytes>,
    done: bool,
}

impl<F> PagedKeys<F>
where
    F: FnMut(&Seek, usize) -> StoreResult<Vec<Bytes>>,
{
    pub fn new(start: Option<&[u8]>, fetch: F) -> Self {
        let seek = match start {
            Some(key) => Seek::AtOrAfter(Bytes::copy_from_slice(key)),
            None => Seek::First,
        };
        Self {
            fetch,
            seek,
            page: Vec::new().into_iter(),
            done: false,
        }
    }
}

impl<F> Iterator for PagedKeys<F>
where
    F: FnMut(&Seek, usize) -> StoreResult<Vec<Bytes>>,
{
    type Item = StoreResult<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.page.next() {
                return Some(Ok(key));
            }
            if self.done {
                return None;
            }

            match (self.fetch)(&self.seek, PAGE_SIZE) {
                Ok(keys) => {
                    if keys.len() < PAGE_SIZE {
                        self.done = true;
                    }
                    if let Some(last) = keys.last() {
                        self.seek = Seek::After(last.clone());
                    }
                    self.page = keys.into_iter();
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
