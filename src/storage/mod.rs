//! Storage Module
//!
//! This module defines what the executor needs from a key-value store and
//! ships two implementations of it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandExecutor                         │
//! └──────────────────────────────┬──────────────────────────────┘
//!                                │ Arc<dyn Store>
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Store trait: get / put / delete / batch_write / multi_get  │
//! │               keys_from / clear_all                          │
//! └───────────────┬──────────────────────────────┬──────────────┘
//!                 ▼                              ▼
//!        ┌─────────────────┐            ┌─────────────────┐
//!        │  MemoryStore    │            │   RedbStore     │
//!        │  RwLock<BTree>  │            │  redb B-tree    │
//!        └─────────────────┘            └─────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Byte ordering**: keys are iterated in byte-lexicographic order
//! - **Atomic batches**: `batch_write` lands all puts or none
//! - **Durability control**: each write says whether it must hit disk
//! - **Paged iteration**: walks never pin a lock or snapshot for their
//!   whole duration
//!
//! ## Example
//!
//! ```
//! use keyspan::storage::{MemoryStore, Store, WriteOptions};
//! use bytes::Bytes;
//!
//! let store = MemoryStore::new();
//! store
//!     .batch_write(
//!         &[(Bytes::from("a"), Bytes::from("1")), (Bytes::from("b"), Bytes::from("2"))],
//!         WriteOptions::durable(),
//!     )
//!     .unwrap();
//!
//! let keys: Vec<Bytes> = store
//!     .keys_from(None)
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(keys, vec![Bytes::from("a"), Bytes::from("b")]);
//! ```

pub mod memory;
pub mod redb;
pub mod store;

// Re-export commonly used types
pub use self::memory::MemoryStore;
pub use self::redb::RedbStore;
pub use self::store::{KeyIter, PagedKeys, Seek, Store, StoreError, StoreResult, WriteOptions};
