//! # keyspan - A Redis-Compatible Server over an Ordered Key-Value Store
//!
//! keyspan speaks the Redis protocol (RESP) and keeps its data in a sorted,
//! byte-keyed store. Because keys are kept in order, `KEYS` and `SCAN` can
//! seek straight to the literal prefix of a glob pattern and stop as soon as
//! keys sort past it, instead of walking the whole keyspace.
//!
//! ## Features
//!
//! - **Redis-Compatible**: RESP requests (multibulk and inline), Redis replies
//! - **Persistent**: Data lives in a [`redb`](https://docs.rs/redb) file,
//!   with per-write durability, or in memory for tests and throwaway servers
//! - **Prefix-Bounded Scans**: Cursor-paginated `SCAN` and `KEYS` that only
//!   visit the part of the keyspace a pattern can match
//! - **Async I/O**: Built on Tokio, with store work on the blocking pool
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              keyspan                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Executor   │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                            │                  │                         │
//! │                            ▼                  ▼                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │   Glob      │<───│ Scan Engine │───>│ dyn Store   │                  │
//! │  │  + Range    │    │             │    │             │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │                         │
//! │                                  ┌────────────┴────────────┐            │
//! │                                  ▼                         ▼            │
//! │                           ┌─────────────┐          ┌─────────────┐      │
//! │                           │  RedbStore  │          │ MemoryStore │      │
//! │                           └─────────────┘          └─────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use keyspan::commands::{CommandExecutor, ExecutorConfig};
//! use keyspan::connection::{handle_connection, ConnectionStats};
//! use keyspan::storage::RedbStore;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(RedbStore::open("keyspan.redb".as_ref())?);
//!     let executor = Arc::new(CommandExecutor::new(store, ExecutorConfig::default()));
//!     let stats = Arc::new(ConnectionStats::new());
//!
//!     let listener = TcpListener::bind("127.0.0.1:6379").await?;
//!     loop {
//!         let (stream, addr) = listener.accept().await?;
//!         tokio::spawn(handle_connection(
//!             stream,
//!             addr,
//!             Arc::clone(&executor),
//!             Arc::clone(&stats),
//!         ));
//!     }
//! }
//! ```
//!
//! ## Supported Commands
//!
//! - `SET key value`
//! - `GET key`
//! - `DEL key`
//! - `MSET key value [key value ...]`
//! - `MGET key [key ...]`
//! - `FLUSHDB`
//! - `QUIT`
//! - `KEYS pattern`
//! - `SCAN cursor [MATCH pattern] [COUNT count]`
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP request parser and reply buffer
//! - [`storage`]: The `Store` trait and its redb and in-memory adapters
//! - [`pattern`]: Glob matching and pattern range analysis
//! - [`commands`]: Command executor and scan engine
//! - [`connection`]: Client connection management
//! - [`config`]: Command-line configuration
//!
//! ## Design Highlights
//!
//! ### Range-Bounded Scans
//!
//! A pattern such as `user:*` can only match keys in `["user:", "user;")`.
//! The scan engine seeks to the lower bound and stops at the upper one.
//! Patterns that open with a wildcard fall back to a full walk. Either way,
//! every returned key has been matched against the whole pattern.
//!
//! ### Stateless Cursors
//!
//! A `SCAN` cursor is the number of matches already returned. The server
//! keeps no per-cursor state and holds no snapshot between calls.
//!
//! ### Streaming Replies
//!
//! Keys are written into the reply as they are found. The array header in
//! front of them is written into a reserved slot once the count is known.

pub mod commands;
pub mod config;
pub mod connection;
pub mod pattern;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandError, CommandExecutor, ExecutorConfig, Flow};
pub use config::ServerConfig;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{ParseError, ReplyBuffer, RequestParser};
pub use storage::{MemoryStore, RedbStore, Store, StoreError};

/// The default port keyspan listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host keyspan binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of keyspan
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
