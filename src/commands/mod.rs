//! Command Processing Module
//!
//! This module implements the command layer of keyspan. It receives argument
//! vectors from the connection, runs them against the store and writes the
//! replies.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ RequestParser   │  (protocol module)
//! └────────┬────────┘
//!          │ Vec<Bytes>
//!          ▼
//! ┌─────────────────┐
//! │ CommandExecutor │  (handler)
//! │                 │
//! │  - Dispatch     │
//! │  - Validate     │
//! │  - Execute      │──────┐ KEYS / SCAN
//! └────────┬────────┘      ▼
//!          │        ┌─────────────┐
//!          │        │ scan engine │  (scan)
//!          │        └──────┬──────┘
//!          ▼               ▼
//! ┌──────────────────────────────────┐
//! │ dyn Store                        │  (storage module)
//! └──────────────────────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `SET`, `GET`, `DEL`
//! - `MSET`, `MGET`
//! - `KEYS`, `SCAN`
//! - `FLUSHDB`, `QUIT`

pub mod error;
pub mod handler;
pub mod scan;

#[cfg(test)]
pub(crate) mod testing;

pub use error::CommandError;
pub use handler::{CommandExecutor, ExecutorConfig, Flow};
pub use scan::{ScanMode, ScanOutcome};
