//! RESP Protocol Implementation
//!
//! This module covers both directions of the Redis Serialization Protocol
//! (RESP) as far as this server needs them.
//!
//! ## Overview
//!
//! Requests come in as arrays of bulk strings (or inline text lines) and are
//! turned into argument vectors. Replies go out as simple strings, errors,
//! integers, bulk strings and arrays, written straight into an output buffer.
//!
//! ## Modules
//!
//! - `types`: Wire prefixes and canned replies
//! - `parser`: Incremental request parser producing argument vectors
//! - `writer`: Reply buffer with reserved, backpatched headers
//!
//! ## Example
//!
//! ```
//! use keyspan::protocol::{ReplyBuffer, RequestParser};
//!
//! // Parsing an incoming command
//! let (args, _consumed) = RequestParser::new()
//!     .parse(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n")
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(args[0], "GET");
//!
//! // Writing a reply
//! let mut out = ReplyBuffer::new();
//! out.write_bulk(b"Ariz");
//! assert_eq!(out.as_bytes(), b"$4\r\nAriz\r\n");
//! ```

pub mod parser;
pub mod types;
pub mod writer;

// Re-export commonly used types for convenience
pub use parser::{Args, ParseError, ParseResult, RequestParser};
pub use writer::{HeaderSlot, Mark, ReplyBuffer, HEADER_RESERVE};
