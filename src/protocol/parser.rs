//! RESP Request Parser
//!
//! Clients send commands either as an array of bulk strings (what every
//! client library does) or as an inline line of whitespace-separated words
//! (what you type into `telnet`). Both become the same thing: an argument
//! vector, one `Bytes` per token, command name first.
//!
//! ```text
//! *3\r\n$3\r\nSET\r\n$4\r\nname\r\n$4\r\nAriz\r\n   ──┐
//!                                                   ├──> ["SET", "name", "Ariz"]
//! SET name Ariz\r\n                                 ──┘
//! ```
//!
//! ## How the Parser Works
//!
//! The parser reads from a buffer and returns either:
//! - `Ok(Some((args, consumed)))` - Parsed one command, `consumed` bytes were used
//! - `Ok(None)` - Need more data, the command is incomplete
//! - `Err(ParseError)` - Invalid protocol data; the stream cannot be resynced
//!
//! This lets the connection append network reads to a buffer, parse as many
//! complete commands as it holds, and wait for more when it runs dry.

use crate::protocol::types::{prefix, CRLF};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur during request parsing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Invalid integer in a length header
    #[error("invalid {what} length")]
    InvalidLength { what: &'static str },

    /// Expected a `$` bulk string inside a command array
    #[error("expected '$', got byte {0:#04x}")]
    ExpectedBulk(u8),

    /// Protocol violation (missing CRLF, etc.)
    #[error("{0}")]
    ProtocolError(String),

    /// The request exceeds a size limit
    #[error("{what} too large: {size} (max: {max})")]
    TooLarge {
        what: &'static str,
        size: usize,
        max: usize,
    },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of arguments in one command
pub const MAX_ARGS: usize = 1024 * 1024;

/// Maximum length of an inline command line
pub const MAX_INLINE_SIZE: usize = 64 * 1024;

/// A parsed command: the command name followed by its arguments.
pub type Args = Vec<Bytes>;

/// An incremental RESP request parser.
///
/// # Example
///
/// ```
/// use keyspan::protocol::RequestParser;
///
/// let mut parser = RequestParser::new();
/// let (args, consumed) = parser
///     .parse(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n")
///     .unwrap()
///     .unwrap();
/// assert_eq!(args, vec!["GET", "name"]);
/// assert_eq!(consumed, 23);
/// ```
#[derive(Debug, Default)]
pub struct RequestParser {
    /// Commands parsed so far
    parsed: u64,
}

impl RequestParser {
    /// Creates a new parser instance.
    pub fn new() -> Self {
        Self { parsed: 0 }
    }

    /// Number of complete commands this parser has produced.
    pub fn parsed(&self) -> u64 {
        self.parsed
    }

    /// Attempts to parse one command from the front of `buf`.
    ///
    /// Empty inline lines are skipped and reported as consumed with an empty
    /// argument vector, so the caller can drop them from its buffer.
    pub fn parse(&mut self, buf: &[u8]) -> ParseResult<Option<(Args, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }

        let result = match buf[0] {
            prefix::ARRAY => parse_multibulk(buf)?,
            _ => parse_inline(buf)?,
        };
        if matches!(&result, Some((args, _)) if !args.is_empty()) {
            self.parsed += 1;
        }
        Ok(result)
    }
}

/// Parses `*<count>\r\n` followed by `count` bulk strings.
fn parse_multibulk(buf: &[u8]) -> ParseResult<Option<(Args, usize)>> {
    debug_assert!(buf[0] == prefix::ARRAY);

    let (count, mut consumed) = match parse_length(buf, "multibulk")? {
        Some(header) => header,
        None => return Ok(None),
    };

    // `*-1` and `*0` carry no command
    let count = match usize::try_from(count) {
        Ok(n) => n,
        Err(_) => return Ok(Some((Vec::new(), consumed))),
    };
    if count > MAX_ARGS {
        return Err(ParseError::TooLarge {
            what: "multibulk",
            size: count,
            max: MAX_ARGS,
        });
    }

    let mut args = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        if consumed >= buf.len() {
            return Ok(None);
        }
        match parse_bulk(&buf[consumed..])? {
            Some((arg, used)) => {
                args.push(arg);
                consumed += used;
            }
            None => return Ok(None),
        }
    }

    Ok(Some((args, consumed)))
}

/// Parses one `$<len>\r\n<data>\r\n` bulk string.
fn parse_bulk(buf: &[u8]) -> ParseResult<Option<(Bytes, usize)>> {
    if buf[0] != prefix::BULK_STRING {
        return Err(ParseError::ExpectedBulk(buf[0]));
    }

    let (length, data_start) = match parse_length(buf, "bulk")? {
        Some(header) => header,
        None => return Ok(None),
    };
    let length = usize::try_from(length).map_err(|_| ParseError::InvalidLength { what: "bulk" })?;
    if length > MAX_BULK_SIZE {
        return Err(ParseError::TooLarge {
            what: "bulk string",
            size: length,
            max: MAX_BULK_SIZE,
        });
    }

    let total_needed = data_start + length + 2;
    if buf.len() < total_needed {
        return Ok(None);
    }
    if &buf[data_start + length..total_needed] != CRLF {
        return Err(ParseError::ProtocolError(
            "bulk string missing trailing CRLF".to_string(),
        ));
    }

    let data = Bytes::copy_from_slice(&buf[data_start..data_start + length]);
    Ok(Some((data, total_needed)))
}

/// Parses the `<prefix><integer>\r\n` header at the front of `buf`.
///
/// Returns the integer and the number of header bytes.
fn parse_length(buf: &[u8], what: &'static str) -> ParseResult<Option<(i64, usize)>> {
    let end = match find_crlf(&buf[1..]) {
        Some(pos) => pos,
        None if buf.len() > MAX_INLINE_SIZE => {
            return Err(ParseError::InvalidLength { what });
        }
        None => return Ok(None),
    };

    let n = std::str::from_utf8(&buf[1..1 + end])
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(ParseError::InvalidLength { what })?;

    Ok(Some((n, 1 + end + 2)))
}

/// Parses a whitespace-separated inline command line.
fn parse_inline(buf: &[u8]) -> ParseResult<Option<(Args, usize)>> {
    let newline = match buf.iter().position(|&b| b == b'\n') {
        Some(pos) => pos,
        None if buf.len() > MAX_INLINE_SIZE => {
            return Err(ParseError::TooLarge {
                what: "inline request",
                size: buf.len(),
                max: MAX_INLINE_SIZE,
            });
        }
        None => return Ok(None),
    };

    let line = match buf[..newline].strip_suffix(b"\r") {
        Some(line) => line,
        None => &buf[..newline],
    };
    let args = line
        .split(|b| b.is_ascii_whitespace())
        .filter(|word| !word.is_empty())
        .map(Bytes::copy_from_slice)
        .collect();

    Ok(Some((args, newline + 1)))
}

/// Finds the position of CRLF in the buffer.
///
/// Returns the position of `\r` if found, or None if CRLF is not present.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}
