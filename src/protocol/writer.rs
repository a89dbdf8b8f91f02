//! Reply Buffer
//!
//! Every command writes its reply into a [`ReplyBuffer`], which the
//! connection then flushes to the socket.
//!
//! ## Backpatched Headers
//!
//! SCAN and KEYS stream keys into the buffer as the store walk finds them,
//! but the array header in front of those keys (`*<n>\r\n`, plus the cursor
//! for SCAN) is only known once the walk is over. Rather than buffering the
//! body a second time, the buffer reserves a fixed placeholder up front and
//! writes the header into its tail afterwards:
//!
//! ```text
//!  start                    slot              slot + HEADER_RESERVE
//!    │                        │                        │
//!    ▼                        ▼                        ▼
//! 1. [ earlier replies ...   ][ ?????????????????????? ][ $6\r\nuser:1\r\n ... ]
//!
//! 2. [ earlier replies ...   ][ ?????????? *2\r\n$1\r\n0\r\n*5\r\n ][ body ... ]
//!                                         └── header, right-aligned ──┘
//!
//! 3.             [ earlier replies ... ][ *2\r\n$1\r\n0\r\n*5\r\n ][ body ... ]
//!                ▲
//!              start (unused placeholder bytes are skipped)
//! ```
//!
//! When the placeholder sits at the very front of the buffer, step 3 only
//! moves `start`. Otherwise the earlier replies are shifted forward to close
//! the gap.

use crate::protocol::types::{canned, prefix, CRLF};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Bytes reserved for a deferred reply header.
///
/// The longest header written into it is the SCAN header with a 20-digit
/// cursor and a 20-digit count, well under this size.
pub const HEADER_RESERVE: usize = 128;

/// Filler written into a header reservation until it is patched.
const PLACEHOLDER: u8 = b'?';

/// A reserved, not yet written, header region.
#[must_use = "a reserved header must be patched before the reply is flushed"]
#[derive(Debug)]
pub struct HeaderSlot {
    offset: usize,
}

/// A position in the buffer that writes can be rolled back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

/// An output buffer holding complete RESP replies.
#[derive(Debug, Default)]
pub struct ReplyBuffer {
    buf: BytesMut,
    /// First valid byte of `buf`
    start: usize,
}

impl ReplyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            start: 0,
        }
    }

    /// Number of valid bytes waiting to be flushed.
    pub fn len(&self) -> usize {
        self.buf.len() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The valid bytes, from the first valid byte on.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[self.start..]
    }

    /// Takes everything written so far, leaving the buffer empty.
    pub fn take(&mut self) -> Bytes {
        self.buf.advance(self.start);
        self.start = 0;
        self.buf.split().freeze()
    }

    /// Appends raw, already-encoded bytes.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// `+OK\r\n`
    pub fn write_ok(&mut self) {
        self.write_raw(canned::OK);
    }

    /// `-<message>\r\n`
    ///
    /// Line breaks inside `message` are replaced with spaces so they cannot
    /// split the reply.
    pub fn write_error(&mut self, message: &str) {
        self.buf.put_u8(prefix::ERROR);
        self.buf.extend(
            message
                .bytes()
                .map(|b| if b == b'\r' || b == b'\n' { b' ' } else { b }),
        );
        self.buf.extend_from_slice(CRLF);
    }

    /// `:<n>\r\n`
    pub fn write_integer(&mut self, n: i64) {
        self.buf.put_u8(prefix::INTEGER);
        self.buf.extend_from_slice(n.to_string().as_bytes());
        self.buf.extend_from_slice(CRLF);
    }

    /// `$<len>\r\n<data>\r\n`
    pub fn write_bulk(&mut self, data: &[u8]) {
        self.buf.reserve(data.len() + 16);
        self.buf.put_u8(prefix::BULK_STRING);
        self.buf.extend_from_slice(data.len().to_string().as_bytes());
        self.buf.extend_from_slice(CRLF);
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(CRLF);
    }

    /// `$-1\r\n`
    pub fn write_null(&mut self) {
        self.write_raw(canned::NULL_BULK);
    }

    /// `*<n>\r\n`, to be followed by `n` replies.
    pub fn write_array_len(&mut self, n: usize) {
        self.buf.put_u8(prefix::ARRAY);
        self.buf.extend_from_slice(n.to_string().as_bytes());
        self.buf.extend_from_slice(CRLF);
    }

    /// Remembers the current end of the buffer.
    pub fn mark(&self) -> Mark {
        Mark(self.buf.len())
    }

    /// Drops everything written after `mark`, including unpatched header
    /// reservations.
    pub fn truncate(&mut self, mark: Mark) {
        debug_assert!(mark.0 >= self.start, "mark predates a header patch");
        self.buf.truncate(mark.0.max(self.start));
    }

    /// Reserves [`HEADER_RESERVE`] bytes for a header written later with
    /// [`ReplyBuffer::patch_header`].
    pub fn reserve_header(&mut self) -> HeaderSlot {
        let offset = self.buf.len();
        self.buf.put_bytes(PLACEHOLDER, HEADER_RESERVE);
        HeaderSlot { offset }
    }

    /// Writes `header` into the tail of a reservation and drops the unused
    /// part of it.
    ///
    /// # Panics
    ///
    /// If `header` is longer than [`HEADER_RESERVE`]. That can only happen if
    /// the header format itself is broken, and a truncated header would
    /// corrupt the reply stream.
    pub fn patch_header(&mut self, slot: HeaderSlot, header: &[u8]) {
        assert!(
            header.len() <= HEADER_RESERVE,
            "reply header of {} bytes overflows the {}-byte reservation",
            header.len(),
            HEADER_RESERVE
        );

        let end = slot.offset + HEADER_RESERVE;
        let header_start = end - header.len();
        self.buf[header_start..end].copy_from_slice(header);

        let gap = header_start - slot.offset;
        if gap > 0 && slot.offset > self.start {
            // Slide earlier replies up against the header.
            self.buf
                .copy_within(self.start..slot.offset, self.start + gap);
        }
        self.start += gap;
    }
}
