//! Cursor-Bounded Scan Engine
//!
//! The machinery behind KEYS and SCAN: walk the store's sorted keyspace,
//! keep the keys that match a glob pattern, and stream them straight into
//! the reply buffer.
//!
//! ## Algorithm
//!
//! ```text
//!  RangeHint::analyze(pattern) ──> seek to prefix (or first key)
//!                                        │
//!         ┌──────────────────────────────┘
//!         ▼
//!   key >= postfix? ──yes──> stop, cursor 0
//!         │ no
//!   matches pattern? ──no──> next key
//!         │ yes: this is match #i
//!   i < cursor? ──yes──> already returned earlier, next key
//!         │ no
//!   SCAN and COUNT keys emitted? ──yes──> stop, cursor i
//!         │ no
//!   emit key, next key
//! ```
//!
//! ## Cursors
//!
//! A cursor is the number of matches a previous call already returned, so
//! resuming re-walks and re-matches those keys before emitting new ones.
//! Nothing is kept between calls, which means the caller must resume with
//! the same pattern. Cursor `0` both starts a walk and reports that it is
//! finished.
//!
//! No snapshot is taken. Keys inserted or deleted before the resume point
//! between two calls shift the ordinals, so a key can be returned twice or
//! skipped. That is the usual weak guarantee of cursor-based enumeration.

use crate::pattern::{GlobPattern, RangeHint};
use crate::protocol::ReplyBuffer;
use crate::storage::{Store, StoreResult};
use tracing::trace;

/// Page size used by SCAN when no COUNT is given.
pub const DEFAULT_COUNT: usize = 10;

/// How far a walk may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Emit at most `count` keys and report where to resume.
    Scan { count: usize },
    /// Emit every matching key past the cursor.
    Keys,
}

/// What a finished walk produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanOutcome {
    /// Keys written to the reply
    pub emitted: usize,
    /// Cursor to resume from; `0` when the keyspace is exhausted
    pub next_cursor: u64,
    /// Keys read from the store, matching or not
    pub visited: u64,
}

/// Walks the keyspace for `pattern` and hands each key to emit.
///
/// The range hint only decides where the walk starts and when it may stop
/// early; every emitted key has passed the full pattern.
pub fn walk<F>(
    store: &dyn Store,
    pattern: &GlobPattern,
    cursor: u64,
    mode: ScanMode,
    mut emit: F,
) -> StoreResult<ScanOutcome>
where
    F: FnMut(&[u8]),
{
    let hint = RangeHint::analyze(pattern.as_bytes());
    let match_all = pattern.matches_everything();
    let mut outcome = ScanOutcome::default();
    let mut ordinal: u64 = 0;

    for key in store.keys_from(hint.seek_key())? {
        let key = key?;
        outcome.visited += 1;

        if hint.is_past_end(&key) {
            break;
        }
        if !match_all && !pattern.matches(&key) {
            continue;
        }

        let i = ordinal;
        ordinal += 1;
        if i < cursor {
            continue;
        }

        if let ScanMode::Scan { count } = mode {
            if outcome.emitted == count {
                outcome.next_cursor = i;
                return Ok(outcome);
            }
        }
        emit(&key);
        outcome.emitted += 1;
    }

    Ok(outcome)
}

/// Runs a walk and writes its complete reply into `out`.
///
/// SCAN replies `*2 <cursor> *<n> keys...`; KEYS replies `*<n> keys...`.
/// Keys are written as they are found, behind a header reservation that is
/// patched once the totals are known. On a store error everything this call
/// wrote is removed again.
pub fn write_scan_reply(
    store: &dyn Store,
    pattern: &GlobPattern,
    cursor: u64,
    mode: ScanMode,
    out: &mut ReplyBuffer,
) -> StoreResult<ScanOutcome> {
    let mark = out.mark();
    let slot = out.reserve_header();

    let result = walk(store, pattern, cursor, mode, |key| out.write_bulk(key));
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            drop(slot);
            out.truncate(mark);
            return Err(e);
        }
    };

    let header = match mode {
        ScanMode::Scan { .. } => scan_header(outcome.next_cursor, outcome.emitted),
        ScanMode::Keys => format!("*{}\r\n", outcome.emitted),
    };
    out.patch_header(slot, header.as_bytes());

    trace!(
        pattern = %String::from_utf8_lossy(pattern.as_bytes()),
        cursor,
        next_cursor = outcome.next_cursor,
        emitted = outcome.emitted,
        visited = outcome.visited,
        "Scan finished"
    );
    Ok(outcome)
}

fn scan_header(next_cursor: u64, emitted: usize) -> String {
    let cursor = next_cursor.to_string();
    format!(
        "*2\r\n${}\r\n{}\r\n*{}\r\n",
        cursor.len(),
        cursor,
        emitted
    )
}
