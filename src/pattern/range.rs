//! Range Analysis for Glob Patterns
//!
//! Derives a search-range hint from a glob so a scan can start at the first
//! key that could possibly match and stop once keys sort past the last one
//! that could.
//!
//! ```text
//! pattern:  user:1*:name
//!           └─┬──┘
//!          literal head = "user:1"
//!
//! prefix  = "USER:1"   seek here
//! postfix = "user:2"   stop at the first key >= this
//! ```
//!
//! Matching folds ASCII case, so a key matches the head when its first
//! bytes equal some case variant of it. Upper-case letters sort below
//! lower-case ones, which makes the all-upper variant the smallest of
//! those variants and the all-lower variant the largest. Seeking to the
//! former and stopping at the successor of the latter (the lower-cased
//! head with trailing `0xff` bytes dropped and the last remaining byte
//! incremented) therefore never excludes a match. The bound only ever
//! narrows the walk; each candidate is still matched against the full
//! pattern.

use bytes::Bytes;

/// Bytes that end the literal head of a pattern.
const META: &[u8] = b"*?[\\";

/// Where a pattern-bounded walk starts and stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeHint {
    /// First key to seek to: the literal head upper-cased. Empty when
    /// `star` is set.
    pub prefix: Bytes,
    /// Exclusive upper bound for matching keys. Empty when `star` is set.
    pub postfix: Bytes,
    /// No usable literal head: the whole keyspace must be walked.
    pub star: bool,
}

impl RangeHint {
    /// A hint that walks the whole keyspace.
    pub fn full() -> Self {
        Self {
            prefix: Bytes::new(),
            postfix: Bytes::new(),
            star: true,
        }
    }

    /// Analyzes `pattern` and returns the tightest sound range for it.
    ///
    /// Falls back to [`RangeHint::full`] when the pattern opens with a
    /// wildcard, is empty, or has a literal head with no successor.
    pub fn analyze(pattern: &[u8]) -> Self {
        let head_len = pattern
            .iter()
            .position(|b| META.contains(b))
            .unwrap_or(pattern.len());
        let head = &pattern[..head_len];

        match successor(&head.to_ascii_lowercase()) {
            Some(postfix) => Self {
                prefix: Bytes::from(head.to_ascii_uppercase()),
                postfix,
                star: false,
            },
            None => Self::full(),
        }
    }

    /// The key to seek to, or `None` to start at the first key.
    pub fn seek_key(&self) -> Option<&[u8]> {
        (!self.star).then_some(self.prefix.as_ref())
    }

    /// Returns true once `key` sorts at or past the upper bound, meaning no
    /// later key in the walk can match.
    pub fn is_past_end(&self, key: &[u8]) -> bool {
        !self.star && key >= self.postfix.as_ref()
    }
}

/// The shortest byte string greater than every string starting with `head`.
///
/// `None` if `head` is empty or all `0xff`, since no such string exists.
fn successor(head: &[u8]) -> Option<Bytes> {
    let last = head.iter().rposition(|&b| b != 0xff)?;
    let mut bound = head[..=last].to_vec();
    bound[last] += 1;
    Some(Bytes::from(bound))
}
