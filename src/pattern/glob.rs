//! Glob Matching
//!
//! Byte-level glob matching for KEYS and SCAN MATCH. Keys are opaque byte
//! strings, so nothing here assumes UTF-8.
//!
//! Supported syntax:
//! - `*` matches any run of bytes, including the empty run
//! - `?` matches exactly one byte
//! - `[abc]`, `[a-z]`, `[^a-z]` match one byte from (or not from) a class;
//!   `\` escapes a byte inside the class, reversed ranges are accepted, and
//!   an unterminated class runs to the end of the pattern
//! - `\x` matches `x` literally; a trailing lone `\` matches itself
//!
//! Matching folds ASCII case: `USER:*` matches `user:1`. Only `A-Z` and
//! `a-z` fold; every other byte, including bytes above `0x7f`, compares
//! exactly. Class ranges are folded at both ends before comparing.
//!
//! The matcher is iterative: every token except `*` consumes exactly one
//! byte, so remembering only the most recent `*` is enough to backtrack, and
//! a pattern like `*a*a*a*b` cannot blow up exponentially.

use bytes::Bytes;

/// A compiled-once, matched-many glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    pattern: Bytes,
}

impl GlobPattern {
    pub fn new(pattern: impl Into<Bytes>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// The raw pattern bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pattern
    }

    /// Returns true if `pattern` is `*` (or a run of stars), which every key
    /// matches.
    pub fn matches_everything(&self) -> bool {
        !self.pattern.is_empty() && self.pattern.iter().all(|&b| b == b'*')
    }

    pub fn matches(&self, text: &[u8]) -> bool {
        glob_match(&self.pattern, text)
    }
}

/// Matches `text` against the glob `pattern`.
pub fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let mut p = 0;
    let mut t = 0;
    // Pattern index just past the last `*`, and the text index it is
    // currently assumed to stop at.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() {
            if pattern[p] == b'*' {
                while p < pattern.len() && pattern[p] == b'*' {
                    p += 1;
                }
                if p == pattern.len() {
                    return true;
                }
                backtrack = Some((p, t));
                continue;
            }
            if let Some(next) = match_token(pattern, p, text[t]) {
                p = next;
                t += 1;
                continue;
            }
        }

        // Mismatch: let the last star swallow one more byte.
        match backtrack {
            Some((star_p, star_t)) => {
                p = star_p;
                t = star_t + 1;
                backtrack = Some((star_p, t));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&b| b == b'*')
}

/// Matches the single-byte token starting at `pattern[p]` against `byte`.
///
/// Returns the index of the next token on a match.
fn match_token(pattern: &[u8], p: usize, byte: u8) -> Option<usize> {
    match pattern[p] {
        b'?' => Some(p + 1),
        b'\\' if p + 1 < pattern.len() => {
            pattern[p + 1].eq_ignore_ascii_case(&byte).then_some(p + 2)
        }
        b'[' => match_class(pattern, p + 1, byte),
        literal => literal.eq_ignore_ascii_case(&byte).then_some(p + 1),
    }
}

/// Matches a character class whose body starts at `pattern[start]`.
fn match_class(pattern: &[u8], start: usize, byte: u8) -> Option<usize> {
    let mut i = start;
    let negate = pattern.get(i) == Some(&b'^');
    if negate {
        i += 1;
    }

    let byte = byte.to_ascii_lowercase();
    let mut matched = false;
    while i < pattern.len() && pattern[i] != b']' {
        if pattern[i] == b'\\' && i + 1 < pattern.len() {
            i += 1;
            if pattern[i].to_ascii_lowercase() == byte {
                matched = true;
            }
        } else if i + 2 < pattern.len() && pattern[i + 1] == b'-' && pattern[i + 2] != b']' {
            let (a, b) = (
                pattern[i].to_ascii_lowercase(),
                pattern[i + 2].to_ascii_lowercase(),
            );
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            if (lo..=hi).contains(&byte) {
                matched = true;
            }
            i += 2;
        } else if pattern[i].to_ascii_lowercase() == byte {
            matched = true;
        }
        i += 1;
    }

    // `i` sits on the closing `]`, or on the end of an unterminated class.
    let next = (i + 1).min(pattern.len());
    (matched != negate).then_some(next)
}
