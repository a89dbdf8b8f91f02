//! Key Patterns
//!
//! Glob matching and range analysis for KEYS and SCAN.
//!
//! - `glob`: byte-level glob matcher, the final word on whether a key matches
//! - `range`: derives a `{prefix, postfix, star}` hint from a pattern's
//!   literal head, used only to narrow the keyspace walk

pub mod glob;
pub mod range;

pub use glob::{glob_match, GlobPattern};
pub use range::RangeHint;
