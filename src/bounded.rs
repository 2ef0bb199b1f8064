//! Fixed-capacity strings whose maximum length is part of the type.
//!
//! Every text field that ends up in the wire record has a hard width.
//! [`Bounded<N>`] makes the width a const parameter and performs the
//! truncation explicitly at construction, so an oversized modem field is
//! cut to size once instead of silently during formatting.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A string of at most `N` bytes, truncated on a character boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounded<const N: usize>(heapless::String<N>);

impl<const N: usize> Bounded<N> {
    /// Maximum length in bytes.
    pub const CAPACITY: usize = N;

    pub const fn new() -> Self {
        Self(heapless::String::new())
    }

    /// Build from `s`, dropping whatever does not fit.
    pub fn truncated(s: &str) -> Self {
        let mut out = heapless::String::new();
        // Cannot fail: the prefix is at most N bytes.
        let _ = out.push_str(truncate(s, N));
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> fmt::Display for Bounded<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl<const N: usize> From<&str> for Bounded<N> {
    fn from(s: &str) -> Self {
        Self::truncated(s)
    }
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char
/// boundary.
pub fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
