//! Byte spans into type strings and literals

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A byte range inside a single-line input such as `DECIMAL(40,2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at a position
    #[inline]
    pub const fn point(pos: usize) -> Self {
        Self { start: pos, end: pos }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Smallest span covering both
    #[inline]
    pub fn merge(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Render a caret line marking this span under `source`.
    ///
    /// Offsets past the end of `source` are clamped so the marker always
    /// lines up with the last character.
    pub fn underline(&self, source: &str) -> String {
        let start = source
            .char_indices()
            .take_while(|(i, _)| *i < self.start)
            .count();
        let width = source
            .char_indices()
            .filter(|(i, _)| *i >= self.start && *i < self.end)
            .count()
            .max(1);
        let start = start.min(source.chars().count());
        format!("{}{}", " ".repeat(start), "^".repeat(width))
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
