//! Source location tracking for error reporting.
//!
//! Provides [`Span`] to track where tokens and errors occur in expression text.

use std::fmt;

/// A span of expression text, represented by its starting position.
///
/// Expressions are usually a single line, but the line is tracked anyway so
/// multi-line filter definitions report useful positions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a new span from a line, column, and length.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Column just past the end of this span.
    #[inline]
    pub fn end_col(&self) -> u32 {
        self.col + self.len
    }

    /// Merge two spans into one that starts at the first span and extends to cover both.
    ///
    /// Spans on different lines keep the first position and add the lengths.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        if self.line == other.line {
            let start_col = self.col.min(other.col);
            let end_col = other.end_col().max(self.end_col());
            Span {
                line: self.line,
                col: start_col,
                len: end_col - start_col,
            }
        } else {
            Span {
                line: self.line,
                col: self.col,
                len: self.len + other.len,
            }
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let span = Span::new(1, 5, 10);
        assert_eq!(span.len(), 10);
        assert_eq!(span.end_col(), 15);
        assert!(!span.is_empty());

        let empty = Span::point(1, 5);
        assert!(empty.is_empty());
    }

    #[test]
    fn span_display() {
        assert_eq!(format!("{}", Span::new(2, 7, 3)), "2:7");
        assert_eq!(format!("{:?}", Span::point(1, 1)), "1:1");
    }

    #[test]
    fn merge_same_line() {
        let a = Span::new(1, 3, 2);
        let b = Span::new(1, 8, 4);
        assert_eq!(a.merge(b), Span::new(1, 3, 9));
        assert_eq!(b.merge(a), Span::new(1, 3, 9));
    }

    #[test]
    fn merge_different_lines() {
        let a = Span::new(1, 3, 2);
        let b = Span::new(2, 1, 4);
        assert_eq!(a.merge(b), Span::new(1, 3, 6));
    }
}
