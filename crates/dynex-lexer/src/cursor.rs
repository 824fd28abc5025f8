/// A cursor over expression text that tracks position.
///
/// Provides low-level character access with peek/advance semantics.
/// Tracks byte offset, line number, and column number as it advances.
pub struct Cursor<'src> {
    /// The source text being scanned.
    source: &'src str,
    /// Remaining source text (slice starting at current position).
    rest: &'src str,
    /// Current byte offset from start of source.
    offset: u32,
    /// Current line number (1-indexed).
    line: u32,
    /// Current column number (1-indexed, byte-based).
    column: u32,
}

impl<'src> Cursor<'src> {
    /// Create a new cursor at the start of the source.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Current byte offset from start of source.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Current line number (1-indexed).
    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Current column number (1-indexed, byte-based).
    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Peek at the current character without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        let first = *self.rest.as_bytes().first()?;
        if first < 128 {
            Some(first as char)
        } else {
            self.rest.chars().next()
        }
    }

    /// Peek at the nth character ahead (0 = current).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Check if the current character satisfies a predicate.
    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    /// Consume the current character and advance.
    ///
    /// Returns the consumed character, or `None` at EOF.
    #[inline]
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        let len = ch.len_utf8() as u32;
        self.rest = &self.rest[len as usize..];
        self.offset += len;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += len;
        }

        Some(ch)
    }

    /// Consume if the current character matches.
    #[inline]
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate matches.
    ///
    /// Returns the consumed slice.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'src str {
        let start = self.offset as usize;
        while self.check(&f) {
            self.advance();
        }
        &self.source[start..self.offset as usize]
    }

    /// Get a slice of source from a starting offset to current position.
    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.offset as usize]
    }
}

/// Check if a character can start an identifier.
#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier.
#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cursor = Cursor::new("hello");
        assert_eq!(cursor.peek(), Some('h'));
        assert_eq!(cursor.offset(), 0);

        assert_eq!(cursor.advance(), Some('h'));
        assert_eq!(cursor.peek(), Some('e'));
        assert_eq!(cursor.offset(), 1);
    }

    #[test]
    fn cursor_eat() {
        let mut cursor = Cursor::new("?.x");

        assert!(cursor.eat('?'));
        assert!(!cursor.eat('?'));
        assert!(cursor.eat('.'));
    }

    #[test]
    fn cursor_eat_while() {
        let mut cursor = Cursor::new("123abc");

        assert_eq!(cursor.eat_while(|c| c.is_ascii_digit()), "123");
        assert_eq!(cursor.eat_while(is_ident_continue), "abc");
        assert_eq!(cursor.peek(), None);
    }

    #[test]
    fn cursor_peek_nth() {
        let cursor = Cursor::new("?.5");
        assert_eq!(cursor.peek_nth(0), Some('?'));
        assert_eq!(cursor.peek_nth(2), Some('5'));
        assert_eq!(cursor.peek_nth(3), None);
    }

    #[test]
    fn cursor_utf8_columns_count_bytes() {
        let mut cursor = Cursor::new("héllo");

        cursor.advance();
        assert_eq!(cursor.offset(), 1);
        assert_eq!(cursor.column(), 2);

        cursor.advance();
        assert_eq!(cursor.offset(), 3);
        assert_eq!(cursor.column(), 4);
        assert_eq!(cursor.slice_from(0), "hé");
    }

    #[test]
    fn cursor_line_and_column() {
        let mut cursor = Cursor::new("a\nb");
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.line(), 2);
        assert_eq!(cursor.column(), 1);
    }

    #[test]
    fn ident_classes() {
        assert!(is_ident_start('a'));
        assert!(is_ident_start('_'));
        assert!(is_ident_start('é'));
        assert!(!is_ident_start('0'));
        assert!(is_ident_continue('0'));
        assert!(!is_ident_continue('-'));
    }
}
