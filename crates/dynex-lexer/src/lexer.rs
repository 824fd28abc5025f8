//! Main lexer implementation.
//!
//! The [`Lexer`] converts expression text into a stream of [`Token`]s.
//! It uses direct dispatch based on the first character.
//!
//! The lexer copies all lexemes into the arena, so the token stream can
//! outlive the borrowed expression text.

use bumpalo::Bump;
use dynex_core::{LexError, Span};

use crate::cursor::{Cursor, is_ident_continue, is_ident_start};
use crate::literal::simple_escape;
use crate::token::{Token, TokenKind};

/// Lexer for expression text.
///
/// The `'src` lifetime is the expression text being lexed (temporary).
/// The `'ast` lifetime is the arena where token lexemes are allocated.
pub struct Lexer<'src, 'ast> {
    cursor: Cursor<'src>,
    arena: &'ast Bump,
    /// Open brackets with the token that opened them.
    groups: Vec<(char, Span)>,
    errors: Vec<LexError>,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    /// Create a new lexer for the given expression text.
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
            groups: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Consume and return the next token.
    ///
    /// Malformed input yields a [`TokenKind::Error`] token and records the
    /// error. Group balance is checked as tokens are produced.
    pub fn next_token(&mut self) -> Token<'ast> {
        let token = self.scan_token();
        self.track_group(token)
    }

    /// Lex the whole text, stopping at the first error.
    ///
    /// The returned vector always ends with an [`TokenKind::Eof`] token.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn tokenize(mut self) -> Result<Vec<Token<'ast>>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if let Some(error) = self.errors.drain(..).next() {
                return Err(error);
            }
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tracing::trace!(count = tokens.len(), "tokenized expression");
        Ok(tokens)
    }

    // =========================================
    // Internal: Group balance
    // =========================================

    fn track_group(&mut self, token: Token<'ast>) -> Token<'ast> {
        if let Some(close) = token.kind.group_close() {
            self.groups.push((close, token.span));
        } else if let Some(close) = token.kind.group_closer() {
            match self.groups.pop() {
                Some((expected, _)) if expected == close => {}
                _ => return self.make_error(LexError::MismatchedGroup { close, span: token.span }),
            }
        } else if token.kind == TokenKind::Eof
            && let Some((close, span)) = self.groups.pop()
        {
            let open = match close {
                ')' => '(',
                ']' => '[',
                _ => '{',
            };
            self.groups.clear();
            return self.make_error(LexError::UnterminatedGroup { open, span });
        }
        token
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    /// Scan the next token from source.
    fn scan_token(&mut self) -> Token<'ast> {
        self.skip_whitespace();

        let Some(c) = self.cursor.peek() else {
            return self.make_eof();
        };

        let start_line = self.cursor.line();
        let start_col = self.cursor.column();
        let start_offset = self.cursor.offset();

        match c {
            '"' => self.scan_string(start_line, start_col, start_offset),
            '\'' => self.scan_char(start_line, start_col, start_offset),

            c if c.is_ascii_digit() => self.scan_number(start_line, start_col, start_offset),

            // Number starting with dot (e.g., .5)
            '.' if self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_decimal_number(start_line, start_col, start_offset)
            }

            c if is_ident_start(c) => self.scan_identifier(start_line, start_col, start_offset),

            _ => self.scan_operator(start_line, start_col, start_offset),
        }
    }

    /// Skip whitespace and BOM.
    fn skip_whitespace(&mut self) {
        while self.cursor.check(|c| c.is_whitespace() || c == '\u{FEFF}') {
            self.cursor.advance();
        }
    }

    fn make_eof(&self) -> Token<'ast> {
        let span = Span::point(self.cursor.line(), self.cursor.column());
        Token::new(TokenKind::Eof, self.arena.alloc_str(""), span)
    }

    /// Create a token from start position to current position.
    /// Copies the lexeme into the arena.
    fn make_token(&self, kind: TokenKind, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        let len = self.cursor.offset() - start_offset;
        let span = Span::new(start_line, start_col, len);
        let lexeme = self.arena.alloc_str(self.cursor.slice_from(start_offset));
        Token::new(kind, lexeme, span)
    }

    /// Create an error token and record the error.
    fn make_error(&mut self, error: LexError) -> Token<'ast> {
        let span = error.span();
        self.errors.push(error);
        Token::new(TokenKind::Error, self.arena.alloc_str(""), span)
    }

    fn span_from(&self, start_line: u32, start_col: u32, start_offset: u32) -> Span {
        Span::new(start_line, start_col, self.cursor.offset() - start_offset)
    }

    // =========================================
    // Scanning: Strings and chars
    // =========================================

    /// Validate the escape sequence after a consumed backslash.
    fn scan_escape(&mut self) -> Result<(), LexError> {
        let line = self.cursor.line();
        let col = self.cursor.column() - 1;
        match self.cursor.advance() {
            Some('u') => {
                let mut sequence = String::from("u");
                for _ in 0..4 {
                    match self.cursor.peek() {
                        Some(h) if h.is_ascii_hexdigit() => {
                            sequence.push(h);
                            self.cursor.advance();
                        }
                        _ => {
                            return Err(LexError::InvalidEscape {
                                sequence,
                                span: Span::new(line, col, self.cursor.column() - col),
                            });
                        }
                    }
                }
                Ok(())
            }
            Some(c) if simple_escape(c).is_some() => Ok(()),
            other => Err(LexError::InvalidEscape {
                sequence: other.map(String::from).unwrap_or_default(),
                span: Span::new(line, col, self.cursor.column() - col),
            }),
        }
    }

    /// Scan a double-quoted string literal.
    fn scan_string(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.advance();

        loop {
            match self.cursor.peek() {
                None | Some('\n') | Some('\r') => {
                    let span = self.span_from(start_line, start_col, start_offset);
                    return self.make_error(LexError::UnterminatedString { span });
                }
                Some('\\') => {
                    self.cursor.advance();
                    if let Err(error) = self.scan_escape() {
                        return self.make_error(error);
                    }
                }
                Some('"') => {
                    self.cursor.advance();
                    return self.make_token(TokenKind::StringLiteral, start_line, start_col, start_offset);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// Scan a single-quoted char literal holding exactly one character.
    fn scan_char(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.advance();

        let mut count = 0;
        loop {
            match self.cursor.peek() {
                None | Some('\n') | Some('\r') => {
                    let span = self.span_from(start_line, start_col, start_offset);
                    return self.make_error(LexError::UnterminatedChar { span });
                }
                Some('\\') => {
                    self.cursor.advance();
                    if let Err(error) = self.scan_escape() {
                        return self.make_error(error);
                    }
                    count += 1;
                }
                Some('\'') => {
                    self.cursor.advance();
                    if count != 1 {
                        let span = self.span_from(start_line, start_col, start_offset);
                        return self.make_error(LexError::InvalidCharLiteral { span });
                    }
                    return self.make_token(TokenKind::CharLiteral, start_line, start_col, start_offset);
                }
                Some(_) => {
                    self.cursor.advance();
                    count += 1;
                }
            }
        }
    }

    // =========================================
    // Scanning: Numbers
    // =========================================

    /// Scan a number literal.
    fn scan_number(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        if self.cursor.peek() == Some('0') {
            let radix = match self.cursor.peek_nth(1) {
                Some('x' | 'X') => Some(16),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                return self.scan_radix_number(start_line, start_col, start_offset, radix);
            }
        }

        self.scan_decimal_number(start_line, start_col, start_offset)
    }

    /// Scan a number with an explicit radix prefix (0x, 0b).
    fn scan_radix_number(&mut self, start_line: u32, start_col: u32, start_offset: u32, radix: u32) -> Token<'ast> {
        self.cursor.advance(); // '0'
        self.cursor.advance(); // radix letter

        let digits = self.cursor.eat_while(|c| c.is_digit(radix));
        if digits.is_empty() {
            let span = self.span_from(start_line, start_col, start_offset);
            return self.make_error(LexError::invalid_number(span, "expected digits after radix prefix"));
        }

        if !self.cursor.eat('L') {
            self.cursor.eat('l');
        }
        self.finish_number(TokenKind::IntLiteral, start_line, start_col, start_offset)
    }

    /// Scan a decimal number (integer or real).
    ///
    /// The exponent is consumed greedily: `1e10` is one token and `1e` is an error.
    fn scan_decimal_number(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        // Integer part (may be empty for `.5`)
        self.cursor.eat_while(|c| c.is_ascii_digit());

        let mut is_real = false;

        // Fractional part; `1.ToString()` keeps the dot as member access
        if self.cursor.peek() == Some('.') && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
            is_real = true;
        }

        if let Some('e' | 'E') = self.cursor.peek() {
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            if self.cursor.eat_while(|c| c.is_ascii_digit()).is_empty() {
                let span = self.span_from(start_line, start_col, start_offset);
                return self.make_error(LexError::invalid_number(span, "missing exponent digits"));
            }
            is_real = true;
        }

        let kind = match self.cursor.peek() {
            Some('f' | 'F' | 'd' | 'D') => {
                self.cursor.advance();
                TokenKind::RealLiteral
            }
            Some('l' | 'L') if !is_real => {
                self.cursor.advance();
                TokenKind::IntLiteral
            }
            Some('m' | 'M') => {
                self.cursor.advance();
                let span = self.span_from(start_line, start_col, start_offset);
                return self.make_error(LexError::invalid_number(span, "decimal literals are not supported"));
            }
            Some('u' | 'U') => {
                self.cursor.advance();
                let span = self.span_from(start_line, start_col, start_offset);
                return self.make_error(LexError::invalid_number(span, "unsigned literals are not supported"));
            }
            _ if is_real => TokenKind::RealLiteral,
            _ => TokenKind::IntLiteral,
        };

        self.finish_number(kind, start_line, start_col, start_offset)
    }

    /// Reject identifier characters glued to the end of a number.
    fn finish_number(&mut self, kind: TokenKind, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        if self.cursor.check(is_ident_continue) {
            self.cursor.eat_while(is_ident_continue);
            let span = self.span_from(start_line, start_col, start_offset);
            return self.make_error(LexError::invalid_number(span, "unexpected character after number"));
        }
        self.make_token(kind, start_line, start_col, start_offset)
    }

    // =========================================
    // Scanning: Identifiers
    // =========================================

    fn scan_identifier(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.eat_while(is_ident_continue);
        self.make_token(TokenKind::Identifier, start_line, start_col, start_offset)
    }

    // =========================================
    // Scanning: Operators
    // =========================================

    /// Scan an operator or punctuation token.
    ///
    /// Uses tuple matching on (first_char, peek) to minimize repeated peek() calls.
    fn scan_operator(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        let Some(c) = self.cursor.advance() else {
            return self.make_eof();
        };
        let next = self.cursor.peek();

        let kind = match (c, next) {
            ('(', _) => TokenKind::LeftParen,
            (')', _) => TokenKind::RightParen,
            ('[', _) => TokenKind::LeftBracket,
            (']', _) => TokenKind::RightBracket,
            ('{', _) => TokenKind::LeftBrace,
            ('}', _) => TokenKind::RightBrace,
            (',', _) => TokenKind::Comma,
            (':', _) => TokenKind::Colon,
            ('~', _) => TokenKind::Tilde,
            ('.', _) => TokenKind::Dot,
            ('+', _) => TokenKind::Plus,
            ('-', _) => TokenKind::Minus,
            ('*', _) => TokenKind::Star,
            ('/', _) => TokenKind::Slash,
            ('%', _) => TokenKind::Percent,
            ('^', _) => TokenKind::Caret,

            // `?.5` is a conditional followed by a real literal
            ('?', Some('.')) if !self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.cursor.advance();
                TokenKind::QuestionDot
            }
            ('?', Some('[')) => { self.cursor.advance(); TokenKind::QuestionBracket }
            ('?', Some('?')) => { self.cursor.advance(); TokenKind::QuestionQuestion }
            ('?', _) => TokenKind::Question,

            ('=', Some('=')) => { self.cursor.advance(); TokenKind::EqualEqual }
            ('=', Some('>')) => { self.cursor.advance(); TokenKind::Arrow }
            ('=', _) => TokenKind::Equal,

            ('!', Some('=')) => { self.cursor.advance(); TokenKind::BangEqual }
            ('!', _) => TokenKind::Bang,

            ('<', Some('=')) => { self.cursor.advance(); TokenKind::LessEqual }
            ('<', Some('<')) => { self.cursor.advance(); TokenKind::LessLess }
            ('<', _) => TokenKind::Less,

            // `>>` stays two tokens so nested generic arguments close
            ('>', Some('=')) => { self.cursor.advance(); TokenKind::GreaterEqual }
            ('>', _) => TokenKind::Greater,

            ('&', Some('&')) => { self.cursor.advance(); TokenKind::AmpAmp }
            ('&', _) => TokenKind::Amp,

            ('|', Some('|')) => { self.cursor.advance(); TokenKind::PipePipe }
            ('|', _) => TokenKind::Pipe,

            _ => {
                let span = self.span_from(start_line, start_col, start_offset);
                return self.make_error(LexError::UnexpectedChar { ch: c, span });
            }
        };

        self.make_token(kind, start_line, start_col, start_offset)
    }
}

/// Implement Iterator for convenient token streaming.
///
/// Stops at the end of input or at the first error.
impl<'src, 'ast> Iterator for Lexer<'src, 'ast> {
    type Item = Token<'ast>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        match token.kind {
            TokenKind::Eof | TokenKind::Error => None,
            _ => Some(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokenize(source: &str) -> Vec<(TokenKind, String)> {
        let arena = Bump::new();
        Lexer::new(source, &arena)
            .map(|t| (t.kind, t.lexeme.to_string()))
            .collect()
    }

    fn token_kinds(source: &str) -> Vec<TokenKind> {
        let arena = Bump::new();
        Lexer::new(source, &arena).map(|t| t.kind).collect()
    }

    fn lex_error(source: &str) -> LexError {
        let arena = Bump::new();
        match Lexer::new(source, &arena).tokenize() {
            Err(error) => error,
            Ok(tokens) => panic!("expected a lex error, got {tokens:?}"),
        }
    }

    // =========================================
    // Basic tokens
    // =========================================

    #[test]
    fn empty_source() {
        let arena = Bump::new();
        let mut lexer = Lexer::new("", &arena);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn whitespace_and_bom() {
        assert_eq!(tokenize("\u{FEFF}  x \t\n"), vec![(TokenKind::Identifier, "x".to_string())]);
    }

    #[test]
    fn tokenize_appends_eof() {
        let arena = Bump::new();
        let tokens = Lexer::new("a + b", &arena).tokenize().unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn words_are_identifiers() {
        assert_eq!(
            token_kinds("new typeof is as true null"),
            vec![TokenKind::Identifier; 6]
        );
    }

    // =========================================
    // Numbers
    // =========================================

    #[test]
    fn integer_literals() {
        assert_eq!(
            tokenize("42 0 0xFF 0b101 7L"),
            vec![
                (TokenKind::IntLiteral, "42".to_string()),
                (TokenKind::IntLiteral, "0".to_string()),
                (TokenKind::IntLiteral, "0xFF".to_string()),
                (TokenKind::IntLiteral, "0b101".to_string()),
                (TokenKind::IntLiteral, "7L".to_string()),
            ]
        );
    }

    #[test]
    fn real_literals() {
        assert_eq!(
            tokenize("3.14 .5 2F 2.5d"),
            vec![
                (TokenKind::RealLiteral, "3.14".to_string()),
                (TokenKind::RealLiteral, ".5".to_string()),
                (TokenKind::RealLiteral, "2F".to_string()),
                (TokenKind::RealLiteral, "2.5d".to_string()),
            ]
        );
    }

    #[test]
    fn exponents_are_one_token() {
        for text in ["1e10", "1e+10", "1e-10", "2.02e-10", "1E5"] {
            assert_eq!(tokenize(text), vec![(TokenKind::RealLiteral, text.to_string())], "{text}");
        }
        assert_eq!(
            token_kinds("1+1e10"),
            vec![TokenKind::IntLiteral, TokenKind::Plus, TokenKind::RealLiteral]
        );
    }

    #[test]
    fn dot_after_integer_is_member_access() {
        assert_eq!(
            token_kinds("1.ToString()"),
            vec![
                TokenKind::IntLiteral,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::LeftParen,
                TokenKind::RightParen,
            ]
        );
    }

    #[test]
    fn malformed_numbers() {
        assert!(matches!(lex_error("1e"), LexError::InvalidNumber { .. }));
        assert!(matches!(lex_error("1e+"), LexError::InvalidNumber { .. }));
        assert!(matches!(lex_error("0x"), LexError::InvalidNumber { .. }));
        assert!(matches!(lex_error("12abc"), LexError::InvalidNumber { .. }));
        assert!(matches!(lex_error("1.5L"), LexError::InvalidNumber { .. }));
        match lex_error("1.5M") {
            LexError::InvalidNumber { detail, .. } => assert!(detail.contains("decimal")),
            other => panic!("unexpected {other:?}"),
        }
    }

    // =========================================
    // Strings and chars
    // =========================================

    #[test]
    fn string_literals() {
        assert_eq!(
            tokenize(r#""hello" "a\"b" "A""#),
            vec![
                (TokenKind::StringLiteral, r#""hello""#.to_string()),
                (TokenKind::StringLiteral, r#""a\"b""#.to_string()),
                (TokenKind::StringLiteral, r#""A""#.to_string()),
            ]
        );
    }

    #[test]
    fn char_literals() {
        assert_eq!(
            tokenize(r"'a' '\n' '\''"),
            vec![
                (TokenKind::CharLiteral, "'a'".to_string()),
                (TokenKind::CharLiteral, r"'\n'".to_string()),
                (TokenKind::CharLiteral, r"'\''".to_string()),
            ]
        );
    }

    #[test]
    fn string_errors() {
        assert!(matches!(lex_error("\"abc"), LexError::UnterminatedString { .. }));
        assert!(matches!(lex_error("'a"), LexError::UnterminatedChar { .. }));
        assert!(matches!(lex_error("'ab'"), LexError::InvalidCharLiteral { .. }));
        assert!(matches!(lex_error("''"), LexError::InvalidCharLiteral { .. }));
        match lex_error(r#""\q""#) {
            LexError::InvalidEscape { sequence, .. } => assert_eq!(sequence, "q"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(lex_error(r#""\u12""#), LexError::InvalidEscape { .. }));
    }

    // =========================================
    // Operators
    // =========================================

    #[test]
    fn conditional_operators() {
        assert_eq!(
            token_kinds("a?.b ?[0] ?? c ? d : e"),
            vec![
                TokenKind::Identifier,
                TokenKind::QuestionDot,
                TokenKind::Identifier,
                TokenKind::QuestionBracket,
                TokenKind::IntLiteral,
                TokenKind::RightBracket,
                TokenKind::QuestionQuestion,
                TokenKind::Identifier,
                TokenKind::Question,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn question_dot_digit_is_ternary() {
        assert_eq!(
            token_kinds("a ?.5 : 1"),
            vec![
                TokenKind::Identifier,
                TokenKind::Question,
                TokenKind::RealLiteral,
                TokenKind::Colon,
                TokenKind::IntLiteral,
            ]
        );
    }

    #[test]
    fn greater_never_merges() {
        assert_eq!(
            token_kinds("a >> 2 >= b << 1 => x"),
            vec![
                TokenKind::Identifier,
                TokenKind::Greater,
                TokenKind::Greater,
                TokenKind::IntLiteral,
                TokenKind::GreaterEqual,
                TokenKind::Identifier,
                TokenKind::LessLess,
                TokenKind::IntLiteral,
                TokenKind::Arrow,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn logical_and_comparison() {
        assert_eq!(
            token_kinds("!a && b || c == d != e & f | g ^ ~h"),
            vec![
                TokenKind::Bang,
                TokenKind::Identifier,
                TokenKind::AmpAmp,
                TokenKind::Identifier,
                TokenKind::PipePipe,
                TokenKind::Identifier,
                TokenKind::EqualEqual,
                TokenKind::Identifier,
                TokenKind::BangEqual,
                TokenKind::Identifier,
                TokenKind::Amp,
                TokenKind::Identifier,
                TokenKind::Pipe,
                TokenKind::Identifier,
                TokenKind::Caret,
                TokenKind::Tilde,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn unexpected_character() {
        match lex_error("a # b") {
            LexError::UnexpectedChar { ch, span } => {
                assert_eq!(ch, '#');
                assert_eq!(span, Span::new(1, 3, 1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    // =========================================
    // Groups
    // =========================================

    #[test]
    fn group_balance() {
        assert!(matches!(lex_error("(a + b"), LexError::UnterminatedGroup { open: '(', .. }));
        assert!(matches!(lex_error("a[0)"), LexError::MismatchedGroup { close: ')', .. }));
        assert!(matches!(lex_error("a)"), LexError::MismatchedGroup { close: ')', .. }));
        assert!(matches!(lex_error("a?[0"), LexError::UnterminatedGroup { open: '[', .. }));

        let arena = Bump::new();
        assert!(Lexer::new("f(a[1], new[] { 2 })", &arena).tokenize().is_ok());
    }

    #[test]
    fn spans() {
        let arena = Bump::new();
        let tokens = Lexer::new("ab +\n  cd", &arena).tokenize().unwrap();
        assert_eq!(tokens[0].span, Span::new(1, 1, 2));
        assert_eq!(tokens[1].span, Span::new(1, 4, 1));
        assert_eq!(tokens[2].span, Span::new(2, 3, 2));
    }
}
