//! Token types produced by the lexer.

use dynex_core::Span;
use std::fmt;

/// A token from the expression text.
///
/// The `'ast` lifetime refers to the arena where the lexeme string is allocated.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    pub kind: TokenKind,
    /// The source text of this token (allocated in arena).
    pub lexeme: &'ast str,
    pub span: Span,
}

impl<'ast> Token<'ast> {
    /// Create a new token.
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    /// Whether this is an identifier spelled exactly `word`.
    ///
    /// Used for contextual keywords (`new`, `typeof`, `is`, `as`).
    #[inline]
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.lexeme == word
    }

    /// Whether `next` starts exactly where this token ends, on the same line.
    #[inline]
    pub fn touches(&self, next: &Token<'_>) -> bool {
        self.span.line == next.span.line && self.span.end_col() == next.span.col
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All token kinds of the expression language.
///
/// Words are always [`TokenKind::Identifier`]; the parser recognizes
/// contextual keywords by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// Integer literal: `42`, `0xFF`, `0b101`, `10L`
    IntLiteral,
    /// Real literal: `3.14`, `.5`, `1e10`, `2F`, `2D`
    RealLiteral,
    /// Char literal: `'a'`, `'\n'`
    CharLiteral,
    /// String literal: `"hello"`
    StringLiteral,

    Identifier,

    // =========================================
    // Delimiters
    // =========================================
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `?.`
    QuestionDot,
    /// `?[`
    QuestionBracket,
    /// `?`
    Question,
    /// `??`
    QuestionQuestion,
    /// `:`
    Colon,
    /// `=>`
    Arrow,

    // =========================================
    // Operators
    // =========================================
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `!`
    Bang,
    /// `~`
    Tilde,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>` (a right shift is two adjacent `>` tokens)
    Greater,
    /// `>=`
    GreaterEqual,
    /// `==`
    EqualEqual,
    /// `!=`
    BangEqual,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `<<`
    LessLess,
    /// `=` (recognized only to reject assignment)
    Equal,

    // =========================================
    // Special
    // =========================================
    /// End of input
    Eof,
    /// Lexer error
    Error,
}

impl TokenKind {
    /// Human-readable description used in error messages.
    pub fn description(self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral => "integer literal",
            RealLiteral => "real literal",
            CharLiteral => "char literal",
            StringLiteral => "string literal",
            Identifier => "identifier",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBracket => "'['",
            RightBracket => "']'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            Comma => "','",
            Dot => "'.'",
            QuestionDot => "'?.'",
            QuestionBracket => "'?['",
            Question => "'?'",
            QuestionQuestion => "'??'",
            Colon => "':'",
            Arrow => "'=>'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            Bang => "'!'",
            Tilde => "'~'",
            Less => "'<'",
            LessEqual => "'<='",
            Greater => "'>'",
            GreaterEqual => "'>='",
            EqualEqual => "'=='",
            BangEqual => "'!='",
            AmpAmp => "'&&'",
            PipePipe => "'||'",
            Amp => "'&'",
            Pipe => "'|'",
            Caret => "'^'",
            LessLess => "'<<'",
            Equal => "'='",
            Eof => "end of expression",
            Error => "error",
        }
    }

    /// Check if this token is a literal.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral | TokenKind::RealLiteral | TokenKind::CharLiteral | TokenKind::StringLiteral
        )
    }

    /// The closing character this token opens a group for.
    pub fn group_close(self) -> Option<char> {
        match self {
            TokenKind::LeftParen => Some(')'),
            TokenKind::LeftBracket | TokenKind::QuestionBracket => Some(']'),
            TokenKind::LeftBrace => Some('}'),
            _ => None,
        }
    }

    /// The character this token closes a group with.
    pub fn group_closer(self) -> Option<char> {
        match self {
            TokenKind::RightParen => Some(')'),
            TokenKind::RightBracket => Some(']'),
            TokenKind::RightBrace => Some('}'),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_words() {
        let tok = Token::new(TokenKind::Identifier, "typeof", Span::new(1, 1, 6));
        assert!(tok.is_word("typeof"));
        assert!(!tok.is_word("Typeof"));
    }

    #[test]
    fn adjacency() {
        let a = Token::new(TokenKind::Greater, ">", Span::new(1, 5, 1));
        let b = Token::new(TokenKind::Greater, ">", Span::new(1, 6, 1));
        let c = Token::new(TokenKind::Greater, ">", Span::new(1, 8, 1));
        assert!(a.touches(&b));
        assert!(!b.touches(&c));
    }

    #[test]
    fn groups() {
        assert_eq!(TokenKind::QuestionBracket.group_close(), Some(']'));
        assert_eq!(TokenKind::RightBrace.group_closer(), Some('}'));
        assert_eq!(TokenKind::Comma.group_close(), None);
    }

    #[test]
    fn display_uses_description() {
        assert_eq!(TokenKind::QuestionDot.to_string(), "'?.'");
        assert_eq!(TokenKind::Eof.to_string(), "end of expression");
        assert!(TokenKind::CharLiteral.is_literal());
    }
}
