//! Lexical analysis for the dynex expression language.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use dynex_lexer::{Lexer, TokenKind};
//!
//! let arena = Bump::new();
//! let tokens = Lexer::new("1 + 1e10", &arena).tokenize().unwrap();
//! assert_eq!(tokens[2].kind, TokenKind::RealLiteral);
//! ```

mod cursor;
mod lexer;
mod literal;
mod token;

pub use lexer::Lexer;
pub use literal::{LiteralError, NumberSuffix, parse_integer, parse_real, split_suffix, unescape_char, unescape_string};
pub use token::{Token, TokenKind};
