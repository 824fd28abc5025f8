//! Identifier detection without resolution.
//!
//! Works on tokens only, so text that would fail to resolve (unknown names,
//! wrong argument types) can still be inspected. Member names after `.` or
//! `?.`, lambda parameters and contextual keywords are not reported.

use bumpalo::Bump;
use rustc_hash::FxHashSet;

use dynex_core::ExpressionError;
use dynex_lexer::{Lexer, Token, TokenKind};
use dynex_registry::Catalog;

const KEYWORDS: &[&str] = &["new", "typeof", "is", "as"];

/// Identifiers mentioned by an expression, split by what they resolve to.
///
/// Each list keeps the order of first appearance without repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifiersInfo {
    /// Names the catalog does not know; usually parameters still to declare.
    pub unknown_identifiers: Vec<String>,
    /// Known global identifiers (variables, constants, functions).
    pub identifiers: Vec<String>,
    /// Known type names.
    pub types: Vec<String>,
}

pub(crate) fn detect(text: &str, catalog: &Catalog) -> Result<IdentifiersInfo, ExpressionError> {
    let arena = Bump::new();
    let tokens = Lexer::new(text, &arena).tokenize()?;
    let lambda_params = lambda_parameters(&tokens);
    let cmp = catalog.comparer();

    let mut info = IdentifiersInfo::default();
    let mut seen = FxHashSet::default();
    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Identifier || KEYWORDS.contains(&token.lexeme) {
            continue;
        }
        let after_member_access = i > 0 && matches!(tokens[i - 1].kind, TokenKind::Dot | TokenKind::QuestionDot);
        if after_member_access || lambda_params.contains(&i) {
            continue;
        }
        if !seen.insert(cmp.key(token.lexeme).into_owned()) {
            continue;
        }

        let name = token.lexeme.to_string();
        if catalog.try_get_known_type(token.lexeme).is_some() || catalog.has_known_generic_definition(token.lexeme) {
            info.types.push(name);
        } else if catalog.try_get_identifier(token.lexeme).is_some() {
            info.identifiers.push(name);
        } else if !lambda_params
            .iter()
            .any(|&p| cmp.matches(tokens[p].lexeme, token.lexeme))
        {
            info.unknown_identifiers.push(name);
        }
    }
    Ok(info)
}

/// Token positions of lambda parameter names.
///
/// Covers `x =>`, `(x, y) =>` and `(int x, string y) =>`; in the typed form
/// only the last word of each parameter is a name.
fn lambda_parameters(tokens: &[Token<'_>]) -> FxHashSet<usize> {
    let mut params = FxHashSet::default();
    for (arrow, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Arrow || arrow == 0 {
            continue;
        }
        let before = arrow - 1;
        match tokens[before].kind {
            TokenKind::Identifier => {
                params.insert(before);
            }
            TokenKind::RightParen => {
                let mut i = before;
                let mut last_word = None;
                while i > 0 {
                    i -= 1;
                    match tokens[i].kind {
                        TokenKind::Identifier => {
                            last_word.get_or_insert(i);
                        }
                        TokenKind::Comma | TokenKind::LeftParen => {
                            params.extend(last_word.take());
                            if tokens[i].kind == TokenKind::LeftParen {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    params
}
