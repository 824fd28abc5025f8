//! Type names inside expressions.
//!
//! Grammar: `NAME ( '<' TYPE (',' TYPE)* '>' | '<' ','* '>' )? ( '?' | '[' ']' )*`
//!
//! Only known types and registered generic families parse as types. Every
//! entry point here is speculative: when the tokens do not form a type the
//! position is restored and `None` is returned.

use dynex_core::{GenericFamily, ParseError, SemanticError, Ty};
use dynex_lexer::TokenKind;

use super::{ParseResult, Parser};

impl<'ast, 'c> Parser<'ast, 'c> {
    /// Parse a type in expression position.
    ///
    /// A trailing `?` is only read as nullable when the token after it
    /// cannot continue a conditional expression.
    pub(super) fn try_parse_type(&mut self) -> ParseResult<Option<Ty>> {
        self.speculate_type(false)
    }

    /// Parse a type where `?` is always the nullable suffix (lambda heads).
    pub(super) fn try_parse_declared_type(&mut self) -> ParseResult<Option<Ty>> {
        self.speculate_type(true)
    }

    /// Parse a type or fail; used after `is`, `as`, `typeof(` and `new`.
    pub(super) fn expect_type(&mut self) -> ParseResult<Ty> {
        let token = self.peek();
        match self.try_parse_type()? {
            Some(ty) => Ok(ty),
            None if token.kind == TokenKind::Identifier => Err(SemanticError::UnknownIdentifier {
                name: token.lexeme.to_string(),
                span: token.span,
            }
            .into()),
            None => Err(ParseError::expected_type(token.span, super::describe(token)).into()),
        }
    }

    /// Explicit generic arguments of a method call: `<T, U>` directly followed by `(`.
    pub(super) fn try_parse_type_arguments(&mut self) -> ParseResult<Option<Vec<Ty>>> {
        if !self.check(TokenKind::Less) {
            return Ok(None);
        }
        let saved = self.position;
        self.advance();
        let mut args = Vec::new();
        loop {
            let Some(ty) = self.parse_type_inner(true)? else {
                self.position = saved;
                return Ok(None);
            };
            args.push(ty);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        if self.eat(TokenKind::Greater).is_none() || !self.check(TokenKind::LeftParen) {
            self.position = saved;
            return Ok(None);
        }
        Ok(Some(args))
    }

    fn speculate_type(&mut self, declared: bool) -> ParseResult<Option<Ty>> {
        let saved = self.position;
        let ty = self.parse_type_inner(declared)?;
        if ty.is_none() {
            self.position = saved;
        }
        Ok(ty)
    }

    fn parse_type_inner(&mut self, declared: bool) -> ParseResult<Option<Ty>> {
        let token = self.peek();
        if token.kind != TokenKind::Identifier {
            return Ok(None);
        }
        let catalog = self.ctx.catalog();
        let family = match catalog.known_generic_definitions(token.lexeme) {
            Some((_, family)) if self.peek_at(1).kind == TokenKind::Less => Some(family),
            _ => None,
        };

        let mut ty = if let Some(family) = family {
            self.advance();
            match self.parse_generic_arguments(family)? {
                Some(ty) => ty,
                None => return Ok(None),
            }
        } else if let Some(known) = self.ctx.try_get_known_type(token.lexeme) {
            self.advance();
            known.ty
        } else {
            return Ok(None);
        };

        loop {
            if self.check(TokenKind::Question) && (declared || self.nullable_suffix_allowed()) {
                self.advance();
                ty = Ty::nullable(ty);
            } else if self.check(TokenKind::LeftBracket) && self.peek_at(1).kind == TokenKind::RightBracket {
                self.advance();
                self.advance();
                ty = Ty::array(ty);
            } else {
                break;
            }
        }
        Ok(Some(ty))
    }

    /// `<T, U>` or the definition forms `<>` and `<,>` after a family name.
    fn parse_generic_arguments(&mut self, family: GenericFamily) -> ParseResult<Option<Ty>> {
        let open = self.advance();
        let mut commas = 0u8;
        while self.eat(TokenKind::Comma).is_some() {
            commas += 1;
        }
        if self.eat(TokenKind::Greater).is_some() {
            return Ok(Some(Ty::Definition(family, commas + 1)));
        }
        if commas > 0 {
            return Ok(None);
        }

        let mut args = Vec::new();
        loop {
            let Some(ty) = self.parse_type_inner(true)? else {
                return Ok(None);
            };
            args.push(ty);
            if self.eat(TokenKind::Comma).is_some() {
                continue;
            }
            if self.eat(TokenKind::Greater).is_some() {
                break;
            }
            return Ok(None);
        }

        let count = args.len();
        match family.instantiate(args) {
            Some(ty) => Ok(Some(ty)),
            None => Err(SemanticError::type_error(
                open.span.merge(self.previous_span()),
                format!("'{}' does not take {count} type argument(s)", family.name()),
            )
            .into()),
        }
    }

    /// Whether the token after a `?` ends the type, making `?` a nullable suffix.
    fn nullable_suffix_allowed(&self) -> bool {
        matches!(
            self.peek_at(1).kind,
            TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace
                | TokenKind::Comma
                | TokenKind::Eof
                | TokenKind::Greater
                | TokenKind::LeftBracket
                | TokenKind::AmpAmp
                | TokenKind::PipePipe
                | TokenKind::QuestionQuestion
                | TokenKind::EqualEqual
                | TokenKind::BangEqual
        )
    }
}
