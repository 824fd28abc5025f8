//! Primary expressions: literals, parenthesized expressions, identifiers,
//! `new`, `typeof` and lambda literals that stand on their own.

use std::sync::Arc;

use dynex_core::{MethodDef, ParseError, ParseErrorKind, SemanticError, Span, Ty, Value};
use dynex_lexer::{LiteralError, NumberSuffix, Token, TokenKind, parse_integer, parse_real, unescape_char, unescape_string};
use dynex_registry::{DefaultNumberType, Identifier};

use super::{Operand, ParseResult, Parser};
use crate::conversion::find_conversion;
use crate::operators::coerce;
use crate::tree::{ExprKind, TypedExpr};

fn invalid_literal(token: Token<'_>, error: LiteralError) -> ParseError {
    ParseError::new(
        ParseErrorKind::InvalidLiteral,
        token.span,
        format!("invalid literal '{}': {error}", token.lexeme),
    )
}

/// Value of an integer literal under the suffix and default number type.
fn integer_value(value: i128, suffix: NumberSuffix, number_type: DefaultNumberType) -> Option<Value> {
    let as_int = || i32::try_from(value).ok().map(Value::Int);
    let as_long = || i64::try_from(value).ok().map(Value::Long);
    match suffix {
        NumberSuffix::Long => as_long(),
        NumberSuffix::Float => Some(Value::Float(value as f32)),
        NumberSuffix::Double => Some(Value::Double(value as f64)),
        NumberSuffix::None => match number_type {
            DefaultNumberType::Default | DefaultNumberType::Int => as_int().or_else(as_long),
            DefaultNumberType::Long => as_long(),
            DefaultNumberType::Single => Some(Value::Float(value as f32)),
            DefaultNumberType::Double => Some(Value::Double(value as f64)),
        },
    }
}

/// Value of a real literal under the suffix and default number type.
fn real_value(value: f64, suffix: NumberSuffix, number_type: DefaultNumberType) -> Value {
    match (suffix, number_type) {
        (NumberSuffix::Float, _) | (NumberSuffix::None, DefaultNumberType::Single) => Value::Float(value as f32),
        _ => Value::Double(value),
    }
}

impl<'ast, 'c> Parser<'ast, 'c> {
    pub(super) fn parse_primary(&mut self) -> ParseResult<Operand> {
        let token = self.peek();
        match token.kind {
            TokenKind::IntLiteral | TokenKind::RealLiteral => {
                self.advance();
                Ok(Operand::Value(self.numeric_literal(token, false, token.span)?))
            }
            TokenKind::StringLiteral => {
                self.advance();
                let text = unescape_string(token.lexeme).map_err(|e| invalid_literal(token, e))?;
                Ok(Operand::Value(TypedExpr::constant(Value::from(text), token.span)))
            }
            TokenKind::CharLiteral => {
                self.advance();
                let c = unescape_char(token.lexeme).map_err(|e| invalid_literal(token, e))?;
                Ok(Operand::Value(TypedExpr::constant(Value::Char(c), token.span)))
            }
            TokenKind::LeftParen | TokenKind::Identifier if self.lambda_ahead()? => {
                self.parse_standalone_lambda().map(Operand::Value)
            }
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RightParen)?;
                Ok(Operand::Value(inner))
            }
            TokenKind::Identifier => self.parse_identifier(),
            TokenKind::Eof => Err(ParseError::unexpected_eof(token.span).into()),
            _ => Err(ParseError::expected_expression(token.span, token.lexeme).into()),
        }
    }

    /// Numeric literal typed by its suffix or the default number type.
    ///
    /// `negative` folds a leading minus into the value so the most negative
    /// integer of each width is representable.
    pub(super) fn numeric_literal(&self, token: Token<'ast>, negative: bool, start: Span) -> ParseResult<TypedExpr> {
        let number_type = self.ctx.catalog().default_number_type();
        let (value, suffix) = if token.kind == TokenKind::IntLiteral {
            let (magnitude, suffix) = parse_integer(token.lexeme).map_err(|e| invalid_literal(token, e))?;
            let signed = if negative { -i128::from(magnitude) } else { i128::from(magnitude) };
            let value = integer_value(signed, suffix, number_type)
                .ok_or_else(|| invalid_literal(token, LiteralError::Overflow))?;
            (value, suffix)
        } else {
            let (real, suffix) = parse_real(token.lexeme).map_err(|e| invalid_literal(token, e))?;
            (real_value(if negative { -real } else { real }, suffix, number_type), suffix)
        };
        let ty = value.runtime_type();
        Ok(TypedExpr::new(
            ExprKind::Constant {
                value,
                unsuffixed: suffix == NumberSuffix::None,
            },
            ty,
            start.merge(token.span),
        ))
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    /// Resolve an identifier: lambda parameter, declared parameter, `new`,
    /// `typeof`, known type, global identifier, then extension method.
    fn parse_identifier(&mut self) -> ParseResult<Operand> {
        let token = self.peek();
        let name = token.lexeme;

        if let Some(var) = self.scope.lookup(name) {
            self.advance();
            let kind = ExprKind::LambdaVar {
                index: var.index,
                depth: var.depth,
            };
            return Ok(Operand::Value(TypedExpr::new(kind, var.ty, token.span)));
        }

        let depth = self.scope.depth();
        if let Some((index, parameter)) = self.ctx.try_get_parameter(name) {
            let ty = parameter.ty.clone();
            self.advance();
            let kind = ExprKind::Parameter { index, depth };
            return Ok(Operand::Value(TypedExpr::new(kind, ty, token.span)));
        }

        let next = self.peek_at(1);
        if token.is_word("new") && matches!(next.kind, TokenKind::Identifier | TokenKind::LeftBracket) {
            return self.parse_new().map(Operand::Value);
        }
        if token.is_word("typeof") && next.kind == TokenKind::LeftParen {
            return self.parse_typeof().map(Operand::Value);
        }

        if let Some(ty) = self.try_parse_type()? {
            return Ok(Operand::Type(ty, token.span.merge(self.previous_span())));
        }

        if let Some(identifier) = self.ctx.try_get_identifier(name) {
            self.advance();
            return match identifier {
                Identifier::Constant { value, ty } => {
                    Ok(Operand::Value(TypedExpr::typed_constant(value.clone(), ty.clone(), token.span)))
                }
                Identifier::Functions(group) => self.parse_function_group(name, group, token.span).map(Operand::Value),
            };
        }

        let extensions = self.ctx.extension_methods(name);
        if !extensions.is_empty() && matches!(next.kind, TokenKind::LeftParen | TokenKind::Less) {
            self.advance();
            return self.parse_static_call(name, extensions, token.span).map(Operand::Value);
        }

        Err(SemanticError::UnknownIdentifier {
            name: name.to_string(),
            span: token.span,
        }
        .into())
    }

    /// A global method group: called, or used as a delegate value.
    fn parse_function_group(&mut self, name: &str, group: &[Arc<MethodDef>], span: Span) -> ParseResult<TypedExpr> {
        if matches!(self.peek().kind, TokenKind::LeftParen | TokenKind::Less) {
            return self.parse_static_call(name, group, span);
        }
        match group {
            [method] if method.generic_arity == 0 && !method.is_variadic => {
                let params = method.params.iter().map(|p| p.ty.clone()).collect();
                let ty = Ty::func(params, method.ret.clone());
                Ok(TypedExpr::typed_constant(Value::Func(method.func.clone()), ty, span))
            }
            _ => Err(SemanticError::type_error(
                span,
                format!("method group '{name}' cannot be used as a value"),
            )
            .into()),
        }
    }

    /// `typeof(T)`, including definitions such as `typeof(IEnumerable<>)`.
    fn parse_typeof(&mut self) -> ParseResult<TypedExpr> {
        let start = self.advance();
        self.expect(TokenKind::LeftParen)?;
        let ty = self.expect_type()?;
        let close = self.expect(TokenKind::RightParen)?;
        Ok(TypedExpr::typed_constant(Value::Type(ty), Ty::Type, start.span.merge(close.span)))
    }

    // =========================================================================
    // new
    // =========================================================================

    /// `new T(args)`, `new T[n]`, `new T[] { .. }` and `new[] { .. }`.
    fn parse_new(&mut self) -> ParseResult<TypedExpr> {
        let start = self.advance();

        if self.eat(TokenKind::LeftBracket).is_some() {
            self.expect(TokenKind::RightBracket)?;
            let items = self.parse_initializer()?;
            let span = start.span.merge(self.previous_span());
            let elem = self.common_element_type(&items, span)?;
            return self.array_init(elem, items, span);
        }

        let ty = self.expect_type()?;

        if self.eat(TokenKind::LeftBracket).is_some() {
            let len = self.parse_expression()?;
            let close = self.expect(TokenKind::RightBracket)?;
            let len = coerce(len, &Ty::Int, &*self.host)?;
            let span = start.span.merge(close.span);
            return Ok(TypedExpr::new(
                ExprKind::NewArray {
                    elem: ty.clone(),
                    len: Box::new(len),
                },
                Ty::array(ty),
                span,
            ));
        }

        if let Ty::Array(elem) = &ty
            && self.check(TokenKind::LeftBrace)
        {
            let elem = (**elem).clone();
            let items = self.parse_initializer()?;
            let span = start.span.merge(self.previous_span());
            return self.array_init(elem, items, span);
        }

        if self.check(TokenKind::LeftParen) {
            let constructors = self.host.constructors(&ty);
            if constructors.is_empty() {
                return Err(SemanticError::UnknownMember {
                    type_name: ty.to_string(),
                    member: "constructor".to_string(),
                    span: start.span,
                }
                .into());
            }
            return self.parse_static_call(&ty.to_string(), &constructors, start.span);
        }

        let token = self.peek();
        Err(ParseError::expected_token(token.span, "'(' or '['", super::describe(token)).into())
    }

    /// `{ a, b, c }`; a trailing comma is allowed.
    fn parse_initializer(&mut self) -> ParseResult<Vec<TypedExpr>> {
        self.expect(TokenKind::LeftBrace)?;
        let mut items = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            items.push(self.parse_expression()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RightBrace)?;
        Ok(items)
    }

    fn array_init(&self, elem: Ty, items: Vec<TypedExpr>, span: Span) -> ParseResult<TypedExpr> {
        let items = items
            .into_iter()
            .map(|item| coerce(item, &elem, &*self.host))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TypedExpr::new(ExprKind::ArrayInit(items), Ty::array(elem), span))
    }

    /// Element type of `new[] { .. }`: the item type every other item converts to.
    fn common_element_type(&self, items: &[TypedExpr], span: Span) -> ParseResult<Ty> {
        let mut candidates: Vec<&Ty> = Vec::new();
        for item in items.iter().filter(|i| i.ty != Ty::Null) {
            if !candidates.contains(&&item.ty) {
                candidates.push(&item.ty);
            }
        }
        candidates
            .into_iter()
            .find(|candidate| {
                items
                    .iter()
                    .all(|item| find_conversion(&item.ty, candidate, None, &*self.host).is_some())
            })
            .cloned()
            .ok_or_else(|| SemanticError::type_error(span, "no best type found for implicitly-typed array").into())
    }
}
