//! Operator tiers: conditional, binary (Pratt loop), unary and casts.

use dynex_core::{SemanticError, Ty};
use dynex_lexer::{Token, TokenKind};

use super::{Operand, ParseResult, Parser};
use crate::conversion::find_explicit_conversion;
use crate::operators::{build_binary, build_coalesce, build_conditional, build_unary};
use crate::tree::{BinaryOp, ExprKind, TypedExpr, UnaryOp};

/// Infix operators of the binary tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Infix {
    Binary(BinaryOp),
    /// `??`
    Coalesce,
    /// `is T`
    Is,
    /// `as T`
    As,
}

impl Infix {
    /// Binding power as (left, right).
    ///
    /// `??` is the only right-associative tier; the conditional operator
    /// sits below all of these and is handled by `parse_expression`.
    fn binding_power(self) -> (u8, u8) {
        match self {
            Infix::Coalesce => (4, 3),
            Infix::Binary(op) => match op {
                BinaryOp::OrElse => (5, 6),
                BinaryOp::AndAlso => (7, 8),
                BinaryOp::BitOr => (9, 10),
                BinaryOp::BitXor => (11, 12),
                BinaryOp::BitAnd => (13, 14),
                BinaryOp::Equal | BinaryOp::NotEqual => (15, 16),
                BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => (17, 18),
                BinaryOp::ShiftLeft | BinaryOp::ShiftRight => (19, 20),
                BinaryOp::Add | BinaryOp::Concat | BinaryOp::Sub => (21, 22),
                BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => (23, 24),
            },
            Infix::Is | Infix::As => (17, 18),
        }
    }
}

/// Whether a token can start the operand of a cast.
fn starts_operand(token: Token<'_>) -> bool {
    matches!(
        token.kind,
        TokenKind::IntLiteral
            | TokenKind::RealLiteral
            | TokenKind::CharLiteral
            | TokenKind::StringLiteral
            | TokenKind::Identifier
            | TokenKind::LeftParen
            | TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::Plus
            | TokenKind::Minus
    )
}

impl<'ast, 'c> Parser<'ast, 'c> {
    /// Parse a full expression: `binary ( '?' expression ':' expression )?`.
    pub(super) fn parse_expression(&mut self) -> ParseResult<TypedExpr> {
        self.nested(|p| {
            let test = p.parse_binary(0)?;
            if p.eat(TokenKind::Question).is_none() {
                return Ok(test);
            }
            let if_true = p.parse_expression()?;
            p.expect(TokenKind::Colon)?;
            let if_false = p.parse_expression()?;
            let span = test.span.merge(if_false.span);
            Ok(build_conditional(test, if_true, if_false, &*p.host, span)?)
        })
    }

    /// Pratt loop over the binary tiers.
    ///
    /// Every fold nests the tree one level deeper and is charged against
    /// the depth limit.
    fn parse_binary(&mut self, min_bp: u8) -> ParseResult<TypedExpr> {
        let saved = self.depth;
        let result = self.parse_binary_folds(min_bp);
        self.depth = saved;
        result
    }

    fn parse_binary_folds(&mut self, min_bp: u8) -> ParseResult<TypedExpr> {
        let mut lhs = self.parse_unary()?;

        loop {
            let Some((infix, width)) = self.peek_infix() else {
                if self.check(TokenKind::Equal) {
                    return Err(super::assignment_error(self.peek().span));
                }
                break;
            };
            let (l_bp, r_bp) = infix.binding_power();
            if l_bp < min_bp {
                break;
            }
            let op_token = self.peek();
            self.deepen()?;
            for _ in 0..width {
                self.advance();
            }

            lhs = match infix {
                Infix::Binary(op) => {
                    let rhs = self.parse_binary(r_bp)?;
                    let span = lhs.span.merge(rhs.span);
                    build_binary(op, lhs, rhs, &*self.host, span)?
                }
                Infix::Coalesce => {
                    let rhs = self.nested(|p| p.parse_binary(r_bp))?;
                    let span = lhs.span.merge(rhs.span);
                    build_coalesce(lhs, rhs, &*self.host, span)?
                }
                Infix::Is => {
                    let target = self.expect_type()?;
                    let span = lhs.span.merge(self.previous_span());
                    TypedExpr::new(
                        ExprKind::TypeIs {
                            operand: Box::new(lhs),
                            target,
                        },
                        Ty::Bool,
                        span,
                    )
                }
                Infix::As => {
                    let target = self.expect_type()?;
                    let span = lhs.span.merge(self.previous_span());
                    if !target.accepts_null() {
                        return Err(SemanticError::type_error(
                            op_token.span,
                            format!("the 'as' operator needs a reference or nullable type, not '{target}'"),
                        )
                        .into());
                    }
                    TypedExpr::new(
                        ExprKind::TypeAs {
                            operand: Box::new(lhs),
                            target: target.clone(),
                        },
                        target,
                        span,
                    )
                }
            };
        }

        Ok(lhs)
    }

    /// Infix operator at the current position and its width in tokens.
    fn peek_infix(&self) -> Option<(Infix, usize)> {
        let token = self.peek();
        let op = match token.kind {
            TokenKind::QuestionQuestion => return Some((Infix::Coalesce, 1)),
            TokenKind::Identifier if token.lexeme == "is" => return Some((Infix::Is, 1)),
            TokenKind::Identifier if token.lexeme == "as" => return Some((Infix::As, 1)),
            TokenKind::Greater => {
                let next = self.peek_at(1);
                if next.kind == TokenKind::Greater && token.touches(&next) {
                    return Some((Infix::Binary(BinaryOp::ShiftRight), 2));
                }
                BinaryOp::Greater
            }
            TokenKind::PipePipe => BinaryOp::OrElse,
            TokenKind::AmpAmp => BinaryOp::AndAlso,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Amp => BinaryOp::BitAnd,
            TokenKind::EqualEqual => BinaryOp::Equal,
            TokenKind::BangEqual => BinaryOp::NotEqual,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::LessEqual => BinaryOp::LessEqual,
            TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
            TokenKind::LessLess => BinaryOp::ShiftLeft,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            _ => return None,
        };
        Some((Infix::Binary(op), 1))
    }

    /// Unary tier: prefix operators, casts, then a postfix sequence.
    fn parse_unary(&mut self) -> ParseResult<TypedExpr> {
        let token = self.peek();
        let op = match token.kind {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let literal = self.peek();
            // `-.5.ToString()` is `(-.5).ToString()`.
            if op == UnaryOp::Neg && matches!(literal.kind, TokenKind::IntLiteral | TokenKind::RealLiteral) {
                self.advance();
                let folded = self.numeric_literal(literal, true, token.span)?;
                return self.parse_postfix(Operand::Value(folded))?.into_value();
            }
            let operand = self.nested(|p| p.parse_unary())?;
            let span = token.span.merge(operand.span);
            return Ok(build_unary(op, operand, span)?);
        }

        if token.kind == TokenKind::LeftParen
            && let Some(cast) = self.try_parse_cast()?
        {
            return Ok(cast);
        }

        let operand = self.parse_primary()?;
        self.parse_postfix(operand)?.into_value()
    }

    /// `(T)operand` when `T` is a known type followed by an operand.
    fn try_parse_cast(&mut self) -> ParseResult<Option<TypedExpr>> {
        let saved = self.position;
        let open = self.advance();
        let Some(target) = self.try_parse_type()? else {
            self.position = saved;
            return Ok(None);
        };
        if !self.check(TokenKind::RightParen) || !starts_operand(self.peek_at(1)) {
            self.position = saved;
            return Ok(None);
        }
        self.advance();

        let operand = self.nested(|p| p.parse_unary())?;
        let span = open.span.merge(operand.span);
        let Some(kind) = find_explicit_conversion(&operand.ty, &target, &*self.host) else {
            return Err(SemanticError::InvalidConversion {
                from: operand.ty.to_string(),
                to: target.to_string(),
                span,
            }
            .into());
        };
        let mut cast = operand.convert(kind, target);
        cast.span = span;
        Ok(Some(cast))
    }
}

