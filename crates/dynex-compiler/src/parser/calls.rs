//! Call arguments, overload binding and lambda literals.
//!
//! A lambda passed as an argument is only scanned on the first pass: its
//! head is parsed and its body skipped. After overload resolution picks a
//! candidate, the body tokens are replayed with the lambda's parameter
//! types taken from the chosen delegate parameter.

use std::sync::Arc;

use dynex_core::{FuncSig, MethodDef, ParseError, ParseErrorKind, SemanticError, Span, Ty};
use dynex_lexer::TokenKind;

use super::{ParseResult, Parser};
use crate::operators::coerce;
use crate::overload::{ArgShape, LambdaShape, OverloadMatch, resolve_overload_with, substitute, unify};
use crate::tree::{ExprKind, TypedExpr};

/// A call argument after the first pass.
#[derive(Debug)]
pub(super) enum ArgSlot {
    Expr(TypedExpr),
    Lambda(PendingLambda),
}

/// A lambda argument whose body has not been parsed yet.
#[derive(Debug)]
pub(super) struct PendingLambda {
    names: Vec<String>,
    shape: LambdaShape,
    /// Token range of the body.
    body: (usize, usize),
    span: Span,
}

/// Parsed lambda head: `x =>`, `(x, y) =>` or `(int x, string y) =>`.
struct LambdaHead {
    names: Vec<String>,
    explicit: Option<Vec<Ty>>,
    span: Span,
}

/// A resolved call with converted arguments.
pub(super) struct BoundCall {
    pub method: Arc<MethodDef>,
    pub args: Vec<TypedExpr>,
    pub ret: Ty,
}

pub(super) fn shapes(args: &[ArgSlot]) -> Vec<ArgShape<'_>> {
    args.iter()
        .map(|arg| match arg {
            ArgSlot::Expr(expr) => ArgShape::Expr {
                ty: &expr.ty,
                literal: expr.literal_value(),
            },
            ArgSlot::Lambda(pending) => ArgShape::Lambda(&pending.shape),
        })
        .collect()
}

impl<'ast, 'c> Parser<'ast, 'c> {
    // =========================================================================
    // Arguments
    // =========================================================================

    /// `( arg, .. )`; returns the arguments and the span of the list.
    pub(super) fn parse_arguments(&mut self) -> ParseResult<(Vec<ArgSlot>, Span)> {
        let open = self.expect(TokenKind::LeftParen)?;
        self.parse_argument_list(open.span, TokenKind::RightParen)
    }

    /// Arguments up to `close`; the opening token has been consumed.
    pub(super) fn parse_argument_list(&mut self, open: Span, close: TokenKind) -> ParseResult<(Vec<ArgSlot>, Span)> {
        let mut args = Vec::new();
        if !self.check(close) {
            loop {
                args.push(self.parse_argument()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        let end = self.expect(close)?;
        Ok((args, open.merge(end.span)))
    }

    fn parse_argument(&mut self) -> ParseResult<ArgSlot> {
        if !self.lambda_ahead()? {
            return self.parse_expression().map(ArgSlot::Expr);
        }
        let head = self.parse_lambda_head()?;
        let start = self.position;
        self.skip_lambda_body()?;
        Ok(ArgSlot::Lambda(PendingLambda {
            shape: LambdaShape {
                arity: head.names.len(),
                explicit: head.explicit,
            },
            names: head.names,
            body: (start, self.position),
            span: head.span,
        }))
    }

    /// Skip a lambda body up to the `,` or closing bracket that ends the argument.
    fn skip_lambda_body(&mut self) -> ParseResult<()> {
        let start = self.position;
        let mut depth = 0usize;
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::QuestionBracket | TokenKind::LeftBrace => {
                    depth += 1
                }
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace if depth == 0 => break,
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => depth -= 1,
                TokenKind::Comma if depth == 0 => break,
                TokenKind::Eof => break,
                _ => {}
            }
            self.advance();
        }
        if self.position == start {
            let token = self.peek();
            return Err(ParseError::expected_expression(token.span, super::describe(token)).into());
        }
        Ok(())
    }

    // =========================================================================
    // Calls
    // =========================================================================

    /// Call without a receiver: global function, static method, constructor
    /// or extension method called statically. Optional explicit generic
    /// arguments precede the argument list.
    pub(super) fn parse_static_call(
        &mut self,
        name: &str,
        candidates: &[Arc<MethodDef>],
        start: Span,
    ) -> ParseResult<TypedExpr> {
        let explicit = self.try_parse_type_arguments()?;
        let (args, args_span) = self.parse_arguments()?;
        let span = start.merge(args_span);
        let matched = self.resolve_call(name, candidates, &args, explicit.as_deref(), span)?;
        let bound = self.bind_match(name, matched, args)?;
        Ok(TypedExpr::new(
            ExprKind::Call {
                func: bound.method.func.clone(),
                args: bound.args,
            },
            bound.ret,
            span,
        ))
    }

    /// Run overload resolution over first-pass arguments.
    pub(super) fn resolve_call(
        &mut self,
        name: &str,
        candidates: &[Arc<MethodDef>],
        args: &[ArgSlot],
        explicit: Option<&[Ty]>,
        span: Span,
    ) -> Result<OverloadMatch, SemanticError> {
        let host = Arc::clone(&self.host);
        let shapes = shapes(args);
        let mut body_type = |index: usize, params: &[Ty]| match args.get(index) {
            Some(ArgSlot::Lambda(pending)) => self.lambda_body_type(pending, params),
            _ => None,
        };
        resolve_overload_with(name, candidates, &shapes, explicit, &*host, span, &mut body_type)
    }

    /// Type of a deferred lambda body under the given parameter types.
    ///
    /// The body is parsed and thrown away; `None` when it does not resolve.
    fn lambda_body_type(&mut self, pending: &PendingLambda, params: &[Ty]) -> Option<Ty> {
        let resume = self.position;
        let (start, end) = pending.body;
        self.position = start;
        let frame = pending.names.iter().cloned().zip(params.iter().cloned()).collect();
        let ty = match self.scope.push_frame(frame, pending.span) {
            Ok(()) => {
                let body = self.parse_expression();
                self.scope.pop_frame();
                body.ok().filter(|_| self.position == end).map(|body| body.ty)
            }
            Err(_) => None,
        };
        self.position = resume;
        ty
    }

    /// Bind lambda bodies, convert arguments and fill defaults for a chosen candidate.
    pub(super) fn bind_match(&mut self, name: &str, matched: OverloadMatch, args: Vec<ArgSlot>) -> ParseResult<BoundCall> {
        let OverloadMatch {
            method,
            mut bindings,
            param_types,
            conversions,
            expanded,
            ..
        } = matched;

        let mut bound = Vec::with_capacity(method.params.len());
        for ((arg, param), conversion) in args.into_iter().zip(&param_types).zip(conversions) {
            match (arg, conversion) {
                (ArgSlot::Expr(expr), Some(conversion)) => bound.push(expr.convert(conversion.kind, param.clone())),
                (ArgSlot::Expr(expr), None) => bound.push(coerce(expr, param, &*self.host)?),
                (ArgSlot::Lambda(pending), _) => {
                    let param = substitute(param, &bindings);
                    let Some(sig) = param.as_func() else {
                        return Err(SemanticError::CannotInferTypes {
                            name: name.to_string(),
                            span: pending.span,
                        }
                        .into());
                    };
                    bound.push(self.bind_lambda(name, &pending, sig, &mut bindings)?);
                }
            }
        }

        let ret = substitute(&method.ret, &bindings);
        if ret.has_params() {
            return Err(SemanticError::CannotInferTypes {
                name: name.to_string(),
                span: bound.first().map(|a| a.span).unwrap_or_default(),
            }
            .into());
        }

        if expanded {
            let fixed = method.params.len() - 1;
            let packed = bound.split_off(fixed.min(bound.len()));
            let elem = method
                .variadic_element()
                .map(|elem| substitute(&elem, &bindings))
                .unwrap_or(Ty::Object);
            let span = packed
                .iter()
                .map(|a| a.span)
                .reduce(Span::merge)
                .unwrap_or_default();
            bound.push(TypedExpr::new(ExprKind::ArrayInit(packed), Ty::array(elem), span));
        } else {
            for param in &method.params[bound.len()..] {
                if let Some(default) = &param.default {
                    let ty = substitute(&param.ty, &bindings);
                    bound.push(TypedExpr::typed_constant(default.clone(), ty, Span::default()));
                }
            }
        }

        Ok(BoundCall { method, args: bound, ret })
    }

    /// Parse a deferred lambda body against the delegate it was bound to.
    fn bind_lambda(
        &mut self,
        name: &str,
        pending: &PendingLambda,
        sig: &FuncSig,
        bindings: &mut [Option<Ty>],
    ) -> ParseResult<TypedExpr> {
        let params: Vec<Ty> = sig.params.iter().map(|p| substitute(p, bindings)).collect();
        if params.iter().any(Ty::has_params) {
            return Err(SemanticError::CannotInferTypes {
                name: name.to_string(),
                span: pending.span,
            }
            .into());
        }

        let resume = self.position;
        let (start, end) = pending.body;
        self.position = start;
        let frame = pending.names.iter().cloned().zip(params.iter().cloned()).collect();
        self.scope.push_frame(frame, pending.span)?;
        let body = self.parse_expression();
        self.scope.pop_frame();
        let body = body?;
        if self.position != end {
            let token = self.peek();
            return Err(ParseError::unexpected_token(token.span, token.lexeme).into());
        }
        self.position = resume;

        let declared = substitute(&sig.ret, bindings);
        if declared.has_params() && !unify(&declared, &body.ty, bindings) {
            return Err(SemanticError::ReturnTypeMismatch {
                expected: declared.to_string(),
                actual: body.ty.to_string(),
            }
            .into());
        }
        let ret = substitute(&declared, bindings);
        if ret.has_params() {
            return Err(SemanticError::CannotInferTypes {
                name: name.to_string(),
                span: pending.span,
            }
            .into());
        }
        let span = pending.span.merge(self.buffer[end.saturating_sub(1)].span);
        self.finish_lambda(params, body, ret, span)
    }

    /// Build the lambda node, converting the body to the delegate's return type.
    fn finish_lambda(&self, params: Vec<Ty>, body: TypedExpr, ret: Ty, span: Span) -> ParseResult<TypedExpr> {
        let arity = params.len();
        let (body, returns_value) = if ret == Ty::Void {
            (body, false)
        } else {
            (coerce(body, &ret, &*self.host)?, true)
        };
        Ok(TypedExpr::new(
            ExprKind::Lambda {
                arity,
                body: Box::new(body),
                returns_value,
            },
            Ty::func(params, ret),
            span,
        ))
    }

    // =========================================================================
    // Lambda literals
    // =========================================================================

    /// Whether a lambda literal starts here. Fails when lambdas are disabled.
    pub(super) fn lambda_ahead(&self) -> ParseResult<bool> {
        let token = self.peek();
        let arrow_at = match token.kind {
            TokenKind::Identifier => 1,
            TokenKind::LeftParen => {
                let mut depth = 0usize;
                let mut offset = 0;
                loop {
                    match self.peek_at(offset).kind {
                        TokenKind::LeftParen => depth += 1,
                        TokenKind::RightParen => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        TokenKind::Eof => return Ok(false),
                        _ => {}
                    }
                    offset += 1;
                }
                offset + 1
            }
            _ => return Ok(false),
        };
        if self.peek_at(arrow_at).kind != TokenKind::Arrow {
            return Ok(false);
        }
        if !self.ctx.catalog().lambdas_enabled() {
            return Err(SemanticError::LambdasDisabled { span: token.span }.into());
        }
        Ok(true)
    }

    /// Parse a lambda head through the `=>`.
    fn parse_lambda_head(&mut self) -> ParseResult<LambdaHead> {
        let start = self.peek().span;
        if self.check(TokenKind::Identifier) {
            let name = self.advance();
            let arrow = self.expect(TokenKind::Arrow)?;
            return Ok(LambdaHead {
                names: vec![name.lexeme.to_string()],
                explicit: None,
                span: start.merge(arrow.span),
            });
        }

        self.expect(TokenKind::LeftParen)?;
        let mut names = Vec::new();
        let mut types = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let untyped = matches!(self.peek_at(1).kind, TokenKind::Comma | TokenKind::RightParen);
                if !untyped {
                    let token = self.peek();
                    let ty = self
                        .try_parse_declared_type()?
                        .ok_or_else(|| ParseError::expected_type(token.span, super::describe(token)))?;
                    types.push(ty);
                }
                names.push(self.expect_identifier()?.lexeme.to_string());
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;
        let arrow = self.expect(TokenKind::Arrow)?;
        let span = start.merge(arrow.span);

        let explicit = match types.len() {
            0 if !names.is_empty() => None,
            n if n == names.len() => Some(types),
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidLambda,
                    span,
                    "lambda parameters must be either all typed or all untyped",
                )
                .into());
            }
        };
        Ok(LambdaHead { names, explicit, span })
    }

    /// A lambda literal outside a call argument.
    ///
    /// Parameter types come from the literal, from the requested delegate
    /// type when the lambda is the whole expression, or default to `object`.
    pub(super) fn parse_standalone_lambda(&mut self) -> ParseResult<TypedExpr> {
        let at_root = self.position == 0;
        let head = self.parse_lambda_head()?;
        let arity = head.names.len();
        let hint = if at_root { self.root_delegate.take() } else { None }.filter(|sig| sig.params.len() == arity);

        let params = match (head.explicit, &hint) {
            (Some(explicit), _) => explicit,
            (None, Some(sig)) => sig.params.clone(),
            (None, None) => vec![Ty::Object; arity],
        };
        let frame = head.names.into_iter().zip(params.iter().cloned()).collect();
        self.scope.push_frame(frame, head.span)?;
        let body = self.parse_expression();
        self.scope.pop_frame();
        let body = body?;

        let span = head.span.merge(body.span);
        let ret = match hint {
            Some(sig) => sig.ret,
            None => body.ty.clone(),
        };
        self.finish_lambda(params, body, ret, span)
    }
}
