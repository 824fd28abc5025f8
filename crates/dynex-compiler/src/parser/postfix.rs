//! Postfix sequences: member access, method calls, indexers, delegate
//! invocation and null-propagation.

use std::sync::Arc;

use dynex_core::{MethodDef, NativeFn, ParamDef, RuntimeError, SemanticError, Span, Ty, Value};
use dynex_lexer::{Token, TokenKind};

use super::calls::ArgSlot;
use super::{Operand, ParseResult, Parser};
use crate::chain::NullChain;
use crate::conversion::default_value;
use crate::operators::coerce;
use crate::tree::{ExprKind, Member, ReflectKind, TypedExpr};

fn access(receiver: TypedExpr, member: Member, args: Vec<TypedExpr>, ty: Ty, span: Span) -> TypedExpr {
    TypedExpr::new(
        ExprKind::Access {
            receiver: Box::new(receiver),
            member,
            args,
            guarded: false,
        },
        ty,
        span,
    )
}

fn unknown_member(ty: &Ty, member: &str, span: Span) -> SemanticError {
    SemanticError::UnknownMember {
        type_name: ty.to_string(),
        member: member.to_string(),
        span,
    }
}

/// Placeholder callable for candidates that are dispatched by the emitter.
fn dispatched_by_emitter() -> NativeFn {
    NativeFn::anonymous(|_: &[Value]| Err(RuntimeError::host("delegate invocation is dispatched directly")))
}

/// Arguments that must all be plain expressions (intrinsic members).
fn plain_args(name: &str, args: Vec<ArgSlot>, span: Span) -> Result<Vec<TypedExpr>, SemanticError> {
    args.into_iter()
        .map(|arg| match arg {
            ArgSlot::Expr(expr) => Ok(expr),
            ArgSlot::Lambda(_) => Err(SemanticError::NoApplicableMethod {
                name: name.to_string(),
                args: "lambda".to_string(),
                span,
            }),
        })
        .collect()
}

impl<'ast, 'c> Parser<'ast, 'c> {
    /// Apply postfix accesses to `operand` until the sequence ends.
    ///
    /// Each link nests the tree one level deeper and is charged against the
    /// depth limit.
    pub(super) fn parse_postfix(&mut self, operand: Operand) -> ParseResult<Operand> {
        let saved = self.depth;
        let result = self.parse_postfix_links(operand);
        self.depth = saved;
        result
    }

    fn parse_postfix_links(&mut self, mut operand: Operand) -> ParseResult<Operand> {
        let mut chain = NullChain::new();
        loop {
            let token = self.peek();
            let is_link = match token.kind {
                TokenKind::Dot | TokenKind::QuestionDot | TokenKind::LeftBracket | TokenKind::QuestionBracket => true,
                TokenKind::LeftParen => matches!(operand, Operand::Value(_)),
                _ => false,
            };
            if is_link {
                self.deepen()?;
            }
            operand = match token.kind {
                TokenKind::Dot => {
                    self.advance();
                    self.parse_member(operand, &mut chain)?
                }
                TokenKind::QuestionDot => {
                    chain.trigger(matches!(operand, Operand::Type(..)), token.span)?;
                    self.advance();
                    self.parse_member(operand, &mut chain)?
                }
                TokenKind::LeftBracket | TokenKind::QuestionBracket => {
                    if token.kind == TokenKind::QuestionBracket {
                        chain.trigger(matches!(operand, Operand::Type(..)), token.span)?;
                    }
                    self.advance();
                    let receiver = operand.into_value()?;
                    Operand::Value(self.parse_index(receiver, token.span, &mut chain)?)
                }
                TokenKind::LeftParen => match operand {
                    Operand::Value(callee) => Operand::Value(self.parse_invoke(callee, &mut chain)?),
                    Operand::Type(..) => break,
                },
                _ => break,
            };
        }
        Ok(operand)
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn parse_member(&mut self, operand: Operand, chain: &mut NullChain) -> ParseResult<Operand> {
        let name = self.expect_identifier()?;
        let explicit = self.try_parse_type_arguments()?;
        let is_call = self.check(TokenKind::LeftParen);

        match operand {
            Operand::Type(ty, span) if is_call => {
                let methods: Vec<_> = self
                    .host
                    .methods(&ty, name.lexeme, self.ctx.comparer())
                    .into_iter()
                    .filter(|m| m.is_static)
                    .collect();
                if methods.is_empty() {
                    return Err(unknown_member(&ty, name.lexeme, name.span).into());
                }
                let (args, args_span) = self.parse_arguments()?;
                let span = span.merge(args_span);
                let matched = self.resolve_call(name.lexeme, &methods, &args, explicit.as_deref(), span)?;
                let bound = self.bind_match(name.lexeme, matched, args)?;
                let call = ExprKind::Call {
                    func: bound.method.func.clone(),
                    args: bound.args,
                };
                Ok(Operand::Value(TypedExpr::new(call, bound.ret, span)))
            }
            Operand::Type(ty, span) => {
                let property = self
                    .host
                    .properties(&ty, name.lexeme, self.ctx.comparer())
                    .into_iter()
                    .find(|p| p.is_static)
                    .ok_or_else(|| unknown_member(&ty, name.lexeme, name.span))?;
                let span = span.merge(name.span);
                let read = ExprKind::StaticProperty(property.getter.clone());
                Ok(Operand::Value(TypedExpr::new(read, property.ty.clone(), span)))
            }
            Operand::Value(receiver) => {
                let lookup = chain.named_member_receiver(&receiver.ty, name.lexeme, self.ctx.comparer());
                let expr = if is_call {
                    self.parse_method_call(receiver, &lookup, name, explicit)?
                } else {
                    self.parse_property(receiver, &lookup, name)?
                };
                Ok(Operand::Value(chain.link(expr)?))
            }
        }
    }

    /// Property read on a value: nullable and array intrinsics, `Type.Name`,
    /// then host properties.
    fn parse_property(&mut self, receiver: TypedExpr, lookup: &Ty, name: Token<'ast>) -> ParseResult<TypedExpr> {
        let cmp = self.ctx.comparer();
        let span = receiver.span.merge(name.span);
        let is = |member: &str| cmp.matches(member, name.lexeme);

        if let Ty::Nullable(inner) = lookup {
            if is("HasValue") {
                return Ok(access(receiver, Member::HasValue, Vec::new(), Ty::Bool, span));
            }
            if is("Value") {
                let inner = (**inner).clone();
                return Ok(access(receiver, Member::NullableValue, Vec::new(), inner, span));
            }
        }
        if *lookup == Ty::Type && is("Name") {
            return Ok(access(receiver, Member::Reflect(ReflectKind::Name), Vec::new(), Ty::String, span));
        }
        if matches!(lookup, Ty::Array(_)) && is("Length") {
            return Ok(access(receiver, Member::ArrayLength, Vec::new(), Ty::Int, span));
        }

        let property = self
            .host
            .properties(lookup, name.lexeme, cmp)
            .into_iter()
            .find(|p| !p.is_static)
            .ok_or_else(|| unknown_member(lookup, name.lexeme, name.span))?;
        Ok(access(
            receiver,
            Member::Property(property.getter.clone()),
            Vec::new(),
            property.ty.clone(),
            span,
        ))
    }

    /// Method call on a value: intrinsics, instance methods, then extension methods.
    fn parse_method_call(
        &mut self,
        receiver: TypedExpr,
        lookup: &Ty,
        name: Token<'ast>,
        explicit: Option<Vec<Ty>>,
    ) -> ParseResult<TypedExpr> {
        let (args, args_span) = self.parse_arguments()?;
        let span = receiver.span.merge(args_span);
        let method = name.lexeme;

        if explicit.is_none()
            && let Some(intrinsic) = self.intrinsic_method(lookup, method, span)?
        {
            return self.finish_intrinsic(receiver, lookup, intrinsic, args, span);
        }

        let cmp = self.ctx.comparer();
        let instance: Vec<_> = self
            .host
            .methods(lookup, method, cmp)
            .into_iter()
            .filter(|m| !m.is_static)
            .collect();
        let extensions = self.ctx.extension_methods(method);
        if instance.is_empty() && extensions.is_empty() {
            return Err(unknown_member(lookup, method, name.span).into());
        }

        if !instance.is_empty() {
            match self.resolve_call(method, &instance, &args, explicit.as_deref(), span) {
                Ok(matched) => {
                    let bound = self.bind_match(method, matched, args)?;
                    let member = Member::Method(bound.method.func.clone());
                    return Ok(access(receiver, member, bound.args, bound.ret, span));
                }
                Err(SemanticError::NoApplicableMethod { .. }) if !extensions.is_empty() => {}
                Err(error) => return Err(error.into()),
            }
        }

        // Extension methods take the receiver as their first argument.
        let receiver_slot = ArgSlot::Expr(TypedExpr { ty: lookup.clone(), ..receiver.clone() });
        let mut all_args = Vec::with_capacity(args.len() + 1);
        all_args.push(receiver_slot);
        all_args.extend(args);
        let matched = self.resolve_call(method, extensions, &all_args, explicit.as_deref(), span)?;
        let mut bound = self.bind_match(method, matched, all_args)?;
        let converted_receiver = bound.args.remove(0);
        let receiver = match converted_receiver.kind {
            ExprKind::Convert { conversion, .. } => receiver.convert(conversion, converted_receiver.ty),
            _ => receiver,
        };
        Ok(access(
            receiver,
            Member::Extension(bound.method.func.clone()),
            bound.args,
            bound.ret,
            span,
        ))
    }

    /// Reflection and nullable members handled without the host.
    fn intrinsic_method(&self, lookup: &Ty, name: &str, span: Span) -> ParseResult<Option<Member>> {
        let cmp = self.ctx.comparer();
        let reflect = if cmp.matches("GetType", name) {
            Some(ReflectKind::GetType)
        } else if *lookup == Ty::Type && cmp.matches("GetMethods", name) {
            Some(ReflectKind::GetMethods)
        } else if *lookup == Ty::Type && cmp.matches("GetProperties", name) {
            Some(ReflectKind::GetProperties)
        } else if *lookup == Ty::Type && cmp.matches("GetMembers", name) {
            Some(ReflectKind::GetMembers)
        } else {
            None
        };
        if let Some(kind) = reflect {
            if self.host.is_restricted() {
                return Err(SemanticError::ReflectionNotAllowed {
                    member: name.to_string(),
                    span,
                }
                .into());
            }
            return Ok(Some(Member::Reflect(kind)));
        }
        if lookup.is_nullable() && cmp.matches("GetValueOrDefault", name) {
            return Ok(Some(Member::GetValueOrDefault));
        }
        if lookup.as_func().is_some() && cmp.matches("Invoke", name) {
            return Ok(Some(Member::Invoke));
        }
        Ok(None)
    }

    fn finish_intrinsic(
        &mut self,
        receiver: TypedExpr,
        lookup: &Ty,
        member: Member,
        args: Vec<ArgSlot>,
        span: Span,
    ) -> ParseResult<TypedExpr> {
        match member {
            Member::Reflect(kind) => {
                if !args.is_empty() {
                    return Err(SemanticError::NoApplicableMethod {
                        name: format!("{kind:?}"),
                        args: format!("{} argument(s)", args.len()),
                        span,
                    }
                    .into());
                }
                let ty = if kind == ReflectKind::GetType { Ty::Type } else { Ty::array(Ty::String) };
                Ok(access(receiver, member, Vec::new(), ty, span))
            }
            Member::GetValueOrDefault => {
                let inner = lookup.underlying().clone();
                let mut args = plain_args("GetValueOrDefault", args, span)?;
                let fallback = match args.len() {
                    0 => TypedExpr::typed_constant(default_value(&inner), inner.clone(), span),
                    1 => coerce(args.remove(0), &inner, &*self.host)?,
                    n => {
                        return Err(SemanticError::NoApplicableMethod {
                            name: "GetValueOrDefault".to_string(),
                            args: format!("{n} argument(s)"),
                            span,
                        }
                        .into());
                    }
                };
                Ok(access(receiver, member, vec![fallback], inner, span))
            }
            _ => self.invoke_delegate(receiver, lookup, args, span),
        }
    }

    // =========================================================================
    // Indexers and invocation
    // =========================================================================

    /// `receiver[args]`; the `[` or `?[` has been consumed.
    fn parse_index(&mut self, receiver: TypedExpr, open: Span, chain: &mut NullChain) -> ParseResult<TypedExpr> {
        let (args, args_span) = self.parse_argument_list(open, TokenKind::RightBracket)?;
        let lookup = chain.member_receiver(&receiver.ty);
        let span = receiver.span.merge(args_span);

        let indexers = self.host.indexers(&lookup);
        let expr = if !indexers.is_empty() {
            let candidates: Vec<Arc<MethodDef>> = indexers
                .iter()
                .map(|ix| Arc::new(MethodDef::instance("this[]", ix.params.clone(), ix.ret.clone(), ix.getter.clone())))
                .collect();
            let matched = self.resolve_call("this[]", &candidates, &args, None, span)?;
            let bound = self.bind_match("this[]", matched, args)?;
            access(receiver, Member::Indexer(bound.method.func.clone()), bound.args, bound.ret, span)
        } else {
            let (member, elem) = match &lookup {
                Ty::Array(elem) => (Member::ArrayIndex, (**elem).clone()),
                Ty::String => (Member::StringIndex, Ty::Char),
                other => return Err(unknown_member(other, "[]", span).into()),
            };
            let mut args = plain_args("[]", args, span)?;
            if args.len() != 1 {
                return Err(SemanticError::NoApplicableMethod {
                    name: "[]".to_string(),
                    args: format!("{} argument(s)", args.len()),
                    span,
                }
                .into());
            }
            let index = coerce(args.remove(0), &Ty::Int, &*self.host)?;
            access(receiver, member, vec![index], elem, span)
        };
        Ok(chain.link(expr)?)
    }

    /// `callee(args)` on a delegate-typed value.
    fn parse_invoke(&mut self, callee: TypedExpr, chain: &mut NullChain) -> ParseResult<TypedExpr> {
        let (args, args_span) = self.parse_arguments()?;
        let lookup = chain.member_receiver(&callee.ty);
        let span = callee.span.merge(args_span);
        let expr = self.invoke_delegate(callee, &lookup, args, span)?;
        Ok(chain.link(expr)?)
    }

    fn invoke_delegate(&mut self, callee: TypedExpr, lookup: &Ty, args: Vec<ArgSlot>, span: Span) -> ParseResult<TypedExpr> {
        let Some(sig) = lookup.as_func() else {
            return Err(SemanticError::type_error(span, format!("a value of type '{lookup}' cannot be invoked")).into());
        };
        let params = sig
            .params
            .iter()
            .enumerate()
            .map(|(i, ty)| ParamDef::new(format!("arg{}", i + 1), ty.clone()))
            .collect();
        let candidate = Arc::new(MethodDef::instance("Invoke", params, sig.ret.clone(), dispatched_by_emitter()));
        let matched = self.resolve_call("Invoke", &[candidate], &args, None, span)?;
        let bound = self.bind_match("Invoke", matched, args)?;
        Ok(access(callee, Member::Invoke, bound.args, bound.ret, span))
    }
}
