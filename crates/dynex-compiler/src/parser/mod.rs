//! Expression parser with inline resolution.
//!
//! The parser is a Pratt parser over the token stream. It resolves every
//! identifier, member access and call while it parses, so its output is a
//! fully typed [`TypedExpr`] tree and there is no separate binding pass.
//!
//! Lambda literals passed as call arguments are skipped on the first pass
//! and their bodies are parsed again ("replayed") once the enclosing call
//! has chosen its overload and the lambda's parameter types are known.
//!
//! Submodules split the grammar:
//! - `expr`: binary, conditional and unary tiers, casts
//! - `primary`: literals, identifiers, `new`, `typeof`, lambda literals
//! - `postfix`: member access, indexers, invocation, null-propagation
//! - `calls`: argument lists, overload binding, lambda replay
//! - `types`: type names inside expressions

mod calls;
mod expr;
mod postfix;
mod primary;
mod types;

use std::sync::Arc;

use dynex_core::{ExpressionError, FuncSig, HostTypes, ParseError, SemanticError, Span, Ty};
use dynex_lexer::{Token, TokenKind};

use crate::context::ResolutionContext;
use crate::scope::LambdaScope;
use crate::tree::TypedExpr;

pub(crate) type ParseResult<T> = Result<T, ExpressionError>;

/// A parsed operand before it is used as a value.
#[derive(Debug)]
enum Operand {
    Value(TypedExpr),
    /// A type name, valid only as the receiver of a static access.
    Type(Ty, Span),
}

impl Operand {
    fn into_value(self) -> ParseResult<TypedExpr> {
        match self {
            Operand::Value(expr) => Ok(expr),
            Operand::Type(ty, span) => {
                Err(SemanticError::type_error(span, format!("'{ty}' is a type, which is not valid in this context")).into())
            }
        }
    }
}

/// Parser state for one expression.
pub struct Parser<'ast, 'c> {
    buffer: Vec<Token<'ast>>,
    position: usize,
    ctx: ResolutionContext<'c>,
    scope: LambdaScope,
    host: Arc<dyn HostTypes>,
    depth: usize,
    max_depth: usize,
    /// Delegate signature requested for a lambda that forms the whole expression.
    root_delegate: Option<FuncSig>,
}

impl<'ast, 'c> Parser<'ast, 'c> {
    /// Create a parser over a token stream produced by the lexer.
    pub fn new(mut tokens: Vec<Token<'ast>>, ctx: ResolutionContext<'c>, root_delegate: Option<FuncSig>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, "", span));
        }
        let catalog = ctx.catalog();
        let declared = ctx.parameters().iter().map(|p| p.name.clone()).collect();
        let scope = LambdaScope::new(ctx.comparer(), declared);
        let host = catalog.host();
        let max_depth = catalog.max_depth();
        Self {
            buffer: tokens,
            position: 0,
            ctx,
            scope,
            host,
            depth: 0,
            max_depth,
            root_delegate,
        }
    }

    /// Parse the whole token stream as one expression.
    ///
    /// Returns the typed tree and the context with its usage sets filled.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(mut self) -> ParseResult<(TypedExpr, ResolutionContext<'c>)> {
        let expr = self.parse_expression()?;
        let token = self.peek();
        match token.kind {
            TokenKind::Eof => Ok((expr, self.ctx)),
            TokenKind::Equal => Err(assignment_error(token.span)),
            _ => Err(ParseError::unexpected_token(token.span, token.lexeme).into()),
        }
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn peek(&self) -> Token<'ast> {
        self.peek_at(0)
    }

    /// Token `offset` positions ahead; the final `Eof` repeats forever.
    fn peek_at(&self, offset: usize) -> Token<'ast> {
        let last = self.buffer.len() - 1;
        self.buffer[(self.position + offset).min(last)]
    }

    fn advance(&mut self) -> Token<'ast> {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        self.check(kind).then(|| self.advance())
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token<'ast>> {
        let token = self.peek();
        if token.kind == kind {
            return Ok(self.advance());
        }
        Err(if token.kind == TokenKind::Eof {
            ParseError::expected_token(token.span, kind.description(), TokenKind::Eof.description())
        } else {
            ParseError::expected_token(token.span, kind.description(), token.lexeme)
        }
        .into())
    }

    fn expect_identifier(&mut self) -> ParseResult<Token<'ast>> {
        let token = self.peek();
        if token.kind == TokenKind::Identifier {
            return Ok(self.advance());
        }
        Err(ParseError::expected_identifier(token.span, describe(token)).into())
    }

    /// Span of the most recently consumed token.
    fn previous_span(&self) -> Span {
        self.buffer[self.position.saturating_sub(1)].span
    }

    // =========================================================================
    // Recursion guard
    // =========================================================================

    /// Run `f` one nesting level deeper, failing past the configured limit.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= self.max_depth {
            return Err(ParseError::depth_limit(self.peek().span, self.max_depth).into());
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Charge one nesting level built by a loop rather than by recursion.
    ///
    /// The caller restores `depth` once the loop ends.
    fn deepen(&mut self) -> ParseResult<()> {
        if self.depth >= self.max_depth {
            return Err(ParseError::depth_limit(self.peek().span, self.max_depth).into());
        }
        self.depth += 1;
        Ok(())
    }
}

fn describe(token: Token<'_>) -> &str {
    if token.kind == TokenKind::Eof {
        TokenKind::Eof.description()
    } else {
        token.lexeme
    }
}

fn assignment_error(span: Span) -> ExpressionError {
    ParseError::new(
        dynex_core::ParseErrorKind::UnsupportedSyntax,
        span,
        "assignment is not supported in expressions",
    )
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{BinaryOp, ExprKind};
    use bumpalo::Bump;
    use dynex_core::{ParamDef, ParseErrorKind, Parameter, Value};
    use dynex_lexer::Lexer;
    use dynex_registry::{Catalog, ClassBuilder, DefaultNumberType, Function, InterpreterOptions};
    use pretty_assertions::assert_eq;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::with_options(InterpreterOptions::DEFAULT);
        catalog
            .register_class(
                ClassBuilder::for_type(Ty::String)
                    .property_raw("Length", Ty::Int, |s: &Value| {
                        Ok(Value::Int(s.as_str().map_or(0, |s| s.chars().count() as i32)))
                    })
                    .method(Function::new("Trim", Vec::new(), Ty::String, |args: &[Value]| {
                        Ok(args[0].clone())
                    }))
                    .method(Function::new(
                        "Contains",
                        vec![ParamDef::new("value", Ty::String)],
                        Ty::Bool,
                        |_: &[Value]| Ok(Value::Bool(true)),
                    )),
            )
            .unwrap();
        catalog.add_function(Function::new(
            "f",
            vec![ParamDef::new("x", Ty::nullable(Ty::Double))],
            Ty::Int,
            |_: &[Value]| Ok(Value::Int(1)),
        ));
        catalog.add_function(Function::new(
            "f",
            vec![ParamDef::new("x", Ty::String)],
            Ty::Int,
            |_: &[Value]| Ok(Value::Int(2)),
        ));
        catalog.add_extension(
            Function::new(
                "Where",
                vec![
                    ParamDef::new("source", Ty::seq(Ty::Param(0))),
                    ParamDef::new("predicate", Ty::func(vec![Ty::Param(0)], Ty::Bool)),
                ],
                Ty::seq(Ty::Param(0)),
                |args: &[Value]| Ok(args[0].clone()),
            )
            .generic(1),
        );
        catalog
    }

    fn parse_with(catalog: &Catalog, text: &str, params: Vec<Parameter>) -> ParseResult<TypedExpr> {
        let arena = Bump::new();
        let tokens = Lexer::new(text, &arena).tokenize()?;
        let ctx = ResolutionContext::new(text, params, catalog)?;
        Parser::new(tokens, ctx, None).parse().map(|(expr, _)| expr)
    }

    fn parse(text: &str) -> ParseResult<TypedExpr> {
        parse_with(&catalog(), text, Vec::new())
    }

    fn type_of(text: &str) -> Ty {
        parse(text).unwrap().ty
    }

    #[test]
    fn literal_types_follow_default_number_type() {
        assert_eq!(type_of("1"), Ty::Int);
        assert_eq!(type_of("3000000000"), Ty::Long);
        assert_eq!(type_of("1.5"), Ty::Double);
        assert_eq!(type_of("1.5f"), Ty::Float);
        assert_eq!(type_of("2L"), Ty::Long);
        assert_eq!(type_of("'c'"), Ty::Char);
        assert_eq!(type_of("\"s\""), Ty::String);

        let mut single = catalog();
        single.set_default_number_type(DefaultNumberType::Single);
        assert_eq!(parse_with(&single, "1", Vec::new()).unwrap().ty, Ty::Float);
        let mut long = catalog();
        long.set_default_number_type(DefaultNumberType::Long);
        assert_eq!(parse_with(&long, "1", Vec::new()).unwrap().ty, Ty::Long);
    }

    #[test]
    fn negative_literals_fold() {
        let expr = parse("-2147483648").unwrap();
        assert_eq!(expr.ty, Ty::Int);
        assert!(matches!(
            expr.kind,
            ExprKind::Constant {
                value: Value::Int(i32::MIN),
                unsuffixed: true
            }
        ));
    }

    #[test]
    fn precedence_tiers() {
        let expr = parse("1 + 2 * 3").unwrap();
        match expr.kind {
            ExprKind::Binary { op, right, .. } => {
                assert_eq!(op, BinaryOp::Add);
                assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("expected binary, got {other:?}"),
        }
        assert_eq!(type_of("1 < 2 == true"), Ty::Bool);
        assert_eq!(type_of("1 << 2 + 1"), Ty::Int);
        assert_eq!(type_of("true ? 1 : 2.5"), Ty::Double);
    }

    #[test]
    fn right_shift_needs_adjacent_tokens() {
        assert_eq!(type_of("16 >> 2"), Ty::Int);
        assert!(parse("16 > > 2").is_err());
    }

    #[test]
    fn coalesce_is_right_associative() {
        let params = vec![
            Parameter::new("a", Ty::nullable(Ty::Int)),
            Parameter::new("b", Ty::nullable(Ty::Int)),
        ];
        let expr = parse_with(&catalog(), "a ?? b ?? 0", params).unwrap();
        assert_eq!(expr.ty, Ty::Int);
        match expr.kind {
            ExprKind::Coalesce { right, .. } => assert!(matches!(right.kind, ExprKind::Coalesce { .. })),
            other => panic!("expected coalesce, got {other:?}"),
        }
    }

    #[test]
    fn casts_and_type_tests() {
        assert_eq!(type_of("(int)1.5"), Ty::Int);
        assert_eq!(type_of("(long?)1"), Ty::nullable(Ty::Long));
        assert_eq!(type_of("\"a\" is string"), Ty::Bool);
        assert_eq!(type_of("\"a\" as object"), Ty::Object);
        assert!(parse("(string)1").is_err());
    }

    #[test]
    fn parenthesized_names_that_are_not_types() {
        let params = vec![Parameter::new("x", Ty::Int)];
        assert_eq!(parse_with(&catalog(), "(x) + 1", params).unwrap().ty, Ty::Int);
    }

    #[test]
    fn unknown_identifier() {
        let params = vec![Parameter::new("a", Ty::Int)];
        let err = parse_with(&catalog(), "b < 1", params).unwrap_err();
        assert!(matches!(
            err,
            ExpressionError::Semantic(SemanticError::UnknownIdentifier { ref name, .. }) if name == "b"
        ));
    }

    #[test]
    fn overloads_and_ambiguity() {
        assert_eq!(type_of("f(1.5)"), Ty::Int);
        assert_eq!(type_of("f(\"x\")"), Ty::Int);
        assert!(matches!(
            parse("f(null)"),
            Err(ExpressionError::Semantic(SemanticError::AmbiguousInvocation { .. }))
        ));
    }

    #[test]
    fn null_chain_lifts_member_types() {
        let params = vec![Parameter::new("s", Ty::String)];
        assert_eq!(parse_with(&catalog(), "s?.Length", params.clone()).unwrap().ty, Ty::nullable(Ty::Int));
        assert_eq!(parse_with(&catalog(), "s.Length", params.clone()).unwrap().ty, Ty::Int);
        assert_eq!(parse_with(&catalog(), "s?.Contains(\"a\")", params).unwrap().ty, Ty::nullable(Ty::Bool));
        assert!(matches!(
            parse("string?.Empty"),
            Err(ExpressionError::Semantic(SemanticError::InvalidConditionalAccess { .. }))
        ));
    }

    #[test]
    fn lambda_arguments_are_bound_after_resolution() {
        let params = vec![
            Parameter::new("list", Ty::array(Ty::Int)),
            Parameter::new("value", Ty::Int),
        ];
        let expr = parse_with(&catalog(), "list.Where(x => x > value)", params).unwrap();
        assert_eq!(expr.ty, Ty::seq(Ty::Int));
    }

    #[test]
    fn nested_lambdas_cannot_redeclare_names() {
        let params = vec![Parameter::new("list", Ty::array(Ty::Int))];
        let err = parse_with(&catalog(), "list.Where(x => list.Where(x => x > 1) != null)", params.clone()).unwrap_err();
        assert!(matches!(
            err,
            ExpressionError::Semantic(SemanticError::LambdaParameterConflict { .. })
        ));
        assert!(parse_with(&catalog(), "list.Where(x => x > 1).Where(x => x < 3)", params).is_ok());
    }

    #[test]
    fn lambdas_can_be_disabled() {
        let mut catalog = catalog();
        catalog.set_lambdas_enabled(false);
        let params = vec![Parameter::new("list", Ty::array(Ty::Int))];
        assert!(matches!(
            parse_with(&catalog, "list.Where(x => x > 1)", params),
            Err(ExpressionError::Semantic(SemanticError::LambdasDisabled { .. }))
        ));
    }

    #[test]
    fn assignment_and_trailing_tokens_fail() {
        let params = vec![Parameter::new("a", Ty::Int)];
        match parse_with(&catalog(), "a = 1", params) {
            Err(ExpressionError::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::UnsupportedSyntax),
            other => panic!("expected parse error, got {other:?}"),
        }
        match parse("1 2") {
            Err(ExpressionError::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::UnexpectedToken),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn depth_limit_is_reported() {
        let text = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        match parse(&text) {
            Err(ExpressionError::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::DepthLimitExceeded),
            other => panic!("expected depth error, got {other:?}"),
        }
    }

    #[test]
    fn long_operator_and_member_chains_hit_the_depth_limit() {
        let depth_error = |text: &str| match parse(text) {
            Err(ExpressionError::Parse(e)) => e.kind == ParseErrorKind::DepthLimitExceeded,
            _ => false,
        };
        assert!(depth_error(&format!("1{}", "+1".repeat(5000))));
        assert!(depth_error(&format!("1{}", "*2-1".repeat(200))));
        assert!(depth_error(&format!("\"a\"{}", ".Trim()".repeat(200))));
        assert!(depth_error(&format!("\"a\"{}", "?.Trim()".repeat(200))));

        assert_eq!(type_of(&format!("1{}", "+1".repeat(80))), Ty::Int);
    }

    #[test]
    fn reflection_is_refused_on_restricted_hosts() {
        assert!(matches!(
            parse("typeof(double).GetMethods()"),
            Err(ExpressionError::Semantic(SemanticError::ReflectionNotAllowed { .. }))
        ));
        assert_eq!(type_of("typeof(double).Name"), Ty::String);
        assert_eq!(type_of("typeof(IEnumerable<>)"), Ty::Type);
    }

    #[test]
    fn arrays() {
        assert_eq!(type_of("new int[3]"), Ty::array(Ty::Int));
        assert_eq!(type_of("new int[] { 1, 2 }"), Ty::array(Ty::Int));
        assert_eq!(type_of("new[] { 1, 2.5 }"), Ty::array(Ty::Double));
        assert_eq!(type_of("new int[] { 1, 2 }[0]"), Ty::Int);
        assert_eq!(type_of("new int[2].Length"), Ty::Int);
    }
}
