//! dynex Compiler
//!
//! Turns expression text into a [`CompiledExpression`] in a single
//! parse-and-resolve pass followed by closure emission.
//!
//! ## Modules
//!
//! - [`context`]: per-parse symbol access with usage tracking
//! - [`scope`]: lambda parameter frames
//! - [`conversion`]: implicit and explicit conversions, tiers and costs
//! - [`overload`]: overload resolution and generic inference
//! - [`operators`]: typing and evaluation of operators
//! - [`tree`]: the resolved expression tree
//! - [`chain`]: null-propagation chains
//! - [`parser`]: the parser that builds the resolved tree
//! - [`emit`]: closure emission
//!
//! ```text
//! text ──Lexer──> tokens ──Parser──> TypedExpr ──emit──> CompiledExpression
//!                             │
//!                             └── ResolutionContext (catalog, parameters, usage)
//! ```

pub mod chain;
mod compiled;
pub mod context;
pub mod conversion;
pub mod emit;
pub mod operators;
pub mod overload;
pub mod parser;
pub mod scope;
pub mod tree;

pub use compiled::{CompiledExpression, Usage};
pub use context::ResolutionContext;
pub use conversion::{Conversion, ConversionKind, Tier, find_conversion, find_explicit_conversion};
pub use overload::{OverloadMatch, resolve_overload};
pub use parser::Parser;
pub use scope::LambdaScope;
pub use tree::{ExprKind, TypedExpr};

use bumpalo::Bump;
use dynex_core::{ExpressionError, Parameter, Ty};
use dynex_lexer::Lexer;
use dynex_registry::Catalog;
use tracing::debug;

/// Compile `text` against a catalog snapshot.
///
/// `return_ty` requests the result type; the expression is implicitly
/// converted to it. Without one the expression's own type is used. When the
/// requested type is a delegate and the whole expression is a lambda, the
/// lambda takes its parameter types from the delegate.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile(
    text: &str,
    parameters: &[Parameter],
    return_ty: Option<&Ty>,
    catalog: &Catalog,
) -> Result<CompiledExpression, ExpressionError> {
    debug!(text, params = parameters.len(), "parsing expression");

    let arena = Bump::new();
    let tokens = Lexer::new(text, &arena).tokenize()?;
    let ctx = ResolutionContext::new(text, parameters.to_vec(), catalog)?;
    let root_delegate = return_ty.and_then(Ty::as_func).cloned();
    let (tree, ctx) = Parser::new(tokens, ctx, root_delegate).parse()?;

    debug!(result = %tree.ty, "parsed expression");

    let usage = Usage {
        parameters: ctx.used_parameters(),
        types: ctx.used_types().to_vec(),
        identifiers: ctx.used_identifiers().to_vec(),
    };
    let compiled = emit::compile(tree, parameters.to_vec(), return_ty, catalog.host())?;
    Ok(compiled.with_usage(usage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynex_core::{RuntimeError, SemanticError, Value};
    use dynex_registry::InterpreterOptions;
    use pretty_assertions::assert_eq;

    fn eval(text: &str) -> Result<Value, ExpressionError> {
        let catalog = Catalog::with_options(InterpreterOptions::DEFAULT);
        Ok(compile(text, &[], None, &catalog)?.invoke(&[])?)
    }

    #[test]
    fn exponent_literals() {
        assert_eq!(eval("1+1e10").unwrap(), Value::Double(10000000001.0));
        assert_eq!(eval("1+1e-10").unwrap(), Value::Double(1.0000000001));
        assert_eq!(eval("2.02e-10").unwrap(), Value::Double(2.02e-10));
    }

    #[test]
    fn parameters_and_reinvocation() {
        let catalog = Catalog::with_options(InterpreterOptions::DEFAULT);
        let params = [Parameter::new("x", Ty::Int), Parameter::new("y", Ty::Int)];
        let compiled = compile("x * y + 1", &params, None, &catalog).unwrap();

        assert_eq!(compiled.return_type(), &Ty::Int);
        assert_eq!(compiled.invoke(&[Value::Int(2), Value::Int(3)]), Ok(Value::Int(7)));
        assert_eq!(compiled.invoke(&[Value::Int(4), Value::Int(5)]), Ok(Value::Int(21)));
        assert_eq!(compiled.used_parameters().len(), 2);
    }

    #[test]
    fn unused_parameters_are_not_reported() {
        let catalog = Catalog::with_options(InterpreterOptions::DEFAULT);
        let params = [Parameter::new("x", Ty::Int), Parameter::new("y", Ty::Int)];
        let compiled = compile("x + 1", &params, None, &catalog).unwrap();
        let names: Vec<_> = compiled.used_parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["x"]);
    }

    #[test]
    fn conditional_and_coalesce() {
        let catalog = Catalog::with_options(InterpreterOptions::DEFAULT);
        let params = [Parameter::new("a", Ty::nullable(Ty::Int))];
        let compiled = compile("a ?? -1", &params, None, &catalog).unwrap();
        assert_eq!(compiled.invoke(&[Value::Null]), Ok(Value::Int(-1)));
        assert_eq!(compiled.invoke(&[Value::Int(4)]), Ok(Value::Int(4)));

        assert_eq!(eval("1 < 2 ? \"yes\" : \"no\"").unwrap(), Value::from("yes"));
    }

    #[test]
    fn root_lambda_takes_the_requested_delegate() {
        let catalog = Catalog::with_options(InterpreterOptions::DEFAULT);
        let delegate = Ty::func(vec![Ty::Int, Ty::Int], Ty::Int);
        let compiled = compile("(a, b) => a * b", &[], Some(&delegate), &catalog).unwrap();
        let Ok(Value::Func(func)) = compiled.invoke(&[]) else {
            panic!("expected a delegate");
        };
        assert_eq!(func.call(&[Value::Int(6), Value::Int(7)]), Ok(Value::Int(42)));
    }

    #[test]
    fn errors_surface_by_stage() {
        assert!(eval("1 +").unwrap_err().is_parse());
        assert!(eval("\"open").unwrap_err().is_lex());
        assert!(matches!(
            eval("b < 1"),
            Err(ExpressionError::Semantic(SemanticError::UnknownIdentifier { ref name, .. })) if name == "b"
        ));
        assert!(matches!(
            eval("1 / 0"),
            Err(ExpressionError::Runtime(RuntimeError::DivisionByZero))
        ));
    }
}
