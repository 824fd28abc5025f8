//! A parsed expression together with its text and declared parameters.

use dynex_compiler::CompiledExpression;
use dynex_core::{NameComparer, NativeFn, Parameter, RuntimeError, Ty, Value};
use dynex_registry::KnownType;

/// An invokable expression produced by [`Interpreter::parse`](crate::Interpreter::parse).
///
/// Cloning is cheap; clones share the compiled closure tree.
#[derive(Debug, Clone)]
pub struct Lambda {
    text: String,
    declared: Vec<Parameter>,
    compiled: CompiledExpression,
    comparer: NameComparer,
}

impl Lambda {
    pub(crate) fn new(text: &str, declared: Vec<Parameter>, compiled: CompiledExpression, comparer: NameComparer) -> Self {
        Self {
            text: text.to_string(),
            declared,
            compiled,
            comparer,
        }
    }

    /// Invoke with positional arguments in declaration order.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        self.compiled.invoke(args)
    }

    /// Invoke with arguments matched to declared parameters by name.
    ///
    /// Parameters without an argument take their default.
    pub fn invoke_named(&self, args: &[(&str, Value)]) -> Result<Value, RuntimeError> {
        if let Some((name, _)) = args
            .iter()
            .find(|(name, _)| !self.declared.iter().any(|p| self.comparer.matches(&p.name, name)))
        {
            return Err(RuntimeError::host(format!("unknown parameter '{name}'")));
        }

        let mut values = Vec::with_capacity(self.declared.len());
        for param in &self.declared {
            let given = args.iter().find(|(name, _)| self.comparer.matches(&param.name, name));
            match (given, &param.default) {
                (Some((_, value)), _) => values.push(value.clone()),
                (None, Some(default)) => values.push(default.clone()),
                (None, None) => {
                    return Err(RuntimeError::ArgumentCount {
                        expected: self.declared.len(),
                        got: args.len(),
                    });
                }
            }
        }
        self.compiled.invoke(&values)
    }

    /// Wrap this lambda as a delegate value other expressions can call.
    pub fn to_delegate(&self) -> NativeFn {
        let compiled = self.compiled.clone();
        NativeFn::anonymous(move |args: &[Value]| compiled.invoke(args))
    }

    pub fn expression_text(&self) -> &str {
        &self.text
    }

    pub fn return_type(&self) -> &Ty {
        self.compiled.return_type()
    }

    pub fn declared_parameters(&self) -> &[Parameter] {
        &self.declared
    }

    /// Declared parameters the expression references, in order of first use.
    pub fn used_parameters(&self) -> &[Parameter] {
        self.compiled.used_parameters()
    }

    pub fn used_types(&self) -> &[KnownType] {
        self.compiled.used_types()
    }

    pub fn used_identifiers(&self) -> &[String] {
        self.compiled.used_identifiers()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Interpreter, InterpreterOptions};
    use dynex_core::{Parameter, RuntimeError, Ty, Value};
    use pretty_assertions::assert_eq;

    fn params() -> Vec<Parameter> {
        vec![
            Parameter::new("a", Ty::Int),
            Parameter::new("b", Ty::Int).default_value(10),
        ]
    }

    #[test]
    fn named_invocation_matches_by_name() {
        let interpreter = Interpreter::new(InterpreterOptions::DEFAULT).unwrap();
        let lambda = interpreter.parse("a - b", None, &params()).unwrap();
        assert_eq!(lambda.invoke_named(&[("b", Value::Int(1)), ("a", Value::Int(5))]).unwrap(), Value::Int(4));
        assert_eq!(lambda.invoke_named(&[("a", Value::Int(5))]).unwrap(), Value::Int(-5));
        assert!(matches!(
            lambda.invoke_named(&[("c", Value::Int(1))]),
            Err(RuntimeError::Host { .. })
        ));
        assert!(matches!(
            lambda.invoke_named(&[("b", Value::Int(1))]),
            Err(RuntimeError::ArgumentCount { .. })
        ));
    }

    #[test]
    fn introspection() {
        let interpreter = Interpreter::new(InterpreterOptions::DEFAULT).unwrap();
        let lambda = interpreter.parse("Math.Abs(a) + int.MaxValue * 0", None, &params()).unwrap();
        assert_eq!(lambda.expression_text(), "Math.Abs(a) + int.MaxValue * 0");
        assert_eq!(lambda.return_type(), &Ty::Int);
        assert_eq!(lambda.declared_parameters().len(), 2);
        let used: Vec<_> = lambda.used_parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(used, vec!["a"]);
        let types: Vec<_> = lambda.used_types().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(types, vec!["Math", "int"]);
    }

    #[test]
    fn delegates_call_back_into_the_expression() {
        let interpreter = Interpreter::new(InterpreterOptions::DEFAULT).unwrap();
        let square = interpreter
            .parse("x * x", None, &[Parameter::new("x", Ty::Int)])
            .unwrap()
            .to_delegate();
        assert_eq!(square.call(&[Value::Int(7)]).unwrap(), Value::Int(49));
    }
}
