//! The invocable result of a compilation.

use std::fmt;
use std::sync::Arc;

use dynex_core::{HostTypes, Parameter, RuntimeError, Ty, Value};
use dynex_registry::KnownType;

use crate::conversion::{convert_numeric, widening_cost};
use crate::emit::{Env, Thunk};

/// Symbols an expression referenced while it was parsed.
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub parameters: Vec<Parameter>,
    pub types: Vec<KnownType>,
    pub identifiers: Vec<String>,
}

/// An immutable, re-invokable compiled expression.
///
/// Invocation holds no locks and mutates nothing, so one instance may be
/// invoked from several threads at once.
#[derive(Clone)]
pub struct CompiledExpression {
    root: Thunk,
    parameters: Vec<Parameter>,
    return_type: Ty,
    host: Arc<dyn HostTypes>,
    usage: Usage,
}

impl CompiledExpression {
    pub(crate) fn new(root: Thunk, parameters: Vec<Parameter>, return_type: Ty, host: Arc<dyn HostTypes>) -> Self {
        Self {
            root,
            parameters,
            return_type,
            host,
            usage: Usage::default(),
        }
    }

    pub(crate) fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    /// Invoke with positional arguments.
    ///
    /// Missing trailing arguments take their parameter's default. Numeric
    /// arguments widen to the declared type; any other mismatch fails before
    /// evaluation starts.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        let values = self.bind_arguments(args)?;
        (self.root)(&Env::root(values))
    }

    fn bind_arguments(&self, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
        if args.len() > self.parameters.len() {
            return Err(RuntimeError::ArgumentCount {
                expected: self.parameters.len(),
                got: args.len(),
            });
        }

        let mut values = Vec::with_capacity(self.parameters.len());
        for (i, param) in self.parameters.iter().enumerate() {
            let value = match (args.get(i), &param.default) {
                (Some(value), _) => value.clone(),
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    return Err(RuntimeError::ArgumentCount {
                        expected: self.parameters.len(),
                        got: args.len(),
                    });
                }
            };
            values.push(self.check_argument(param, value)?);
        }
        Ok(values)
    }

    fn check_argument(&self, param: &Parameter, value: Value) -> Result<Value, RuntimeError> {
        if self.host.accepts(&value, &param.ty) {
            return Ok(value);
        }
        let actual = value.runtime_type();
        if widening_cost(&actual, param.ty.underlying()).is_some() {
            return convert_numeric(value, &param.ty);
        }
        Err(RuntimeError::ArgumentType {
            name: param.name.clone(),
            expected: param.ty.to_string(),
            actual: actual.to_string(),
        })
    }

    pub fn return_type(&self) -> &Ty {
        &self.return_type
    }

    /// Declared parameters, in invocation order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Declared parameters the expression references.
    pub fn used_parameters(&self) -> &[Parameter] {
        &self.usage.parameters
    }

    pub fn used_types(&self) -> &[KnownType] {
        &self.usage.types
    }

    pub fn used_identifiers(&self) -> &[String] {
        &self.usage.identifiers
    }
}

impl fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("parameters", &self.parameters)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}
