//! Builder for host functions and methods.

use dynex_core::{FromValue, MethodDef, NativeFn, ParamDef, RuntimeError, Ty, TypeHash, Value};

/// A host callable under construction.
///
/// The same builder describes global functions, static and instance
/// methods, extension methods and constructors; where it is registered
/// decides which.
///
/// # Example
///
/// ```
/// use dynex_core::{ParamDef, Ty, Value};
/// use dynex_registry::Function;
///
/// let twice = Function::new("Twice", vec![ParamDef::new("x", Ty::Int)], Ty::Int, |args: &[Value]| {
///     Ok(Value::Int(args[0].as_i64().unwrap_or_default() as i32 * 2))
/// });
/// let sqrt = Function::unary("Sqrt", f64::sqrt);
/// assert_eq!(sqrt.def().to_string(), "Sqrt(double)");
/// # let _ = twice;
/// ```
#[derive(Debug, Clone)]
pub struct Function {
    def: MethodDef,
}

impl Function {
    /// A function over raw argument values.
    ///
    /// Instance methods receive their receiver as `args[0]`, ahead of the
    /// declared parameters.
    pub fn new<F>(name: &str, params: Vec<ParamDef>, ret: Ty, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        let id = TypeHash::from_function(name, params.len());
        Self {
            def: MethodDef::function(name, params, ret, NativeFn::new(id, f)),
        }
    }

    /// A function without parameters.
    pub fn nullary<R, F>(name: &str, f: F) -> Self
    where
        R: FromValue + Into<Value>,
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self::new(name, Vec::new(), R::static_type(), move |_: &[Value]| Ok(f().into()))
    }

    /// A function of one typed argument.
    pub fn unary<A, R, F>(name: &str, f: F) -> Self
    where
        A: FromValue,
        R: FromValue + Into<Value>,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let params = vec![ParamDef::new("a", A::static_type())];
        Self::new(name, params, R::static_type(), move |args: &[Value]| {
            Ok(f(A::from_value(arg(args, 0)?)?).into())
        })
    }

    /// A function of two typed arguments.
    pub fn binary<A, B, R, F>(name: &str, f: F) -> Self
    where
        A: FromValue,
        B: FromValue,
        R: FromValue + Into<Value>,
        F: Fn(A, B) -> R + Send + Sync + 'static,
    {
        let params = vec![ParamDef::new("a", A::static_type()), ParamDef::new("b", B::static_type())];
        Self::new(name, params, R::static_type(), move |args: &[Value]| {
            Ok(f(A::from_value(arg(args, 0)?)?, B::from_value(arg(args, 1)?)?).into())
        })
    }

    /// Declare generic placeholders `Ty::Param(0..arity)`.
    pub fn generic(mut self, arity: u8) -> Self {
        self.def = self.def.generic(arity);
        self
    }

    /// Mark the last parameter as a `params` array.
    pub fn variadic(mut self) -> Self {
        self.def = self.def.variadic();
        self
    }

    /// Register under another name.
    pub fn renamed(mut self, name: &str) -> Self {
        self.def.name = name.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn def(&self) -> &MethodDef {
        &self.def
    }

    pub(crate) fn into_function(self) -> MethodDef {
        self.def
    }

    pub(crate) fn into_instance(mut self) -> MethodDef {
        self.def.is_static = false;
        self.def
    }

    pub(crate) fn into_extension(self) -> MethodDef {
        self.def.extension()
    }
}

/// Fetch an argument by position, cloning it out of the slice.
pub fn arg(args: &[Value], index: usize) -> Result<Value, RuntimeError> {
    args.get(index).cloned().ok_or(RuntimeError::ArgumentCount {
        expected: index + 1,
        got: args.len(),
    })
}
