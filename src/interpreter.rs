//! The configuration facade.
//!
//! An `Interpreter` owns the catalog that expressions are parsed against.
//! Every parse borrows the catalog as it is at that moment; later changes
//! never affect expressions that were already parsed.
//!
//! # Example
//!
//! ```
//! use dynex::{Interpreter, InterpreterOptions, Parameter, Value};
//!
//! let mut interpreter = Interpreter::new(InterpreterOptions::DEFAULT).unwrap();
//! interpreter.set_variable("rate", 0.5);
//!
//! let lambda = interpreter
//!     .parse("price * rate", None, &[Parameter::new("price", dynex::Ty::Double)])
//!     .unwrap();
//! assert_eq!(lambda.invoke(&[Value::Double(10.0)]).unwrap(), Value::Double(5.0));
//! ```

use dynex_core::{ExpressionError, FromValue, Parameter, RegistrationError, SemanticError, Span, Ty, Value};
use dynex_registry::{Catalog, ClassBuilder, DefaultNumberType, Function, InterpreterOptions, Module};
use tracing::debug;

use crate::detector::{IdentifiersInfo, detect};
use crate::lambda::Lambda;

/// Expression parser and evaluator configured with host symbols.
#[derive(Debug, Clone)]
pub struct Interpreter {
    catalog: Catalog,
    options: InterpreterOptions,
}

impl Interpreter {
    /// Create an interpreter with the features selected by `options`.
    ///
    /// `PRIMITIVE_TYPES` brings the members of the built-in types along with
    /// the sequence extension methods; `COMMON_TYPES` adds `Math` and `Convert`.
    pub fn new(options: InterpreterOptions) -> Result<Self, RegistrationError> {
        let mut catalog = Catalog::with_options(options);
        if options.contains(InterpreterOptions::PRIMITIVE_TYPES) {
            catalog.install(dynex_modules::numeric::module())?;
            catalog.install(dynex_modules::string::module())?;
            catalog.install(dynex_modules::enumerable::module())?;
        }
        if options.contains(InterpreterOptions::COMMON_TYPES) {
            catalog.install(dynex_modules::math::module())?;
            catalog.install(dynex_modules::convert::module())?;
        }
        debug!(options = ?options, "created interpreter");
        Ok(Self { catalog, options })
    }

    pub fn options(&self) -> InterpreterOptions {
        self.options
    }

    /// The catalog snapshot the next parse will use.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Expose a value as a global identifier typed after the value.
    ///
    /// A null value is typed `object`.
    pub fn set_variable(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        let ty = match value.runtime_type() {
            Ty::Null => Ty::Object,
            ty => ty,
        };
        self.catalog.set_constant(name, ty, value);
        self
    }

    /// Expose a value as a global identifier of the given type.
    pub fn set_variable_typed(&mut self, name: &str, ty: Ty, value: impl Into<Value>) -> &mut Self {
        self.catalog.set_constant(name, ty, value.into());
        self
    }

    /// Add a function callable as `name(...)`.
    ///
    /// Functions registered under the same name form one overloaded group.
    pub fn set_function(&mut self, name: &str, function: Function) -> &mut Self {
        self.catalog.add_function(function.renamed(name));
        self
    }

    /// Forget a variable or every function of that name.
    pub fn unset_identifier(&mut self, name: &str) -> &mut Self {
        self.catalog.remove_identifier(name);
        self
    }

    /// Make a type reachable by `alias` in casts, `typeof`, `new` and static access.
    pub fn reference_type(&mut self, alias: &str, ty: Ty) -> &mut Self {
        self.catalog.add_known_type(alias, ty);
        self
    }

    /// Register a host class and reference it under its own name.
    pub fn register_class(&mut self, class: ClassBuilder) -> Result<Ty, RegistrationError> {
        let ty = self.catalog.register_class(class)?;
        if let Ty::Class(id) = &ty {
            self.catalog.add_known_type(&id.name, ty.clone());
        }
        Ok(ty)
    }

    /// Install every registration of a module.
    pub fn install(&mut self, module: Module) -> Result<&mut Self, RegistrationError> {
        self.catalog.install(module)?;
        Ok(self)
    }

    // ==========================================================================
    // Settings
    // ==========================================================================

    pub fn set_default_number_type(&mut self, number_type: DefaultNumberType) -> &mut Self {
        self.catalog.set_default_number_type(number_type);
        self
    }

    /// Allow `GetType()` and member enumeration on host types.
    pub fn enable_reflection(&mut self) -> &mut Self {
        self.catalog.set_reflection_enabled(true);
        self
    }

    /// Limit the nesting depth a parse accepts.
    pub fn set_max_depth(&mut self, max_depth: usize) -> &mut Self {
        self.catalog.set_max_depth(max_depth);
        self
    }

    // ==========================================================================
    // Parsing and evaluation
    // ==========================================================================

    /// Parse `text` into an invokable lambda.
    ///
    /// With a `return_ty` the result is implicitly converted to that type.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(&self, text: &str, return_ty: Option<&Ty>, params: &[Parameter]) -> Result<Lambda, ExpressionError> {
        let compiled = dynex_compiler::compile(text, params, return_ty, &self.catalog)?;
        Ok(Lambda::new(text, params.to_vec(), compiled, self.catalog.comparer()))
    }

    /// Parse `text` as the body of a delegate type.
    ///
    /// Parameters take the delegate's parameter types and are named by
    /// `names`, falling back to `arg1`, `arg2`, ... when fewer names are given.
    pub fn parse_as_delegate(&self, text: &str, delegate: &Ty, names: &[&str]) -> Result<Lambda, ExpressionError> {
        let Some(sig) = delegate.as_func() else {
            return Err(SemanticError::type_error(Span::default(), format!("'{delegate}' is not a delegate type")).into());
        };
        let params: Vec<Parameter> = sig
            .params
            .iter()
            .enumerate()
            .map(|(i, ty)| match names.get(i) {
                Some(name) => Parameter::new(*name, ty.clone()),
                None => Parameter::new(format!("arg{}", i + 1), ty.clone()),
            })
            .collect();
        self.parse(text, Some(&sig.ret), &params)
    }

    /// Parse and invoke in one step, passing each parameter's value.
    pub fn eval(&self, text: &str, params: &[Parameter]) -> Result<Value, ExpressionError> {
        let lambda = self.parse(text, None, params)?;
        Ok(lambda.invoke(&argument_values(params))?)
    }

    /// Parse, convert the result to `T` and invoke.
    pub fn eval_as<T: FromValue>(&self, text: &str, params: &[Parameter]) -> Result<T, ExpressionError> {
        let lambda = self.parse(text, Some(&T::static_type()), params)?;
        let value = lambda.invoke(&argument_values(params))?;
        Ok(T::from_value(value)?)
    }

    /// Classify the identifiers `text` mentions without parsing it.
    pub fn detect_identifiers(&self, text: &str) -> Result<IdentifiersInfo, ExpressionError> {
        detect(text, &self.catalog)
    }
}

fn argument_values(params: &[Parameter]) -> Vec<Value> {
    params
        .iter()
        .map(|p| p.value.clone().or_else(|| p.default.clone()).unwrap_or(Value::Null))
        .collect()
}
