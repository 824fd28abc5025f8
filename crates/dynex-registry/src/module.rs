//! Module - a bundle of registrations installed in one step.

use dynex_core::{Ty, Value};

use crate::{ClassBuilder, Function};

/// Classes, functions, constants, type aliases and extension methods that
/// are installed together into a [`Catalog`](crate::Catalog).
///
/// # Example
///
/// ```
/// use dynex_core::Ty;
/// use dynex_registry::{ClassBuilder, Function, Module};
///
/// let module = Module::new()
///     .class(ClassBuilder::for_type(Ty::Int).constant("MaxValue", Ty::Int, i32::MAX))
///     .function(Function::unary("Twice", |x: i32| x * 2))
///     .constant("Answer", Ty::Int, 42);
/// assert_eq!(module.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub(crate) classes: Vec<(Option<String>, ClassBuilder)>,
    pub(crate) functions: Vec<Function>,
    pub(crate) constants: Vec<(String, Ty, Value)>,
    pub(crate) known_types: Vec<(String, Ty)>,
    pub(crate) extensions: Vec<Function>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class without naming it as a known type.
    pub fn class(mut self, class: ClassBuilder) -> Self {
        self.classes.push((None, class));
        self
    }

    /// Register a class and make it a known type under `alias`.
    pub fn named_class(mut self, alias: &str, class: ClassBuilder) -> Self {
        self.classes.push((Some(alias.to_string()), class));
        self
    }

    /// Global function; repeated names form an overload group.
    pub fn function(mut self, function: Function) -> Self {
        self.functions.push(function);
        self
    }

    /// Global constant identifier.
    pub fn constant(mut self, name: &str, ty: Ty, value: impl Into<Value>) -> Self {
        self.constants.push((name.to_string(), ty, value.into()));
        self
    }

    /// Make `ty` a known type under `alias`.
    pub fn known_type(mut self, alias: &str, ty: Ty) -> Self {
        self.known_types.push((alias.to_string(), ty));
        self
    }

    /// Extension method; the first parameter is the receiver.
    pub fn extension(mut self, function: Function) -> Self {
        self.extensions.push(function);
        self
    }

    /// Total number of registrations.
    pub fn len(&self) -> usize {
        self.classes.len()
            + self.functions.len()
            + self.constants.len()
            + self.known_types.len()
            + self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
