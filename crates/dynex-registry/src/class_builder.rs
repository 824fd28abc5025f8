//! ClassBuilder for describing host classes and extending built-in types.
//!
//! # Example
//!
//! ```
//! use dynex_core::{ParamDef, Ty, Value};
//! use dynex_registry::{ClassBuilder, Function};
//!
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! let person = ClassBuilder::reference("Person")
//!     .property("Name", Ty::String, |p: &Person| p.name.clone())
//!     .property("Age", Ty::Int, |p: &Person| p.age)
//!     .method(Function::new("Greet", vec![ParamDef::new("other", Ty::String)], Ty::String, |args: &[Value]| {
//!         let me = args[0].downcast_ref::<Person>()?;
//!         Ok(Value::from(format!("{} greets {}", me.name, args[1])))
//!     }));
//! assert_eq!(person.ty().to_string(), "Person");
//! ```

use std::any::Any;
use std::sync::Arc;

use dynex_core::{ClassId, IndexerDef, MethodDef, NativeFn, ParamDef, PropertyDef, RuntimeError, Ty, TypeHash, Value};

use crate::Function;

/// Builder for a host class, or for members added to a built-in type.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    pub(crate) ty: Ty,
    pub(crate) base: Option<String>,
    pub(crate) properties: Vec<Arc<PropertyDef>>,
    pub(crate) methods: Vec<Arc<MethodDef>>,
    pub(crate) indexers: Vec<Arc<IndexerDef>>,
    pub(crate) constructors: Vec<Arc<MethodDef>>,
}

impl ClassBuilder {
    /// A reference class; instances may be null.
    pub fn reference(name: &str) -> Self {
        Self::for_type(Ty::Class(ClassId::reference(name)))
    }

    /// A value class; instances are never null unless made nullable.
    pub fn value(name: &str) -> Self {
        Self::for_type(Ty::Class(ClassId::value(name)))
    }

    /// Members for an existing type family (`string`, `int`, `object`, arrays, ...).
    pub fn for_type(ty: Ty) -> Self {
        Self {
            ty,
            base: None,
            properties: Vec::new(),
            methods: Vec::new(),
            indexers: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// The type this builder describes.
    pub fn ty(&self) -> Ty {
        self.ty.clone()
    }

    /// Derive from a previously registered class.
    pub fn base(mut self, name: &str) -> Self {
        self.base = Some(name.to_string());
        self
    }

    /// Instance property backed by a typed getter.
    ///
    /// The getter fails with `InvalidCast` when the receiver is not a `T`.
    pub fn property<T, R, F>(self, name: &str, ty: Ty, getter: F) -> Self
    where
        T: Any,
        R: Into<Value>,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        self.property_raw(name, ty, move |receiver: &Value| Ok(getter(receiver.downcast_ref::<T>()?).into()))
    }

    /// Instance property over the raw receiver value.
    pub fn property_raw<F>(mut self, name: &str, ty: Ty, getter: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        let func = NativeFn::new(TypeHash::from_name(name), move |args: &[Value]| match args.first() {
            Some(Value::Null) | None => Err(RuntimeError::NullReference),
            Some(receiver) => getter(receiver),
        });
        self.properties.push(Arc::new(PropertyDef::instance(name, ty, func)));
        self
    }

    /// Static constant such as `int.MaxValue` or `Math.PI`.
    pub fn constant(mut self, name: &str, ty: Ty, value: impl Into<Value>) -> Self {
        let value = value.into();
        let func = NativeFn::new(TypeHash::from_name(name), move |_: &[Value]| Ok(value.clone()));
        self.properties.push(Arc::new(PropertyDef::constant(name, ty, func)));
        self
    }

    /// Instance method; the function receives the receiver as its first argument.
    pub fn method(mut self, function: Function) -> Self {
        self.methods.push(Arc::new(function.into_instance()));
        self
    }

    /// Static method.
    pub fn static_method(mut self, function: Function) -> Self {
        self.methods.push(Arc::new(function.into_function()));
        self
    }

    /// Indexer; the getter receives the receiver followed by the index values.
    pub fn indexer<F>(mut self, params: Vec<ParamDef>, ret: Ty, getter: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        let func = NativeFn::new(TypeHash::from_function("this[]", params.len()), getter);
        self.indexers.push(Arc::new(IndexerDef { params, ret, getter: func }));
        self
    }

    /// Constructor used by `new T(...)`; it returns the new instance.
    pub fn constructor(mut self, function: Function) -> Self {
        let mut def = function.into_function();
        def.ret = self.ty.clone();
        self.constructors.push(Arc::new(def));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point {
        x: i32,
    }

    #[test]
    fn typed_property_downcasts() {
        let class = ClassBuilder::value("Point").property("X", Ty::Int, |p: &Point| p.x);
        let getter = &class.properties[0].getter;
        let point = Value::object(ClassId::value("Point"), Point { x: 7 });
        assert_eq!(getter.call(&[point]), Ok(Value::Int(7)));
        assert_eq!(getter.call(&[Value::Null]), Err(RuntimeError::NullReference));
        assert!(matches!(getter.call(&[Value::Int(1)]), Err(RuntimeError::InvalidCast { .. })));
    }

    #[test]
    fn constants_are_static() {
        let class = ClassBuilder::for_type(Ty::Int).constant("MaxValue", Ty::Int, i32::MAX);
        let prop = &class.properties[0];
        assert!(prop.is_static);
        assert_eq!(prop.getter.call(&[]), Ok(Value::Int(i32::MAX)));
    }

    #[test]
    fn constructors_return_class() {
        let class = ClassBuilder::reference("Box").constructor(Function::new("Box", Vec::new(), Ty::Object, |_: &[Value]| {
            Ok(Value::object(ClassId::reference("Box"), ()))
        }));
        assert_eq!(class.constructors[0].ret, class.ty());
    }
}
