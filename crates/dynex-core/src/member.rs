//! Member descriptors: functions, methods, properties, indexers, and
//! declared expression parameters.
//!
//! Descriptors are immutable once registered and shared through `Arc`, so a
//! compiled expression can hold on to the members it calls.

use std::fmt;

use crate::{NativeFn, Ty, Value};

/// A parameter of a host function, method, constructor or indexer.
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: String,
    pub ty: Ty,
    /// Value used when the argument is omitted.
    pub default: Option<Value>,
}

impl ParamDef {
    /// A required parameter.
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// An optional parameter with a default value.
    pub fn optional(name: impl Into<String>, ty: Ty, default: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            default: Some(default),
        }
    }
}

/// A callable member: global function, static or instance method,
/// extension method, or constructor.
///
/// Instance and extension methods receive their receiver as the first
/// argument of `func`; for extension methods the receiver is also the first
/// declared parameter.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: String,
    pub params: Vec<ParamDef>,
    pub ret: Ty,
    /// Number of generic placeholders (`Ty::Param(0..n)`) in the signature.
    pub generic_arity: u8,
    pub is_static: bool,
    pub is_extension: bool,
    /// The last parameter is a `params` array.
    pub is_variadic: bool,
    pub func: NativeFn,
}

impl MethodDef {
    /// A static function.
    pub fn function(name: impl Into<String>, params: Vec<ParamDef>, ret: Ty, func: NativeFn) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            generic_arity: 0,
            is_static: true,
            is_extension: false,
            is_variadic: false,
            func,
        }
    }

    /// An instance method.
    pub fn instance(name: impl Into<String>, params: Vec<ParamDef>, ret: Ty, func: NativeFn) -> Self {
        Self {
            is_static: false,
            ..Self::function(name, params, ret, func)
        }
    }

    /// Mark as an extension method; the first parameter is the receiver.
    pub fn extension(mut self) -> Self {
        self.is_static = true;
        self.is_extension = true;
        self
    }

    /// Mark the last parameter as a `params` array.
    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }

    /// Declare the number of generic placeholders.
    pub fn generic(mut self, arity: u8) -> Self {
        self.generic_arity = arity;
        self
    }

    /// Number of parameters without defaults.
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| p.default.is_none()).count()
    }

    /// Whether any parameter carries a default value.
    pub fn has_defaults(&self) -> bool {
        self.params.iter().any(|p| p.default.is_some())
    }

    /// Element type of the trailing `params` array.
    pub fn variadic_element(&self) -> Option<Ty> {
        if !self.is_variadic {
            return None;
        }
        match self.params.last().map(|p| &p.ty) {
            Some(Ty::Array(elem)) => Some((**elem).clone()),
            _ => None,
        }
    }
}

impl fmt::Display for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if i + 1 == self.params.len() && self.is_variadic {
                f.write_str("params ")?;
            }
            write!(f, "{}", param.ty)?;
        }
        f.write_str(")")
    }
}

/// A property or field.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: String,
    pub ty: Ty,
    pub is_static: bool,
    /// Receives the receiver (instance) or nothing (static).
    pub getter: NativeFn,
}

impl PropertyDef {
    pub fn instance(name: impl Into<String>, ty: Ty, getter: NativeFn) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
            getter,
        }
    }

    pub fn constant(name: impl Into<String>, ty: Ty, getter: NativeFn) -> Self {
        Self {
            is_static: true,
            ..Self::instance(name, ty, getter)
        }
    }
}

/// An indexer (`obj[a, b]`).
#[derive(Debug, Clone)]
pub struct IndexerDef {
    pub params: Vec<ParamDef>,
    pub ret: Ty,
    /// Receives the receiver followed by the index arguments.
    pub getter: NativeFn,
}

/// Kinds reported by member enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Method,
    Property,
    Constructor,
    Indexer,
}

/// One entry of an open member enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    pub name: String,
    pub kind: MemberKind,
    pub is_static: bool,
}

/// A declared parameter of an expression.
///
/// Names are unique per parse under the configured case policy. `value` is
/// only used by evaluation helpers that parse and invoke in one step.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub ty: Ty,
    pub default: Option<Value>,
    pub value: Option<Value>,
}

impl Parameter {
    /// A parameter of the given type.
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            value: None,
        }
    }

    /// A parameter typed after its value (`object` for null).
    pub fn with_value(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = match value.runtime_type() {
            Ty::Null => Ty::Object,
            ty => ty,
        };
        Self {
            value: Some(value),
            ..Self::new(name, ty)
        }
    }

    /// A parameter of the given type carrying a value.
    pub fn typed_value(name: impl Into<String>, ty: Ty, value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::new(name, ty)
        }
    }

    /// Set the value used when an invocation omits this argument.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}
