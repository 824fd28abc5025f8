//! Runtime values.
//!
//! [`Value`] is what parameters, host members and compiled expressions
//! exchange. It is cheap to clone (strings, arrays and host objects are
//! reference counted) and `Send + Sync`, so a compiled expression can be
//! invoked from several threads at once.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{ClassId, NativeFn, RuntimeError, Ty};

/// A host object together with its class identity.
#[derive(Clone)]
pub struct HostObject {
    class: ClassId,
    data: Arc<dyn Any + Send + Sync>,
}

impl HostObject {
    /// Wrap a host value.
    pub fn new<T: Any + Send + Sync>(class: ClassId, value: T) -> Self {
        Self {
            class,
            data: Arc::new(value),
        }
    }

    /// Class of the wrapped value.
    pub fn class(&self) -> &ClassId {
        &self.class
    }

    /// Borrow the wrapped value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    /// Whether both handles point at the same object.
    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{..}}", self.class.name)
    }
}

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(Arc<str>),
    Array(Arc<[Value]>),
    Object(HostObject),
    Func(NativeFn),
    Type(Ty),
}

impl Value {
    /// Wrap a host value of the given class.
    pub fn object<T: Any + Send + Sync>(class: ClassId, value: T) -> Self {
        Value::Object(HostObject::new(class, value))
    }

    /// Build an array value.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Arc::from(items))
    }

    /// Whether this is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Integral view of `char`, `int` and `long` values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Char(c) => Some(*c as i64),
            Value::Int(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Real view of every numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// Borrow a host object's data.
    ///
    /// Fails with `NullReference` on null and `InvalidCast` on any other mismatch.
    pub fn downcast_ref<T: Any>(&self) -> Result<&T, RuntimeError> {
        match self {
            Value::Null => Err(RuntimeError::NullReference),
            Value::Object(obj) => obj.downcast_ref::<T>().ok_or_else(|| RuntimeError::InvalidCast {
                from: obj.class().name.to_string(),
                to: std::any::type_name::<T>().to_string(),
            }),
            other => Err(RuntimeError::InvalidCast {
                from: other.type_name(),
                to: std::any::type_name::<T>().to_string(),
            }),
        }
    }

    /// The most specific static type describing this value.
    pub fn runtime_type(&self) -> Ty {
        match self {
            Value::Null => Ty::Null,
            Value::Bool(_) => Ty::Bool,
            Value::Char(_) => Ty::Char,
            Value::Int(_) => Ty::Int,
            Value::Long(_) => Ty::Long,
            Value::Float(_) => Ty::Float,
            Value::Double(_) => Ty::Double,
            Value::String(_) => Ty::String,
            Value::Array(items) => {
                let elem = items.first().map(Value::runtime_type).unwrap_or(Ty::Object);
                Ty::array(elem)
            }
            Value::Object(obj) => Ty::Class(obj.class().clone()),
            Value::Func(_) => Ty::Object,
            Value::Type(_) => Ty::Type,
        }
    }

    /// Type name used in diagnostics.
    pub fn type_name(&self) -> String {
        self.runtime_type().to_string()
    }

    /// Text rendering used by `ToString()` and string concatenation.
    ///
    /// Null renders as the empty string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Char(c) => c.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::String(s) => s.to_string(),
            Value::Array(_) => format!("{}", self.runtime_type()),
            Value::Object(obj) => obj.class().name.to_string(),
            Value::Func(_) => "Delegate".to_string(),
            Value::Type(ty) => ty.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Func(a), Value::Func(b)) => a.ptr_eq(b),
            (Value::Type(a), Value::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            other => f.write_str(&other.to_display_string()),
        }
    }
}

// ============================================================================
// Conversions from Rust values
// ============================================================================

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from!(bool => Bool, char => Char, i32 => Int, i64 => Long, f32 => Float, f64 => Double, Ty => Type, NativeFn => Func);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Arc::from(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// ============================================================================
// Conversions into Rust values
// ============================================================================

/// Rust types that a compiled expression's result can be extracted into.
pub trait FromValue: Sized {
    /// Static type to request when parsing.
    fn static_type() -> Ty;

    /// Extract from a value of [`static_type`](Self::static_type).
    fn from_value(value: Value) -> Result<Self, RuntimeError>;
}

fn cast_error(value: &Value, to: &Ty) -> RuntimeError {
    RuntimeError::InvalidCast {
        from: value.type_name(),
        to: to.to_string(),
    }
}

macro_rules! impl_from_value {
    ($($t:ty => $variant:ident, $ty:expr);* $(;)?) => {
        $(
            impl FromValue for $t {
                fn static_type() -> Ty {
                    $ty
                }

                fn from_value(value: Value) -> Result<Self, RuntimeError> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        Value::Null => Err(RuntimeError::NullReference),
                        other => Err(cast_error(&other, &$ty)),
                    }
                }
            }
        )*
    };
}

impl_from_value! {
    bool => Bool, Ty::Bool;
    char => Char, Ty::Char;
    i32 => Int, Ty::Int;
    i64 => Long, Ty::Long;
    f32 => Float, Ty::Float;
    f64 => Double, Ty::Double;
}

impl FromValue for String {
    fn static_type() -> Ty {
        Ty::String
    }

    fn from_value(value: Value) -> Result<Self, RuntimeError> {
        match value {
            Value::String(s) => Ok(s.to_string()),
            Value::Null => Err(RuntimeError::NullReference),
            other => Err(cast_error(&other, &Ty::String)),
        }
    }
}

impl FromValue for Value {
    fn static_type() -> Ty {
        Ty::Object
    }

    fn from_value(value: Value) -> Result<Self, RuntimeError> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn static_type() -> Ty {
        Ty::nullable(T::static_type())
    }

    fn from_value(value: Value) -> Result<Self, RuntimeError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn static_type() -> Ty {
        Ty::array(T::static_type())
    }

    fn from_value(value: Value) -> Result<Self, RuntimeError> {
        match value {
            Value::Array(items) => items.iter().cloned().map(T::from_value).collect(),
            Value::Null => Err(RuntimeError::NullReference),
            other => Err(cast_error(&other, &Self::static_type())),
        }
    }
}
