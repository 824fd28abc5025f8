//! Host type introspection capability.
//!
//! The resolver never reflects over Rust types directly. Everything it knows
//! about members, inheritance and member enumeration comes through
//! [`HostTypes`], which the registry implements.

use std::borrow::Cow;
use std::sync::Arc;

use thiserror::Error;

use crate::{IndexerDef, MemberInfo, MethodDef, PropertyDef, Ty, Value};

/// Case policy for names of parameters, types, identifiers and members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NameComparer {
    #[default]
    Ordinal,
    IgnoreCase,
}

impl NameComparer {
    /// Compare two names under this policy.
    #[inline]
    pub fn matches(self, a: &str, b: &str) -> bool {
        match self {
            NameComparer::Ordinal => a == b,
            NameComparer::IgnoreCase => a.eq_ignore_ascii_case(b),
        }
    }

    /// Normalized map key for a name.
    pub fn key<'a>(self, name: &'a str) -> Cow<'a, str> {
        match self {
            NameComparer::Ordinal => Cow::Borrowed(name),
            NameComparer::IgnoreCase => Cow::Owned(name.to_ascii_lowercase()),
        }
    }
}

/// Open member enumeration was refused because the host is restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("member enumeration is not allowed")]
pub struct ReflectionRefused;

/// Name-targeted member lookup and type relationships supplied by the host.
pub trait HostTypes: Send + Sync {
    /// Properties and fields named `name`, static and instance, including inherited ones.
    fn properties(&self, ty: &Ty, name: &str, cmp: NameComparer) -> Vec<Arc<PropertyDef>>;

    /// Methods named `name`, static and instance, including inherited ones.
    fn methods(&self, ty: &Ty, name: &str, cmp: NameComparer) -> Vec<Arc<MethodDef>>;

    /// Indexers declared by `ty` or its bases.
    fn indexers(&self, ty: &Ty) -> Vec<Arc<IndexerDef>>;

    /// Constructors of `ty`.
    fn constructors(&self, ty: &Ty) -> Vec<Arc<MethodDef>>;

    /// Direct base class of `ty`.
    fn base_type(&self, ty: &Ty) -> Option<Ty>;

    /// Whether open-ended member enumeration is refused.
    fn is_restricted(&self) -> bool;

    /// Enumerate every member of `ty`.
    fn enumerate_members(&self, ty: &Ty) -> Result<Vec<MemberInfo>, ReflectionRefused>;

    /// Whether a reference of type `from` can be used as `to` without conversion.
    fn is_assignable(&self, from: &Ty, to: &Ty) -> bool {
        if from == to {
            return true;
        }
        let mut current = self.base_type(from);
        while let Some(base) = current {
            if &base == to {
                return true;
            }
            current = self.base_type(&base);
        }
        false
    }

    /// Whether a non-null runtime value is an instance of `ty`.
    fn conforms(&self, value: &Value, ty: &Ty) -> bool {
        match (value, ty) {
            (Value::Null, _) => false,
            (_, Ty::Object) => true,
            (_, Ty::Nullable(inner)) => self.conforms(value, inner),
            (Value::Bool(_), Ty::Bool)
            | (Value::Char(_), Ty::Char)
            | (Value::Int(_), Ty::Int)
            | (Value::Long(_), Ty::Long)
            | (Value::Float(_), Ty::Float)
            | (Value::Double(_), Ty::Double)
            | (Value::String(_), Ty::String)
            | (Value::Type(_), Ty::Type)
            | (Value::Func(_), Ty::Func(_)) => true,
            (Value::Array(items), Ty::Array(elem) | Ty::Seq(elem)) => {
                items.iter().all(|item| item.is_null() || self.conforms(item, elem))
            }
            (Value::String(_), Ty::Seq(elem)) => matches!(**elem, Ty::Char | Ty::Object),
            (Value::Object(obj), Ty::Class(_)) => {
                self.is_assignable(&Ty::Class(obj.class().clone()), ty)
            }
            _ => false,
        }
    }

    /// Whether a runtime value (null included) may be stored in `ty`.
    fn accepts(&self, value: &Value, ty: &Ty) -> bool {
        match value {
            Value::Null => ty.accepts_null(),
            other => self.conforms(other, ty),
        }
    }
}
