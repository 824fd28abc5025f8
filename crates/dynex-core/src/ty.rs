//! Static type descriptors.
//!
//! [`Ty`] describes the static type of every resolved expression node, every
//! declared parameter and every member signature. Built-in families (arrays,
//! sequences, nullables, delegates) are structural; host classes are nominal
//! and identified by [`ClassId`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::TypeHash;

/// Identity of a host class.
///
/// Equality and hashing use only the type hash; the name is carried for
/// diagnostics and the value-type flag decides nullable lifting.
#[derive(Clone)]
pub struct ClassId {
    /// Hash of the class name.
    pub hash: TypeHash,
    /// Display name.
    pub name: Arc<str>,
    /// Whether instances are values (cannot be null without `?`).
    pub value_type: bool,
}

impl ClassId {
    /// Identity for a reference class.
    pub fn reference(name: &str) -> Self {
        Self {
            hash: TypeHash::from_name(name),
            name: Arc::from(name),
            value_type: false,
        }
    }

    /// Identity for a value class.
    pub fn value(name: &str) -> Self {
        Self {
            value_type: true,
            ..Self::reference(name)
        }
    }
}

impl PartialEq for ClassId {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for ClassId {}

impl Hash for ClassId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Delegate signature: parameter types and return type (`Void` for actions).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FuncSig {
    pub params: Vec<Ty>,
    pub ret: Ty,
}

/// Built-in generic type definitions that can be named without arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenericFamily {
    Nullable,
    Enumerable,
    Func,
    Action,
}

impl GenericFamily {
    /// Source-level base name.
    pub fn name(self) -> &'static str {
        match self {
            GenericFamily::Nullable => "Nullable",
            GenericFamily::Enumerable => "IEnumerable",
            GenericFamily::Func => "Func",
            GenericFamily::Action => "Action",
        }
    }

    /// Arities this family can be instantiated with.
    pub fn arities(self) -> std::ops::RangeInclusive<u8> {
        match self {
            GenericFamily::Nullable | GenericFamily::Enumerable => 1..=1,
            GenericFamily::Func => 1..=9,
            GenericFamily::Action => 1..=8,
        }
    }

    /// Instantiate the family with type arguments.
    ///
    /// Returns `None` when the argument count does not fit the family.
    pub fn instantiate(self, mut args: Vec<Ty>) -> Option<Ty> {
        if !self.arities().contains(&(args.len() as u8)) {
            return None;
        }
        Some(match self {
            GenericFamily::Nullable => Ty::nullable(args.pop()?),
            GenericFamily::Enumerable => Ty::Seq(Box::new(args.pop()?)),
            GenericFamily::Func => {
                let ret = args.pop()?;
                Ty::func(args, ret)
            }
            GenericFamily::Action => Ty::func(args, Ty::Void),
        })
    }
}

/// A static type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// No value.
    Void,
    /// Type of the `null` literal.
    Null,
    /// Top type; every value converts to it.
    Object,
    Bool,
    Char,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    String,
    /// Runtime type descriptor, the result of `typeof`.
    Type,
    /// `T?` over a value type.
    Nullable(Box<Ty>),
    /// `T[]`.
    Array(Box<Ty>),
    /// `IEnumerable<T>`.
    Seq(Box<Ty>),
    /// `Func<..>` / `Action<..>`.
    Func(Box<FuncSig>),
    /// Host class.
    Class(ClassId),
    /// Generic placeholder of a generic method, by position.
    Param(u8),
    /// Unbound generic definition such as `IEnumerable<>`.
    Definition(GenericFamily, u8),
}

impl Ty {
    /// `T?` when `T` is a value type, otherwise `T` itself.
    pub fn nullable(inner: Ty) -> Ty {
        if inner.is_value_type() {
            Ty::Nullable(Box::new(inner))
        } else {
            inner
        }
    }

    /// `T[]`.
    pub fn array(elem: Ty) -> Ty {
        Ty::Array(Box::new(elem))
    }

    /// `IEnumerable<T>`.
    pub fn seq(elem: Ty) -> Ty {
        Ty::Seq(Box::new(elem))
    }

    /// Delegate type.
    pub fn func(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Func(Box::new(FuncSig { params, ret }))
    }

    /// Host class type.
    pub fn class(id: ClassId) -> Ty {
        Ty::Class(id)
    }

    /// Whether values of this type can never be null.
    pub fn is_value_type(&self) -> bool {
        match self {
            Ty::Bool | Ty::Char | Ty::Int | Ty::Long | Ty::Float | Ty::Double => true,
            Ty::Class(id) => id.value_type,
            _ => false,
        }
    }

    /// Whether `null` is a valid value of this type.
    pub fn accepts_null(&self) -> bool {
        !self.is_value_type() && !matches!(self, Ty::Void | Ty::Param(_) | Ty::Definition(..))
    }

    /// Whether this is `T?`.
    pub fn is_nullable(&self) -> bool {
        matches!(self, Ty::Nullable(_))
    }

    /// The `T` of `T?`, or the type itself.
    pub fn underlying(&self) -> &Ty {
        match self {
            Ty::Nullable(inner) => inner,
            other => other,
        }
    }

    /// Promotion rank of numeric types; `char` ranks below `int`.
    pub fn numeric_rank(&self) -> Option<u8> {
        match self {
            Ty::Char => Some(0),
            Ty::Int => Some(1),
            Ty::Long => Some(2),
            Ty::Float => Some(3),
            Ty::Double => Some(4),
            _ => None,
        }
    }

    /// Numeric types (excluding `char`).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Ty::Int | Ty::Long | Ty::Float | Ty::Double)
    }

    /// Integral types usable with bitwise and shift operators.
    pub fn is_integral(&self) -> bool {
        matches!(self, Ty::Char | Ty::Int | Ty::Long)
    }

    /// Element type when this type can be enumerated.
    pub fn element_type(&self) -> Option<Ty> {
        match self {
            Ty::Array(elem) | Ty::Seq(elem) => Some((**elem).clone()),
            Ty::String => Some(Ty::Char),
            _ => None,
        }
    }

    /// Delegate signature, if this is a delegate type.
    pub fn as_func(&self) -> Option<&FuncSig> {
        match self {
            Ty::Func(sig) => Some(sig),
            _ => None,
        }
    }

    /// Whether any generic placeholder appears in this type.
    pub fn has_params(&self) -> bool {
        match self {
            Ty::Param(_) => true,
            Ty::Nullable(t) | Ty::Array(t) | Ty::Seq(t) => t.has_params(),
            Ty::Func(sig) => sig.ret.has_params() || sig.params.iter().any(Ty::has_params),
            _ => false,
        }
    }

    /// Replace bound generic placeholders.
    ///
    /// Unbound placeholders are left in place.
    pub fn substitute(&self, bindings: &[Option<Ty>]) -> Ty {
        match self {
            Ty::Param(index) => bindings
                .get(*index as usize)
                .and_then(|b| b.clone())
                .unwrap_or_else(|| self.clone()),
            Ty::Nullable(t) => Ty::nullable(t.substitute(bindings)),
            Ty::Array(t) => Ty::array(t.substitute(bindings)),
            Ty::Seq(t) => Ty::seq(t.substitute(bindings)),
            Ty::Func(sig) => Ty::func(
                sig.params.iter().map(|p| p.substitute(bindings)).collect(),
                sig.ret.substitute(bindings),
            ),
            other => other.clone(),
        }
    }

    /// Hash of the type family used for member lookup.
    ///
    /// All arrays share one family, as do all sequences and all delegates.
    pub fn family_hash(&self) -> TypeHash {
        match self {
            Ty::Class(id) => id.hash,
            other => TypeHash::from_name(other.family_name()),
        }
    }

    /// Name of the type family.
    pub fn family_name(&self) -> &str {
        match self {
            Ty::Void => "void",
            Ty::Null => "null",
            Ty::Object => "object",
            Ty::Bool => "bool",
            Ty::Char => "char",
            Ty::Int => "int",
            Ty::Long => "long",
            Ty::Float => "float",
            Ty::Double => "double",
            Ty::String => "string",
            Ty::Type => "Type",
            Ty::Nullable(_) => "Nullable",
            Ty::Array(_) => "Array",
            Ty::Seq(_) => "IEnumerable",
            Ty::Func(_) => "Delegate",
            Ty::Class(id) => &id.name,
            Ty::Param(_) => "T",
            Ty::Definition(family, _) => family.name(),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Nullable(inner) => write!(f, "{inner}?"),
            Ty::Array(elem) => write!(f, "{elem}[]"),
            Ty::Seq(elem) => write!(f, "IEnumerable<{elem}>"),
            Ty::Func(sig) => {
                let name = if sig.ret == Ty::Void { "Action" } else { "Func" };
                write!(f, "{name}<")?;
                for (i, param) in sig.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                if sig.ret != Ty::Void {
                    if !sig.params.is_empty() {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", sig.ret)?;
                }
                f.write_str(">")
            }
            Ty::Param(index) => write!(f, "T{index}"),
            Ty::Definition(family, arity) => {
                write!(f, "{}<{}>", family.name(), ",".repeat(arity.saturating_sub(1) as usize))
            }
            other => f.write_str(other.family_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_only_wraps_value_types() {
        assert_eq!(Ty::nullable(Ty::Int), Ty::Nullable(Box::new(Ty::Int)));
        assert_eq!(Ty::nullable(Ty::String), Ty::String);
        assert_eq!(Ty::nullable(Ty::nullable(Ty::Int)), Ty::nullable(Ty::Int));
    }

    #[test]
    fn null_acceptance() {
        assert!(!Ty::Int.accepts_null());
        assert!(Ty::nullable(Ty::Int).accepts_null());
        assert!(Ty::String.accepts_null());
        assert!(Ty::array(Ty::Int).accepts_null());
        assert!(!Ty::class(ClassId::value("Point")).accepts_null());
        assert!(Ty::class(ClassId::reference("Person")).accepts_null());
    }

    #[test]
    fn display_forms() {
        assert_eq!(Ty::nullable(Ty::Double).to_string(), "double?");
        assert_eq!(Ty::array(Ty::Int).to_string(), "int[]");
        assert_eq!(Ty::seq(Ty::String).to_string(), "IEnumerable<string>");
        assert_eq!(Ty::func(vec![Ty::Int], Ty::Bool).to_string(), "Func<int, bool>");
        assert_eq!(Ty::func(vec![Ty::Int], Ty::Void).to_string(), "Action<int>");
        assert_eq!(Ty::Definition(GenericFamily::Func, 3).to_string(), "Func<,,>");
    }

    #[test]
    fn substitute_binds_placeholders() {
        let sig = Ty::func(vec![Ty::Param(0)], Ty::Param(1));
        let bound = sig.substitute(&[Some(Ty::Int), None]);
        assert_eq!(bound, Ty::func(vec![Ty::Int], Ty::Param(1)));
        assert!(bound.has_params());
        assert!(!Ty::seq(Ty::Int).has_params());
    }

    #[test]
    fn families_instantiate() {
        assert_eq!(
            GenericFamily::Func.instantiate(vec![Ty::Int, Ty::Bool]),
            Some(Ty::func(vec![Ty::Int], Ty::Bool))
        );
        assert_eq!(GenericFamily::Nullable.instantiate(vec![Ty::Int, Ty::Int]), None);
        assert_eq!(
            GenericFamily::Enumerable.instantiate(vec![Ty::Char]),
            Some(Ty::seq(Ty::Char))
        );
    }

    #[test]
    fn element_types() {
        assert_eq!(Ty::String.element_type(), Some(Ty::Char));
        assert_eq!(Ty::array(Ty::Long).element_type(), Some(Ty::Long));
        assert_eq!(Ty::Int.element_type(), None);
    }

    #[test]
    fn class_identity_uses_hash() {
        let a = ClassId::reference("Person");
        let mut b = ClassId::reference("Person");
        b.name = Arc::from("renamed");
        assert_eq!(a, b);
        assert_ne!(a, ClassId::reference("Order"));
    }
}
