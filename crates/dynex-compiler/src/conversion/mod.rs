//! Type conversion system.
//!
//! Determines whether a value of one static type can be used where another
//! is expected, through which runtime operation, and how good the match is
//! for overload resolution.
//!
//! ## Tiers
//!
//! Implicit conversions are classified into tiers, best first:
//! 1. exact type match
//! 2. implicit widening or reference compatibility (numeric widening, any
//!    type to `object`, derived to base, arrays and strings to
//!    `IEnumerable<T>`, `null` to a reference or nullable type)
//! 3. nullable lifting (`T` or `S?` where `T?` is expected)
//! 4. an unsuffixed numeric literal stored in a numeric type that holds its value exactly
//! 5. variadic expansion (assigned per candidate, never per argument)
//!
//! Inside a tier, the cost constants order the conversions.

mod primitive;

pub use primitive::{convert_numeric, default_value, is_numeric_or_char, represents_exactly, widening_cost};

use std::fmt;

use dynex_core::{HostTypes, Ty, Value};

/// Match quality of a conversion or a whole candidate, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Exact = 1,
    Implicit = 2,
    Lifted = 3,
    Literal = 4,
    Variadic = 5,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Exact => "exact",
            Tier::Implicit => "implicit",
            Tier::Lifted => "lifted",
            Tier::Literal => "literal",
            Tier::Variadic => "variadic",
        };
        f.write_str(name)
    }
}

/// Runtime operation performed by a conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionKind {
    /// The value is used as is.
    Identity,
    /// Convert a primitive value; null passes through.
    Numeric(Ty),
    /// Runtime type test (unboxing, downcast); fails with `InvalidCast`.
    Checked(Ty),
    /// `T?` to `T`; fails with `NullReference` on null.
    Unwrap(Ty),
}

/// A type conversion with its cost for overload resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub kind: ConversionKind,
    pub tier: Tier,
    /// Cost inside the tier (lower is better).
    pub cost: u32,
}

impl Conversion {
    /// Cost for exact match.
    pub const COST_EXACT: u32 = 0;
    /// Cost for primitive widening (int -> long, float -> double).
    pub const COST_PRIMITIVE_WIDENING: u32 = 4;
    /// Cost for storing an unsuffixed literal in a narrower type.
    pub const COST_PRIMITIVE_NARROWING: u32 = 5;
    /// Cost for integer to float conversion.
    pub const COST_INT_TO_FLOAT: u32 = 8;
    /// Cost for reference cast (derived to base, sequence views, null literal).
    pub const COST_REFERENCE_CAST: u32 = 10;
    /// Cost for conversion to `object`.
    pub const COST_TO_OBJECT: u32 = 12;
    /// Cost for each argument packed into a `params` array.
    pub const COST_VAR_ARG: u32 = 13;

    pub(crate) fn exact() -> Self {
        Self {
            kind: ConversionKind::Identity,
            tier: Tier::Exact,
            cost: Self::COST_EXACT,
        }
    }

    fn new(kind: ConversionKind, tier: Tier, cost: u32) -> Self {
        Self { kind, tier, cost }
    }

    /// Check if this is an exact match (no conversion).
    pub fn is_exact(&self) -> bool {
        self.tier == Tier::Exact
    }
}

/// Find the implicit conversion from `from` to `to`.
///
/// `literal` is the value of an unsuffixed numeric literal argument; it
/// enables the literal tier.
pub fn find_conversion(from: &Ty, to: &Ty, literal: Option<&Value>, host: &dyn HostTypes) -> Option<Conversion> {
    if from == to {
        return Some(Conversion::exact());
    }
    if let Some(conversion) = find_widening(from, to, host) {
        return Some(conversion);
    }
    if let Some(conversion) = find_lifting(from, to) {
        return Some(conversion);
    }
    let value = literal?;
    let target = to.underlying();
    (target.is_numeric() && represents_exactly(value, target)).then(|| {
        Conversion::new(
            ConversionKind::Numeric(target.clone()),
            Tier::Literal,
            Conversion::COST_PRIMITIVE_NARROWING,
        )
    })
}

/// Whether `from` converts implicitly to `to`.
pub fn can_implicitly_convert(from: &Ty, to: &Ty, host: &dyn HostTypes) -> bool {
    find_conversion(from, to, None, host).is_some()
}

/// Find the conversion a cast `(to)expr` performs.
pub fn find_explicit_conversion(from: &Ty, to: &Ty, host: &dyn HostTypes) -> Option<ConversionKind> {
    if let Some(conversion) = find_conversion(from, to, None, host) {
        return Some(conversion.kind);
    }
    let (source, target) = (from.underlying(), to.underlying());
    if is_numeric_or_char(source) && is_numeric_or_char(target) {
        return Some(if from.is_nullable() && !to.is_nullable() {
            ConversionKind::Unwrap(target.clone())
        } else {
            ConversionKind::Numeric(target.clone())
        });
    }
    match (from, to) {
        (Ty::Object, _) => Some(ConversionKind::Checked(to.clone())),
        (Ty::Nullable(inner), _) if **inner == *to => Some(ConversionKind::Unwrap(to.clone())),
        (Ty::Class(_), Ty::Class(_)) if host.is_assignable(to, from) => Some(ConversionKind::Checked(to.clone())),
        (Ty::Seq(_), Ty::Array(_) | Ty::String) => Some(ConversionKind::Checked(to.clone())),
        _ => None,
    }
}

/// Tier 2: widening and reference compatibility.
fn find_widening(from: &Ty, to: &Ty, host: &dyn HostTypes) -> Option<Conversion> {
    if *from == Ty::Void {
        return None;
    }
    if *from == Ty::Null {
        return to.accepts_null().then(|| {
            Conversion::new(ConversionKind::Identity, Tier::Implicit, Conversion::COST_REFERENCE_CAST)
        });
    }
    if *to == Ty::Object {
        return Some(Conversion::new(
            ConversionKind::Identity,
            Tier::Implicit,
            Conversion::COST_TO_OBJECT,
        ));
    }
    if let Some(cost) = widening_cost(from, to) {
        return Some(Conversion::new(ConversionKind::Numeric(to.clone()), Tier::Implicit, cost));
    }
    let reference = match (from, to) {
        (Ty::Class(_), Ty::Class(_)) => host.is_assignable(from, to),
        (Ty::Array(elem) | Ty::Seq(elem), Ty::Seq(target)) => element_compatible(elem, target, host),
        (Ty::Array(elem), Ty::Array(target)) => element_compatible(elem, target, host),
        (Ty::String, Ty::Seq(target)) => **target == Ty::Char,
        _ => false,
    };
    reference.then(|| Conversion::new(ConversionKind::Identity, Tier::Implicit, Conversion::COST_REFERENCE_CAST))
}

/// Tier 3: `T` (or anything widening to `T`) and `S?` where `T?` is expected.
fn find_lifting(from: &Ty, to: &Ty) -> Option<Conversion> {
    let Ty::Nullable(target) = to else {
        return None;
    };
    let source = from.underlying();
    if source == &**target {
        return Some(Conversion::new(ConversionKind::Identity, Tier::Lifted, Conversion::COST_EXACT));
    }
    widening_cost(source, target)
        .map(|cost| Conversion::new(ConversionKind::Numeric((**target).clone()), Tier::Lifted, cost))
}

/// Covariance of array and sequence elements; value types are invariant.
fn element_compatible(elem: &Ty, target: &Ty, host: &dyn HostTypes) -> bool {
    elem == target
        || (!elem.is_value_type() && *elem != Ty::Null && (*target == Ty::Object || host.is_assignable(elem, target)))
}
