//! Resolved expression tree.
//!
//! The parser resolves identifiers, members, overloads and conversions while
//! it parses, so the tree it produces is already fully typed. The emitter
//! turns it into closures without looking anything up again.

use std::fmt;

use dynex_core::{NativeFn, Span, Ty, Value};

use crate::conversion::ConversionKind;

// ============================================================================
// Operators
// ============================================================================

/// Binary operators after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    /// `+` with a string operand.
    Concat,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    /// `&&`, short-circuits.
    AndAlso,
    /// `||`, short-circuits.
    OrElse,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add | BinaryOp::Concat => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `+`
    Plus,
    /// `-`
    Neg,
    /// `!`
    Not,
    /// `~`
    BitNot,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        })
    }
}

// ============================================================================
// Members
// ============================================================================

/// Reflection members of `object` and `Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectKind {
    /// `x.GetType()`
    GetType,
    /// `t.Name` on a `Type`
    Name,
    /// `t.GetMethods()`
    GetMethods,
    /// `t.GetProperties()`
    GetProperties,
    /// `t.GetMembers()`
    GetMembers,
}

impl ReflectKind {
    /// Whether the member enumerates members and needs an open registry.
    pub fn enumerates(self) -> bool {
        matches!(
            self,
            ReflectKind::GetMethods | ReflectKind::GetProperties | ReflectKind::GetMembers
        )
    }
}

/// The member an [`ExprKind::Access`] reads from its receiver.
#[derive(Debug, Clone)]
pub enum Member {
    /// Instance property getter; receives the receiver.
    Property(NativeFn),
    /// Instance method; receives the receiver then the arguments.
    Method(NativeFn),
    /// Extension method called with instance syntax; the receiver may be null.
    Extension(NativeFn),
    /// Host indexer; receives the receiver then the indices.
    Indexer(NativeFn),
    /// `array[i]`
    ArrayIndex,
    /// `string[i]`
    StringIndex,
    /// `array.Length`
    ArrayLength,
    /// `nullable.HasValue`
    HasValue,
    /// `nullable.Value`
    NullableValue,
    /// `nullable.GetValueOrDefault()`; the default is the argument.
    GetValueOrDefault,
    /// Delegate invocation `f(args)`.
    Invoke,
    Reflect(ReflectKind),
}

// ============================================================================
// Expressions
// ============================================================================

/// A resolved expression node with its static type.
#[derive(Debug, Clone)]
pub struct TypedExpr {
    pub kind: ExprKind,
    pub ty: Ty,
    pub span: Span,
}

/// Resolved expression kinds.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// A literal or folded value. `unsuffixed` marks numeric literals
    /// typed by the default number type, which may convert by value.
    Constant { value: Value, unsuffixed: bool },
    /// Declared expression parameter; `depth` is the number of lambda
    /// frames between the reference and the root environment.
    Parameter { index: usize, depth: usize },
    /// Lambda parameter, `depth` frames out from the innermost.
    LambdaVar { index: usize, depth: usize },
    Convert {
        operand: Box<TypedExpr>,
        conversion: ConversionKind,
    },
    Unary {
        op: UnaryOp,
        operand: Box<TypedExpr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    /// `left ?? right`
    Coalesce { left: Box<TypedExpr>, right: Box<TypedExpr> },
    /// `test ? if_true : if_false`
    Conditional {
        test: Box<TypedExpr>,
        if_true: Box<TypedExpr>,
        if_false: Box<TypedExpr>,
    },
    /// `operand is T`
    TypeIs { operand: Box<TypedExpr>, target: Ty },
    /// `operand as T`
    TypeAs { operand: Box<TypedExpr>, target: Ty },
    /// Global function, static method, constructor or extension method
    /// called statically.
    Call { func: NativeFn, args: Vec<TypedExpr> },
    /// Static property read.
    StaticProperty(NativeFn),
    /// Member access on an evaluated receiver. `guarded` links return null
    /// for a null receiver instead of failing.
    Access {
        receiver: Box<TypedExpr>,
        member: Member,
        args: Vec<TypedExpr>,
        guarded: bool,
    },
    /// `new T[len]`, filled with the element default.
    NewArray { elem: Ty, len: Box<TypedExpr> },
    /// `new T[] { .. }` and packed `params` arguments.
    ArrayInit(Vec<TypedExpr>),
    /// Lambda literal; its body reads its parameters at depth 0.
    Lambda {
        arity: usize,
        body: Box<TypedExpr>,
        /// `false` when the delegate returns `void`.
        returns_value: bool,
    },
}

impl TypedExpr {
    pub fn new(kind: ExprKind, ty: Ty, span: Span) -> Self {
        Self { kind, ty, span }
    }

    /// A constant of the value's runtime type.
    pub fn constant(value: Value, span: Span) -> Self {
        let ty = value.runtime_type();
        Self::new(
            ExprKind::Constant {
                value,
                unsuffixed: false,
            },
            ty,
            span,
        )
    }

    /// A constant with an explicit static type.
    pub fn typed_constant(value: Value, ty: Ty, span: Span) -> Self {
        Self::new(
            ExprKind::Constant {
                value,
                unsuffixed: false,
            },
            ty,
            span,
        )
    }

    /// Value of an unsuffixed numeric literal, for the literal conversion tier.
    pub fn literal_value(&self) -> Option<&Value> {
        match &self.kind {
            ExprKind::Constant {
                value,
                unsuffixed: true,
            } => Some(value),
            _ => None,
        }
    }

    /// Wrap in a conversion; identity conversions and exact types are skipped.
    pub fn convert(self, conversion: ConversionKind, target: Ty) -> Self {
        if conversion == ConversionKind::Identity || self.ty == target && !matches!(conversion, ConversionKind::Checked(_))
        {
            return Self { ty: target, ..self };
        }
        let span = self.span;
        Self::new(
            ExprKind::Convert {
                operand: Box::new(self),
                conversion,
            },
            target,
            span,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_conversion_retypes() {
        let expr = TypedExpr::constant(Value::from("a"), Span::default());
        let retyped = expr.convert(ConversionKind::Identity, Ty::Object);
        assert_eq!(retyped.ty, Ty::Object);
        assert!(matches!(retyped.kind, ExprKind::Constant { .. }));
    }

    #[test]
    fn numeric_conversion_wraps() {
        let expr = TypedExpr::constant(Value::Int(1), Span::default());
        let widened = expr.convert(ConversionKind::Numeric(Ty::Long), Ty::Long);
        assert_eq!(widened.ty, Ty::Long);
        assert!(matches!(widened.kind, ExprKind::Convert { .. }));
    }

    #[test]
    fn only_unsuffixed_literals_expose_values() {
        let plain = TypedExpr::constant(Value::Int(1), Span::default());
        assert!(plain.literal_value().is_none());
        let literal = TypedExpr::new(
            ExprKind::Constant {
                value: Value::Int(1),
                unsuffixed: true,
            },
            Ty::Int,
            Span::default(),
        );
        assert_eq!(literal.literal_value(), Some(&Value::Int(1)));
        assert_eq!(BinaryOp::Concat.to_string(), "+");
        assert!(ReflectKind::GetMembers.enumerates());
    }
}
