//! Operator resolution for expression compilation.
//!
//! This module determines how an operator applies to its operand types:
//! - Primitive operations run on operands converted to the promoted type
//! - `+` with a string operand concatenates
//! - `&&` and `||` short-circuit
//!
//! It also types the `??` and `?:` operators.

mod binary;
mod primitive;
mod unary;

pub use binary::resolve_binary;
pub use primitive::{eval_binary, eval_unary};
pub use unary::resolve_unary;

use dynex_core::{HostTypes, SemanticError, Span, Ty};

use crate::conversion::{ConversionKind, can_implicitly_convert, find_conversion};
use crate::tree::{BinaryOp, ExprKind, TypedExpr, UnaryOp};

/// Result of binary operator resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorResolution {
    /// Evaluate on operands converted to the promoted type.
    Primitive {
        op: BinaryOp,
        /// Numeric conversion for the left operand, if its type differs.
        left_conv: Option<Ty>,
        /// Numeric conversion for the right operand, if its type differs.
        right_conv: Option<Ty>,
        result_type: Ty,
    },
    /// String concatenation.
    Concat,
    /// Short-circuit `&&` or `||`.
    Logical,
}

/// Result of unary operator resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum UnaryResolution {
    Primitive {
        op: UnaryOp,
        conversion: Option<Ty>,
        result_type: Ty,
    },
    /// No operation needed beyond promotion (unary `+`).
    NoOp { conversion: Option<Ty>, result_type: Ty },
}

fn promote_operand(expr: TypedExpr, target: Option<Ty>) -> TypedExpr {
    match target {
        Some(target) => {
            let ty = if expr.ty.is_nullable() {
                Ty::nullable(target.clone())
            } else {
                target.clone()
            };
            expr.convert(ConversionKind::Numeric(target), ty)
        }
        None => expr,
    }
}

/// Build a binary operator node.
pub fn build_binary(
    op: BinaryOp,
    left: TypedExpr,
    right: TypedExpr,
    host: &dyn HostTypes,
    span: Span,
) -> Result<TypedExpr, SemanticError> {
    let (op, left, right, ty) = match resolve_binary(op, &left.ty, &right.ty, host, span)? {
        OperatorResolution::Primitive {
            op,
            left_conv,
            right_conv,
            result_type,
        } => (
            op,
            promote_operand(left, left_conv),
            promote_operand(right, right_conv),
            result_type,
        ),
        OperatorResolution::Concat => (BinaryOp::Concat, left, right, Ty::String),
        OperatorResolution::Logical => (op, left, right, Ty::Bool),
    };
    Ok(TypedExpr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        ty,
        span,
    ))
}

/// Build a unary operator node.
pub fn build_unary(op: UnaryOp, operand: TypedExpr, span: Span) -> Result<TypedExpr, SemanticError> {
    match resolve_unary(op, &operand.ty, span)? {
        UnaryResolution::NoOp { conversion, result_type } => {
            let promoted = promote_operand(operand, conversion);
            Ok(TypedExpr { ty: result_type, ..promoted })
        }
        UnaryResolution::Primitive {
            op,
            conversion,
            result_type,
        } => Ok(TypedExpr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(promote_operand(operand, conversion)),
            },
            result_type,
            span,
        )),
    }
}

/// Convert `expr` implicitly to `target` or fail with `InvalidConversion`.
pub fn coerce(expr: TypedExpr, target: &Ty, host: &dyn HostTypes) -> Result<TypedExpr, SemanticError> {
    match find_conversion(&expr.ty, target, expr.literal_value(), host) {
        Some(conversion) => Ok(expr.convert(conversion.kind, target.clone())),
        None => Err(SemanticError::InvalidConversion {
            from: expr.ty.to_string(),
            to: target.to_string(),
            span: expr.span,
        }),
    }
}

/// Build `left ?? right`.
///
/// With a nullable `T?` on the left the result is `T` when the right side
/// converts to `T`; otherwise the result is whichever operand type the
/// other converts to, left preferred.
pub fn build_coalesce(
    left: TypedExpr,
    right: TypedExpr,
    host: &dyn HostTypes,
    span: Span,
) -> Result<TypedExpr, SemanticError> {
    if !left.ty.accepts_null() {
        return Err(SemanticError::InvalidOperator {
            op: "??".to_string(),
            left: left.ty.to_string(),
            right: right.ty.to_string(),
            span,
        });
    }

    let underlying = left.ty.underlying().clone();
    let result = if left.ty == Ty::Null {
        right.ty.clone()
    } else if left.ty.is_nullable() && can_implicitly_convert(&right.ty, &underlying, host) {
        underlying
    } else if can_implicitly_convert(&right.ty, &left.ty, host) {
        left.ty.clone()
    } else if can_implicitly_convert(&underlying, &right.ty, host) {
        right.ty.clone()
    } else {
        return Err(SemanticError::InvalidOperator {
            op: "??".to_string(),
            left: left.ty.to_string(),
            right: right.ty.to_string(),
            span,
        });
    };

    let left = if left.ty == Ty::Null {
        left
    } else {
        match find_conversion(left.ty.underlying(), &result, None, host).map(|c| c.kind) {
            Some(ConversionKind::Numeric(target)) => left.convert(ConversionKind::Numeric(target), result.clone()),
            _ => TypedExpr {
                ty: result.clone(),
                ..left
            },
        }
    };
    let right = coerce(right, &result, host)?;
    Ok(TypedExpr::new(
        ExprKind::Coalesce {
            left: Box::new(left),
            right: Box::new(right),
        },
        result,
        span,
    ))
}

/// Build `test ? if_true : if_false`.
pub fn build_conditional(
    test: TypedExpr,
    if_true: TypedExpr,
    if_false: TypedExpr,
    host: &dyn HostTypes,
    span: Span,
) -> Result<TypedExpr, SemanticError> {
    let test = coerce(test, &Ty::Bool, host)?;
    let (a, b) = (&if_true.ty, &if_false.ty);
    let result = if a == b {
        a.clone()
    } else if *a == Ty::Null && !b.accepts_null() && b.is_value_type() {
        Ty::nullable(b.clone())
    } else if *b == Ty::Null && !a.accepts_null() && a.is_value_type() {
        Ty::nullable(a.clone())
    } else {
        let a_to_b = can_implicitly_convert(a, b, host);
        let b_to_a = can_implicitly_convert(b, a, host);
        match (a_to_b, b_to_a) {
            (true, false) => b.clone(),
            (false, true) => a.clone(),
            _ => {
                return Err(SemanticError::type_error(
                    span,
                    format!(
                        "type of conditional expression cannot be determined because there is no implicit conversion between '{a}' and '{b}'"
                    ),
                ));
            }
        }
    };
    let if_true = coerce(if_true, &result, host)?;
    let if_false = coerce(if_false, &result, host)?;
    Ok(TypedExpr::new(
        ExprKind::Conditional {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        },
        result,
        span,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynex_core::Value;
    use dynex_registry::TypeRegistry;

    fn param(ty: Ty) -> TypedExpr {
        TypedExpr::new(ExprKind::Parameter { index: 0, depth: 0 }, ty, Span::default())
    }

    fn binary(op: BinaryOp, left: Ty, right: Ty) -> Result<TypedExpr, SemanticError> {
        build_binary(op, param(left), param(right), &TypeRegistry::new(), Span::default())
    }

    // =========================================================================
    // Binary typing
    // =========================================================================

    #[test]
    fn arithmetic_promotes() {
        assert_eq!(binary(BinaryOp::Add, Ty::Int, Ty::Int).unwrap().ty, Ty::Int);
        assert_eq!(binary(BinaryOp::Add, Ty::Char, Ty::Char).unwrap().ty, Ty::Int);
        assert_eq!(binary(BinaryOp::Mul, Ty::Int, Ty::Double).unwrap().ty, Ty::Double);
        assert_eq!(binary(BinaryOp::Sub, Ty::Long, Ty::Float).unwrap().ty, Ty::Float);
    }

    #[test]
    fn arithmetic_lifts_over_nullables() {
        assert_eq!(
            binary(BinaryOp::Add, Ty::nullable(Ty::Int), Ty::Int).unwrap().ty,
            Ty::nullable(Ty::Int)
        );
        assert_eq!(
            binary(BinaryOp::Div, Ty::Null, Ty::Double).unwrap().ty,
            Ty::nullable(Ty::Double)
        );
        assert_eq!(
            binary(BinaryOp::Less, Ty::nullable(Ty::Int), Ty::Long).unwrap().ty,
            Ty::Bool
        );
    }

    #[test]
    fn plus_with_string_concatenates() {
        let expr = binary(BinaryOp::Add, Ty::String, Ty::Int).unwrap();
        assert_eq!(expr.ty, Ty::String);
        assert!(matches!(
            expr.kind,
            ExprKind::Binary {
                op: BinaryOp::Concat,
                ..
            }
        ));
        assert!(binary(BinaryOp::Sub, Ty::String, Ty::Int).is_err());
    }

    #[test]
    fn equality_needs_compatible_types() {
        assert_eq!(binary(BinaryOp::Equal, Ty::String, Ty::Null).unwrap().ty, Ty::Bool);
        assert_eq!(binary(BinaryOp::Equal, Ty::Object, Ty::String).unwrap().ty, Ty::Bool);
        assert_eq!(binary(BinaryOp::NotEqual, Ty::Int, Ty::Double).unwrap().ty, Ty::Bool);
        assert!(matches!(
            binary(BinaryOp::Equal, Ty::String, Ty::Int),
            Err(SemanticError::InvalidOperator { .. })
        ));
    }

    #[test]
    fn bitwise_and_logical() {
        assert_eq!(binary(BinaryOp::BitAnd, Ty::Bool, Ty::Bool).unwrap().ty, Ty::Bool);
        assert_eq!(binary(BinaryOp::BitOr, Ty::Int, Ty::Long).unwrap().ty, Ty::Long);
        assert!(binary(BinaryOp::BitXor, Ty::Double, Ty::Int).is_err());
        assert_eq!(binary(BinaryOp::ShiftLeft, Ty::Long, Ty::Int).unwrap().ty, Ty::Long);
        assert!(binary(BinaryOp::ShiftLeft, Ty::Int, Ty::Long).is_err());
        assert_eq!(binary(BinaryOp::AndAlso, Ty::Bool, Ty::Bool).unwrap().ty, Ty::Bool);
        assert!(binary(BinaryOp::OrElse, Ty::Bool, Ty::Int).is_err());
    }

    // =========================================================================
    // Unary typing
    // =========================================================================

    #[test]
    fn unary_typing() {
        let neg = build_unary(UnaryOp::Neg, param(Ty::Char), Span::default()).unwrap();
        assert_eq!(neg.ty, Ty::Int);
        let not = build_unary(UnaryOp::Not, param(Ty::nullable(Ty::Bool)), Span::default()).unwrap();
        assert_eq!(not.ty, Ty::nullable(Ty::Bool));
        assert!(matches!(
            build_unary(UnaryOp::BitNot, param(Ty::Double), Span::default()),
            Err(SemanticError::InvalidUnaryOperator { .. })
        ));
        let plus = build_unary(UnaryOp::Plus, param(Ty::Long), Span::default()).unwrap();
        assert!(matches!(plus.kind, ExprKind::Parameter { .. }));
    }

    // =========================================================================
    // ?? and ?:
    // =========================================================================

    #[test]
    fn coalesce_result_types() {
        let host = TypeRegistry::new();
        let c = |l: Ty, r: Ty| build_coalesce(param(l), param(r), &host, Span::default()).map(|e| e.ty);
        assert_eq!(c(Ty::nullable(Ty::Int), Ty::Int), Ok(Ty::Int));
        assert_eq!(c(Ty::nullable(Ty::Int), Ty::nullable(Ty::Int)), Ok(Ty::nullable(Ty::Int)));
        assert_eq!(c(Ty::nullable(Ty::Int), Ty::Double), Ok(Ty::Double));
        assert_eq!(c(Ty::String, Ty::String), Ok(Ty::String));
        assert_eq!(c(Ty::String, Ty::Object), Ok(Ty::Object));
        assert!(c(Ty::Int, Ty::Int).is_err());
        assert!(c(Ty::String, Ty::Int).is_err());
    }

    #[test]
    fn conditional_result_types() {
        let host = TypeRegistry::new();
        let cond = |a: TypedExpr, b: TypedExpr| {
            build_conditional(param(Ty::Bool), a, b, &host, Span::default()).map(|e| e.ty)
        };
        assert_eq!(cond(param(Ty::Int), param(Ty::Double)), Ok(Ty::Double));
        assert_eq!(
            cond(TypedExpr::constant(Value::Null, Span::default()), param(Ty::Int)),
            Ok(Ty::nullable(Ty::Int))
        );
        assert_eq!(
            cond(TypedExpr::constant(Value::Null, Span::default()), param(Ty::String)),
            Ok(Ty::String)
        );
        assert!(cond(param(Ty::String), param(Ty::Int)).is_err());
        assert!(build_conditional(param(Ty::Int), param(Ty::Int), param(Ty::Int), &host, Span::default()).is_err());
    }
}
