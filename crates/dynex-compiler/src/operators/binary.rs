//! Binary operator resolution.
//!
//! Resolves binary operators by trying, in order:
//! 1. String concatenation
//! 2. Primitive operations with numeric promotion and nullable lifting
//! 3. Equality between compatible types

use dynex_core::{HostTypes, SemanticError, Span, Ty};

use super::{OperatorResolution, primitive};
use crate::conversion::can_implicitly_convert;
use crate::tree::BinaryOp;

fn invalid(op: BinaryOp, left: &Ty, right: &Ty, span: Span) -> SemanticError {
    SemanticError::InvalidOperator {
        op: op.to_string(),
        left: left.to_string(),
        right: right.to_string(),
        span,
    }
}

/// Operand conversion to a promoted type, skipped when already there.
fn conversion_to(operand: &Ty, promoted: &Ty) -> Option<Ty> {
    (*operand != Ty::Null && operand.underlying() != promoted).then(|| promoted.clone())
}

fn primitive(op: BinaryOp, left: &Ty, right: &Ty, operand_type: Ty, result: Ty) -> OperatorResolution {
    let lifted = primitive::is_lifted(left) || primitive::is_lifted(right);
    OperatorResolution::Primitive {
        op,
        left_conv: conversion_to(left, &operand_type),
        right_conv: conversion_to(right, &operand_type),
        result_type: if lifted { Ty::nullable(result) } else { result },
    }
}

/// Resolve a binary operator for the operand types.
pub fn resolve_binary(
    op: BinaryOp,
    left: &Ty,
    right: &Ty,
    host: &dyn HostTypes,
    span: Span,
) -> Result<OperatorResolution, SemanticError> {
    if *left == Ty::Void || *right == Ty::Void {
        return Err(invalid(op, left, right, span));
    }

    match op {
        BinaryOp::Add | BinaryOp::Concat if *left == Ty::String || *right == Ty::String => {
            Ok(OperatorResolution::Concat)
        }
        BinaryOp::Add | BinaryOp::Concat | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let promoted = primitive::promote_binary(left, right).ok_or_else(|| invalid(op, left, right, span))?;
            let arith = if op == BinaryOp::Concat { BinaryOp::Add } else { op };
            Ok(primitive(arith, left, right, promoted.clone(), promoted))
        }
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            let promoted = primitive::promote_binary(left, right).ok_or_else(|| invalid(op, left, right, span))?;
            Ok(OperatorResolution::Primitive {
                op,
                left_conv: conversion_to(left, &promoted),
                right_conv: conversion_to(right, &promoted),
                result_type: Ty::Bool,
            })
        }
        BinaryOp::Equal | BinaryOp::NotEqual => resolve_equality(op, left, right, host, span),
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
            if *left == Ty::Bool && *right == Ty::Bool {
                return Ok(primitive(op, left, right, Ty::Bool, Ty::Bool));
            }
            let promoted = primitive::promote_integral(left, right).ok_or_else(|| invalid(op, left, right, span))?;
            Ok(primitive(op, left, right, promoted.clone(), promoted))
        }
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight => {
            let promoted = primitive::promote_unary(left)
                .filter(|t| matches!(t, Ty::Int | Ty::Long))
                .ok_or_else(|| invalid(op, left, right, span))?;
            if !matches!(right.underlying(), Ty::Int | Ty::Char) {
                return Err(invalid(op, left, right, span));
            }
            let lifted = primitive::is_lifted(left) || right.is_nullable();
            Ok(OperatorResolution::Primitive {
                op,
                left_conv: conversion_to(left, &promoted),
                right_conv: conversion_to(right, &Ty::Int),
                result_type: if lifted { Ty::nullable(promoted) } else { promoted },
            })
        }
        BinaryOp::AndAlso | BinaryOp::OrElse => {
            if *left == Ty::Bool && *right == Ty::Bool {
                Ok(OperatorResolution::Logical)
            } else {
                Err(invalid(op, left, right, span))
            }
        }
    }
}

/// Equality: numeric with promotion, otherwise any two types where one
/// converts to the other, or `null` against anything.
fn resolve_equality(
    op: BinaryOp,
    left: &Ty,
    right: &Ty,
    host: &dyn HostTypes,
    span: Span,
) -> Result<OperatorResolution, SemanticError> {
    if let Some(promoted) = primitive::promote_binary(left, right) {
        return Ok(OperatorResolution::Primitive {
            op,
            left_conv: conversion_to(left, &promoted),
            right_conv: conversion_to(right, &promoted),
            result_type: Ty::Bool,
        });
    }
    let compatible = *left == Ty::Null
        || *right == Ty::Null
        || can_implicitly_convert(left, right, host)
        || can_implicitly_convert(right, left, host);
    if compatible {
        Ok(OperatorResolution::Primitive {
            op,
            left_conv: None,
            right_conv: None,
            result_type: Ty::Bool,
        })
    } else {
        Err(invalid(op, left, right, span))
    }
}
