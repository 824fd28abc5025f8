//! Unary operator resolution.

use dynex_core::{SemanticError, Span, Ty};

use super::{UnaryResolution, primitive};
use crate::tree::UnaryOp;

/// Resolve a unary operator for the operand type.
pub fn resolve_unary(op: UnaryOp, operand: &Ty, span: Span) -> Result<UnaryResolution, SemanticError> {
    let invalid = || SemanticError::InvalidUnaryOperator {
        op: op.to_string(),
        operand: operand.to_string(),
        span,
    };
    let promoted = match op {
        UnaryOp::Plus | UnaryOp::Neg => primitive::promote_unary(operand),
        UnaryOp::BitNot => primitive::promote_unary(operand).filter(|t| matches!(t, Ty::Int | Ty::Long)),
        UnaryOp::Not => (*operand.underlying() == Ty::Bool).then_some(Ty::Bool),
    }
    .ok_or_else(invalid)?;

    let conversion = (operand.underlying() != &promoted).then(|| promoted.clone());
    let result_type = if operand.is_nullable() { Ty::nullable(promoted) } else { promoted };
    if op == UnaryOp::Plus {
        return Ok(UnaryResolution::NoOp { conversion, result_type });
    }
    Ok(UnaryResolution::Primitive {
        op,
        conversion,
        result_type,
    })
}
