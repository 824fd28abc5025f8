//! Primitive operator typing and evaluation.
//!
//! Typing follows binary numeric promotion: `char` becomes `int`, then the
//! wider of the two operand types is used. Evaluation runs on operands that
//! were already converted to the promoted type.

use std::cmp::Ordering;

use dynex_core::{RuntimeError, Ty, Value};

use crate::tree::{BinaryOp, UnaryOp};

// =============================================================================
// Typing helpers
// =============================================================================

fn rank_type(rank: u8) -> Ty {
    match rank {
        0 | 1 => Ty::Int,
        2 => Ty::Long,
        3 => Ty::Float,
        _ => Ty::Double,
    }
}

/// Whether an operand takes part in nullable lifting.
pub fn is_lifted(ty: &Ty) -> bool {
    ty.is_nullable() || *ty == Ty::Null
}

/// Promoted operand type of two numeric (or char) operands.
///
/// A `null` literal takes the type of the other operand. The result is
/// never nullable; lifting is decided separately.
pub fn promote_binary(left: &Ty, right: &Ty) -> Option<Ty> {
    let l = if *left == Ty::Null { right.underlying() } else { left.underlying() };
    let r = if *right == Ty::Null { left.underlying() } else { right.underlying() };
    let rank = l.numeric_rank()?.max(r.numeric_rank()?);
    Some(rank_type(rank))
}

/// Promoted operand type of a unary numeric operator.
pub fn promote_unary(operand: &Ty) -> Option<Ty> {
    operand.underlying().numeric_rank().map(rank_type)
}

/// Promoted type for integral operators (`&`, `|`, `^`, `~`, shifts).
pub fn promote_integral(left: &Ty, right: &Ty) -> Option<Ty> {
    let promoted = promote_binary(left, right)?;
    matches!(promoted, Ty::Int | Ty::Long).then_some(promoted)
}

// =============================================================================
// Evaluation
// =============================================================================

fn unsupported(op: impl std::fmt::Display, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::host(format!(
        "operator '{op}' is not defined for '{}' and '{}'",
        left.type_name(),
        right.type_name()
    ))
}

macro_rules! integer_arith {
    ($op:expr, $a:expr, $b:expr, $variant:ident) => {
        match $op {
            BinaryOp::Add => Value::$variant($a.wrapping_add($b)),
            BinaryOp::Sub => Value::$variant($a.wrapping_sub($b)),
            BinaryOp::Mul => Value::$variant($a.wrapping_mul($b)),
            BinaryOp::Div if $b == 0 => return Err(RuntimeError::DivisionByZero),
            BinaryOp::Div => Value::$variant($a.wrapping_div($b)),
            BinaryOp::Mod if $b == 0 => return Err(RuntimeError::DivisionByZero),
            BinaryOp::Mod => Value::$variant($a.wrapping_rem($b)),
            BinaryOp::BitAnd => Value::$variant($a & $b),
            BinaryOp::BitOr => Value::$variant($a | $b),
            BinaryOp::BitXor => Value::$variant($a ^ $b),
            _ => return Err(unsupported($op, &Value::$variant($a), &Value::$variant($b))),
        }
    };
}

macro_rules! real_arith {
    ($op:expr, $a:expr, $b:expr, $variant:ident) => {
        match $op {
            BinaryOp::Add => Value::$variant($a + $b),
            BinaryOp::Sub => Value::$variant($a - $b),
            BinaryOp::Mul => Value::$variant($a * $b),
            BinaryOp::Div => Value::$variant($a / $b),
            BinaryOp::Mod => Value::$variant($a % $b),
            _ => return Err(unsupported($op, &Value::$variant($a), &Value::$variant($b))),
        }
    };
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Long(a), Value::Long(b)) => Some(a.cmp(b)),
        (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
        _ => None,
    }
}

/// Evaluate a binary operator on converted operands.
///
/// `&&` and `||` are short-circuited by the emitter; they are evaluated
/// here only when both operands are already known.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn eval_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Concat => {
            let mut text = left.to_display_string();
            text.push_str(&right.to_display_string());
            return Ok(Value::from(text));
        }
        BinaryOp::Equal => return Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => return Ok(Value::Bool(left != right)),
        _ => {}
    }

    if op.is_relational() {
        let ordering = compare(&left, &right);
        return Ok(Value::Bool(match (op, ordering) {
            (_, None) => false,
            (BinaryOp::Less, Some(o)) => o == Ordering::Less,
            (BinaryOp::LessEqual, Some(o)) => o != Ordering::Greater,
            (BinaryOp::Greater, Some(o)) => o == Ordering::Greater,
            (_, Some(o)) => o != Ordering::Less,
        }));
    }

    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    Ok(match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinaryOp::BitAnd | BinaryOp::AndAlso => Value::Bool(a & b),
            BinaryOp::BitOr | BinaryOp::OrElse => Value::Bool(a | b),
            BinaryOp::BitXor => Value::Bool(a ^ b),
            _ => return Err(unsupported(op, &Value::Bool(a), &Value::Bool(b))),
        },
        (Value::Int(a), Value::Int(b)) => match op {
            BinaryOp::ShiftLeft => Value::Int(a.wrapping_shl(b as u32)),
            BinaryOp::ShiftRight => Value::Int(a.wrapping_shr(b as u32)),
            _ => integer_arith!(op, a, b, Int),
        },
        (Value::Long(a), Value::Int(b)) if matches!(op, BinaryOp::ShiftLeft | BinaryOp::ShiftRight) => {
            if op == BinaryOp::ShiftLeft {
                Value::Long(a.wrapping_shl(b as u32))
            } else {
                Value::Long(a.wrapping_shr(b as u32))
            }
        }
        (Value::Long(a), Value::Long(b)) => integer_arith!(op, a, b, Long),
        (Value::Float(a), Value::Float(b)) => real_arith!(op, a, b, Float),
        (Value::Double(a), Value::Double(b)) => real_arith!(op, a, b, Double),
        (left, right) => return Err(unsupported(op, &left, &right)),
    })
}

/// Evaluate a unary operator on a converted operand.
pub fn eval_unary(op: UnaryOp, operand: Value) -> Result<Value, RuntimeError> {
    Ok(match (op, operand) {
        (_, Value::Null) => Value::Null,
        (UnaryOp::Plus, value) => value,
        (UnaryOp::Neg, Value::Int(v)) => Value::Int(v.wrapping_neg()),
        (UnaryOp::Neg, Value::Long(v)) => Value::Long(v.wrapping_neg()),
        (UnaryOp::Neg, Value::Float(v)) => Value::Float(-v),
        (UnaryOp::Neg, Value::Double(v)) => Value::Double(-v),
        (UnaryOp::Not, Value::Bool(v)) => Value::Bool(!v),
        (UnaryOp::BitNot, Value::Int(v)) => Value::Int(!v),
        (UnaryOp::BitNot, Value::Long(v)) => Value::Long(!v),
        (op, value) => {
            return Err(RuntimeError::host(format!(
                "operator '{op}' is not defined for '{}'",
                value.type_name()
            )));
        }
    })
}
