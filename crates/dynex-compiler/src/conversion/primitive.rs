//! Primitive (numeric and char) conversions.

use dynex_core::{RuntimeError, Ty, Value};

use super::Conversion;

/// `char` and the numeric types.
pub fn is_numeric_or_char(ty: &Ty) -> bool {
    ty.numeric_rank().is_some()
}

/// Cost of an implicit widening between primitive types.
pub fn widening_cost(from: &Ty, to: &Ty) -> Option<u32> {
    match (from, to) {
        (Ty::Char, Ty::Int | Ty::Long) | (Ty::Int, Ty::Long) | (Ty::Float, Ty::Double) => {
            Some(Conversion::COST_PRIMITIVE_WIDENING)
        }
        (Ty::Char | Ty::Int | Ty::Long, Ty::Float | Ty::Double) => Some(Conversion::COST_INT_TO_FLOAT),
        _ => None,
    }
}

/// Whether a numeric literal value can be stored in `target` without loss.
pub fn represents_exactly(value: &Value, target: &Ty) -> bool {
    match value {
        Value::Int(_) | Value::Long(_) => {
            let Some(n) = value.as_i64() else {
                return false;
            };
            match target {
                Ty::Int => i32::try_from(n).is_ok(),
                Ty::Long => true,
                Ty::Float => (n as f32) as i64 == n,
                Ty::Double => (n as f64) as i64 == n,
                _ => false,
            }
        }
        Value::Float(_) | Value::Double(_) => {
            let Some(x) = value.as_f64() else {
                return false;
            };
            let whole = x.is_finite() && x.fract() == 0.0;
            match target {
                Ty::Int => whole && x >= i32::MIN as f64 && x <= i32::MAX as f64,
                Ty::Long => whole && x >= i64::MIN as f64 && x < i64::MAX as f64,
                Ty::Float => !x.is_finite() || (x as f32) as f64 == x,
                Ty::Double => true,
                _ => false,
            }
        }
        _ => false,
    }
}

fn cast_error(value: &Value, target: &Ty) -> RuntimeError {
    RuntimeError::InvalidCast {
        from: value.type_name(),
        to: target.to_string(),
    }
}

/// Convert a primitive value to `target` (or its underlying type when nullable).
///
/// Null passes through. Integer narrowing wraps; real to integer truncates.
pub fn convert_numeric(value: Value, target: &Ty) -> Result<Value, RuntimeError> {
    let target = target.underlying();
    if value.is_null() {
        return Ok(Value::Null);
    }
    let integral = value.as_i64();
    let real = value.as_f64().ok_or_else(|| cast_error(&value, target))?;
    Ok(match target {
        Ty::Int => Value::Int(integral.map(|n| n as i32).unwrap_or(real as i32)),
        Ty::Long => Value::Long(integral.unwrap_or(real as i64)),
        Ty::Float => Value::Float(real as f32),
        Ty::Double => Value::Double(real),
        Ty::Char => {
            let code = integral.unwrap_or(real as i64) as u32 & 0xFFFF;
            Value::Char(char::from_u32(code).ok_or_else(|| cast_error(&value, target))?)
        }
        _ => return Err(cast_error(&value, target)),
    })
}

/// Value of an uninitialized element of type `ty`.
pub fn default_value(ty: &Ty) -> Value {
    match ty {
        Ty::Bool => Value::Bool(false),
        Ty::Char => Value::Char('\0'),
        Ty::Int => Value::Int(0),
        Ty::Long => Value::Long(0),
        Ty::Float => Value::Float(0.0),
        Ty::Double => Value::Double(0.0),
        _ => Value::Null,
    }
}
