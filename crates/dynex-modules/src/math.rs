//! The `Math` class: constants and static functions.
//!
//! Overloads over `int`, `long` and `double` follow the usual resolution
//! rules, so `Math.Max(1, 2)` stays integral while `Math.Max(1, 2.5)` widens.

use dynex_core::{FromValue, ParamDef, RuntimeError, Ty, Value};
use dynex_registry::{ClassBuilder, Function, Module, arg};

fn overflow() -> RuntimeError {
    RuntimeError::host("Arithmetic operation resulted in an overflow.")
}

fn round_to(x: f64, digits: i32) -> Result<f64, RuntimeError> {
    if !(0..=15).contains(&digits) {
        return Err(RuntimeError::host("Rounding digits must be between 0 and 15, inclusive."));
    }
    let scale = 10f64.powi(digits);
    Ok((x * scale).round_ties_even() / scale)
}

/// The math module.
pub fn module() -> Module {
    let class = ClassBuilder::reference("Math")
        // =====================================================================
        // CONSTANTS
        // =====================================================================
        .constant("PI", Ty::Double, std::f64::consts::PI)
        .constant("E", Ty::Double, std::f64::consts::E)
        // =====================================================================
        // ABS, SIGN, MIN, MAX
        // =====================================================================
        .static_method(Function::new("Abs", vec![ParamDef::new("value", Ty::Int)], Ty::Int, |args: &[Value]| {
            let value = i32::from_value(arg(args, 0)?)?;
            value.checked_abs().map(Value::Int).ok_or_else(overflow)
        }))
        .static_method(Function::new("Abs", vec![ParamDef::new("value", Ty::Long)], Ty::Long, |args: &[Value]| {
            let value = i64::from_value(arg(args, 0)?)?;
            value.checked_abs().map(Value::Long).ok_or_else(overflow)
        }))
        .static_method(Function::unary("Abs", f64::abs))
        .static_method(Function::unary("Sign", |x: f64| if x > 0.0 { 1 } else if x < 0.0 { -1 } else { 0 }))
        .static_method(Function::binary("Max", |a: i32, b: i32| a.max(b)))
        .static_method(Function::binary("Max", |a: i64, b: i64| a.max(b)))
        .static_method(Function::binary("Max", f64::max))
        .static_method(Function::binary("Min", |a: i32, b: i32| a.min(b)))
        .static_method(Function::binary("Min", |a: i64, b: i64| a.min(b)))
        .static_method(Function::binary("Min", f64::min))
        // =====================================================================
        // POWERS, ROOTS, LOGARITHMS
        // =====================================================================
        .static_method(Function::binary("Pow", f64::powf))
        .static_method(Function::unary("Sqrt", f64::sqrt))
        .static_method(Function::unary("Exp", f64::exp))
        .static_method(Function::unary("Log", f64::ln))
        .static_method(Function::unary("Log10", f64::log10))
        // =====================================================================
        // ROUNDING
        // =====================================================================
        .static_method(Function::unary("Floor", f64::floor))
        .static_method(Function::unary("Ceiling", f64::ceil))
        .static_method(Function::unary("Truncate", f64::trunc))
        .static_method(Function::unary("Round", f64::round_ties_even))
        .static_method(Function::new(
            "Round",
            vec![ParamDef::new("value", Ty::Double), ParamDef::new("digits", Ty::Int)],
            Ty::Double,
            |args: &[Value]| {
                let (x, digits) = (f64::from_value(arg(args, 0)?)?, i32::from_value(arg(args, 1)?)?);
                Ok(Value::Double(round_to(x, digits)?))
            },
        ))
        // =====================================================================
        // TRIGONOMETRY
        // =====================================================================
        .static_method(Function::unary("Sin", f64::sin))
        .static_method(Function::unary("Cos", f64::cos))
        .static_method(Function::unary("Tan", f64::tan))
        .static_method(Function::binary("Atan2", f64::atan2));

    Module::new().named_class("Math", class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::eval;
    use pretty_assertions::assert_eq;

    #[test]
    fn overloads_keep_integral_types() {
        assert_eq!(eval("Math.Max(1, 2)").unwrap(), Value::Int(2));
        assert_eq!(eval("Math.Max(1, 2.5)").unwrap(), Value::Double(2.5));
        assert_eq!(eval("Math.Abs(-3L)").unwrap(), Value::Long(3));
        assert!(eval("Math.Abs(int.MinValue)").is_err());
    }

    #[test]
    fn rounding_is_to_even() {
        assert_eq!(eval("Math.Round(2.5)").unwrap(), Value::Double(2.0));
        assert_eq!(eval("Math.Round(3.5)").unwrap(), Value::Double(4.0));
        assert_eq!(eval("Math.Round(1.234, 2)").unwrap(), Value::Double(1.23));
        assert_eq!(eval("Math.Floor(-1.5)").unwrap(), Value::Double(-2.0));
    }

    #[test]
    fn constants() {
        assert_eq!(eval("Math.PI").unwrap(), Value::Double(std::f64::consts::PI));
        assert_eq!(eval("Math.Pow(2, 10)").unwrap(), Value::Double(1024.0));
    }
}
