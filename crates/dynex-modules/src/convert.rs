//! The `Convert` class.
//!
//! Every function takes `object`. Null converts to the target's default;
//! reals round half to even before narrowing to an integer.

use dynex_core::{ParamDef, RuntimeError, Ty, Value};
use dynex_registry::{ClassBuilder, Function, Module, arg};

fn overflow(target: &str) -> RuntimeError {
    RuntimeError::host(format!("Value was either too large or too small for an {target}."))
}

fn format_error() -> RuntimeError {
    RuntimeError::host("Input string was not in a correct format.")
}

fn to_i64(value: &Value, target: &str) -> Result<i64, RuntimeError> {
    match value {
        Value::Null => Ok(0),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Char(c) => Ok(i64::from(u32::from(*c))),
        Value::Int(v) => Ok(i64::from(*v)),
        Value::Long(v) => Ok(*v),
        Value::Float(_) | Value::Double(_) => {
            let real = value.as_f64().unwrap_or_default().round_ties_even();
            if real.is_finite() && real >= i64::MIN as f64 && real < i64::MAX as f64 {
                Ok(real as i64)
            } else {
                Err(overflow(target))
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| format_error()),
        other => Err(RuntimeError::InvalidCast {
            from: other.type_name(),
            to: target.to_string(),
        }),
    }
}

fn to_f64(value: &Value) -> Result<f64, RuntimeError> {
    match value {
        Value::Null => Ok(0.0),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| format_error()),
        other => other.as_f64().ok_or_else(|| RuntimeError::InvalidCast {
            from: other.type_name(),
            to: "Double".to_string(),
        }),
    }
}

fn to_bool(value: &Value) -> Result<bool, RuntimeError> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.trim() {
            t if t.eq_ignore_ascii_case("true") => Ok(true),
            t if t.eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(format_error()),
        },
        other => other.as_f64().map(|v| v != 0.0).ok_or_else(|| RuntimeError::InvalidCast {
            from: other.type_name(),
            to: "Boolean".to_string(),
        }),
    }
}

fn converter<F>(name: &str, ret: Ty, f: F) -> Function
where
    F: Fn(&Value) -> Result<Value, RuntimeError> + Send + Sync + 'static,
{
    Function::new(name, vec![ParamDef::new("value", Ty::Object)], ret, move |args: &[Value]| {
        f(&arg(args, 0)?)
    })
}

/// The convert module.
pub fn module() -> Module {
    let class = ClassBuilder::reference("Convert")
        .static_method(converter("ToInt32", Ty::Int, |v| {
            let wide = to_i64(v, "Int32")?;
            i32::try_from(wide).map(Value::Int).map_err(|_| overflow("Int32"))
        }))
        .static_method(converter("ToInt64", Ty::Long, |v| to_i64(v, "Int64").map(Value::Long)))
        .static_method(converter("ToDouble", Ty::Double, |v| to_f64(v).map(Value::Double)))
        .static_method(converter("ToBoolean", Ty::Bool, |v| to_bool(v).map(Value::Bool)))
        .static_method(converter("ToString", Ty::String, |v| Ok(Value::from(v.to_display_string()))));

    Module::new().named_class("Convert", class)
}
