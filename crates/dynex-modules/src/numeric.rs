//! Members shared by every value plus the numeric types' own members.

use std::cmp::Ordering;
use std::str::FromStr;

use ordered_float::OrderedFloat;

use dynex_core::{ParamDef, RuntimeError, Ty, Value};
use dynex_registry::{ClassBuilder, Function, Module};

use crate::text_arg;

fn format_error() -> RuntimeError {
    RuntimeError::host("Input string was not in a correct format.")
}

fn parse<T: FromStr + 'static>(name: &str, ret: Ty, wrap: fn(T) -> Value) -> Function {
    Function::new(name, vec![ParamDef::new("s", Ty::String)], ret, move |args: &[Value]| {
        let text = text_arg(args, 0)?;
        text.trim().parse::<T>().map(wrap).map_err(|_| format_error())
    })
}

/// `CompareTo` between a receiver and an argument of the same type.
fn compare_to(ty: Ty) -> Function {
    Function::new("CompareTo", vec![ParamDef::new("value", ty)], Ty::Int, |args: &[Value]| {
        let ordering = match (args.first(), args.get(1)) {
            (Some(Value::Int(a)), Some(Value::Int(b))) => a.cmp(b),
            (Some(Value::Long(a)), Some(Value::Long(b))) => a.cmp(b),
            (Some(Value::Char(a)), Some(Value::Char(b))) => a.cmp(b),
            (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
            (Some(Value::Float(a)), Some(Value::Float(b))) => OrderedFloat(*a).cmp(&OrderedFloat(*b)),
            (Some(Value::Double(a)), Some(Value::Double(b))) => OrderedFloat(*a).cmp(&OrderedFloat(*b)),
            (_, Some(Value::Null)) => Ordering::Greater,
            _ => return Err(RuntimeError::NullReference),
        };
        Ok(Value::Int(ordering as i32))
    })
}

/// The numeric module.
pub fn module() -> Module {
    let object = ClassBuilder::for_type(Ty::Object)
        .method(Function::new("ToString", Vec::new(), Ty::String, |args: &[Value]| {
            Ok(Value::from(args.first().map(Value::to_display_string).unwrap_or_default()))
        }))
        .method(Function::new(
            "Equals",
            vec![ParamDef::new("obj", Ty::Object)],
            Ty::Bool,
            |args: &[Value]| Ok(Value::Bool(args.first() == args.get(1))),
        ));

    let int = ClassBuilder::for_type(Ty::Int)
        .constant("MaxValue", Ty::Int, i32::MAX)
        .constant("MinValue", Ty::Int, i32::MIN)
        .method(compare_to(Ty::Int))
        .static_method(parse::<i32>("Parse", Ty::Int, Value::Int));

    let long = ClassBuilder::for_type(Ty::Long)
        .constant("MaxValue", Ty::Long, i64::MAX)
        .constant("MinValue", Ty::Long, i64::MIN)
        .method(compare_to(Ty::Long))
        .static_method(parse::<i64>("Parse", Ty::Long, Value::Long));

    let float = ClassBuilder::for_type(Ty::Float)
        .constant("MaxValue", Ty::Float, f32::MAX)
        .constant("MinValue", Ty::Float, f32::MIN)
        .method(compare_to(Ty::Float))
        .static_method(parse::<f32>("Parse", Ty::Float, Value::Float));

    let double = ClassBuilder::for_type(Ty::Double)
        .constant("MaxValue", Ty::Double, f64::MAX)
        .constant("MinValue", Ty::Double, f64::MIN)
        .constant("NaN", Ty::Double, f64::NAN)
        .method(compare_to(Ty::Double))
        .static_method(parse::<f64>("Parse", Ty::Double, Value::Double));

    let boolean = ClassBuilder::for_type(Ty::Bool)
        .method(compare_to(Ty::Bool))
        .static_method(Function::new(
            "Parse",
            vec![ParamDef::new("value", Ty::String)],
            Ty::Bool,
            |args: &[Value]| {
                let text = text_arg(args, 0)?.trim();
                if text.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if text.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(format_error())
                }
            },
        ));

    let character = ClassBuilder::for_type(Ty::Char).method(compare_to(Ty::Char));

    Module::new()
        .class(object)
        .class(int)
        .class(long)
        .class(float)
        .class(double)
        .class(boolean)
        .class(character)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::eval;
    use pretty_assertions::assert_eq;

    #[test]
    fn to_string_on_any_value() {
        assert_eq!(eval("(1 + 2).ToString()").unwrap(), Value::from("3"));
        assert_eq!(eval("true.ToString()").unwrap(), Value::from("True"));
        assert_eq!(eval("2.5.ToString()").unwrap(), Value::from("2.5"));
    }

    #[test]
    fn constants_and_parse() {
        assert_eq!(eval("int.MaxValue").unwrap(), Value::Int(i32::MAX));
        assert_eq!(eval("int.Parse(\" 42 \") + 1").unwrap(), Value::Int(43));
        assert_eq!(eval("double.Parse(\"1.5\")").unwrap(), Value::Double(1.5));
        assert!(eval("int.Parse(\"x\")").is_err());
    }

    #[test]
    fn compare_to_orders() {
        assert_eq!(eval("1.CompareTo(2)").unwrap(), Value::Int(-1));
        assert_eq!(eval("2.5.CompareTo(2.5)").unwrap(), Value::Int(0));
    }
}
