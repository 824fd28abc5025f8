//! `string` members.
//!
//! Strings are indexed by character, not by byte. Instance methods receive
//! the string as their first argument.

use dynex_core::{ParamDef, RuntimeError, Ty, Value};
use dynex_registry::{ClassBuilder, Function, Module};

use crate::{int_arg, text_arg};

fn receiver(args: &[Value]) -> Result<&str, RuntimeError> {
    text_arg(args, 0)
}

fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Character range `start..start + len` of `text`.
fn substring(text: &str, start: i64, len: Option<i64>) -> Result<String, RuntimeError> {
    let count = char_count(text);
    let out_of_range = |index: i64| RuntimeError::IndexOutOfRange { index, len: count };
    let start_at = usize::try_from(start).map_err(|_| out_of_range(start))?;
    if start_at > count {
        return Err(out_of_range(start));
    }
    let take = match len {
        Some(len) => {
            let take = usize::try_from(len).map_err(|_| out_of_range(len))?;
            if start_at + take > count {
                return Err(out_of_range(start + len));
            }
            take
        }
        None => count - start_at,
    };
    Ok(text.chars().skip(start_at).take(take).collect())
}

/// Character index of the first match of `needle`, or -1.
fn index_of(text: &str, needle: &str) -> i32 {
    text.find(needle)
        .map(|byte| text[..byte].chars().count() as i32)
        .unwrap_or(-1)
}

fn string_param(name: &str) -> ParamDef {
    ParamDef::new(name, Ty::String)
}

fn int_param(name: &str) -> ParamDef {
    ParamDef::new(name, Ty::Int)
}

fn text_method<F>(name: &str, f: F) -> Function
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    Function::new(name, Vec::new(), Ty::String, move |args: &[Value]| Ok(Value::from(f(receiver(args)?))))
}

fn predicate<F>(name: &str, f: F) -> Function
where
    F: Fn(&str, &str) -> bool + Send + Sync + 'static,
{
    Function::new(name, vec![string_param("value")], Ty::Bool, move |args: &[Value]| {
        Ok(Value::Bool(f(receiver(args)?, text_arg(args, 1)?)))
    })
}

/// The `string` module.
pub fn module() -> Module {
    let class = ClassBuilder::for_type(Ty::String)
        .property_raw("Length", Ty::Int, |s: &Value| {
            Ok(Value::Int(s.as_str().map_or(0, char_count) as i32))
        })
        .constant("Empty", Ty::String, "")
        .method(text_method("ToUpper", str::to_uppercase))
        .method(text_method("ToLower", str::to_lowercase))
        .method(text_method("Trim", |s| s.trim().to_string()))
        .method(text_method("TrimStart", |s| s.trim_start().to_string()))
        .method(text_method("TrimEnd", |s| s.trim_end().to_string()))
        .method(text_method("ToString", str::to_string))
        .method(predicate("Contains", |s, value| s.contains(value)))
        .method(predicate("StartsWith", |s, value| s.starts_with(value)))
        .method(predicate("EndsWith", |s, value| s.ends_with(value)))
        .method(Function::new(
            "Substring",
            vec![int_param("startIndex")],
            Ty::String,
            |args: &[Value]| Ok(Value::from(substring(receiver(args)?, int_arg(args, 1)?, None)?)),
        ))
        .method(Function::new(
            "Substring",
            vec![int_param("startIndex"), int_param("length")],
            Ty::String,
            |args: &[Value]| {
                let len = int_arg(args, 2)?;
                Ok(Value::from(substring(receiver(args)?, int_arg(args, 1)?, Some(len))?))
            },
        ))
        .method(Function::new(
            "IndexOf",
            vec![string_param("value")],
            Ty::Int,
            |args: &[Value]| Ok(Value::Int(index_of(receiver(args)?, text_arg(args, 1)?))),
        ))
        .method(Function::new(
            "IndexOf",
            vec![ParamDef::new("value", Ty::Char)],
            Ty::Int,
            |args: &[Value]| match args.get(1) {
                Some(Value::Char(c)) => Ok(Value::Int(index_of(receiver(args)?, c.encode_utf8(&mut [0; 4])))),
                _ => Err(RuntimeError::NullReference),
            },
        ))
        .method(Function::new(
            "Replace",
            vec![string_param("oldValue"), string_param("newValue")],
            Ty::String,
            |args: &[Value]| {
                let (text, from, to) = (receiver(args)?, text_arg(args, 1)?, text_arg(args, 2)?);
                if from.is_empty() {
                    return Err(RuntimeError::host("String cannot be of zero length."));
                }
                Ok(Value::from(text.replace(from, to)))
            },
        ))
        .method(Function::new(
            "Split",
            vec![ParamDef::new("separator", Ty::Char)],
            Ty::array(Ty::String),
            |args: &[Value]| {
                let Some(Value::Char(separator)) = args.get(1) else {
                    return Err(RuntimeError::NullReference);
                };
                let parts = receiver(args)?.split(*separator).map(Value::from).collect();
                Ok(Value::array(parts))
            },
        ))
        .static_method(Function::new(
            "IsNullOrEmpty",
            vec![string_param("value")],
            Ty::Bool,
            |args: &[Value]| Ok(Value::Bool(args.first().and_then(Value::as_str).is_none_or(str::is_empty))),
        ))
        .static_method(
            Function::new(
                "Concat",
                vec![ParamDef::new("values", Ty::array(Ty::Object))],
                Ty::String,
                |args: &[Value]| {
                    let items = args.first().and_then(Value::as_array).unwrap_or(&[]);
                    Ok(Value::from(items.iter().map(Value::to_display_string).collect::<String>()))
                },
            )
            .variadic(),
        );

    Module::new().class(class)
}
