//! Sequence extension methods.
//!
//! Receivers are arrays, strings (as characters) or the results of other
//! extension methods. Every method is eager and returns an array where a
//! sequence is declared.

use std::cmp::Ordering;

use ordered_float::OrderedFloat;

use dynex_core::{ParamDef, RuntimeError, Ty, Value};
use dynex_registry::{Function, Module};

use crate::int_arg;

fn no_elements() -> RuntimeError {
    RuntimeError::host("Sequence contains no elements")
}

fn overflow() -> RuntimeError {
    RuntimeError::host("Arithmetic operation resulted in an overflow.")
}

/// Elements of sequence argument `index`.
fn items(args: &[Value], index: usize) -> Result<Vec<Value>, RuntimeError> {
    match args.get(index) {
        Some(Value::Array(items)) => Ok(items.to_vec()),
        Some(Value::String(s)) => Ok(s.chars().map(Value::Char).collect()),
        Some(Value::Null) => Err(RuntimeError::NullReference),
        Some(other) => Err(RuntimeError::InvalidCast {
            from: other.type_name(),
            to: "IEnumerable".to_string(),
        }),
        None => Err(RuntimeError::ArgumentCount {
            expected: index + 1,
            got: args.len(),
        }),
    }
}

fn call(f: Option<&Value>, args: &[Value]) -> Result<Value, RuntimeError> {
    match f {
        Some(Value::Func(f)) => f.call(args),
        Some(Value::Null) | None => Err(RuntimeError::NullReference),
        Some(other) => Err(RuntimeError::InvalidCast {
            from: other.type_name(),
            to: "Func".to_string(),
        }),
    }
}

fn test(f: Option<&Value>, item: &Value) -> Result<bool, RuntimeError> {
    match call(f, std::slice::from_ref(item))? {
        Value::Bool(b) => Ok(b),
        other => Err(RuntimeError::InvalidCast {
            from: other.type_name(),
            to: "bool".to_string(),
        }),
    }
}

/// Ordering used by `OrderBy`: nulls first, numbers by value, text ordinally.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Char(a), Value::Char(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Long(a), Value::Long(b)) => a.cmp(b),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => OrderedFloat(a).cmp(&OrderedFloat(b)),
            _ => Ordering::Equal,
        },
    }
}

// =============================================================================
// SIGNATURE HELPERS
// =============================================================================

fn t() -> Ty {
    Ty::Param(0)
}

fn source() -> ParamDef {
    ParamDef::new("source", Ty::seq(t()))
}

fn predicate() -> ParamDef {
    ParamDef::new("predicate", Ty::func(vec![t()], Ty::Bool))
}

fn selector(ret: Ty) -> ParamDef {
    ParamDef::new("selector", Ty::func(vec![t()], ret))
}

fn count_param() -> ParamDef {
    ParamDef::new("count", Ty::Int)
}

/// `T?` for value types, `T` otherwise, once `T` is bound.
fn t_or_default() -> Ty {
    Ty::Nullable(Box::new(t()))
}

fn extension<F>(name: &str, params: Vec<ParamDef>, ret: Ty, arity: u8, f: F) -> Function
where
    F: Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
{
    let function = Function::new(name, params, ret, f);
    if arity > 0 { function.generic(arity) } else { function }
}

// =============================================================================
// FILTERING AND PROJECTION
// =============================================================================

fn filtering() -> Vec<Function> {
    vec![
        extension("Where", vec![source(), predicate()], Ty::seq(t()), 1, |args| {
            let mut kept = Vec::new();
            for item in items(args, 0)? {
                if test(args.get(1), &item)? {
                    kept.push(item);
                }
            }
            Ok(Value::array(kept))
        }),
        extension(
            "Select",
            vec![source(), ParamDef::new("selector", Ty::func(vec![t()], Ty::Param(1)))],
            Ty::seq(Ty::Param(1)),
            2,
            |args| {
                let projected = items(args, 0)?
                    .iter()
                    .map(|item| call(args.get(1), std::slice::from_ref(item)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(projected))
            },
        ),
        extension(
            "SelectMany",
            vec![
                source(),
                ParamDef::new("selector", Ty::func(vec![t()], Ty::seq(Ty::Param(1)))),
            ],
            Ty::seq(Ty::Param(1)),
            2,
            |args| {
                let mut flattened = Vec::new();
                for item in items(args, 0)? {
                    let inner = call(args.get(1), &[item])?;
                    flattened.extend(items(&[inner], 0)?);
                }
                Ok(Value::array(flattened))
            },
        ),
        extension("Take", vec![source(), count_param()], Ty::seq(t()), 1, |args| {
            let count = usize::try_from(int_arg(args, 1)?).unwrap_or(0);
            Ok(Value::array(items(args, 0)?.into_iter().take(count).collect()))
        }),
        extension("Skip", vec![source(), count_param()], Ty::seq(t()), 1, |args| {
            let count = usize::try_from(int_arg(args, 1)?).unwrap_or(0);
            Ok(Value::array(items(args, 0)?.into_iter().skip(count).collect()))
        }),
        extension("TakeWhile", vec![source(), predicate()], Ty::seq(t()), 1, |args| {
            let mut kept = Vec::new();
            for item in items(args, 0)? {
                if !test(args.get(1), &item)? {
                    break;
                }
                kept.push(item);
            }
            Ok(Value::array(kept))
        }),
        extension(
            "TakeWhile",
            vec![
                source(),
                ParamDef::new("predicate", Ty::func(vec![t(), Ty::Int], Ty::Bool)),
            ],
            Ty::seq(t()),
            1,
            |args| {
                let mut kept = Vec::new();
                for (index, item) in items(args, 0)?.into_iter().enumerate() {
                    let index = i32::try_from(index).map_err(|_| overflow())?;
                    match call(args.get(1), &[item.clone(), Value::Int(index)])? {
                        Value::Bool(true) => kept.push(item),
                        Value::Bool(false) => break,
                        other => {
                            return Err(RuntimeError::InvalidCast {
                                from: other.type_name(),
                                to: "bool".to_string(),
                            });
                        }
                    }
                }
                Ok(Value::array(kept))
            },
        ),
        extension(
            "OrderBy",
            vec![source(), ParamDef::new("keySelector", Ty::func(vec![t()], Ty::Param(1)))],
            Ty::seq(t()),
            2,
            |args| {
                let mut keyed = items(args, 0)?
                    .into_iter()
                    .map(|item| Ok((call(args.get(1), std::slice::from_ref(&item))?, item)))
                    .collect::<Result<Vec<_>, RuntimeError>>()?;
                keyed.sort_by(|(a, _), (b, _)| compare(a, b));
                Ok(Value::array(keyed.into_iter().map(|(_, item)| item).collect()))
            },
        ),
        extension(
            "Zip",
            vec![
                source(),
                ParamDef::new("second", Ty::seq(Ty::Param(1))),
                ParamDef::new("resultSelector", Ty::func(vec![t(), Ty::Param(1)], Ty::Param(2))),
            ],
            Ty::seq(Ty::Param(2)),
            3,
            |args| {
                let (first, second) = (items(args, 0)?, items(args, 1)?);
                let zipped = first
                    .into_iter()
                    .zip(second)
                    .map(|(a, b)| call(args.get(2), &[a, b]))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(zipped))
            },
        ),
        extension("ToArray", vec![source()], Ty::array(t()), 1, |args| {
            Ok(Value::array(items(args, 0)?))
        }),
    ]
}

// =============================================================================
// QUANTIFIERS AND ELEMENTS
// =============================================================================

fn quantifiers() -> Vec<Function> {
    vec![
        extension("Any", vec![source()], Ty::Bool, 1, |args| {
            Ok(Value::Bool(!items(args, 0)?.is_empty()))
        }),
        extension("Any", vec![source(), predicate()], Ty::Bool, 1, |args| {
            for item in items(args, 0)? {
                if test(args.get(1), &item)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }),
        extension("All", vec![source(), predicate()], Ty::Bool, 1, |args| {
            for item in items(args, 0)? {
                if !test(args.get(1), &item)? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }),
        extension("Count", vec![source()], Ty::Int, 1, |args| {
            Ok(Value::Int(items(args, 0)?.len() as i32))
        }),
        extension("Count", vec![source(), predicate()], Ty::Int, 1, |args| {
            let mut count = 0;
            for item in items(args, 0)? {
                if test(args.get(1), &item)? {
                    count += 1;
                }
            }
            Ok(Value::Int(count))
        }),
        extension(
            "Contains",
            vec![source(), ParamDef::new("value", t())],
            Ty::Bool,
            1,
            |args| {
                let needle = args.get(1).unwrap_or(&Value::Null);
                Ok(Value::Bool(items(args, 0)?.iter().any(|item| item == needle)))
            },
        ),
        extension("First", vec![source()], t(), 1, |args| {
            items(args, 0)?.into_iter().next().ok_or_else(no_elements)
        }),
        extension("First", vec![source(), predicate()], t(), 1, |args| {
            for item in items(args, 0)? {
                if test(args.get(1), &item)? {
                    return Ok(item);
                }
            }
            Err(RuntimeError::host("Sequence contains no matching element"))
        }),
        extension("FirstOrDefault", vec![source()], t_or_default(), 1, |args| {
            Ok(items(args, 0)?.into_iter().next().unwrap_or(Value::Null))
        }),
        extension("FirstOrDefault", vec![source(), predicate()], t_or_default(), 1, |args| {
            for item in items(args, 0)? {
                if test(args.get(1), &item)? {
                    return Ok(item);
                }
            }
            Ok(Value::Null)
        }),
        extension("SingleOrDefault", vec![source()], t_or_default(), 1, |args| {
            let mut all = items(args, 0)?.into_iter();
            match (all.next(), all.next()) {
                (None, _) => Ok(Value::Null),
                (Some(item), None) => Ok(item),
                (Some(_), Some(_)) => Err(RuntimeError::host("Sequence contains more than one element")),
            }
        }),
        extension("SingleOrDefault", vec![source(), predicate()], t_or_default(), 1, |args| {
            let mut found = None;
            for item in items(args, 0)? {
                if test(args.get(1), &item)? {
                    if found.is_some() {
                        return Err(RuntimeError::host("Sequence contains more than one matching element"));
                    }
                    found = Some(item);
                }
            }
            Ok(found.unwrap_or(Value::Null))
        }),
    ]
}

// =============================================================================
// AGGREGATES
// =============================================================================

fn aggregates() -> Vec<Function> {
    let mut functions = vec![
        extension("Sum", vec![ParamDef::new("source", Ty::seq(Ty::Int))], Ty::Int, 0, |args| {
            items(args, 0)?
                .iter()
                .try_fold(0i32, |sum, item| sum.checked_add(item.as_i64().unwrap_or(0) as i32))
                .map(Value::Int)
                .ok_or_else(overflow)
        }),
        extension("Sum", vec![ParamDef::new("source", Ty::seq(Ty::Long))], Ty::Long, 0, |args| {
            items(args, 0)?
                .iter()
                .try_fold(0i64, |sum, item| sum.checked_add(item.as_i64().unwrap_or(0)))
                .map(Value::Long)
                .ok_or_else(overflow)
        }),
        extension("Sum", vec![ParamDef::new("source", Ty::seq(Ty::Double))], Ty::Double, 0, |args| {
            Ok(Value::Double(items(args, 0)?.iter().filter_map(Value::as_f64).sum()))
        }),
        extension("Sum", vec![source(), selector(Ty::Int)], Ty::Int, 1, |args| {
            let mut sum = 0i32;
            for item in items(args, 0)? {
                let value = call(args.get(1), &[item])?.as_i64().unwrap_or(0) as i32;
                sum = sum.checked_add(value).ok_or_else(overflow)?;
            }
            Ok(Value::Int(sum))
        }),
        extension("Sum", vec![source(), selector(Ty::Long)], Ty::Long, 1, |args| {
            let mut sum = 0i64;
            for item in items(args, 0)? {
                let value = call(args.get(1), &[item])?.as_i64().unwrap_or(0);
                sum = sum.checked_add(value).ok_or_else(overflow)?;
            }
            Ok(Value::Long(sum))
        }),
        extension("Sum", vec![source(), selector(Ty::Double)], Ty::Double, 1, |args| {
            let mut sum = 0.0;
            for item in items(args, 0)? {
                sum += call(args.get(1), &[item])?.as_f64().unwrap_or(0.0);
            }
            Ok(Value::Double(sum))
        }),
    ];

    for ty in [Ty::Int, Ty::Long, Ty::Double] {
        let pick = |name: &str, keep: Ordering| {
            extension(name, vec![ParamDef::new("source", Ty::seq(ty.clone()))], ty.clone(), 0, move |args| {
                items(args, 0)?
                    .into_iter()
                    .reduce(|best, item| if compare(&item, &best) == keep { item } else { best })
                    .ok_or_else(no_elements)
            })
        };
        functions.push(pick("Max", Ordering::Greater));
        functions.push(pick("Min", Ordering::Less));
    }
    functions
}

/// The enumerable module.
pub fn module() -> Module {
    filtering()
        .into_iter()
        .chain(quantifiers())
        .chain(aggregates())
        .fold(Module::new(), Module::extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{eval, eval_with};
    use dynex_core::Parameter;
    use pretty_assertions::assert_eq;

    fn numbers() -> Parameter {
        Parameter::with_value("list", vec![1, 2, 3])
    }

    #[test]
    fn where_filters_with_captured_parameter() {
        let params = [numbers(), Parameter::with_value("value", 1)];
        assert_eq!(
            eval_with("list.Where(x => x > value).ToArray()", &params).unwrap(),
            Value::from(vec![2, 3])
        );
        let params = [numbers(), Parameter::with_value("value", 2)];
        assert_eq!(
            eval_with("list.Where(x => x > value).ToArray()", &params).unwrap(),
            Value::from(vec![3])
        );
    }

    #[test]
    fn select_infers_result_type() {
        let params = [numbers()];
        assert_eq!(
            eval_with("list.Select(x => x.ToString()).ToArray()", &params).unwrap(),
            Value::from(vec!["1", "2", "3"])
        );
        assert_eq!(
            eval_with("list.Select(x => x * 2).Sum()", &params).unwrap(),
            Value::Int(12)
        );
    }

    #[test]
    fn quantifiers_and_counts() {
        let params = [numbers()];
        assert_eq!(eval_with("list.Any()", &params).unwrap(), Value::Bool(true));
        assert_eq!(eval_with("list.All(x => x > 0)", &params).unwrap(), Value::Bool(true));
        assert_eq!(eval_with("list.Count(x => x % 2 == 1)", &params).unwrap(), Value::Int(2));
        assert_eq!(eval_with("list.Contains(2)", &params).unwrap(), Value::Bool(true));
    }

    #[test]
    fn element_access() {
        let params = [numbers()];
        assert_eq!(eval_with("list.First()", &params).unwrap(), Value::Int(1));
        assert_eq!(eval_with("list.FirstOrDefault(x => x > 5)", &params).unwrap(), Value::Null);
        assert!(eval_with("list.Skip(3).First()", &params).is_err());
        assert!(eval_with("list.SingleOrDefault()", &params).is_err());
    }

    #[test]
    fn indexed_take_while_and_single_match() {
        let params = [Parameter::with_value("list", vec![5, 6, 7, 8])];
        assert_eq!(
            eval_with("list.TakeWhile((item, idx) => idx < 2).ToArray()", &params).unwrap(),
            Value::from(vec![5, 6])
        );
        assert_eq!(
            eval_with("list.TakeWhile((item, idx) => item > 5 || idx == 0).Count()", &params).unwrap(),
            Value::Int(4)
        );
        assert_eq!(
            eval_with("list.TakeWhile(item => item < 7).Count()", &params).unwrap(),
            Value::Int(2)
        );

        assert_eq!(eval("\"abcd\".SingleOrDefault(c => c == 'd')").unwrap(), Value::Char('d'));
        assert_eq!(eval("\"abcd\".SingleOrDefault(c => c == 'z')").unwrap(), Value::Null);
        assert!(eval("\"abba\".SingleOrDefault(c => c == 'b')").is_err());
    }

    #[test]
    fn sum_selector_keeps_the_selector_type() {
        let params = [Parameter::with_value("words", vec!["one", "three", "seventeen"])];
        assert_eq!(eval_with("words.Sum(w => w.Length)", &params).unwrap(), Value::Int(17));
        assert_eq!(eval_with("words.Sum(w => (long)w.Length)", &params).unwrap(), Value::Long(17));
        assert_eq!(eval_with("words.Sum(w => w.Length / 2.0)", &params).unwrap(), Value::Double(8.5));
    }

    #[test]
    fn strings_are_character_sequences() {
        assert_eq!(eval("\"hello\".Count(c => c == 'l')").unwrap(), Value::Int(2));
        assert_eq!(eval("\"abc\".First()").unwrap(), Value::Char('a'));
    }

    #[test]
    fn ordering_and_aggregates() {
        let params = [Parameter::with_value("list", vec![3, 1, 2])];
        assert_eq!(
            eval_with("list.OrderBy(x => x).ToArray()", &params).unwrap(),
            Value::from(vec![1, 2, 3])
        );
        assert_eq!(eval_with("list.Max()", &params).unwrap(), Value::Int(3));
        assert_eq!(eval_with("list.Min()", &params).unwrap(), Value::Int(1));
        assert_eq!(eval_with("list.Sum(x => x / 2.0)", &params).unwrap(), Value::Double(3.0));
        assert_eq!(
            eval_with("list.Take(2).Zip(list.Skip(1), (a, b) => a + b).ToArray()", &params).unwrap(),
            Value::from(vec![4, 3])
        );
    }

    #[test]
    fn compare_orders_nulls_first() {
        assert_eq!(compare(&Value::Null, &Value::Int(1)), Ordering::Less);
        assert_eq!(compare(&Value::Int(2), &Value::Double(1.5)), Ordering::Greater);
        assert_eq!(compare(&Value::from("a"), &Value::from("b")), Ordering::Less);
    }
}
