//! Runtime dispatch of member accesses on an evaluated receiver.

use dynex_core::{HostTypes, MemberKind, RuntimeError, Ty, Value};

use crate::tree::{Member, ReflectKind};

/// Read `member` from a non-null `receiver`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn read_member(member: &Member, receiver: Value, args: Vec<Value>, host: &dyn HostTypes) -> Result<Value, RuntimeError> {
    match member {
        Member::Property(getter) => getter.call(&[receiver]),
        Member::Method(func) | Member::Extension(func) | Member::Indexer(func) => {
            let mut call_args = Vec::with_capacity(args.len() + 1);
            call_args.push(receiver);
            call_args.extend(args);
            func.call(&call_args)
        }
        Member::ArrayIndex => {
            let items = receiver.as_array().ok_or_else(|| not_a(&receiver, "array"))?;
            let index = index_arg(&args)?;
            usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or(RuntimeError::IndexOutOfRange {
                    index,
                    len: items.len(),
                })
        }
        Member::StringIndex => {
            let text = receiver.as_str().ok_or_else(|| not_a(&receiver, "string"))?;
            let index = index_arg(&args)?;
            usize::try_from(index)
                .ok()
                .and_then(|i| text.chars().nth(i))
                .map(Value::Char)
                .ok_or_else(|| RuntimeError::IndexOutOfRange {
                    index,
                    len: text.chars().count(),
                })
        }
        Member::ArrayLength => {
            let items = receiver.as_array().ok_or_else(|| not_a(&receiver, "array"))?;
            Ok(Value::Int(items.len() as i32))
        }
        Member::HasValue => Ok(Value::Bool(true)),
        Member::NullableValue | Member::GetValueOrDefault => Ok(receiver),
        Member::Invoke => match receiver {
            Value::Func(func) => func.call(&args),
            other => Err(not_a(&other, "delegate")),
        },
        Member::Reflect(kind) => reflect(*kind, receiver, host),
    }
}

/// Result of a member access on a null receiver outside a conditional chain.
pub fn read_null_member(member: &Member, args: Vec<Value>) -> Result<Value, RuntimeError> {
    match member {
        Member::HasValue => Ok(Value::Bool(false)),
        Member::GetValueOrDefault => Ok(args.into_iter().next().unwrap_or(Value::Null)),
        _ => Err(RuntimeError::NullReference),
    }
}

fn index_arg(args: &[Value]) -> Result<i64, RuntimeError> {
    match args.first() {
        Some(Value::Null) | None => Err(RuntimeError::NullReference),
        Some(value) => value.as_i64().ok_or_else(|| not_a(value, "int")),
    }
}

fn not_a(value: &Value, expected: &str) -> RuntimeError {
    RuntimeError::InvalidCast {
        from: value.type_name(),
        to: expected.to_string(),
    }
}

fn reflect(kind: ReflectKind, receiver: Value, host: &dyn HostTypes) -> Result<Value, RuntimeError> {
    if kind == ReflectKind::GetType {
        return Ok(Value::Type(receiver.runtime_type()));
    }
    let Value::Type(ty) = receiver else {
        return Err(not_a(&receiver, "Type"));
    };
    if kind == ReflectKind::Name {
        return Ok(Value::from(runtime_name(&ty)));
    }

    let members = host
        .enumerate_members(&ty)
        .map_err(|refused| RuntimeError::host(refused.to_string()))?;
    let names = members
        .into_iter()
        .filter(|m| match kind {
            ReflectKind::GetMethods => m.kind == MemberKind::Method,
            ReflectKind::GetProperties => m.kind == MemberKind::Property,
            _ => true,
        })
        .map(|m| Value::from(m.name))
        .collect();
    Ok(Value::array(names))
}

/// Runtime type name as reported by `Type.Name`.
pub fn runtime_name(ty: &Ty) -> String {
    match ty {
        Ty::Void => "Void".to_string(),
        Ty::Null | Ty::Object => "Object".to_string(),
        Ty::Bool => "Boolean".to_string(),
        Ty::Char => "Char".to_string(),
        Ty::Int => "Int32".to_string(),
        Ty::Long => "Int64".to_string(),
        Ty::Float => "Single".to_string(),
        Ty::Double => "Double".to_string(),
        Ty::String => "String".to_string(),
        Ty::Type => "Type".to_string(),
        Ty::Nullable(_) => "Nullable`1".to_string(),
        Ty::Array(elem) => format!("{}[]", runtime_name(elem)),
        Ty::Seq(_) => "IEnumerable`1".to_string(),
        Ty::Func(sig) if sig.ret == Ty::Void => format!("Action`{}", sig.params.len()),
        Ty::Func(sig) => format!("Func`{}", sig.params.len() + 1),
        Ty::Class(id) => id.name.to_string(),
        Ty::Param(index) => format!("T{index}"),
        Ty::Definition(family, arity) => format!("{}`{arity}", family.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynex_core::NativeFn;
    use pretty_assertions::assert_eq;

    struct Closed;

    impl HostTypes for Closed {
        fn properties(&self, _: &Ty, _: &str, _: dynex_core::NameComparer) -> Vec<std::sync::Arc<dynex_core::PropertyDef>> {
            Vec::new()
        }
        fn methods(&self, _: &Ty, _: &str, _: dynex_core::NameComparer) -> Vec<std::sync::Arc<dynex_core::MethodDef>> {
            Vec::new()
        }
        fn indexers(&self, _: &Ty) -> Vec<std::sync::Arc<dynex_core::IndexerDef>> {
            Vec::new()
        }
        fn constructors(&self, _: &Ty) -> Vec<std::sync::Arc<dynex_core::MethodDef>> {
            Vec::new()
        }
        fn base_type(&self, _: &Ty) -> Option<Ty> {
            None
        }
        fn is_restricted(&self) -> bool {
            true
        }
        fn enumerate_members(&self, _: &Ty) -> Result<Vec<dynex_core::MemberInfo>, dynex_core::ReflectionRefused> {
            Err(dynex_core::ReflectionRefused)
        }
    }

    #[test]
    fn array_and_string_indexing() {
        let array = Value::array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(
            read_member(&Member::ArrayIndex, array.clone(), vec![Value::Int(1)], &Closed),
            Ok(Value::Int(2))
        );
        assert_eq!(
            read_member(&Member::ArrayIndex, array, vec![Value::Int(5)], &Closed),
            Err(RuntimeError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert_eq!(
            read_member(&Member::StringIndex, Value::from("héllo"), vec![Value::Int(1)], &Closed),
            Ok(Value::Char('é'))
        );
    }

    #[test]
    fn null_receivers() {
        assert_eq!(read_null_member(&Member::HasValue, Vec::new()), Ok(Value::Bool(false)));
        assert_eq!(
            read_null_member(&Member::GetValueOrDefault, vec![Value::Int(7)]),
            Ok(Value::Int(7))
        );
        assert_eq!(read_null_member(&Member::ArrayLength, Vec::new()), Err(RuntimeError::NullReference));
    }

    #[test]
    fn methods_receive_the_receiver_first() {
        let concat = NativeFn::anonymous(|args: &[Value]| {
            let text: String = args.iter().map(Value::to_display_string).collect();
            Ok(Value::from(text))
        });
        let result = read_member(&Member::Method(concat), Value::from("a"), vec![Value::from("b")], &Closed);
        assert_eq!(result, Ok(Value::from("ab")));
    }

    #[test]
    fn reflection_names() {
        assert_eq!(runtime_name(&Ty::Int), "Int32");
        assert_eq!(runtime_name(&Ty::array(Ty::Double)), "Double[]");
        assert_eq!(runtime_name(&Ty::func(vec![Ty::Int], Ty::Bool)), "Func`2");
        assert_eq!(
            read_member(&Member::Reflect(ReflectKind::GetType), Value::Long(1), Vec::new(), &Closed),
            Ok(Value::Type(Ty::Long))
        );
        assert!(read_member(
            &Member::Reflect(ReflectKind::GetMethods),
            Value::Type(Ty::Int),
            Vec::new(),
            &Closed
        )
        .is_err());
    }
}
