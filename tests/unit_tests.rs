//! Integration tests for dynex using `Interpreter` as the entry point.
//!
//! These tests run the full pipeline (lexing, resolution, emission and
//! invocation) through the public facade.


use dynex::{
    ClassBuilder, ClassId, ExpressionError, Function, ParamDef, Parameter, ParseErrorKind, RuntimeError,
    SemanticError, Ty, Value,
};
use pretty_assertions::assert_eq;
use test_harness::{eval, interpreter, semantic_error};

// =============================================================================
// Literals
// =============================================================================

#[test]
fn exponent_literals_are_single_tokens() {
    assert_eq!(eval("1+1e10", &[]).unwrap(), Value::Double(10000000001.0));
    assert_eq!(eval("1+1e-10", &[]).unwrap(), Value::Double(1.0000000001));
    assert_eq!(eval("1e+10", &[]).unwrap(), Value::Double(1e10));
    assert_eq!(eval("2.02e-10", &[]).unwrap(), Value::Double(2.02e-10));
}

#[test]
fn strings_and_chars() {
    assert_eq!(eval("\"a\\tb\" + 'c'", &[]).unwrap(), Value::from("a\tbc"));
    assert_eq!(eval("\"abc\"[2]", &[]).unwrap(), Value::Char('c'));
}

#[test]
fn negative_literals_bind_before_member_access() {
    assert_eq!(eval("-.5.ToString()", &[]).unwrap(), Value::from("-0.5"));
    assert_eq!(eval("-.5.ToString()", &[]).unwrap(), eval("(-.5).ToString()", &[]).unwrap());
    assert_eq!(eval(".1.ToString()", &[]).unwrap(), Value::from("0.1"));
    assert_eq!(
        eval("(-1-.1-0.1).ToString()", &[]).unwrap(),
        Value::from((-1.0_f64 - 0.1 - 0.1).to_string())
    );
}

// =============================================================================
// Null propagation
// =============================================================================

#[derive(Clone)]
struct Address {
    city: String,
}

#[derive(Clone)]
struct Customer {
    address: Option<Address>,
}

fn address_ty() -> Ty {
    Ty::Class(ClassId::reference("Address"))
}

fn customer_value(city: Option<&str>) -> Value {
    let customer = Customer {
        address: city.map(|city| Address { city: city.to_string() }),
    };
    Value::object(ClassId::reference("Customer"), customer)
}

fn customer_interpreter() -> dynex::Interpreter {
    let mut interpreter = interpreter();
    interpreter
        .register_class(ClassBuilder::reference("Address").property("City", Ty::String, |a: &Address| {
            a.city.clone()
        }))
        .unwrap();
    interpreter
        .register_class(ClassBuilder::reference("Customer").property("Address", address_ty(), |c: &Customer| {
            match &c.address {
                Some(address) => Value::object(ClassId::reference("Address"), address.clone()),
                None => Value::Null,
            }
        }))
        .unwrap();
    interpreter
}

#[test]
fn conditional_chain_short_circuits() {
    let interpreter = customer_interpreter();
    let params = [Parameter::new("c", Ty::Class(ClassId::reference("Customer")))];
    let lambda = interpreter.parse("c?.Address.City.Length", None, &params).unwrap();

    assert_eq!(lambda.return_type(), &Ty::nullable(Ty::Int));
    assert_eq!(lambda.invoke(&[Value::Null]).unwrap(), Value::Null);
    assert_eq!(lambda.invoke(&[customer_value(Some("Paris"))]).unwrap(), Value::Int(5));
    assert_eq!(
        lambda.invoke(&[customer_value(None)]).unwrap_err(),
        RuntimeError::NullReference
    );
}

#[test]
fn conditional_access_on_strings() {
    let interpreter = interpreter();
    let params = [Parameter::new("a", Ty::String)];
    let lambda = interpreter.parse("a?.Length", None, &params).unwrap();
    assert_eq!(lambda.invoke(&[Value::Null]).unwrap(), Value::Null);
    assert_eq!(lambda.invoke(&[Value::from("abc")]).unwrap(), Value::Int(3));

    let coalesced = interpreter.parse("a?.Length ?? -1", None, &params).unwrap();
    assert_eq!(coalesced.return_type(), &Ty::Int);
    assert_eq!(coalesced.invoke(&[Value::Null]).unwrap(), Value::Int(-1));
}

#[test]
fn conditional_access_keeps_nullable_members() {
    let interpreter = interpreter();
    let cases = [
        ("x?.HasValue", Value::Bool(true)),
        ("x?.Value", Value::Int(5)),
        ("x?.GetValueOrDefault()", Value::Int(5)),
        ("x?.GetValueOrDefault(3)", Value::Int(5)),
    ];
    for (text, expected) in cases {
        let present = [Parameter::typed_value("x", Ty::nullable(Ty::Int), 5)];
        assert_eq!(interpreter.eval(text, &present).unwrap(), expected, "{text}");
        let absent = [Parameter::typed_value("x", Ty::nullable(Ty::Int), Value::Null)];
        assert_eq!(interpreter.eval(text, &absent).unwrap(), Value::Null, "{text}");
    }
}

// =============================================================================
// Overload resolution
// =============================================================================

#[test]
fn null_argument_is_ambiguous_between_nullable_and_reference() {
    let mut interpreter = interpreter();
    interpreter
        .set_function(
            "f",
            Function::new("f", vec![ParamDef::new("d", Ty::nullable(Ty::Double))], Ty::Int, |_: &[Value]| {
                Ok(Value::Int(1))
            }),
        )
        .set_function(
            "f",
            Function::new("f", vec![ParamDef::new("s", Ty::String)], Ty::Int, |_: &[Value]| Ok(Value::Int(2))),
        );

    assert_eq!(interpreter.eval("f(1.5)", &[]).unwrap(), Value::Int(1));
    assert_eq!(interpreter.eval("f(\"x\")", &[]).unwrap(), Value::Int(2));
    assert!(matches!(
        semantic_error(interpreter.eval("f(null)", &[])),
        SemanticError::AmbiguousInvocation { .. }
    ));
}

#[test]
fn default_values_break_ties_only_when_they_are_the_difference() {
    let mut interpreter = interpreter();
    interpreter
        .set_function(
            "GFunction",
            Function::new(
                "GFunction",
                vec![ParamDef::optional("arg", Ty::String, Value::Null)],
                Ty::Bool,
                |args: &[Value]| Ok(Value::Bool(!args.first().is_none_or(Value::is_null))),
            ),
        )
        .set_function(
            "GFunction",
            Function::new("GFunction", vec![ParamDef::new("arg", Ty::String)], Ty::Bool, |args: &[Value]| {
                Ok(Value::Bool(args.first().is_none_or(Value::is_null)))
            }),
        )
        .set_variable("arg", "arg");

    assert!(matches!(
        semantic_error(interpreter.eval("GFunction(arg)", &[])),
        SemanticError::AmbiguousInvocation { .. }
    ));
    assert_eq!(interpreter.eval("GFunction()", &[]).unwrap(), Value::Bool(false));
}

#[test]
fn more_specific_parameters_win_ties() {
    let mut interpreter = interpreter();
    interpreter
        .set_function(
            "h",
            Function::new("h", vec![ParamDef::new("o", Ty::Object)], Ty::Int, |_: &[Value]| Ok(Value::Int(1))),
        )
        .set_function(
            "h",
            Function::new("h", vec![ParamDef::new("s", Ty::String)], Ty::Int, |_: &[Value]| Ok(Value::Int(2))),
        );

    assert_eq!(interpreter.eval("h(null)", &[]).unwrap(), Value::Int(2));
    assert_eq!(interpreter.eval("h(1)", &[]).unwrap(), Value::Int(1));
}

#[test]
fn sum_follows_the_selector_type() {
    let params = [Parameter::with_value("myList", vec!["a", "bb", "ccc"])];
    assert_eq!(eval("myList.Sum(str => str.Length)", &params).unwrap(), Value::Int(6));
    assert_eq!(eval("myList.Sum(str => (long)str.Length)", &params).unwrap(), Value::Long(6));
    assert_eq!(
        eval("myList.TakeWhile((str, i) => i < 2).Count()", &params).unwrap(),
        Value::Int(2)
    );
    assert_eq!(
        eval("myList.SingleOrDefault(str => str.Length > 2)", &params).unwrap(),
        Value::from("ccc")
    );
}

#[test]
fn variadic_null_binds_as_a_null_array() {
    let mut interpreter = interpreter();
    interpreter.set_function(
        "Count",
        Function::new(
            "Count",
            vec![ParamDef::new("values", Ty::array(Ty::Object))],
            Ty::Int,
            |args: &[Value]| match args.first() {
                Some(Value::Array(items)) => Ok(Value::Int(items.len() as i32)),
                _ => Err(RuntimeError::NullReference),
            },
        )
        .variadic(),
    );

    assert_eq!(interpreter.eval("Count(1, \"a\", null)", &[]).unwrap(), Value::Int(3));
    assert_eq!(interpreter.eval("Count()", &[]).unwrap(), Value::Int(0));
    assert_eq!(
        interpreter.eval("Count(null)", &[]).unwrap_err(),
        ExpressionError::Runtime(RuntimeError::NullReference)
    );
}

#[test]
fn unset_functions_become_unknown() {
    let mut interpreter = interpreter();
    interpreter.set_function("f", Function::nullary("f", || 1));
    assert_eq!(interpreter.eval("f()", &[]).unwrap(), Value::Int(1));

    interpreter.unset_identifier("f");
    assert!(matches!(
        semantic_error(interpreter.eval("f()", &[])),
        SemanticError::UnknownIdentifier { .. }
    ));
}

// =============================================================================
// Lambdas
// =============================================================================

#[test]
fn where_with_captured_parameter() {
    let interpreter = interpreter();
    let params = [Parameter::new("list", Ty::array(Ty::Int)), Parameter::new("value", Ty::Int)];
    let lambda = interpreter
        .parse("list.Where(x => x > value).ToArray()", None, &params)
        .unwrap();
    let list = Value::from(vec![1, 2, 3]);

    assert_eq!(lambda.invoke(&[list.clone(), Value::Int(1)]).unwrap(), Value::from(vec![2, 3]));
    assert_eq!(lambda.invoke(&[list, Value::Int(2)]).unwrap(), Value::from(vec![3]));
}

#[test]
fn nested_lambdas_cannot_redeclare_ancestor_names() {
    let interpreter = interpreter();
    let params = [Parameter::with_value("list", vec![1, 2, 3])];

    assert!(matches!(
        semantic_error(interpreter.eval("list.Any(x => list.Any(x => x > 1))", &params)),
        SemanticError::LambdaParameterConflict { .. }
    ));
    assert_eq!(
        interpreter
            .eval("list.Any(x => x > 2) && list.All(x => x > 0)", &params)
            .unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        interpreter
            .eval("list.Count(x => list.Any(y => y > x))", &params)
            .unwrap(),
        Value::Int(2)
    );
}

#[test]
fn lambda_parameters_cannot_shadow_declared_parameters() {
    let interpreter = interpreter();
    let params = [Parameter::with_value("x", 1), Parameter::with_value("list", vec![1])];
    assert!(matches!(
        semantic_error(interpreter.eval("list.Any(x => x > 0)", &params)),
        SemanticError::LambdaParameterConflict { .. }
    ));
}

#[test]
fn root_lambda_takes_delegate_types() {
    let interpreter = interpreter();
    let delegate = Ty::func(vec![Ty::Int, Ty::Int], Ty::Int);
    let lambda = interpreter.parse("(a, b) => a * b", Some(&delegate), &[]).unwrap();
    let Value::Func(multiply) = lambda.invoke(&[]).unwrap() else {
        panic!("expected a delegate");
    };
    assert_eq!(multiply.call(&[Value::Int(6), Value::Int(7)]).unwrap(), Value::Int(42));
}

// =============================================================================
// Errors and limits
// =============================================================================

#[test]
fn unknown_identifier_names_the_identifier() {
    match semantic_error(eval("b < 1", &[])) {
        SemanticError::UnknownIdentifier { name, .. } => assert_eq!(name, "b"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn deep_nesting_is_rejected() {
    let text = format!("{}1{}", "(".repeat(500), ")".repeat(500));
    match eval(&text, &[]) {
        Err(ExpressionError::Parse(error)) => assert_eq!(error.kind, ParseErrorKind::DepthLimitExceeded),
        other => panic!("expected a depth error, got {other:?}"),
    }

    for text in [
        format!("1{}", "+1".repeat(5000)),
        format!("\"a\"{}", ".Trim()".repeat(500)),
        format!("\"a\"{}", "?.Trim()".repeat(500)),
    ] {
        match eval(&text, &[]) {
            Err(ExpressionError::Parse(error)) => assert_eq!(error.kind, ParseErrorKind::DepthLimitExceeded),
            other => panic!("expected a depth error, got {other:?}"),
        }
    }
    assert_eq!(eval(&format!("1{}", "+1".repeat(50)), &[]).unwrap(), Value::Int(51));

    let mut interpreter = interpreter();
    interpreter.set_max_depth(1000);
    let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
    assert_eq!(interpreter.eval(&shallow, &[]).unwrap(), Value::Int(1));
}

#[test]
fn reflection_is_refused_by_default() {
    assert!(matches!(
        semantic_error(eval("typeof(double).GetMethods()", &[])),
        SemanticError::ReflectionNotAllowed { .. }
    ));
    assert_eq!(eval("typeof(double).Name", &[]).unwrap(), Value::from("Double"));
}

#[test]
fn errors_are_reported_by_stage() {
    assert!(eval("1 +", &[]).unwrap_err().is_parse());
    assert!(eval("\"open", &[]).unwrap_err().is_lex());
    assert_eq!(
        eval("1 / 0", &[]).unwrap_err(),
        ExpressionError::Runtime(RuntimeError::DivisionByZero)
    );
}

// =============================================================================
// Invocation
// =============================================================================

#[test]
fn reinvocation_matches_fresh_evaluation() {
    let interpreter = interpreter();
    let params = [Parameter::new("x", Ty::Int), Parameter::new("y", Ty::Double)];
    let lambda = interpreter.parse("x * 2 + y", None, &params).unwrap();

    for (x, y) in [(1, 0.5), (-4, 2.0), (100, -1.25)] {
        let fresh = interpreter
            .eval(
                "x * 2 + y",
                &[Parameter::with_value("x", x), Parameter::with_value("y", y)],
            )
            .unwrap();
        assert_eq!(lambda.invoke(&[Value::Int(x), Value::Double(y)]).unwrap(), fresh);
    }
}

#[test]
fn invocation_checks_arguments() {
    let interpreter = interpreter();
    let params = [Parameter::new("x", Ty::Long)];
    let lambda = interpreter.parse("x + 1", None, &params).unwrap();

    assert_eq!(lambda.invoke(&[Value::Int(1)]).unwrap(), Value::Long(2));
    assert!(matches!(
        lambda.invoke(&[Value::from("one")]),
        Err(RuntimeError::ArgumentType { .. })
    ));
    assert!(matches!(lambda.invoke(&[]), Err(RuntimeError::ArgumentCount { .. })));
}

#[test]
fn compiled_expressions_are_shareable_across_threads() {
    let interpreter = interpreter();
    let lambda = interpreter
        .parse("x * x", None, &[Parameter::new("x", Ty::Int)])
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let lambda = lambda.clone();
            std::thread::spawn(move || lambda.invoke(&[Value::Int(i)]))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect();
    assert_eq!(results, vec![Value::Int(0), Value::Int(1), Value::Int(4), Value::Int(9)]);
}
