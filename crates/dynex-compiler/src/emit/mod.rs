//! Closure emitter.
//!
//! Turns a resolved [`TypedExpr`] tree into a tree of closures. Every node
//! becomes one [`Thunk`] that evaluates its children and applies the
//! already-resolved operation; nothing is looked up at invocation time.
//!
//! ```text
//! TypedExpr ──Emitter::emit──> Thunk ──CompiledExpression::invoke──> Value
//!                               │
//!                               └── reads parameters and lambda arguments from Env
//! ```

mod env;
mod member;

pub use env::Env;
pub use member::runtime_name;

use std::sync::Arc;

use dynex_core::{HostTypes, NativeFn, Parameter, RuntimeError, SemanticError, Ty, Value};

use crate::compiled::CompiledExpression;
use crate::conversion::{ConversionKind, convert_numeric, default_value};
use crate::operators::{coerce, eval_binary, eval_unary};
use crate::tree::{BinaryOp, ExprKind, Member, TypedExpr};
use member::{read_member, read_null_member};

/// One emitted node.
pub type Thunk = Arc<dyn Fn(&Arc<Env>) -> Result<Value, RuntimeError> + Send + Sync>;

/// Compile a resolved tree into an invocable expression.
///
/// With a requested return type the tree is implicitly converted to it;
/// `void` discards the value and yields null.
pub fn compile(
    tree: TypedExpr,
    parameters: Vec<Parameter>,
    return_ty: Option<&Ty>,
    host: Arc<dyn HostTypes>,
) -> Result<CompiledExpression, SemanticError> {
    let (tree, return_type, discard) = match return_ty {
        None => {
            let ty = if tree.ty == Ty::Null { Ty::Object } else { tree.ty.clone() };
            (tree, ty, false)
        }
        Some(Ty::Void) => (tree, Ty::Void, true),
        Some(requested) => {
            let actual = tree.ty.to_string();
            let converted = coerce(tree, requested, &*host).map_err(|_| SemanticError::ReturnTypeMismatch {
                expected: requested.to_string(),
                actual,
            })?;
            (converted, requested.clone(), false)
        }
    };

    let emitter = Emitter::new(Arc::clone(&host));
    let body = emitter.emit(&tree);
    let root: Thunk = if discard {
        Arc::new(move |env: &Arc<Env>| body(env).map(|_| Value::Null))
    } else {
        body
    };
    tracing::debug!(return_type = %return_type, params = parameters.len(), "emitted closure tree");
    Ok(CompiledExpression::new(root, parameters, return_type, host))
}

/// Builds thunks for resolved nodes.
pub struct Emitter {
    host: Arc<dyn HostTypes>,
}

impl Emitter {
    pub fn new(host: Arc<dyn HostTypes>) -> Self {
        Self { host }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn emit(&self, expr: &TypedExpr) -> Thunk {
        match &expr.kind {
            ExprKind::Constant { value, .. } => {
                let value = value.clone();
                Arc::new(move |_: &Arc<Env>| Ok(value.clone()))
            }
            ExprKind::Parameter { index, depth } => {
                let (index, depth) = (*index, *depth);
                Arc::new(move |env: &Arc<Env>| Ok(env.parameter(depth, index)))
            }
            ExprKind::LambdaVar { index, depth } => {
                let (index, depth) = (*index, *depth);
                Arc::new(move |env: &Arc<Env>| Ok(env.lambda_var(depth, index)))
            }
            ExprKind::Convert { operand, conversion } => self.emit_convert(operand, conversion.clone()),
            ExprKind::Unary { op, operand } => {
                let (op, operand) = (*op, self.emit(operand));
                Arc::new(move |env: &Arc<Env>| eval_unary(op, operand(env)?))
            }
            ExprKind::Binary { op, left, right } => self.emit_binary(*op, left, right),
            ExprKind::Coalesce { left, right } => {
                let (left, right) = (self.emit(left), self.emit(right));
                Arc::new(move |env: &Arc<Env>| match left(env)? {
                    Value::Null => right(env),
                    value => Ok(value),
                })
            }
            ExprKind::Conditional {
                test,
                if_true,
                if_false,
            } => {
                let (test, if_true, if_false) = (self.emit(test), self.emit(if_true), self.emit(if_false));
                Arc::new(move |env: &Arc<Env>| match test(env)? {
                    Value::Bool(true) => if_true(env),
                    Value::Bool(false) => if_false(env),
                    _ => Err(RuntimeError::NullReference),
                })
            }
            ExprKind::TypeIs { operand, target } => {
                let (operand, target, host) = (self.emit(operand), target.clone(), Arc::clone(&self.host));
                Arc::new(move |env: &Arc<Env>| Ok(Value::Bool(host.conforms(&operand(env)?, &target))))
            }
            ExprKind::TypeAs { operand, target } => {
                let (operand, target, host) = (self.emit(operand), target.clone(), Arc::clone(&self.host));
                Arc::new(move |env: &Arc<Env>| {
                    let value = operand(env)?;
                    Ok(if host.conforms(&value, &target) { value } else { Value::Null })
                })
            }
            ExprKind::Call { func, args } => {
                let (func, args) = (func.clone(), self.emit_all(args));
                Arc::new(move |env: &Arc<Env>| func.call(&eval_all(&args, env)?))
            }
            ExprKind::StaticProperty(getter) => {
                let getter = getter.clone();
                Arc::new(move |_: &Arc<Env>| getter.call(&[]))
            }
            ExprKind::Access {
                receiver,
                member,
                args,
                guarded,
            } => {
                let (receiver, args) = (self.emit(receiver), self.emit_all(args));
                let (member, guarded, host) = (member.clone(), *guarded, Arc::clone(&self.host));
                Arc::new(move |env: &Arc<Env>| {
                    let target = receiver(env)?;
                    if target.is_null() {
                        if guarded {
                            return Ok(Value::Null);
                        }
                        if let Member::Extension(func) = &member {
                            let mut call_args = vec![Value::Null];
                            call_args.extend(eval_all(&args, env)?);
                            return func.call(&call_args);
                        }
                        return read_null_member(&member, eval_all(&args, env)?);
                    }
                    read_member(&member, target, eval_all(&args, env)?, &*host)
                })
            }
            ExprKind::NewArray { elem, len } => {
                let (fill, len) = (default_value(elem), self.emit(len));
                Arc::new(move |env: &Arc<Env>| {
                    let count = len(env)?.as_i64().ok_or(RuntimeError::NullReference)?;
                    let count = usize::try_from(count)
                        .map_err(|_| RuntimeError::host(format!("array length {count} is negative")))?;
                    Ok(Value::array(vec![fill.clone(); count]))
                })
            }
            ExprKind::ArrayInit(items) => {
                let items = self.emit_all(items);
                Arc::new(move |env: &Arc<Env>| Ok(Value::array(eval_all(&items, env)?)))
            }
            ExprKind::Lambda {
                arity,
                body,
                returns_value,
            } => self.emit_lambda(*arity, body, *returns_value),
        }
    }

    fn emit_all(&self, exprs: &[TypedExpr]) -> Arc<[Thunk]> {
        exprs.iter().map(|e| self.emit(e)).collect()
    }

    fn emit_convert(&self, operand: &TypedExpr, conversion: ConversionKind) -> Thunk {
        let operand = self.emit(operand);
        match conversion {
            ConversionKind::Identity => operand,
            ConversionKind::Numeric(target) => {
                Arc::new(move |env: &Arc<Env>| convert_numeric(operand(env)?, &target))
            }
            ConversionKind::Unwrap(_) => Arc::new(move |env: &Arc<Env>| match operand(env)? {
                Value::Null => Err(RuntimeError::NullReference),
                value => Ok(value),
            }),
            ConversionKind::Checked(target) => {
                let host = Arc::clone(&self.host);
                Arc::new(move |env: &Arc<Env>| {
                    let value = operand(env)?;
                    if value.is_null() {
                        return if target.accepts_null() {
                            Ok(Value::Null)
                        } else {
                            Err(RuntimeError::NullReference)
                        };
                    }
                    if host.conforms(&value, &target) {
                        Ok(value)
                    } else {
                        Err(RuntimeError::InvalidCast {
                            from: value.type_name(),
                            to: target.to_string(),
                        })
                    }
                })
            }
        }
    }

    fn emit_binary(&self, op: BinaryOp, left: &TypedExpr, right: &TypedExpr) -> Thunk {
        let (left, right) = (self.emit(left), self.emit(right));
        match op {
            BinaryOp::AndAlso => Arc::new(move |env: &Arc<Env>| match left(env)? {
                Value::Bool(false) => Ok(Value::Bool(false)),
                l => eval_binary(op, l, right(env)?),
            }),
            BinaryOp::OrElse => Arc::new(move |env: &Arc<Env>| match left(env)? {
                Value::Bool(true) => Ok(Value::Bool(true)),
                l => eval_binary(op, l, right(env)?),
            }),
            _ => Arc::new(move |env: &Arc<Env>| {
                let l = left(env)?;
                eval_binary(op, l, right(env)?)
            }),
        }
    }

    /// A lambda evaluates to a delegate capturing the environment it was created in.
    fn emit_lambda(&self, arity: usize, body: &TypedExpr, returns_value: bool) -> Thunk {
        let body = self.emit(body);
        Arc::new(move |env: &Arc<Env>| {
            let (captured, body) = (Arc::clone(env), Arc::clone(&body));
            let func = NativeFn::anonymous(move |args: &[Value]| {
                if args.len() != arity {
                    return Err(RuntimeError::ArgumentCount {
                        expected: arity,
                        got: args.len(),
                    });
                }
                let frame = Env::child(&captured, args.to_vec());
                let value = body(&frame)?;
                Ok(if returns_value { value } else { Value::Null })
            });
            Ok(Value::Func(func))
        })
    }
}

fn eval_all(thunks: &[Thunk], env: &Arc<Env>) -> Result<Vec<Value>, RuntimeError> {
    thunks.iter().map(|thunk| thunk(env)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::UnaryOp;
    use dynex_core::Span;
    use dynex_registry::TypeRegistry;
    use pretty_assertions::assert_eq;

    fn host() -> Arc<dyn HostTypes> {
        Arc::new(TypeRegistry::new())
    }

    fn run(expr: &TypedExpr, params: Vec<Value>) -> Result<Value, RuntimeError> {
        let thunk = Emitter::new(host()).emit(expr);
        thunk(&Env::root(params))
    }

    fn int(v: i32) -> TypedExpr {
        TypedExpr::constant(Value::Int(v), Span::default())
    }

    fn param(index: usize, ty: Ty) -> TypedExpr {
        TypedExpr::new(ExprKind::Parameter { index, depth: 0 }, ty, Span::default())
    }

    fn binary(op: BinaryOp, left: TypedExpr, right: TypedExpr, ty: Ty) -> TypedExpr {
        TypedExpr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
            Span::default(),
        )
    }

    #[test]
    fn arithmetic_over_parameters() {
        let expr = binary(BinaryOp::Add, param(0, Ty::Int), int(2), Ty::Int);
        assert_eq!(run(&expr, vec![Value::Int(40)]), Ok(Value::Int(42)));
        assert_eq!(run(&expr, vec![Value::Int(1)]), Ok(Value::Int(3)));
    }

    #[test]
    fn and_also_short_circuits() {
        let boom = TypedExpr::new(
            ExprKind::Call {
                func: NativeFn::anonymous(|_: &[Value]| Err(RuntimeError::host("evaluated"))),
                args: Vec::new(),
            },
            Ty::Bool,
            Span::default(),
        );
        let expr = binary(
            BinaryOp::AndAlso,
            TypedExpr::constant(Value::Bool(false), Span::default()),
            boom,
            Ty::Bool,
        );
        assert_eq!(run(&expr, Vec::new()), Ok(Value::Bool(false)));
    }

    #[test]
    fn guarded_access_yields_null() {
        let access = |guarded| {
            TypedExpr::new(
                ExprKind::Access {
                    receiver: Box::new(param(0, Ty::array(Ty::Int))),
                    member: Member::ArrayLength,
                    args: Vec::new(),
                    guarded,
                },
                Ty::nullable(Ty::Int),
                Span::default(),
            )
        };
        assert_eq!(run(&access(true), vec![Value::Null]), Ok(Value::Null));
        assert_eq!(run(&access(false), vec![Value::Null]), Err(RuntimeError::NullReference));
        assert_eq!(
            run(&access(true), vec![Value::array(vec![Value::Int(1)])]),
            Ok(Value::Int(1))
        );
    }

    #[test]
    fn lambdas_capture_their_environment() {
        // x => x + p0
        let body = binary(
            BinaryOp::Add,
            TypedExpr::new(ExprKind::LambdaVar { index: 0, depth: 0 }, Ty::Int, Span::default()),
            TypedExpr::new(ExprKind::Parameter { index: 0, depth: 1 }, Ty::Int, Span::default()),
            Ty::Int,
        );
        let lambda = TypedExpr::new(
            ExprKind::Lambda {
                arity: 1,
                body: Box::new(body),
                returns_value: true,
            },
            Ty::func(vec![Ty::Int], Ty::Int),
            Span::default(),
        );
        let Ok(Value::Func(func)) = run(&lambda, vec![Value::Int(10)]) else {
            panic!("expected a delegate");
        };
        assert_eq!(func.call(&[Value::Int(5)]), Ok(Value::Int(15)));
        assert_eq!(
            func.call(&[]),
            Err(RuntimeError::ArgumentCount { expected: 1, got: 0 })
        );
    }

    #[test]
    fn checked_and_unwrap_conversions() {
        let unbox = param(0, Ty::Object).convert(ConversionKind::Checked(Ty::Int), Ty::Int);
        assert_eq!(run(&unbox, vec![Value::Int(3)]), Ok(Value::Int(3)));
        assert!(matches!(
            run(&unbox, vec![Value::from("x")]),
            Err(RuntimeError::InvalidCast { .. })
        ));

        let unwrap = param(0, Ty::nullable(Ty::Int)).convert(ConversionKind::Unwrap(Ty::Int), Ty::Int);
        assert_eq!(run(&unwrap, vec![Value::Null]), Err(RuntimeError::NullReference));

        let negate = TypedExpr::new(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(param(0, Ty::nullable(Ty::Int))),
            },
            Ty::nullable(Ty::Int),
            Span::default(),
        );
        assert_eq!(run(&negate, vec![Value::Null]), Ok(Value::Null));
    }

    #[test]
    fn new_array_is_filled_with_defaults() {
        let expr = TypedExpr::new(
            ExprKind::NewArray {
                elem: Ty::Int,
                len: Box::new(int(2)),
            },
            Ty::array(Ty::Int),
            Span::default(),
        );
        assert_eq!(run(&expr, Vec::new()), Ok(Value::array(vec![Value::Int(0), Value::Int(0)])));
    }

    #[test]
    fn requested_return_type_converts_or_fails() {
        let compiled = compile(int(1), Vec::new(), Some(&Ty::Double), host()).unwrap();
        assert_eq!(compiled.return_type(), &Ty::Double);
        assert_eq!(compiled.invoke(&[]), Ok(Value::Double(1.0)));

        let mismatch = compile(int(1), Vec::new(), Some(&Ty::String), host());
        assert!(matches!(mismatch, Err(SemanticError::ReturnTypeMismatch { .. })));

        let discarded = compile(int(1), Vec::new(), Some(&Ty::Void), host()).unwrap();
        assert_eq!(discarded.invoke(&[]), Ok(Value::Null));
    }
}
