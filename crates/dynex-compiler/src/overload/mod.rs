//! Overload resolution for calls.
//!
//! ## Algorithm
//!
//! 1. Filter candidates by argument count (defaults and `params` arrays considered)
//! 2. Infer generic arguments from the typed arguments, or take the explicit ones
//! 3. Check every typed argument converts to its parameter type
//! 4. Check lambda arguments against delegate-typed parameters
//! 5. Rank viable candidates by tier, then by cost, then break ties
//!
//! Expanded (`params`) forms are only considered when no candidate applies
//! in normal form. Lambda bodies are typed only when several candidates
//! remain: the conversion from a body's type to its delegate's return type
//! then joins the candidate's rank, so `Sum(x => x.Length)` prefers
//! `Func<T, int>` over `Func<T, double>`. The parser binds the bodies once
//! the winner is known.

mod generic;
mod ranking;

pub use generic::{substitute, unify};
pub use ranking::find_best_match;

use std::sync::Arc;

use dynex_core::{HostTypes, MethodDef, SemanticError, Span, Ty, Value};

use crate::conversion::{Conversion, Tier, find_conversion};

/// Shape of a lambda literal argument whose body has not been parsed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaShape {
    pub arity: usize,
    /// Parameter types written in the literal, if any.
    pub explicit: Option<Vec<Ty>>,
}

/// What the resolver knows about one call argument.
#[derive(Debug, Clone, Copy)]
pub enum ArgShape<'a> {
    /// A parsed argument; `literal` is set for unsuffixed numeric literals.
    Expr { ty: &'a Ty, literal: Option<&'a Value> },
    Lambda(&'a LambdaShape),
}

impl ArgShape<'_> {
    fn describe(&self) -> String {
        match self {
            ArgShape::Expr { ty, .. } => ty.to_string(),
            ArgShape::Lambda(shape) => format!("lambda/{}", shape.arity),
        }
    }
}

/// Result of successful overload resolution.
#[derive(Debug, Clone)]
pub struct OverloadMatch {
    pub method: Arc<MethodDef>,
    /// Generic bindings; lambda return types may still be open.
    pub bindings: Vec<Option<Ty>>,
    /// Parameter type receiving each supplied argument.
    pub param_types: Vec<Ty>,
    /// Conversion for each argument (`None` for lambdas).
    pub conversions: Vec<Option<Conversion>>,
    /// Trailing arguments are packed into the `params` array.
    pub expanded: bool,
    pub tier: Tier,
    pub cost: u32,
}

impl OverloadMatch {
    /// Whether omitted arguments are filled from parameter defaults.
    pub fn fills_defaults(&self) -> bool {
        !self.expanded && self.param_types.len() < self.method.params.len()
    }
}

/// Types the body of the lambda argument at `index` for the given parameter
/// types; `None` when the body does not resolve with them.
pub type LambdaBodyTyper<'a> = dyn FnMut(usize, &[Ty]) -> Option<Ty> + 'a;

/// Resolve a call against its candidates without looking at lambda bodies.
pub fn resolve_overload(
    name: &str,
    candidates: &[Arc<MethodDef>],
    args: &[ArgShape<'_>],
    explicit_generics: Option<&[Ty]>,
    host: &dyn HostTypes,
    span: Span,
) -> Result<OverloadMatch, SemanticError> {
    resolve_overload_with(name, candidates, args, explicit_generics, host, span, &mut |_, _| None)
}

/// Resolve a call against its candidates, typing lambda bodies with
/// `body_type` when that is needed to rank them.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn resolve_overload_with(
    name: &str,
    candidates: &[Arc<MethodDef>],
    args: &[ArgShape<'_>],
    explicit_generics: Option<&[Ty]>,
    host: &dyn HostTypes,
    span: Span,
    body_type: &mut LambdaBodyTyper<'_>,
) -> Result<OverloadMatch, SemanticError> {
    let normal: Vec<_> = candidates
        .iter()
        .filter_map(|m| try_match_candidate(m, args, explicit_generics, false, host))
        .collect();
    let viable = if normal.is_empty() {
        candidates
            .iter()
            .filter(|m| m.is_variadic)
            .filter_map(|m| try_match_candidate(m, args, explicit_generics, true, host))
            .collect()
    } else {
        normal
    };

    if viable.is_empty() {
        return Err(SemanticError::NoApplicableMethod {
            name: name.to_string(),
            args: args.iter().map(ArgShape::describe).collect::<Vec<_>>().join(", "),
            span,
        });
    }

    let viable = rank_lambda_bodies(viable, args, host, body_type);
    let best = find_best_match(name, viable, host, span)?;
    tracing::debug!(
        name,
        candidates = candidates.len(),
        tier = %best.tier,
        cost = best.cost,
        "overload selected"
    );
    Ok(best)
}

/// Fold the conversion of each lambda body to its delegate's return type
/// into the rank of every viable candidate.
///
/// Candidates whose bodies do not resolve or do not convert are dropped,
/// unless that drops all of them; binding then reports the body's error.
/// Generic and `void` returns do not take part.
fn rank_lambda_bodies(
    viable: Vec<OverloadMatch>,
    args: &[ArgShape<'_>],
    host: &dyn HostTypes,
    body_type: &mut LambdaBodyTyper<'_>,
) -> Vec<OverloadMatch> {
    if viable.len() < 2 || !args.iter().any(|a| matches!(a, ArgShape::Lambda(_))) {
        return viable;
    }
    let mut ranked = Vec::with_capacity(viable.len());
    'candidates: for candidate in &viable {
        let mut candidate = candidate.clone();
        for (index, arg) in args.iter().enumerate() {
            if !matches!(arg, ArgShape::Lambda(_)) {
                continue;
            }
            let Some(sig) = candidate.param_types[index].as_func().cloned() else {
                continue;
            };
            if sig.ret == Ty::Void || sig.ret.has_params() {
                continue;
            }
            let Some(conversion) = body_type(index, &sig.params).and_then(|body| find_conversion(&body, &sig.ret, None, host))
            else {
                continue 'candidates;
            };
            candidate.tier = candidate.tier.max(conversion.tier);
            candidate.cost += conversion.cost;
        }
        ranked.push(candidate);
    }
    if ranked.is_empty() { viable } else { ranked }
}

/// Try to match arguments against one candidate in normal or expanded form.
fn try_match_candidate(
    method: &Arc<MethodDef>,
    args: &[ArgShape<'_>],
    explicit_generics: Option<&[Ty]>,
    expanded: bool,
    host: &dyn HostTypes,
) -> Option<OverloadMatch> {
    let params = &method.params;
    let declared: Vec<Ty> = if expanded {
        let element = method.variadic_element()?;
        let fixed = params.len() - 1;
        if args.len() < fixed {
            return None;
        }
        (0..args.len())
            .map(|i| if i < fixed { params[i].ty.clone() } else { element.clone() })
            .collect()
    } else {
        if args.len() > params.len() || params[args.len()..].iter().any(|p| p.default.is_none()) {
            return None;
        }
        params[..args.len()].iter().map(|p| p.ty.clone()).collect()
    };

    let mut bindings = match explicit_generics {
        Some(explicit) if explicit.len() == method.generic_arity as usize => {
            explicit.iter().cloned().map(Some).collect()
        }
        Some(_) => return None,
        None => vec![None; method.generic_arity as usize],
    };

    for (param, arg) in declared.iter().zip(args) {
        match arg {
            ArgShape::Expr { ty, .. } => {
                if !unify(param, ty, &mut bindings) {
                    return None;
                }
            }
            ArgShape::Lambda(LambdaShape {
                explicit: Some(explicit),
                ..
            }) => {
                let Ty::Func(sig) = param else {
                    return None;
                };
                if sig.params.len() != explicit.len()
                    || !sig.params.iter().zip(explicit).all(|(p, e)| unify(p, e, &mut bindings))
                {
                    return None;
                }
            }
            ArgShape::Lambda(_) => {}
        }
    }

    let mut param_types = Vec::with_capacity(args.len());
    let mut conversions = Vec::with_capacity(args.len());
    let mut tier = Tier::Exact;
    let mut cost = 0;
    for (param, arg) in declared.iter().zip(args) {
        let param = substitute(param, &bindings);
        match arg {
            ArgShape::Expr { ty, literal } => {
                if param.has_params() {
                    return None;
                }
                let conversion = find_conversion(ty, &param, *literal, host)?;
                tier = tier.max(conversion.tier);
                cost += conversion.cost;
                conversions.push(Some(conversion));
            }
            ArgShape::Lambda(shape) => {
                let sig = param.as_func()?;
                if sig.params.len() != shape.arity || sig.params.iter().any(Ty::has_params) {
                    return None;
                }
                if let Some(explicit) = &shape.explicit
                    && explicit != &sig.params
                {
                    return None;
                }
                conversions.push(None);
            }
        }
        param_types.push(param);
    }

    if expanded {
        tier = Tier::Variadic;
        cost += Conversion::COST_VAR_ARG * (args.len() + 1 - params.len()) as u32;
    }

    Some(OverloadMatch {
        method: Arc::clone(method),
        bindings,
        param_types,
        conversions,
        expanded,
        tier,
        cost,
    })
}
