//! Generic argument inference.
//!
//! Simple structural unification without variance: a placeholder binds to
//! the first concrete type it meets and every later occurrence must match
//! exactly. Sequence parameters accept arrays, strings and sequences.

use dynex_core::Ty;

/// Unify a declared parameter type with an argument type, extending `bindings`.
///
/// Returns `false` on a conflict. Shapes that cannot bind anything (a `null`
/// argument, a non-generic parameter) succeed without binding; the
/// conversion check that follows decides whether they fit.
pub fn unify(param: &Ty, arg: &Ty, bindings: &mut [Option<Ty>]) -> bool {
    if !param.has_params() || *arg == Ty::Null {
        return true;
    }
    match (param, arg) {
        (Ty::Param(index), _) => {
            let Some(slot) = bindings.get_mut(*index as usize) else {
                return false;
            };
            if let Some(bound) = slot.as_ref() {
                return bound == arg;
            }
            *slot = Some(arg.clone());
            true
        }
        (Ty::Nullable(p), Ty::Nullable(a)) => unify(p, a, bindings),
        (Ty::Nullable(p), a) if a.is_value_type() => unify(p, a, bindings),
        (Ty::Array(p), Ty::Array(a)) => unify(p, a, bindings),
        (Ty::Seq(p), Ty::Array(a) | Ty::Seq(a)) => unify(p, a, bindings),
        (Ty::Seq(p), Ty::String) => unify(p, &Ty::Char, bindings),
        (Ty::Func(p), Ty::Func(a)) if p.params.len() == a.params.len() => {
            p.params.iter().zip(&a.params).all(|(p, a)| unify(p, a, bindings)) && unify(&p.ret, &a.ret, bindings)
        }
        _ => true,
    }
}

/// Replace bound placeholders in `ty`.
pub fn substitute(ty: &Ty, bindings: &[Option<Ty>]) -> Ty {
    ty.substitute(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_through_sequences() {
        let mut bindings: Vec<Option<Ty>> = vec![None];
        assert!(unify(&Ty::seq(Ty::Param(0)), &Ty::array(Ty::Int), &mut bindings));
        assert_eq!(bindings, vec![Some(Ty::Int)]);

        let mut bindings: Vec<Option<Ty>> = vec![None];
        assert!(unify(&Ty::seq(Ty::Param(0)), &Ty::String, &mut bindings));
        assert_eq!(bindings, vec![Some(Ty::Char)]);
    }

    #[test]
    fn conflicts_fail() {
        let mut bindings: Vec<Option<Ty>> = vec![None];
        assert!(unify(&Ty::Param(0), &Ty::Int, &mut bindings));
        assert!(!unify(&Ty::Param(0), &Ty::Long, &mut bindings));
        assert!(unify(&Ty::Param(0), &Ty::Null, &mut bindings));
    }

    #[test]
    fn delegates_unify_componentwise() {
        let mut bindings = vec![Some(Ty::Int), None];
        let param = Ty::func(vec![Ty::Param(0)], Ty::Param(1));
        assert!(unify(&param, &Ty::func(vec![Ty::Int], Ty::Bool), &mut bindings));
        assert_eq!(bindings, vec![Some(Ty::Int), Some(Ty::Bool)]);
        assert_eq!(substitute(&param, &bindings), Ty::func(vec![Ty::Int], Ty::Bool));
    }

    #[test]
    fn lifting_binds_underlying() {
        let mut bindings: Vec<Option<Ty>> = vec![None];
        assert!(unify(&Ty::Nullable(Box::new(Ty::Param(0))), &Ty::Double, &mut bindings));
        assert_eq!(bindings[0], Some(Ty::Double));
    }
}
