//! Tier and cost based ranking for overload resolution.
//!
//! Selects the best match from the viable candidates: the lowest tier wins,
//! then the lowest total cost. Remaining ties are broken by default filling,
//! then by parameter specificity, or reported as ambiguous.

use dynex_core::{HostTypes, SemanticError, Span};

use super::OverloadMatch;
use crate::conversion::can_implicitly_convert;

/// Find the best match from viable candidates.
///
/// # Returns
///
/// * `Ok(OverloadMatch)` - The best matching candidate
/// * `Err(SemanticError::AmbiguousInvocation)` - Several candidates tie
pub fn find_best_match(
    name: &str,
    mut viable: Vec<OverloadMatch>,
    host: &dyn HostTypes,
    span: Span,
) -> Result<OverloadMatch, SemanticError> {
    viable.sort_by_key(|m| (m.tier, m.cost));
    let Some(best) = viable.first() else {
        return Err(SemanticError::NoApplicableMethod {
            name: name.to_string(),
            args: String::new(),
            span,
        });
    };
    let key = (best.tier, best.cost);
    let tied = viable.iter().take_while(|m| (m.tier, m.cost) == key).count();
    if tied == 1 {
        return Ok(viable.swap_remove(0));
    }

    viable.truncate(tied);
    if let Some(index) = break_tie(&viable).or_else(|| most_specific(&viable, host)) {
        return Ok(viable.swap_remove(index));
    }
    Err(ambiguous_invocation_error(name, &viable, span))
}

/// Try to break a tie between candidates of equal tier and cost.
///
/// When all tied candidates accept the same parameter types and exactly one
/// of them completes the call from parameter defaults, that one wins.
fn break_tie(tied: &[OverloadMatch]) -> Option<usize> {
    let first = &tied[0].param_types;
    if tied.iter().any(|m| &m.param_types != first) {
        return None;
    }
    let mut filling = tied.iter().enumerate().filter(|(_, m)| m.fills_defaults());
    let (index, _) = filling.next()?;
    filling.next().is_none().then_some(index)
}

/// The tied candidate more specific than every other one, if any.
///
/// `float` is more specific than `double` and `string` than `object`: the
/// first converts implicitly to the second and not back.
fn most_specific(tied: &[OverloadMatch], host: &dyn HostTypes) -> Option<usize> {
    (0..tied.len()).find(|&i| {
        tied.iter()
            .enumerate()
            .all(|(j, other)| i == j || more_specific(&tied[i], other, host))
    })
}

fn more_specific(a: &OverloadMatch, b: &OverloadMatch, host: &dyn HostTypes) -> bool {
    if a.param_types.len() != b.param_types.len() {
        return false;
    }
    let mut strictly = false;
    for (x, y) in a.param_types.iter().zip(&b.param_types) {
        if x == y {
            continue;
        }
        if !can_implicitly_convert(x, y, host) || can_implicitly_convert(y, x, host) {
            return false;
        }
        strictly = true;
    }
    strictly
}

/// Build error for an ambiguous invocation.
fn ambiguous_invocation_error(name: &str, tied: &[OverloadMatch], span: Span) -> SemanticError {
    let candidates = tied
        .iter()
        .map(|m| m.method.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    SemanticError::AmbiguousInvocation {
        name: name.to_string(),
        candidates,
        span,
    }
}
