//! Lambda scope management.
//!
//! [`LambdaScope`] is a stack of levels. The bottom level is always
//! [`ScopeLevel::Root`], which holds no names; every lambda literal whose
//! body is being parsed pushes a [`ScopeLevel::Frame`] owning its parameter
//! names. Lookups walk from the innermost frame outwards.
//!
//! A frame may not reuse a name held by any frame below it or by a declared
//! parameter. Sibling lambdas never coexist on the stack, so they may reuse
//! names freely.

use dynex_core::{NameComparer, SemanticError, Span, Ty};

// ============================================================================
// Types
// ============================================================================

/// A lambda parameter found by [`LambdaScope::lookup`].
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaVar {
    /// Frames between the innermost frame and the owning frame (0 = innermost).
    pub depth: usize,
    /// Position within the owning frame.
    pub index: usize,
    pub ty: Ty,
}

/// Parameters introduced by one lambda literal.
#[derive(Debug, Clone)]
pub struct Frame {
    params: Vec<(String, Ty)>,
}

/// One level of the scope stack.
#[derive(Debug, Clone)]
pub enum ScopeLevel {
    Root,
    Frame(Frame),
}

// ============================================================================
// LambdaScope
// ============================================================================

/// Scope stack of the lambda literals enclosing the parse position.
#[derive(Debug)]
pub struct LambdaScope {
    levels: Vec<ScopeLevel>,
    comparer: NameComparer,
    declared: Vec<String>,
}

impl LambdaScope {
    /// Create a root scope; `declared` are the expression's parameter names.
    pub fn new(comparer: NameComparer, declared: Vec<String>) -> Self {
        Self {
            levels: vec![ScopeLevel::Root],
            comparer,
            declared,
        }
    }

    /// Number of frames currently pushed.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Push a frame for a lambda whose body is about to be parsed.
    pub fn push_frame(&mut self, params: Vec<(String, Ty)>, span: Span) -> Result<(), SemanticError> {
        for (i, (name, _)) in params.iter().enumerate() {
            let repeated = params[..i].iter().any(|(other, _)| self.comparer.matches(other, name));
            if repeated || self.lookup(name).is_some() || self.declared.iter().any(|d| self.comparer.matches(d, name)) {
                return Err(SemanticError::LambdaParameterConflict {
                    name: name.clone(),
                    span,
                });
            }
        }
        tracing::trace!(depth = self.depth() + 1, params = params.len(), "push lambda frame");
        self.levels.push(ScopeLevel::Frame(Frame { params }));
        Ok(())
    }

    /// Pop the innermost frame. The root level is never popped.
    pub fn pop_frame(&mut self) {
        if matches!(self.levels.last(), Some(ScopeLevel::Frame(_))) {
            self.levels.pop();
            tracing::trace!(depth = self.depth(), "pop lambda frame");
        }
    }

    /// Find a lambda parameter, innermost frame first.
    pub fn lookup(&self, name: &str) -> Option<LambdaVar> {
        self.levels
            .iter()
            .rev()
            .filter_map(|level| match level {
                ScopeLevel::Frame(frame) => Some(frame),
                ScopeLevel::Root => None,
            })
            .enumerate()
            .find_map(|(depth, frame)| {
                frame
                    .params
                    .iter()
                    .position(|(param, _)| self.comparer.matches(param, name))
                    .map(|index| LambdaVar {
                        depth,
                        index,
                        ty: frame.params[index].1.clone(),
                    })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(names: &[&str]) -> Vec<(String, Ty)> {
        names.iter().map(|n| (n.to_string(), Ty::Int)).collect()
    }

    #[test]
    fn lookup_prefers_innermost() {
        let mut scope = LambdaScope::new(NameComparer::Ordinal, Vec::new());
        scope.push_frame(frame(&["x", "y"]), Span::default()).unwrap();
        scope.push_frame(vec![("z".into(), Ty::String)], Span::default()).unwrap();
        assert_eq!(scope.depth(), 2);
        assert_eq!(
            scope.lookup("y"),
            Some(LambdaVar {
                depth: 1,
                index: 1,
                ty: Ty::Int
            })
        );
        assert_eq!(scope.lookup("z").map(|v| v.depth), Some(0));
        assert_eq!(scope.lookup("w"), None);
    }

    #[test]
    fn ancestor_names_conflict() {
        let mut scope = LambdaScope::new(NameComparer::Ordinal, Vec::new());
        scope.push_frame(frame(&["x"]), Span::default()).unwrap();
        let err = scope.push_frame(frame(&["x"]), Span::new(1, 9, 1)).unwrap_err();
        assert!(matches!(err, SemanticError::LambdaParameterConflict { ref name, .. } if name == "x"));
    }

    #[test]
    fn siblings_reuse_names() {
        let mut scope = LambdaScope::new(NameComparer::Ordinal, Vec::new());
        scope.push_frame(frame(&["x"]), Span::default()).unwrap();
        scope.pop_frame();
        scope.push_frame(frame(&["x"]), Span::default()).unwrap();
        scope.pop_frame();
        scope.pop_frame();
        assert_eq!(scope.depth(), 0);
    }

    #[test]
    fn declared_and_repeated_names_conflict() {
        let mut scope = LambdaScope::new(NameComparer::IgnoreCase, vec!["Value".to_string()]);
        assert!(scope.push_frame(frame(&["value"]), Span::default()).is_err());
        assert!(scope.push_frame(frame(&["a", "A"]), Span::default()).is_err());
        assert_eq!(scope.depth(), 0);
    }
}
