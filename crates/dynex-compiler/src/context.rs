//! ResolutionContext - per-parse symbol access with usage tracking.
//!
//! A context wraps one catalog snapshot and the declared parameters of one
//! parse. Every successful lookup is recorded, so after the parse the caller
//! can ask which parameters, types and identifiers the expression actually
//! uses. Usage sets only grow.

use rustc_hash::FxHashMap;

use dynex_core::{MethodDef, NameComparer, Parameter, SemanticError};
use dynex_registry::{Catalog, Identifier, KnownType};

use std::sync::Arc;

/// Symbol access for a single parse.
pub struct ResolutionContext<'c> {
    text: String,
    parameters: Vec<Parameter>,
    by_name: FxHashMap<String, usize>,
    catalog: &'c Catalog,
    used_parameters: Vec<bool>,
    used_types: Vec<KnownType>,
    used_identifiers: Vec<String>,
}

impl<'c> ResolutionContext<'c> {
    /// Create a context. Parameter names must be unique under the catalog's case policy.
    pub fn new(text: &str, parameters: Vec<Parameter>, catalog: &'c Catalog) -> Result<Self, SemanticError> {
        let comparer = catalog.comparer();
        let mut by_name = FxHashMap::default();
        for (index, parameter) in parameters.iter().enumerate() {
            let key = comparer.key(&parameter.name).into_owned();
            if by_name.insert(key, index).is_some() {
                return Err(SemanticError::DuplicateParameter {
                    name: parameter.name.clone(),
                });
            }
        }
        Ok(Self {
            text: text.to_string(),
            used_parameters: vec![false; parameters.len()],
            parameters,
            by_name,
            catalog,
            used_types: Vec::new(),
            used_identifiers: Vec::new(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn comparer(&self) -> NameComparer {
        self.catalog.comparer()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Whether `name` is a declared parameter, without marking it used.
    pub fn is_parameter(&self, name: &str) -> bool {
        self.by_name.contains_key(self.comparer().key(name).as_ref())
    }

    /// Declared parameter and its position; marks it used.
    pub fn try_get_parameter(&mut self, name: &str) -> Option<(usize, &Parameter)> {
        let index = *self.by_name.get(self.catalog.comparer().key(name).as_ref())?;
        self.used_parameters[index] = true;
        Some((index, &self.parameters[index]))
    }

    /// Known type by name; marks it used.
    pub fn try_get_known_type(&mut self, name: &str) -> Option<KnownType> {
        let known = self.catalog.try_get_known_type(name)?.clone();
        if !self.used_types.iter().any(|t| t.name == known.name) {
            self.used_types.push(known.clone());
        }
        Some(known)
    }

    /// Global identifier by name; marks it used.
    pub fn try_get_identifier(&mut self, name: &str) -> Option<&'c Identifier> {
        let (registered, identifier) = self.catalog.try_get_identifier(name)?;
        if !self.used_identifiers.iter().any(|n| n == registered) {
            self.used_identifiers.push(registered.to_string());
        }
        Some(identifier)
    }

    pub fn extension_methods(&self, name: &str) -> &'c [Arc<MethodDef>] {
        self.catalog.extension_methods(name)
    }

    /// Parameters referenced by the expression, in declaration order.
    pub fn used_parameters(&self) -> Vec<Parameter> {
        self.parameters
            .iter()
            .zip(&self.used_parameters)
            .filter(|(_, used)| **used)
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// Known types referenced by the expression, in first-use order.
    pub fn used_types(&self) -> &[KnownType] {
        &self.used_types
    }

    /// Global identifiers referenced by the expression, in first-use order.
    pub fn used_identifiers(&self) -> &[String] {
        &self.used_identifiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynex_core::Ty;
    use dynex_registry::InterpreterOptions;

    #[test]
    fn duplicate_parameters_rejected() {
        let catalog = Catalog::with_options(InterpreterOptions::DEFAULT_CASE_INSENSITIVE);
        let params = vec![Parameter::new("x", Ty::Int), Parameter::new("X", Ty::Int)];
        let err = ResolutionContext::new("x", params, &catalog).err();
        assert_eq!(err, Some(SemanticError::DuplicateParameter { name: "X".into() }));

        let catalog = Catalog::with_options(InterpreterOptions::DEFAULT);
        let params = vec![Parameter::new("x", Ty::Int), Parameter::new("X", Ty::Int)];
        assert!(ResolutionContext::new("x", params, &catalog).is_ok());
    }

    #[test]
    fn usage_is_recorded_once_in_order() {
        let catalog = Catalog::with_options(InterpreterOptions::DEFAULT);
        let params = vec![
            Parameter::new("a", Ty::Int),
            Parameter::new("b", Ty::Int),
            Parameter::new("c", Ty::Int),
        ];
        let mut ctx = ResolutionContext::new("c + a", params, &catalog).unwrap();
        assert!(ctx.try_get_parameter("c").is_some());
        assert!(ctx.try_get_parameter("a").is_some());
        assert!(ctx.try_get_parameter("a").is_some());
        assert!(ctx.try_get_parameter("zz").is_none());
        let used: Vec<_> = ctx.used_parameters().into_iter().map(|p| p.name).collect();
        assert_eq!(used, vec!["a", "c"]);

        ctx.try_get_known_type("string");
        ctx.try_get_known_type("int");
        ctx.try_get_known_type("string");
        let types: Vec<_> = ctx.used_types().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(types, vec!["string", "int"]);

        ctx.try_get_identifier("null");
        ctx.try_get_identifier("true");
        assert_eq!(ctx.used_identifiers(), &["null".to_string(), "true".to_string()]);
    }
}
