//! Catalog - the symbol snapshot a parse resolves names against.
//!
//! A parse borrows the catalog immutably, so every lookup during one parse
//! sees the same known types, identifiers and extension methods. The host
//! type registry is shared through an `Arc`; mutating it after compiled
//! expressions exist clones it, leaving those expressions on the old version.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use dynex_core::{GenericFamily, HostTypes, MethodDef, NameComparer, RegistrationError, Ty, Value};

use crate::{ClassBuilder, DefaultNumberType, Function, InterpreterOptions, Module, TypeRegistry};

/// Default limit on nested expressions.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// A type reachable by name.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownType {
    /// Name as registered.
    pub name: String,
    pub ty: Ty,
}

/// A global identifier.
#[derive(Debug, Clone)]
pub enum Identifier {
    /// Precomputed constant.
    Constant { value: Value, ty: Ty },
    /// Method group of host functions sharing the name.
    Functions(Vec<Arc<MethodDef>>),
}

/// Immutable-during-parse symbol tables.
#[derive(Debug, Clone)]
pub struct Catalog {
    comparer: NameComparer,
    default_number_type: DefaultNumberType,
    lambdas_enabled: bool,
    max_depth: usize,
    types: Arc<TypeRegistry>,
    known_types: FxHashMap<String, KnownType>,
    generic_definitions: FxHashMap<String, (String, GenericFamily)>,
    identifiers: FxHashMap<String, (String, Identifier)>,
    extensions: FxHashMap<String, Vec<Arc<MethodDef>>>,
}

fn primitive_aliases() -> [(&'static str, Ty); 17] {
    [
        ("object", Ty::Object),
        ("bool", Ty::Bool),
        ("char", Ty::Char),
        ("int", Ty::Int),
        ("long", Ty::Long),
        ("float", Ty::Float),
        ("double", Ty::Double),
        ("string", Ty::String),
        ("Object", Ty::Object),
        ("Boolean", Ty::Bool),
        ("Char", Ty::Char),
        ("Int32", Ty::Int),
        ("Int64", Ty::Long),
        ("Single", Ty::Float),
        ("Double", Ty::Double),
        ("String", Ty::String),
        ("Type", Ty::Type),
    ]
}

const GENERIC_FAMILIES: &[GenericFamily] = &[
    GenericFamily::Nullable,
    GenericFamily::Enumerable,
    GenericFamily::Func,
    GenericFamily::Action,
];

impl Catalog {
    /// An empty catalog with lambdas enabled and the default depth limit.
    pub fn new(comparer: NameComparer) -> Self {
        Self {
            comparer,
            default_number_type: DefaultNumberType::Default,
            lambdas_enabled: true,
            max_depth: DEFAULT_MAX_DEPTH,
            types: Arc::new(TypeRegistry::new()),
            known_types: FxHashMap::default(),
            generic_definitions: FxHashMap::default(),
            identifiers: FxHashMap::default(),
            extensions: FxHashMap::default(),
        }
    }

    /// A catalog configured from option flags.
    ///
    /// `COMMON_TYPES` needs host modules and is applied by the caller.
    pub fn with_options(options: InterpreterOptions) -> Self {
        let comparer = if options.contains(InterpreterOptions::CASE_INSENSITIVE) {
            NameComparer::IgnoreCase
        } else {
            NameComparer::Ordinal
        };
        let mut catalog = Self::new(comparer);
        catalog.lambdas_enabled = options.contains(InterpreterOptions::LAMBDA_EXPRESSIONS);
        if options.contains(InterpreterOptions::PRIMITIVE_TYPES) {
            for (alias, ty) in primitive_aliases() {
                catalog.add_known_type(alias, ty);
            }
            for family in GENERIC_FAMILIES {
                catalog.add_generic_definition(family.name(), *family);
            }
        }
        if options.contains(InterpreterOptions::SYSTEM_KEYWORDS) {
            catalog.set_constant("true", Ty::Bool, Value::Bool(true));
            catalog.set_constant("false", Ty::Bool, Value::Bool(false));
            catalog.set_constant("null", Ty::Null, Value::Null);
        }
        catalog
    }

    // ==========================================================================
    // Configuration
    // ==========================================================================

    pub fn comparer(&self) -> NameComparer {
        self.comparer
    }

    pub fn default_number_type(&self) -> DefaultNumberType {
        self.default_number_type
    }

    pub fn set_default_number_type(&mut self, number_type: DefaultNumberType) {
        self.default_number_type = number_type;
    }

    pub fn lambdas_enabled(&self) -> bool {
        self.lambdas_enabled
    }

    pub fn set_lambdas_enabled(&mut self, enabled: bool) {
        self.lambdas_enabled = enabled;
    }

    /// Maximum number of nested expressions a parse accepts.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Allow reflection members (`GetMethods()`, ...) to enumerate host types.
    pub fn set_reflection_enabled(&mut self, enabled: bool) {
        Arc::make_mut(&mut self.types).set_restricted(!enabled);
    }

    /// Shared host type registry.
    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    /// Host type registry as the introspection capability.
    pub fn host(&self) -> Arc<dyn HostTypes> {
        self.types.clone()
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a host class or extend a built-in type.
    pub fn register_class(&mut self, class: ClassBuilder) -> Result<Ty, RegistrationError> {
        Arc::make_mut(&mut self.types).register(class)
    }

    /// Make `ty` reachable as `alias`.
    pub fn add_known_type(&mut self, alias: &str, ty: Ty) {
        let key = self.comparer.key(alias).into_owned();
        self.known_types.insert(
            key,
            KnownType {
                name: alias.to_string(),
                ty,
            },
        );
    }

    /// Make a built-in generic family reachable by its base name.
    pub fn add_generic_definition(&mut self, name: &str, family: GenericFamily) {
        let key = self.comparer.key(name).into_owned();
        self.generic_definitions.insert(key, (name.to_string(), family));
    }

    /// Set a constant identifier, replacing any previous identifier of that name.
    pub fn set_constant(&mut self, name: &str, ty: Ty, value: Value) {
        let key = self.comparer.key(name).into_owned();
        self.identifiers
            .insert(key, (name.to_string(), Identifier::Constant { value, ty }));
    }

    /// Add a function to the method group of its name.
    ///
    /// A constant of the same name is replaced by the group.
    pub fn add_function(&mut self, function: Function) {
        let def = Arc::new(function.into_function());
        let key = self.comparer.key(&def.name).into_owned();
        match self.identifiers.get_mut(&key) {
            Some((_, Identifier::Functions(group))) => group.push(def),
            _ => {
                let name = def.name.clone();
                self.identifiers.insert(key, (name, Identifier::Functions(vec![def])));
            }
        }
    }

    /// Remove a constant or function group; returns whether one existed.
    pub fn remove_identifier(&mut self, name: &str) -> bool {
        self.identifiers.remove(self.comparer.key(name).as_ref()).is_some()
    }

    /// Add an extension method.
    pub fn add_extension(&mut self, function: Function) {
        let def = Arc::new(function.into_extension());
        let key = self.comparer.key(&def.name).into_owned();
        self.extensions.entry(key).or_default().push(def);
    }

    /// Install every registration of a module.
    pub fn install(&mut self, module: Module) -> Result<(), RegistrationError> {
        let count = module.len();
        for (alias, class) in module.classes {
            let ty = self.register_class(class)?;
            if let Some(alias) = alias {
                self.add_known_type(&alias, ty);
            }
        }
        for function in module.functions {
            self.add_function(function);
        }
        for (name, ty, value) in module.constants {
            self.set_constant(&name, ty, value);
        }
        for (alias, ty) in module.known_types {
            self.add_known_type(&alias, ty);
        }
        for function in module.extensions {
            self.add_extension(function);
        }
        tracing::debug!(registrations = count, "installed module");
        Ok(())
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    pub fn try_get_known_type(&self, name: &str) -> Option<&KnownType> {
        self.known_types.get(self.comparer.key(name).as_ref())
    }

    pub fn has_known_generic_definition(&self, name: &str) -> bool {
        self.generic_definitions.contains_key(self.comparer.key(name).as_ref())
    }

    /// Generic family registered under a base name, with its registered spelling.
    pub fn known_generic_definitions(&self, name: &str) -> Option<(&str, GenericFamily)> {
        self.generic_definitions
            .get(self.comparer.key(name).as_ref())
            .map(|(name, family)| (name.as_str(), *family))
    }

    /// Global identifier with its registered spelling.
    pub fn try_get_identifier(&self, name: &str) -> Option<(&str, &Identifier)> {
        self.identifiers
            .get(self.comparer.key(name).as_ref())
            .map(|(name, identifier)| (name.as_str(), identifier))
    }

    pub fn extension_methods(&self, name: &str) -> &[Arc<MethodDef>] {
        self.extensions
            .get(self.comparer.key(name).as_ref())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Names of every global identifier.
    pub fn identifier_names(&self) -> impl Iterator<Item = &str> {
        self.identifiers.values().map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynex_core::ParamDef;

    fn int_fn(name: &str, arity: usize) -> Function {
        let params = (0..arity).map(|i| ParamDef::new(format!("p{i}"), Ty::Int)).collect();
        Function::new(name, params, Ty::Int, |_: &[Value]| Ok(Value::Int(0)))
    }

    #[test]
    fn options_install_primitives_and_keywords() {
        let catalog = Catalog::with_options(InterpreterOptions::DEFAULT);
        assert_eq!(catalog.try_get_known_type("Int32").map(|k| &k.ty), Some(&Ty::Int));
        assert!(catalog.has_known_generic_definition("IEnumerable"));
        assert!(matches!(
            catalog.try_get_identifier("true"),
            Some((_, Identifier::Constant { value: Value::Bool(true), .. }))
        ));
        assert!(catalog.try_get_identifier("TRUE").is_none());
        assert_eq!(catalog.max_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn bare_options_leave_catalog_empty() {
        let catalog = Catalog::with_options(InterpreterOptions::empty());
        assert!(catalog.try_get_known_type("int").is_none());
        assert!(catalog.try_get_identifier("null").is_none());
        assert!(!catalog.lambdas_enabled());
    }

    #[test]
    fn case_insensitive_lookup_keeps_spelling() {
        let catalog = Catalog::with_options(InterpreterOptions::DEFAULT_CASE_INSENSITIVE);
        let (name, _) = catalog.try_get_identifier("TRUE").unwrap();
        assert_eq!(name, "true");
        assert_eq!(catalog.known_generic_definitions("func").map(|(_, f)| f), Some(GenericFamily::Func));
    }

    #[test]
    fn functions_form_groups() {
        let mut catalog = Catalog::new(NameComparer::Ordinal);
        catalog.set_constant("f", Ty::Int, Value::Int(1));
        catalog.add_function(int_fn("f", 1));
        catalog.add_function(int_fn("f", 2));
        match catalog.try_get_identifier("f") {
            Some((_, Identifier::Functions(group))) => assert_eq!(group.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn install_module() {
        let mut catalog = Catalog::new(NameComparer::Ordinal);
        let module = Module::new()
            .named_class("Person", ClassBuilder::reference("Person"))
            .extension(int_fn("Twice", 1))
            .known_type("Number", Ty::Double);
        catalog.install(module).unwrap();
        assert!(catalog.try_get_known_type("Person").is_some());
        assert_eq!(catalog.try_get_known_type("Number").map(|k| &k.ty), Some(&Ty::Double));
        assert_eq!(catalog.extension_methods("Twice").len(), 1);
        assert!(catalog.extension_methods("Twice")[0].is_extension);
        assert!(catalog.types().get_by_name("Person").is_some());
    }

    #[test]
    fn reflection_toggle_copies_registry() {
        let mut catalog = Catalog::new(NameComparer::Ordinal);
        let before = catalog.host();
        catalog.set_reflection_enabled(true);
        assert!(before.is_restricted());
        assert!(!catalog.host().is_restricted());
    }
}
