//! TypeRegistry - host type metadata keyed by type family.
//!
//! Every type family (a host class, `string`, `int`, all arrays, ...) has at
//! most one [`ClassEntry`], found through [`Ty::family_hash`]. Registering a
//! builder for a family that already exists merges the members, so several
//! modules can extend the same built-in type.
//!
//! The registry implements [`HostTypes`]: member lookup walks the declared
//! base chain and ends at `object`, which every type derives from.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use dynex_core::{
    HostTypes, IndexerDef, MemberInfo, MemberKind, MethodDef, NameComparer, PropertyDef, ReflectionRefused,
    RegistrationError, Ty, TypeHash,
};

use crate::ClassBuilder;

/// Members registered for one type family.
#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub ty: Ty,
    pub base: Option<Ty>,
    pub properties: Vec<Arc<PropertyDef>>,
    pub methods: Vec<Arc<MethodDef>>,
    pub indexers: Vec<Arc<IndexerDef>>,
    pub constructors: Vec<Arc<MethodDef>>,
}

/// Host type registry.
///
/// Restricted by default: open member enumeration is refused until
/// [`set_restricted(false)`](Self::set_restricted).
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    classes: FxHashMap<TypeHash, ClassEntry>,
    restricted: bool,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self {
            classes: FxHashMap::default(),
            restricted: true,
        }
    }
}

impl TypeRegistry {
    /// Create a new empty, restricted registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow or refuse open member enumeration.
    pub fn set_restricted(&mut self, restricted: bool) {
        self.restricted = restricted;
    }

    /// Register a class or extend an existing type family.
    pub fn register(&mut self, class: ClassBuilder) -> Result<Ty, RegistrationError> {
        let base = match &class.base {
            Some(name) => {
                let entry = self
                    .classes
                    .get(&TypeHash::from_name(name))
                    .ok_or_else(|| RegistrationError::UnknownBase {
                        class: class.ty.to_string(),
                        base: name.clone(),
                    })?;
                Some(entry.ty.clone())
            }
            None => None,
        };

        let hash = class.ty.family_hash();
        let ty = class.ty.clone();
        match self.classes.get_mut(&hash) {
            Some(existing) => {
                if existing.ty.is_value_type() != class.ty.is_value_type() {
                    return Err(RegistrationError::KindMismatch(class.ty.to_string()));
                }
                if base.is_some() {
                    existing.base = base;
                }
                existing.properties.extend(class.properties);
                existing.methods.extend(class.methods);
                existing.indexers.extend(class.indexers);
                existing.constructors.extend(class.constructors);
            }
            None => {
                tracing::trace!(class = %ty, "registering host type");
                self.classes.insert(
                    hash,
                    ClassEntry {
                        ty: class.ty,
                        base,
                        properties: class.properties,
                        methods: class.methods,
                        indexers: class.indexers,
                        constructors: class.constructors,
                    },
                );
            }
        }
        Ok(ty)
    }

    /// Entry of a type family.
    pub fn get(&self, ty: &Ty) -> Option<&ClassEntry> {
        self.classes.get(&ty.family_hash())
    }

    /// Look up a registered class by name.
    pub fn get_by_name(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.get(&TypeHash::from_name(name))
    }

    pub fn contains(&self, ty: &Ty) -> bool {
        self.classes.contains_key(&ty.family_hash())
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Entries from the type itself up through its bases to `object`.
    fn chain(&self, ty: &Ty) -> Vec<&ClassEntry> {
        let mut entries = Vec::new();
        let mut current = Some(ty.clone());
        while let Some(ty) = current {
            if let Some(entry) = self.get(&ty) {
                entries.push(entry);
            }
            current = self.base_type(&ty);
        }
        entries
    }
}

impl HostTypes for TypeRegistry {
    fn properties(&self, ty: &Ty, name: &str, cmp: NameComparer) -> Vec<Arc<PropertyDef>> {
        self.chain(ty)
            .into_iter()
            .flat_map(|entry| entry.properties.iter())
            .filter(|p| cmp.matches(&p.name, name))
            .cloned()
            .collect()
    }

    /// Methods of the chain; a base method with the same parameter types as a
    /// more derived one is hidden.
    fn methods(&self, ty: &Ty, name: &str, cmp: NameComparer) -> Vec<Arc<MethodDef>> {
        let mut found: Vec<Arc<MethodDef>> = Vec::new();
        for entry in self.chain(ty) {
            let start = found.len();
            for method in entry.methods.iter().filter(|m| cmp.matches(&m.name, name)) {
                let hidden = found[..start].iter().any(|m| {
                    m.is_static == method.is_static
                        && m.params.len() == method.params.len()
                        && m.params.iter().zip(&method.params).all(|(a, b)| a.ty == b.ty)
                });
                if !hidden {
                    found.push(Arc::clone(method));
                }
            }
        }
        found
    }

    fn indexers(&self, ty: &Ty) -> Vec<Arc<IndexerDef>> {
        self.chain(ty)
            .into_iter()
            .find(|entry| !entry.indexers.is_empty())
            .map(|entry| entry.indexers.clone())
            .unwrap_or_default()
    }

    fn constructors(&self, ty: &Ty) -> Vec<Arc<MethodDef>> {
        self.get(ty).map(|entry| entry.constructors.clone()).unwrap_or_default()
    }

    fn base_type(&self, ty: &Ty) -> Option<Ty> {
        match ty {
            Ty::Object | Ty::Void | Ty::Null | Ty::Param(_) | Ty::Definition(..) => None,
            other => self
                .get(other)
                .and_then(|entry| entry.base.clone())
                .or(Some(Ty::Object)),
        }
    }

    fn is_restricted(&self) -> bool {
        self.restricted
    }

    fn enumerate_members(&self, ty: &Ty) -> Result<Vec<MemberInfo>, ReflectionRefused> {
        if self.restricted {
            return Err(ReflectionRefused);
        }
        let mut members = Vec::new();
        if let Some(entry) = self.get(ty) {
            members.extend(entry.constructors.iter().map(|c| MemberInfo {
                name: c.name.clone(),
                kind: MemberKind::Constructor,
                is_static: true,
            }));
        }
        for entry in self.chain(ty) {
            members.extend(entry.properties.iter().map(|p| MemberInfo {
                name: p.name.clone(),
                kind: MemberKind::Property,
                is_static: p.is_static,
            }));
            members.extend(entry.methods.iter().map(|m| MemberInfo {
                name: m.name.clone(),
                kind: MemberKind::Method,
                is_static: m.is_static,
            }));
            members.extend(entry.indexers.iter().map(|_| MemberInfo {
                name: "Item".to_string(),
                kind: MemberKind::Indexer,
                is_static: false,
            }));
        }
        Ok(members)
    }
}
