//! Type catalog: the name→type registry consulted while decoding

use crate::error::LookupError;
use crate::types::{TypeDef, TypeHandle};
use hashbrown::HashMap;

/// Registry of types keyed by module qualifier and type name
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    modules: HashMap<String, HashMap<String, TypeHandle>>,
}

impl TypeCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type under its own module and name
    pub fn register(&mut self, def: TypeDef) -> TypeHandle {
        let handle = TypeHandle::new(def);
        self.insert(handle.module().to_string(), handle.name().to_string(), handle.clone());
        handle
    }

    /// Make an already registered type reachable under another reference.
    ///
    /// Lists written before a type moved modules still refer to the old path.
    pub fn register_alias(&mut self, module: &str, name: &str, handle: &TypeHandle) {
        self.insert(module.to_string(), name.to_string(), handle.clone());
    }

    fn insert(&mut self, module: String, name: String, handle: TypeHandle) {
        self.modules.entry(module).or_default().insert(name, handle);
    }

    /// Resolve a (module, name) reference
    pub fn lookup(&self, module: &str, name: &str) -> Result<TypeHandle, LookupError> {
        let types = self
            .modules
            .get(module)
            .ok_or_else(|| LookupError::ModuleNotFound(module.to_string()))?;

        types
            .get(name)
            .cloned()
            .ok_or_else(|| LookupError::NameNotFound {
                module: module.to_string(),
                name: name.to_string(),
            })
    }

    /// Check if any type is registered under `module`
    pub fn has_module(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Resolve a dotted `module.Name` path
    pub fn lookup_qualified(&self, path: &str) -> Result<TypeHandle, LookupError> {
        match path.rsplit_once('.') {
            Some((module, name)) => self.lookup(module, name),
            None => Err(LookupError::ModuleNotFound(path.to_string())),
        }
    }

    /// Copy of this catalog with every module under one of `prefixes` removed.
    ///
    /// A prefix matches the module itself and its dotted submodules.
    pub fn without_modules<S: AsRef<str>>(&self, prefixes: &[S]) -> Self {
        let modules = self
            .modules
            .iter()
            .filter(|(module, _)| {
                !prefixes
                    .iter()
                    .any(|p| module_has_prefix(module, p.as_ref()))
            })
            .map(|(module, types)| (module.clone(), types.clone()))
            .collect();

        Self { modules }
    }

    /// Number of registered references (aliases included)
    pub fn len(&self) -> usize {
        self.modules.values().map(|types| types.len()).sum()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn module_has_prefix(module: &str, prefix: &str) -> bool {
    module == prefix
        || (module.starts_with(prefix) && module.as_bytes().get(prefix.len()) == Some(&b'.'))
}
