//! Class resolution hook used by the tolerant decode path
//!
//! For every class reference in a stream the resolver decides between the
//! real catalog type, a placeholder standing in for an application record
//! type, and the universal placeholder for references that do not resolve.

use crate::constants::DEFAULT_RESERVED_NAMESPACES;
use crate::decoder::Lookup;
use crate::types::{Class, PlaceholderType, TypeHandle};
use hashbrown::HashMap;
use serde::Serialize;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Top-level namespaces whose types are application records.
///
/// Matching is on the first dot-separated segment of the module qualifier
/// against this fixed list; stored lists depend on these names staying put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedNamespaces(Vec<String>);

impl ReservedNamespaces {
    /// Build from a list of namespace names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Check if `module` lives in one of the reserved namespaces
    pub fn contains_module(&self, module: &str) -> bool {
        let top = module.split('.').next().unwrap_or(module);
        self.0.iter().any(|ns| ns == top)
    }
}

impl Default for ReservedNamespaces {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_NAMESPACES.iter().copied())
    }
}

/// A class reference that failed to resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedRef {
    /// Module qualifier from the stream
    pub module: String,
    /// Type name from the stream
    pub name: String,
    /// Why the lookup failed
    pub reason: String,
}

impl UnresolvedRef {
    /// `module.name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }
}

/// Per-decode class resolver.
///
/// Holds the placeholder cache and the list of failed lookups for one decode
/// call. Create a fresh resolver for every call.
pub struct TypeResolver<'a> {
    reserved: &'a ReservedNamespaces,
    universal: Arc<PlaceholderType>,
    cache: HashMap<TypeHandle, Arc<PlaceholderType>>,
    unresolved: Vec<UnresolvedRef>,
}

impl<'a> TypeResolver<'a> {
    /// Create a resolver with an empty cache
    pub fn new(reserved: &'a ReservedNamespaces) -> Self {
        Self {
            reserved,
            universal: PlaceholderType::universal(),
            cache: HashMap::new(),
            unresolved: Vec::new(),
        }
    }

    /// Resolve one class reference
    pub fn resolve(&mut self, module: &str, name: &str, lookup: &Lookup<'_>) -> Class {
        let real = match lookup(module, name) {
            Ok(real) => real,
            Err(err) => {
                #[cfg(feature = "logging")]
                warn!("Unresolved class {}.{}: {}", module, name, err);

                self.unresolved.push(UnresolvedRef {
                    module: module.to_string(),
                    name: name.to_string(),
                    reason: err.to_string(),
                });
                return Class::Placeholder(self.universal.clone());
            }
        };

        if !self.reserved.contains_module(module) {
            return Class::Real(real);
        }

        // Hand out a placeholder so the record's assign hook does not run
        // while the graph is half built; the tag is swapped after decoding.
        let placeholder = self.cache.entry(real.clone()).or_insert_with(|| {
            #[cfg(feature = "logging")]
            debug!("Deferring {} behind a placeholder", real.qualified_name());

            PlaceholderType::deferred(&real)
        });

        Class::Placeholder(placeholder.clone())
    }

    /// Check if `class` is this resolver's universal placeholder
    pub fn is_universal(&self, class: &Class) -> bool {
        matches!(class, Class::Placeholder(p) if Arc::ptr_eq(p, &self.universal))
    }

    /// Whether any lookup failed
    pub fn had_errors(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// Failed lookups in stream order
    pub fn unresolved(&self) -> &[UnresolvedRef] {
        &self.unresolved
    }

    /// Number of distinct placeholder subtypes created
    pub fn cached_types(&self) -> usize {
        self.cache.len()
    }

    /// Consume the resolver, keeping the failed lookups
    pub fn into_unresolved(self) -> Vec<UnresolvedRef> {
        self.unresolved
    }
}
