//! The node registry (C1): a catalog of known node types and the factories
//! that produce stateless-per-invocation instances of them.
//!
//! Registration is additive and idempotent on `(id, version)`. Lookup is by
//! id only; the engine never sees a factory, only the instance it produces.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::RegistryError;
use crate::traits::{ExecutableNode, NodeMetadata};

/// Produces a fresh, stateless [`ExecutableNode`] instance and reports the
/// metadata describing it. One factory per node type lives in the registry
/// for the lifetime of the process.
pub trait NodeFactory: Send + Sync {
    fn metadata(&self) -> &NodeMetadata;
    fn create(&self) -> Arc<dyn ExecutableNode>;
}

/// Read-mostly catalog of node types. Writes only happen at boot-time
/// registration or an explicit reload; lookups are lock-free reads once
/// built, matching the concurrency model's "Node Registry is read-mostly"
/// contract.
pub struct Registry {
    factories: RwLock<HashMap<String, Arc<dyn NodeFactory>>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self { factories: RwLock::new(HashMap::new()) }
    }

    /// Register a node type. Re-registering the exact same `(id, version)`
    /// is a no-op (idempotent). Registering the same id with a *different*
    /// version is a configuration error the host must report — the spec
    /// stops short of saying which version wins, so we refuse the change
    /// rather than silently shadow a running registration.
    pub fn register(&self, factory: Arc<dyn NodeFactory>) -> Result<(), RegistryError> {
        let meta = factory.metadata().clone();
        let mut factories = self.factories.write().expect("registry lock poisoned");

        if let Some(existing) = factories.get(&meta.id) {
            let existing_version = existing.metadata().version.clone();
            if existing_version == meta.version {
                return Ok(());
            }
            return Err(RegistryError::VersionCollision {
                id: meta.id,
                existing: existing_version,
                attempted: meta.version,
            });
        }

        factories.insert(meta.id.clone(), factory);
        Ok(())
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.factories.read().expect("registry lock poisoned").contains_key(node_type)
    }

    pub fn create(&self, node_type: &str) -> Option<Arc<dyn ExecutableNode>> {
        self.factories
            .read()
            .expect("registry lock poisoned")
            .get(node_type)
            .map(|f| f.create())
    }

    pub fn metadata(&self, node_type: &str) -> Option<NodeMetadata> {
        self.factories
            .read()
            .expect("registry lock poisoned")
            .get(node_type)
            .map(|f| f.metadata().clone())
    }

    /// All registered metadata, for `GET /workflows/allnodes`.
    pub fn all_metadata(&self) -> Vec<NodeMetadata> {
        self.factories
            .read()
            .expect("registry lock poisoned")
            .values()
            .map(|f| f.metadata().clone())
            .collect()
    }

    /// Every registered node type id, used by the validator to compute
    /// Levenshtein suggestions for an unknown node type.
    pub fn type_names(&self) -> Vec<String> {
        self.factories.read().expect("registry lock poisoned").keys().cloned().collect()
    }

    /// A registry pre-loaded with the in-tree node library (C9).
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        crate::library::register_all(&registry).expect("built-in node ids never collide");
        registry
    }
}
