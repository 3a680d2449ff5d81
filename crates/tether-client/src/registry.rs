//! Record of declared typed RPCs, for documentation tooling.
//!
//! Nothing in the call path reads the registry; declaring an RPC only
//! appends to it.

use crate::shape::Shape;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// What a typed RPC looks like on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcDefinition {
    pub name: String,
    pub doc: String,
    /// The literal `type` of request bodies.
    pub kind: String,
    pub request: Shape,
    pub response: Shape,
}

/// An append-only list of [`RpcDefinition`]s.
#[derive(Debug)]
pub struct RpcRegistry {
    definitions: Mutex<Vec<Arc<RpcDefinition>>>,
}

static GLOBAL: RpcRegistry = RpcRegistry::new();

impl RpcRegistry {
    pub const fn new() -> Self {
        Self {
            definitions: parking_lot::const_mutex(Vec::new()),
        }
    }

    /// The process-wide registry used when a builder is not given one.
    pub fn global() -> &'static RpcRegistry {
        &GLOBAL
    }

    pub fn register(&self, definition: RpcDefinition) -> Arc<RpcDefinition> {
        let definition = Arc::new(definition);
        self.definitions.lock().push(definition.clone());
        definition
    }

    /// All definitions in declaration order.
    pub fn definitions(&self) -> Vec<Arc<RpcDefinition>> {
        self.definitions.lock().clone()
    }

    /// The most recent definition with this name.
    pub fn find(&self, name: &str) -> Option<Arc<RpcDefinition>> {
        self.definitions
            .lock()
            .iter()
            .rev()
            .find(|d| d.name == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.definitions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.lock().is_empty()
    }
}

impl Default for RpcRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(name: &str) -> RpcDefinition {
        RpcDefinition {
            name: name.to_string(),
            doc: String::new(),
            kind: name.to_string(),
            request: Shape::Any,
            response: Shape::Any,
        }
    }

    #[test]
    fn keeps_declaration_order() {
        let registry = RpcRegistry::new();
        registry.register(definition("read"));
        registry.register(definition("write"));

        let names: Vec<String> = registry
            .definitions()
            .iter()
            .map(|d| d.name.clone())
            .collect();
        assert_eq!(names, vec!["read", "write"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn find_prefers_latest() {
        let registry = RpcRegistry::new();
        registry.register(definition("read"));
        let mut newer = definition("read");
        newer.doc = "v2".into();
        registry.register(newer);

        assert_eq!(registry.find("read").unwrap().doc, "v2");
        assert!(registry.find("cas").is_none());
    }
}
