use std::{
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

use crate::types::SOAP_ENCODING_NAMESPACE;

/// Namespace to schema location bindings consulted when a schema imports a
/// namespace without saying where to find it.
///
/// Clones share the same table. Bindings are never removed; binding a
/// namespace again replaces its location.
#[derive(Debug, Clone)]
pub struct SchemaLocations {
    bindings: Arc<Mutex<HashMap<String, String>>>,
}

impl SchemaLocations {
    pub fn new() -> Self {
        let locations = Self {
            bindings: Default::default(),
        };
        locations.bind(SOAP_ENCODING_NAMESPACE, SOAP_ENCODING_NAMESPACE);
        locations
    }

    /// The table shared by every client in the process.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<SchemaLocations> = OnceLock::new();
        GLOBAL.get_or_init(Self::new).clone()
    }

    pub fn bind(&self, namespace: impl Into<String>, location: impl Into<String>) {
        self.bindings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(namespace.into(), location.into());
    }

    pub fn location(&self, namespace: &str) -> Option<String> {
        self.bindings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(namespace)
            .cloned()
    }
}

impl Default for SchemaLocations {
    fn default() -> Self {
        Self::new()
    }
}
