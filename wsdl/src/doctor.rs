//! Schema doctors patch loaded schemas before references are checked.

use std::fmt;

use crate::types::{Schema, SchemaImport};

pub trait Doctor: fmt::Debug {
    fn examine(&self, schema: &mut Schema);
}

/// An import to add to schemas that reference another namespace without
/// importing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub namespace: String,
    pub location: Option<String>,
    /// Target namespaces of the schemas that receive the import. Empty means all.
    pub filter: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportDoctor {
    imports: Vec<Import>,
}

impl Import {
    pub fn new(namespace: impl Into<String>, location: Option<String>) -> Self {
        Self {
            namespace: namespace.into(),
            location,
            filter: Vec::new(),
        }
    }

    pub fn add_filter(&mut self, namespace: impl Into<String>) {
        self.filter.push(namespace.into());
    }

    fn matches(&self, schema: &Schema) -> bool {
        self.filter.is_empty() || self.filter.contains(&schema.target_namespace)
    }

    pub fn apply(&self, schema: &mut Schema) {
        if !self.matches(schema)
            || schema.target_namespace == self.namespace
            || schema.imports_namespace(&self.namespace)
        {
            return;
        }

        tracing::debug!(
            namespace = %self.namespace,
            schema = %schema.target_namespace,
            "Adding doctor import"
        );

        schema.imports.push(SchemaImport {
            namespace: self.namespace.clone(),
            location: self.location.clone(),
        });
    }
}

impl ImportDoctor {
    pub fn new(imports: Vec<Import>) -> Self {
        Self { imports }
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }
}

impl Doctor for ImportDoctor {
    fn examine(&self, schema: &mut Schema) {
        for import in &self.imports {
            import.apply(schema);
        }
    }
}
