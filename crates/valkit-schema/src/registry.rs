//! Descriptive metadata attached to schemas by identity.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;
use valkit_value::{Map, Value};

use crate::schema::{Schema, SchemaId};

/// Descriptive record for a schema. Never consulted while parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.examples.push(example.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Identity-keyed metadata store.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entries: RwLock<HashMap<SchemaId, Metadata>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, id: SchemaId, metadata: Metadata) {
        debug!(schema = %id, "registering schema metadata");
        self.entries.write().insert(id, metadata);
    }

    pub fn get(&self, id: SchemaId) -> Option<Metadata> {
        self.entries.read().get(&id).cloned()
    }

    pub fn remove(&self, id: SchemaId) -> Option<Metadata> {
        self.entries.write().remove(&id)
    }

    pub fn contains(&self, id: SchemaId) -> bool {
        self.entries.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

static GLOBAL: Lazy<MetadataRegistry> = Lazy::new(MetadataRegistry::new);

/// The process-wide registry written by `describe` and `meta`.
pub fn global_registry() -> &'static MetadataRegistry {
    &GLOBAL
}

impl<T> Schema<T> {
    /// Metadata registered for this schema.
    pub fn metadata(&self) -> Option<Metadata> {
        if !self.inner.registered {
            return None;
        }
        global_registry().get(self.inner.id)
    }

    pub fn description(&self) -> Option<String> {
        self.metadata().and_then(|m| m.description)
    }
}
