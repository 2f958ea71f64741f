use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Kind of backing data source a widget or field can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Model,
    Store,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Store => "store",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Column as reported by a data source's schema introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub nullable: bool,
}

impl SchemaColumn {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            data_type: data_type.to_string(),
            primary: false,
            nullable: true,
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.nullable = false;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

/// Handle on a model or store owned by the data-access layer.
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;

    fn describe_schema(&self) -> Vec<SchemaColumn>;
}

/// Registry of data sources maintained outside the compiler.
pub trait DataSources: Send + Sync {
    fn resolve(&self, kind: SourceKind, name: &str) -> Option<Arc<dyn DataSource>>;
}

/// Data source backed by a fixed column list.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    columns: Vec<SchemaColumn>,
}

impl MemorySource {
    pub fn new(name: &str, columns: Vec<SchemaColumn>) -> Self {
        Self {
            name: name.to_string(),
            columns,
        }
    }
}

impl DataSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe_schema(&self) -> Vec<SchemaColumn> {
        self.columns.clone()
    }
}

/// In-process data source registry.
#[derive(Default, Clone)]
pub struct MemorySources {
    models: HashMap<String, Arc<dyn DataSource>>,
    stores: HashMap<String, Arc<dyn DataSource>>,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, name: &str, columns: Vec<SchemaColumn>) -> Self {
        self.register(SourceKind::Model, Arc::new(MemorySource::new(name, columns)));
        self
    }

    pub fn with_store(mut self, name: &str) -> Self {
        self.register(SourceKind::Store, Arc::new(MemorySource::new(name, Vec::new())));
        self
    }

    pub fn register(&mut self, kind: SourceKind, source: Arc<dyn DataSource>) {
        let name = source.name().to_string();
        match kind {
            SourceKind::Model => self.models.insert(name, source),
            SourceKind::Store => self.stores.insert(name, source),
        };
    }
}

impl DataSources for MemorySources {
    fn resolve(&self, kind: SourceKind, name: &str) -> Option<Arc<dyn DataSource>> {
        match kind {
            SourceKind::Model => self.models.get(name).cloned(),
            SourceKind::Store => self.stores.get(name).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_kind() {
        let sources = MemorySources::new()
            .with_model("user", vec![SchemaColumn::new("id", "ID").primary()])
            .with_store("cache");

        let user = sources.resolve(SourceKind::Model, "user").unwrap();
        assert_eq!(user.describe_schema()[0].name, "id");
        assert!(user.describe_schema()[0].primary);
        assert!(sources.resolve(SourceKind::Store, "user").is_none());
        assert!(sources.resolve(SourceKind::Store, "cache").is_some());
    }
}
