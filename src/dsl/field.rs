use super::{CloudProp, Compute, null_as_default};
use crate::core::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The two field collections of a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldCollection {
    Filter,
    Table,
}

impl FieldCollection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Table => "table",
        }
    }
}

impl fmt::Display for FieldCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which component of a field: read-only rendering or editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentSlot {
    View,
    Edit,
}

impl ComponentSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }
}

/// Render or edit widget of a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentDsl {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Value::is_null")]
    pub props: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute: Option<Compute>,
}

impl ComponentDsl {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Props declared as cloud properties: `"$options": {"process": ..., "query": ...}`.
    ///
    /// Returned in key order, with the `$` stripped from the name.
    pub fn inline_cloud_props(&self, xpath: &str) -> Vec<CloudProp> {
        let Some(props) = self.props.as_object() else {
            return Vec::new();
        };

        props
            .iter()
            .filter_map(|(key, value)| {
                let name = key.strip_prefix('$')?;
                let process = value.get("process")?.as_str()?;
                Some(CloudProp {
                    xpath: xpath.to_string(),
                    name: name.to_string(),
                    process: process.to_string(),
                    query: value.get("query").cloned().unwrap_or(Value::Null),
                })
            })
            .collect()
    }
}

/// Data source a field draws its values from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRef {
    Model(String),
    Store(String),
}

impl SourceRef {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Model(_) => "model",
            Self::Store(_) => "store",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Model(name) | Self::Store(name) => name,
        }
    }
}

/// Compute slot of a single field, filled by the overlay merge.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldComputes {
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Compute>,
    #[serde(rename = "out", default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Compute>,
}

impl FieldComputes {
    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.output.is_none()
    }
}

/// One filter or column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldDsl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Column (for table fields) or query path (for filters, `where.<column>.<op>`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<ComponentDsl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<ComponentDsl>,
    #[serde(default, skip_serializing_if = "FieldComputes::is_empty")]
    pub computes: FieldComputes,
}

impl FieldDsl {
    pub fn component(&self, slot: ComponentSlot) -> Option<&ComponentDsl> {
        match slot {
            ComponentSlot::View => self.view.as_ref(),
            ComponentSlot::Edit => self.edit.as_ref(),
        }
    }

    pub fn components(&self) -> impl Iterator<Item = (ComponentSlot, &ComponentDsl)> {
        [
            (ComponentSlot::View, self.view.as_ref()),
            (ComponentSlot::Edit, self.edit.as_ref()),
        ]
        .into_iter()
        .filter_map(|(slot, component)| component.map(|c| (slot, c)))
    }

    /// Display label, falling back to the field name.
    pub fn label_or<'a>(&'a self, name: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(name)
    }
}

/// Field collections, keyed by field name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldsDsl {
    #[serde(default, deserialize_with = "null_as_default")]
    pub filter: BTreeMap<String, FieldDsl>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub table: BTreeMap<String, FieldDsl>,
}

impl FieldsDsl {
    pub fn collection(&self, collection: FieldCollection) -> &BTreeMap<String, FieldDsl> {
        match collection {
            FieldCollection::Filter => &self.filter,
            FieldCollection::Table => &self.table,
        }
    }

    pub fn collection_mut(&mut self, collection: FieldCollection) -> &mut BTreeMap<String, FieldDsl> {
        match collection {
            FieldCollection::Filter => &mut self.filter,
            FieldCollection::Table => &mut self.table,
        }
    }

    /// Every field with the collection it belongs to, filters first.
    pub fn iter(&self) -> impl Iterator<Item = (FieldCollection, &String, &FieldDsl)> {
        self.filter
            .iter()
            .map(|(name, field)| (FieldCollection::Filter, name, field))
            .chain(
                self.table
                    .iter()
                    .map(|(name, field)| (FieldCollection::Table, name, field)),
            )
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filter.contains_key(name) || self.table.contains_key(name)
    }
}

/// Settings address of a field component's props.
pub fn props_xpath(collection: FieldCollection, name: &str, slot: ComponentSlot) -> String {
    format!("fields.{}.{}.{}.props", collection.as_str(), name, slot.as_str())
}
