use super::{FieldCollection, null_as_default};
use crate::core::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Presentation structure. Only the column lists are interpreted; every other
/// member is carried through to the client settings untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutDsl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<LayoutSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<LayoutSection>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<LayoutColumn>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Reference to a field, plus presentation attributes such as `width`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutColumn {
    pub name: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl LayoutDsl {
    pub fn section(&self, collection: FieldCollection) -> Option<&LayoutSection> {
        match collection {
            FieldCollection::Filter => self.filter.as_ref(),
            FieldCollection::Table => self.table.as_ref(),
        }
    }

    /// Field names the layout refers to, per collection.
    pub fn referenced_fields(&self) -> Vec<(FieldCollection, &str)> {
        [FieldCollection::Filter, FieldCollection::Table]
            .into_iter()
            .flat_map(|collection| {
                self.section(collection)
                    .into_iter()
                    .flat_map(|section| section.columns.iter())
                    .map(move |column| (collection, column.name.as_str()))
            })
            .collect()
    }

    /// Client view of the layout: the authored structure as a tree.
    pub fn to_value(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(json) => Value::from(json),
            Err(_) => Value::object(),
        }
    }
}
