use super::{
    ActionDsl, CloudProp, Compute, Computes, FieldsDsl, LayoutDsl, Route, WidgetKind,
    null_as_default,
};
use crate::core::{Result, Value, WidgetError};
use crate::provider::{SchemaColumn, SourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Data source a widget was bound to, with the schema seen at bind time.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBinding {
    pub kind: SourceKind,
    pub name: String,
    pub columns: Vec<SchemaColumn>,
}

impl SourceBinding {
    pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary(&self) -> Option<&SchemaColumn> {
        self.columns.iter().find(|c| c.primary)
    }
}

/// One widget definition, from parsed document to compiled descriptor.
///
/// The authored sections (`action`, `layout`, `fields`, `config`, `cprops`,
/// `computes`) are public. The compiled state (`source`, `settings`) is
/// filled by the pipeline stages and read through accessors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WidgetDescriptor {
    #[serde(skip)]
    id: String,
    #[serde(skip)]
    kind: WidgetKind,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: ActionDsl,
    #[serde(default, deserialize_with = "null_as_default")]
    pub layout: LayoutDsl,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: FieldsDsl,
    #[serde(default, deserialize_with = "null_as_default")]
    pub config: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cprops: Vec<CloudProp>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub computes: Computes,

    #[serde(skip)]
    source: Option<SourceBinding>,
    #[serde(skip)]
    settings: Value,
    #[serde(skip)]
    merged: bool,
}

impl WidgetDescriptor {
    /// Empty descriptor with every section present.
    pub fn new(id: &str, kind: WidgetKind) -> Self {
        let mut widget = Self {
            id: id.to_string(),
            kind,
            config: Value::object(),
            ..Default::default()
        };
        widget.action.set_default_process(kind);
        widget
    }

    /// Decode a definition file.
    ///
    /// Omitted or null sections come back empty, and every operation without
    /// an explicit process is bound to its built-in one.
    pub fn parse(id: &str, kind: WidgetKind, data: &[u8]) -> Result<Self> {
        let mut widget: WidgetDescriptor =
            serde_json::from_slice(data).map_err(|e| WidgetError::MalformedDefinition {
                id: id.to_string(),
                message: e.to_string(),
            })?;

        if !widget.config.is_object() {
            if !widget.config.is_null() {
                return Err(WidgetError::MalformedDefinition {
                    id: id.to_string(),
                    message: format!("config must be an object, got {}", widget.config.type_name()),
                });
            }
            widget.config = Value::object();
        }

        widget.id = id.to_string();
        widget.kind = kind;
        widget.action.set_default_process(kind);
        Ok(widget)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    /// Data source resolved by the binder, if the widget declares one.
    pub fn source(&self) -> Option<&SourceBinding> {
        self.source.as_ref()
    }

    pub(crate) fn set_source(&mut self, source: SourceBinding) {
        self.source = Some(source);
    }

    /// Client-facing settings produced by the overlay merge; `Null` before it.
    pub fn settings(&self) -> &Value {
        &self.settings
    }

    pub(crate) fn settings_mut(&mut self) -> &mut Value {
        &mut self.settings
    }

    pub(crate) fn set_settings(&mut self, settings: Value) {
        self.settings = settings;
        self.merged = true;
    }

    /// True once the overlay merge has run on this descriptor.
    pub fn is_merged(&self) -> bool {
        self.merged
    }

    pub fn computes_in(&self) -> &BTreeMap<String, Compute> {
        &self.computes.input
    }

    pub fn computes_out(&self) -> &BTreeMap<String, Compute> {
        &self.computes.output
    }

    /// Endpoints to register for this widget.
    pub fn routes(&self, namespace: &str) -> Vec<Route> {
        self.action.routes(namespace, self.kind, &self.id)
    }

    /// The authored definition (the "App DSL") as a tree.
    pub fn to_value(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(json) => Value::from(json),
            Err(_) => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::Operation;

    #[test]
    fn test_parse_empty_document() {
        let widget = WidgetDescriptor::parse("orders", WidgetKind::Table, b"{}").unwrap();
        assert_eq!(widget.id(), "orders");
        assert!(widget.fields.table.is_empty());
        assert!(widget.fields.filter.is_empty());
        assert_eq!(widget.config, Value::object());
        assert!(!widget.is_merged());

        for op in Operation::ALL {
            assert!(!widget.action.process(op).unwrap_or_default().is_empty());
        }
    }

    #[test]
    fn test_parse_null_sections() {
        let data = br#"{"name": "Orders", "action": null, "layout": null, "fields": null, "cprops": null, "computes": null}"#;
        let widget = WidgetDescriptor::parse("orders", WidgetKind::Table, data).unwrap();
        assert_eq!(widget.name, "Orders");
        assert_eq!(widget.layout, LayoutDsl::default());
        assert_eq!(widget.action.process(Operation::Search), Some("yao.table.Search"));
    }

    #[test]
    fn test_parse_failure_carries_id() {
        let err = WidgetDescriptor::parse("broken", WidgetKind::Table, b"{\"name\": ").unwrap_err();
        match err {
            WidgetError::MalformedDefinition { id, message } => {
                assert_eq!(id, "broken");
                assert!(message.contains("EOF"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_config_must_be_object() {
        let err = WidgetDescriptor::parse("x", WidgetKind::Table, br#"{"config": [1]}"#).unwrap_err();
        assert!(err.to_string().contains("config must be an object"));
    }

    #[test]
    fn test_routes_use_id_and_kind() {
        let widget = WidgetDescriptor::new("admin.users", WidgetKind::Form);
        let routes = widget.routes("__yao");
        assert!(
            routes
                .iter()
                .any(|r| r.path == "/api/__yao/form/admin.users/setting" && r.process == "yao.form.Xgen")
        );
    }
}
