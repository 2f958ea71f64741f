use crate::core::{Result, WidgetError};
use crate::dsl::{ComponentDsl, FieldDsl, SourceBinding, SourceRef, WidgetDescriptor, props_xpath};
use crate::provider::{DataSource, DataSources, Processes, SchemaColumn, SourceKind};
use std::sync::Arc;

/// Resolves the named external references of a widget: its data source,
/// per-field sources and the processes behind its cloud properties.
///
/// The binder only reads the collaborator registries. When the widget binds a
/// model and declares no table fields, columns are generated from the model
/// schema.
pub struct Binder<'a> {
    sources: &'a dyn DataSources,
    processes: &'a dyn Processes,
}

impl<'a> Binder<'a> {
    pub fn new(sources: &'a dyn DataSources, processes: &'a dyn Processes) -> Self {
        Self { sources, processes }
    }

    pub fn bind(&self, widget: &mut WidgetDescriptor) -> Result<()> {
        self.bind_source(widget)?;
        self.bind_field_sources(widget)?;
        self.bind_cloud_processes(widget)
    }

    fn bind_source(&self, widget: &mut WidgetDescriptor) -> Result<()> {
        let Some(bind) = widget.action.bind.clone() else {
            return Ok(());
        };

        let model = match bind.model.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => Some(self.resolve_source(
                widget.id(),
                SourceKind::Model,
                name,
                "action.bind.model",
            )?),
            None => None,
        };
        let store = match bind.store.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => Some(self.resolve_source(
                widget.id(),
                SourceKind::Store,
                name,
                "action.bind.store",
            )?),
            None => None,
        };

        let (kind, source) = match (model, store) {
            (Some(model), _) => (SourceKind::Model, model),
            (None, Some(store)) => (SourceKind::Store, store),
            (None, None) => return Ok(()),
        };

        let binding = SourceBinding {
            kind,
            name: source.name().to_string(),
            columns: source.describe_schema(),
        };

        if widget.fields.table.is_empty() {
            for column in &binding.columns {
                widget.fields.table.insert(column.name.clone(), generated_field(column));
            }
        }

        if widget.layout.primary.is_none() {
            widget.layout.primary = binding.primary().map(|c| c.name.clone());
        }

        widget.set_source(binding);
        Ok(())
    }

    fn bind_field_sources(&self, widget: &WidgetDescriptor) -> Result<()> {
        for (collection, name, field) in widget.fields.iter() {
            let Some(source) = &field.source else {
                continue;
            };
            let kind = match source {
                SourceRef::Model(_) => SourceKind::Model,
                SourceRef::Store(_) => SourceKind::Store,
            };
            let location = format!("fields.{}.{}.source", collection, name);
            self.resolve_source(widget.id(), kind, source.name(), &location)?;
        }
        Ok(())
    }

    fn bind_cloud_processes(&self, widget: &WidgetDescriptor) -> Result<()> {
        for (index, prop) in widget.cprops.iter().enumerate() {
            if !self.processes.exists(&prop.process) {
                return Err(unresolved(
                    widget.id(),
                    "process",
                    &prop.process,
                    &format!("cprops.{}", index),
                ));
            }
        }

        for (collection, name, field) in widget.fields.iter() {
            for (slot, component) in field.components() {
                let xpath = props_xpath(collection, name, slot);
                for prop in component.inline_cloud_props(&xpath) {
                    if !self.processes.exists(&prop.process) {
                        return Err(unresolved(
                            widget.id(),
                            "process",
                            &prop.process,
                            &format!("{}.${}", xpath, prop.name),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve_source(
        &self,
        id: &str,
        kind: SourceKind,
        name: &str,
        location: &str,
    ) -> Result<Arc<dyn DataSource>> {
        self.sources
            .resolve(kind, name)
            .ok_or_else(|| unresolved(id, kind.as_str(), name, location))
    }
}

fn unresolved(id: &str, kind: &str, reference: &str, location: &str) -> WidgetError {
    WidgetError::UnresolvedReference {
        id: id.to_string(),
        kind: kind.to_string(),
        reference: reference.to_string(),
        location: location.to_string(),
    }
}

/// Column generated from a schema column: rendered as text, edited with the
/// input matching its type. Primary keys are not editable.
fn generated_field(column: &SchemaColumn) -> FieldDsl {
    let edit = if column.primary {
        None
    } else {
        Some(ComponentDsl::new(edit_component(&column.data_type)))
    };

    FieldDsl {
        label: Some(column.label.clone().unwrap_or_else(|| column.name.clone())),
        bind: Some(column.name.clone()),
        data_type: Some(column.data_type.clone()),
        view: Some(ComponentDsl::new("Text")),
        edit,
        ..Default::default()
    }
}

fn edit_component(data_type: &str) -> &'static str {
    match data_type.to_lowercase().as_str() {
        "tinyinteger" | "smallinteger" | "integer" | "biginteger" | "unsignedinteger"
        | "float" | "double" | "decimal" | "unsigneddecimal" => "InputNumber",
        "boolean" => "Switch",
        "date" | "datetime" | "datetimetz" | "time" | "timestamp" | "timestamptz" => "DatePicker",
        "enum" => "Select",
        "text" | "mediumtext" | "longtext" | "json" | "jsonb" => "TextArea",
        _ => "Input",
    }
}
