use crate::core::{Result, Value, WidgetError};
use crate::dsl::{
    CloudProp, Compute, ComponentDsl, ComponentSlot, FieldCollection, FieldDsl, WidgetDescriptor,
    props_xpath,
};
use serde::Serialize;

/// Folds the auxiliary sections of a widget into its primary structure.
///
/// Merging never mutates its input: it returns a merged copy whose settings
/// are rebuilt from the typed sections every time, so merging an already
/// merged descriptor yields the same descriptor again.
pub struct Merger<'a> {
    namespace: &'a str,
}

impl<'a> Merger<'a> {
    pub fn new(namespace: &'a str) -> Self {
        Self { namespace }
    }

    pub fn merge(&self, widget: &WidgetDescriptor) -> Result<WidgetDescriptor> {
        let mut merged = widget.clone();
        merge_computes(&mut merged);
        collect_cloud_props(&mut merged);

        let mut settings = build_settings(&merged);
        self.inject_cloud_props(&merged, &mut settings)?;
        merged.set_settings(settings);
        Ok(merged)
    }

    fn inject_cloud_props(&self, widget: &WidgetDescriptor, settings: &mut Value) -> Result<()> {
        for prop in &widget.cprops {
            let remote = prop.remote(self.namespace, widget.kind(), widget.id());
            if settings.replace(&prop.xpath, &prop.name, remote).is_none() {
                return Err(WidgetError::UnresolvedXPath {
                    id: widget.id().to_string(),
                    xpath: prop.xpath.clone(),
                    name: prop.name.clone(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Compute merge
// ============================================================================

/// Attach compute overlays to the fields they name.
///
/// The `computes.in/out` overlay is keyed by field name and applies to every
/// collection. An inline `compute` on a view (read) or edit (write) component
/// only applies to the field that declares it, and the overlay wins over it.
/// Filters only take write-side computes.
fn merge_computes(widget: &mut WidgetDescriptor) {
    let id = widget.id().to_string();
    let overlay = widget.computes.clone();

    for (name, field) in widget.fields.table.iter_mut() {
        let inline_in = field.edit.as_ref().and_then(|c| c.compute.clone());
        let inline_out = field.view.as_ref().and_then(|c| c.compute.clone());
        if let Some(compute) = effective(&id, "in", name, overlay.input.get(name), inline_in) {
            field.computes.input = Some(compute);
        }
        if let Some(compute) = effective(&id, "out", name, overlay.output.get(name), inline_out) {
            field.computes.output = Some(compute);
        }
    }
    for (name, field) in widget.fields.filter.iter_mut() {
        let inline_in = field.edit.as_ref().and_then(|c| c.compute.clone());
        if let Some(compute) = effective(&id, "in", name, overlay.input.get(name), inline_in) {
            field.computes.input = Some(compute);
        }
    }
}

fn effective(
    id: &str,
    direction: &str,
    name: &str,
    explicit: Option<&Compute>,
    inline: Option<Compute>,
) -> Option<Compute> {
    match (explicit, inline) {
        (Some(explicit), Some(inline)) => {
            if *explicit != inline {
                log::debug!(
                    "[{}] compute overlay {}.{} replaces inline {}",
                    id,
                    direction,
                    name,
                    inline.process
                );
            }
            Some(explicit.clone())
        }
        (Some(explicit), None) => Some(explicit.clone()),
        (None, inline) => inline,
    }
}

// ============================================================================
// Cloud properties
// ============================================================================

/// Append the inline `$name` props to the cloud-property list, skipping any
/// target an explicit entry already claims.
fn collect_cloud_props(widget: &mut WidgetDescriptor) {
    let mut inline: Vec<CloudProp> = Vec::new();
    for (collection, name, field) in widget.fields.iter() {
        for (slot, component) in field.components() {
            inline.extend(component.inline_cloud_props(&props_xpath(collection, name, slot)));
        }
    }

    for prop in inline {
        if !widget.cprops.iter().any(|existing| existing.same_target(&prop)) {
            widget.cprops.push(prop);
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Client settings: the layout tree plus name, config and the resolved fields.
fn build_settings(widget: &WidgetDescriptor) -> Value {
    let mut settings = widget.layout.to_value();
    if !settings.is_object() {
        settings = Value::object();
    }

    settings.insert("name", Value::from(widget.name.clone()));
    settings.insert("config", widget.config.clone());

    let mut fields = Value::object();
    for collection in [FieldCollection::Filter, FieldCollection::Table] {
        let members = widget
            .fields
            .collection(collection)
            .iter()
            .map(|(name, field)| (name.clone(), field_settings(name, field)))
            .collect();
        fields.insert(collection.as_str(), members);
    }
    settings.insert("fields", fields);
    settings
}

fn field_settings(name: &str, field: &FieldDsl) -> Value {
    let mut value = Value::object();
    value.insert("label", Value::from(field.label_or(name)));
    if let Some(bind) = &field.bind {
        value.insert("bind", Value::from(bind.as_str()));
    }
    for (slot, component) in field.components() {
        let compute = match slot {
            ComponentSlot::View => field.computes.output.as_ref(),
            ComponentSlot::Edit => field.computes.input.as_ref(),
        };
        value.insert(slot.as_str(), component_settings(component, compute.map(to_tree)));
    }
    value
}

fn component_settings(component: &ComponentDsl, compute: Option<Value>) -> Value {
    let props = match &component.props {
        Value::Object(props) => props
            .iter()
            .filter(|(key, _)| !key.starts_with('$'))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        Value::Null => Value::object(),
        other => other.clone(),
    };

    let mut value = Value::object();
    value.insert("type", Value::from(component.kind.as_str()));
    value.insert("props", props);
    if let Some(compute) = compute {
        value.insert("compute", compute);
    }
    value
}

fn to_tree<T: Serialize>(item: &T) -> Value {
    serde_json::to_value(item).map(Value::from).unwrap_or_default()
}
