use crate::core::{Result, Value, WidgetError};
use crate::dsl::{ComponentDsl, WidgetDescriptor, WidgetKind};
use crate::loader::discovery;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Settings members whose string values are shown to the user.
const TRANSLATABLE_KEYS: [&str; 5] = ["label", "title", "placeholder", "text", "description"];

/// Prefix marking a string as a dictionary key rather than literal text.
const KEY_PREFIX: &str = "::";

/// Source of the active language pack.
pub trait Locales: Send + Sync {
    fn active_locale(&self) -> Option<Arc<LocaleOverlay>>;
}

/// A language pack that never changes after construction.
pub struct StaticLocale(Option<Arc<LocaleOverlay>>);

impl StaticLocale {
    pub fn new(overlay: LocaleOverlay) -> Self {
        Self(Some(Arc::new(overlay)))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl Locales for StaticLocale {
    fn active_locale(&self) -> Option<Arc<LocaleOverlay>> {
        self.0.clone()
    }
}

/// Translation dictionaries for one locale: shared entries plus entries
/// scoped to a single widget, which take precedence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocaleOverlay {
    pub name: String,
    pub global: HashMap<String, String>,
    pub widgets: HashMap<String, HashMap<String, String>>,
}

impl LocaleOverlay {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_global(mut self, key: &str, text: &str) -> Self {
        self.global.insert(key.to_string(), text.to_string());
        self
    }

    pub fn with_widget(mut self, id: &str, key: &str, text: &str) -> Self {
        self.widgets
            .entry(id.to_string())
            .or_default()
            .insert(key.to_string(), text.to_string());
        self
    }

    /// Read `<langs>/<locale>/global.json` and the per-widget dictionaries
    /// under `<langs>/<locale>/<kind dir>/`, keyed by widget ID.
    pub fn load(langs: &Path, locale: &str, kind: WidgetKind, prefix: &str) -> Result<Self> {
        let root = langs.join(locale);
        if !root.is_dir() {
            return Err(WidgetError::Config(format!(
                "language pack {} does not exist",
                root.display()
            )));
        }

        let mut overlay = LocaleOverlay::new(locale);

        let global = root.join("global.json");
        if global.is_file() {
            overlay.global = read_dictionary(&global)?;
        }

        let widgets = root.join(kind.dir_name());
        if widgets.is_dir() {
            let extensions = [".json".to_string()];
            let found = discovery::discover(&widgets, &extensions, prefix);
            if let Some(err) = found.errors.into_iter().next() {
                return Err(err);
            }
            for file in found.files {
                overlay.widgets.insert(file.id, read_dictionary(&file.path)?);
            }
        }

        log::debug!(
            "loaded language pack {} ({} global entries, {} widgets)",
            locale,
            overlay.global.len(),
            overlay.widgets.len()
        );
        Ok(overlay)
    }

    /// Translate one string for a widget.
    ///
    /// `::key` strings always resolve to a dictionary entry or, failing that,
    /// to the bare key. Plain strings are replaced only when an entry exists.
    pub fn translate(&self, id: &str, text: &str) -> Option<String> {
        let (key, keyed) = match text.strip_prefix(KEY_PREFIX) {
            Some(key) => (key, true),
            None => (text, false),
        };

        let found = self
            .widgets
            .get(id)
            .and_then(|dict| dict.get(key))
            .or_else(|| self.global.get(key))
            .cloned();

        match found {
            Some(text) => Some(text),
            None if keyed => Some(key.to_string()),
            None => None,
        }
    }

    /// Replace the user-facing strings of a compiled widget in place.
    pub fn apply(&self, widget: &mut WidgetDescriptor) {
        let id = widget.id().to_string();
        let tr = |text: &mut String| {
            if let Some(translated) = self.translate(&id, text) {
                *text = translated;
            }
        };

        tr(&mut widget.name);

        for field in widget
            .fields
            .filter
            .iter_mut()
            .chain(widget.fields.table.iter_mut())
        {
            let (name, field) = field;
            match field.label.as_mut() {
                Some(label) => tr(label),
                None => field.label = self.translate(&id, name),
            }
            for component in [field.view.as_mut(), field.edit.as_mut()].into_iter().flatten() {
                self.translate_component(&id, component);
            }
        }

        for value in widget.layout.extra.values_mut() {
            self.translate_tree(&id, value);
        }

        let mut settings = widget.settings().clone();
        if let Some(Value::Text(name)) = settings.as_object_mut().and_then(|m| m.get_mut("name")) {
            tr(name);
        }
        self.translate_tree(&id, &mut settings);
        *widget.settings_mut() = settings;
    }

    /// Inline `$name` props hold process queries, not display text.
    fn translate_component(&self, id: &str, component: &mut ComponentDsl) {
        match &mut component.props {
            Value::Object(props) => {
                for (key, value) in props.iter_mut().filter(|(key, _)| !key.starts_with('$')) {
                    match value {
                        Value::Text(text) => self.translate_text(id, Some(key.as_str()), text),
                        other => self.translate_tree(id, other),
                    }
                }
            }
            other => self.translate_tree(id, other),
        }
    }

    fn translate_tree(&self, id: &str, value: &mut Value) {
        value.for_each_text_mut(&is_remote, &mut |key: Option<&str>, text: &mut String| {
            self.translate_text(id, key, text)
        });
    }

    fn translate_text(&self, id: &str, key: Option<&str>, text: &mut String) {
        if key.is_some_and(|key| TRANSLATABLE_KEYS.contains(&key)) {
            if let Some(translated) = self.translate(id, text) {
                *text = translated;
            }
        }
    }
}

/// Injected cloud-property descriptor; its params are sent back to the server
/// verbatim.
fn is_remote(map: &BTreeMap<String, Value>) -> bool {
    map.len() == 2 && map.contains_key("api") && map.contains_key("params")
}

fn read_dictionary(path: &Path) -> Result<HashMap<String, String>> {
    let data = fs::read(path)?;
    serde_json::from_slice(&data).map_err(|e| {
        WidgetError::Config(format!("invalid dictionary {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::merge::Merger;
    use serde_json::json;
    use tempfile::tempdir;

    fn compiled(doc: serde_json::Value) -> WidgetDescriptor {
        let data = serde_json::to_vec(&doc).unwrap();
        let widget = WidgetDescriptor::parse("users", WidgetKind::Table, &data).unwrap();
        Merger::new("__yao").merge(&widget).unwrap()
    }

    #[test]
    fn test_translate_precedence() {
        let overlay = LocaleOverlay::new("zh-cn")
            .with_global("Name", "名称")
            .with_global("Users", "用户")
            .with_widget("users", "Name", "用户名");

        assert_eq!(overlay.translate("users", "Name").as_deref(), Some("用户名"));
        assert_eq!(overlay.translate("orders", "Name").as_deref(), Some("名称"));
        assert_eq!(overlay.translate("users", "::Users").as_deref(), Some("用户"));
        assert_eq!(overlay.translate("users", "::Unknown").as_deref(), Some("Unknown"));
        assert_eq!(overlay.translate("users", "Unknown"), None);
    }

    #[test]
    fn test_apply_translates_labels_and_settings() {
        let mut widget = compiled(json!({
            "name": "::Users",
            "fields": { "table": {
                "Name": { "bind": "name", "view": { "type": "Text" } },
                "Status": { "label": "State", "edit": { "type": "Select", "props": {
                    "placeholder": "Pick one",
                    "options": [ { "label": "Active", "value": "Active" } ]
                }}}
            }}
        }));

        let overlay = LocaleOverlay::new("zh-cn")
            .with_global("Users", "用户")
            .with_global("Name", "名称")
            .with_global("State", "状态")
            .with_global("Active", "启用")
            .with_global("Pick one", "请选择");
        overlay.apply(&mut widget);

        assert_eq!(widget.name, "用户");
        assert_eq!(widget.fields.table["Name"].label.as_deref(), Some("名称"));
        assert_eq!(widget.fields.table["Status"].label.as_deref(), Some("状态"));

        let settings = widget.settings();
        assert_eq!(settings.get("name"), Some(&Value::from("用户")));
        assert_eq!(settings.resolve("fields.table.Name.label"), Some(&Value::from("名称")));
        assert_eq!(
            settings.resolve("fields.table.Status.edit.props.options.0.label"),
            Some(&Value::from("启用"))
        );
        assert_eq!(
            settings.resolve("fields.table.Status.edit.props.options.0.value"),
            Some(&Value::from("Active"))
        );
        assert_eq!(
            settings.resolve("fields.table.Status.edit.props.placeholder"),
            Some(&Value::from("请选择"))
        );
    }

    #[test]
    fn test_apply_leaves_cloud_prop_params_untouched() {
        let mut widget = compiled(json!({
            "fields": { "table": {
                "Status": { "label": "Active", "edit": { "type": "Select", "props": {
                    "$options": { "process": "models.status.Get", "query": { "label": "Active" } }
                }}}
            }}
        }));

        let overlay = LocaleOverlay::new("zh-cn").with_global("Active", "启用");
        overlay.apply(&mut widget);

        let settings = widget.settings();
        assert_eq!(settings.resolve("fields.table.Status.label"), Some(&Value::from("启用")));
        assert_eq!(
            settings.resolve("fields.table.Status.edit.props.options.params.label"),
            Some(&Value::from("Active"))
        );
        assert!(settings.resolve("fields.table.Status.edit.props.options.api").is_some());

        let edit = widget.fields.table["Status"].edit.as_ref().unwrap();
        assert_eq!(edit.props.resolve("$options.query.label"), Some(&Value::from("Active")));
    }

    #[test]
    fn test_load_language_pack() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("zh-cn");
        fs::create_dir_all(root.join("tables").join("admin")).unwrap();
        fs::write(root.join("global.json"), r#"{"Name": "名称"}"#).unwrap();
        fs::write(root.join("tables").join("admin").join("users.json"), r#"{"Name": "用户名"}"#)
            .unwrap();

        let overlay = LocaleOverlay::load(dir.path(), "zh-cn", WidgetKind::Table, "").unwrap();
        assert_eq!(overlay.name, "zh-cn");
        assert_eq!(overlay.global["Name"], "名称");
        assert_eq!(overlay.translate("admin.users", "Name").as_deref(), Some("用户名"));
    }

    #[test]
    fn test_load_missing_pack_fails() {
        let dir = tempdir().unwrap();
        let err = LocaleOverlay::load(dir.path(), "fr", WidgetKind::Table, "").unwrap_err();
        assert!(matches!(err, WidgetError::Config(_)));
    }
}
