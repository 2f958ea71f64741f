/// Localization tests
///
/// Language packs read from `<root>/langs/<locale>` and applied at load time.
/// Run with: cargo test --test locale_tests

use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use widgetc::{EngineConfig, Providers, Value, WidgetEngine};

fn setup(root: &Path) {
    let tables = root.join("tables");
    fs::create_dir_all(&tables).unwrap();
    fs::write(
        tables.join("users.json"),
        serde_json::to_vec(&json!({
            "name": "::Users",
            "fields": { "table": {
                "Name": { "bind": "name", "view": { "type": "Text" } },
                "Status": { "bind": "status", "edit": { "type": "Select", "props": {
                    "options": [ { "label": "Active", "value": "active" } ]
                } } }
            }}
        }))
        .unwrap(),
    )
    .unwrap();

    let pack = root.join("langs").join("zh-cn");
    fs::create_dir_all(pack.join("tables")).unwrap();
    fs::write(
        pack.join("global.json"),
        serde_json::to_vec(&json!({ "Users": "用户", "Name": "名称", "Active": "启用" })).unwrap(),
    )
    .unwrap();
    fs::write(
        pack.join("tables").join("users.json"),
        serde_json::to_vec(&json!({ "Name": "用户名" })).unwrap(),
    )
    .unwrap();
}

#[test]
fn test_locale_is_applied_on_load() {
    let dir = tempdir().unwrap();
    setup(dir.path());

    let engine = WidgetEngine::new(EngineConfig::new(dir.path()).locale("zh-cn"), Providers::default()).unwrap();
    engine.init().unwrap();

    let users = engine.get("users").unwrap();
    assert_eq!(users.name, "用户");
    assert_eq!(users.fields.table["Name"].label.as_deref(), Some("用户名"));
    assert_eq!(users.fields.table["Status"].label, None);

    let settings = users.settings();
    assert_eq!(settings.resolve("fields.table.Name.label"), Some(&Value::from("用户名")));
    assert_eq!(
        settings.resolve("fields.table.Status.edit.props.options.0.label"),
        Some(&Value::from("启用"))
    );
}

#[test]
fn test_without_locale_keys_are_kept() {
    let dir = tempdir().unwrap();
    setup(dir.path());

    let engine = WidgetEngine::new(EngineConfig::new(dir.path()), Providers::default()).unwrap();
    engine.init().unwrap();

    let users = engine.get("users").unwrap();
    assert_eq!(users.name, "::Users");
    assert_eq!(users.settings().resolve("fields.table.Name.label"), Some(&Value::from("Name")));
}
