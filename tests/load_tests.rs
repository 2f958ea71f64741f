/// Batch load tests
///
/// Loading directories of definitions: partial failures, duplicate IDs,
/// reloads and unresolved references.
/// Run with: cargo test --test load_tests

use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use widgetc::{
    EngineConfig, MemorySources, Operation, ProcessTable, Providers, SchemaColumn, WidgetEngine,
    WidgetError,
};

fn write(root: &Path, relative: &str, doc: serde_json::Value) {
    let path = root.join("tables").join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
}

fn write_raw(root: &Path, relative: &str, data: &str) {
    let path = root.join("tables").join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, data).unwrap();
}

fn providers() -> Providers {
    let sources = MemorySources::new()
        .with_model(
            "user",
            vec![
                SchemaColumn::new("id", "ID").primary(),
                SchemaColumn::new("name", "string"),
                SchemaColumn::new("status", "enum"),
            ],
        )
        .with_model("status", vec![SchemaColumn::new("id", "ID").primary()]);
    let processes = ProcessTable::new()
        .with("models.status.Get")
        .with("scripts.user.Search");
    Providers::new(Arc::new(sources), Arc::new(processes))
}

fn engine(root: &Path) -> WidgetEngine {
    WidgetEngine::new(EngineConfig::new(root), providers()).unwrap()
}

#[test]
fn test_partial_failures_are_aggregated() {
    let dir = tempdir().unwrap();
    write(dir.path(), "users.json", json!({ "name": "Users", "action": { "bind": { "model": "user" } } }));
    write(dir.path(), "admin/roles.json", json!({ "name": "Roles" }));
    write(dir.path(), "orders.json", json!({ "name": "Orders" }));
    write_raw(dir.path(), "broken.json", "{ \"name\": ");
    write(dir.path(), "ghost.json", json!({ "action": { "bind": { "model": "no_such_model" } } }));

    let engine = engine(dir.path());
    let err = engine.init().unwrap_err();

    let WidgetError::Batch(batch) = err else {
        panic!("expected batch error");
    };
    let mut failed = batch.ids();
    failed.sort();
    assert_eq!(failed, vec!["broken", "ghost"]);

    let message = batch.to_string();
    assert!(message.contains("[broken] malformed definition"));
    assert!(message.contains("[ghost] unresolved model reference 'no_such_model'"));
    assert!(message.contains("; "));

    let registry = engine.registry();
    assert_eq!(registry.ids(), vec!["admin.roles", "orders", "users"]);
    assert!(registry.get("ghost").is_err());
}

#[test]
fn test_widget_without_action_gets_default_processes() {
    let dir = tempdir().unwrap();
    write(dir.path(), "orders.json", json!({ "name": "Orders" }));

    let engine = engine(dir.path());
    engine.init().unwrap();

    let orders = engine.get("orders").unwrap();
    for op in Operation::ALL {
        let process = orders.action.process(op).unwrap();
        assert!(!process.is_empty(), "{} has no process", op.key());
    }
    assert_eq!(orders.action.process(Operation::Search), Some("yao.table.Search"));
    assert_eq!(orders.action.process(Operation::Setting), Some("yao.table.Xgen"));
}

#[test]
fn test_explicit_process_is_kept() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "users.json",
        json!({ "action": { "bind": { "model": "user" }, "search": { "process": "scripts.user.Search", "default": [null, 1, 20] } } }),
    );

    let engine = engine(dir.path());
    engine.init().unwrap();

    let users = engine.get("users").unwrap();
    let binding = users.action.binding(Operation::Search).unwrap();
    assert_eq!(binding.process, "scripts.user.Search");
    assert_eq!(binding.default.len(), 3);
    assert!(!binding.is_defaulted());
}

#[test]
fn test_duplicate_ids_fail_both_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "Users.json", json!({ "name": "First" }));
    write(dir.path(), "users.yao", json!({ "name": "Second" }));
    write(dir.path(), "orders.json", json!({}));

    let engine = engine(dir.path());
    let err = engine.init().unwrap_err();

    let WidgetError::Batch(batch) = err else {
        panic!("expected batch error");
    };
    assert_eq!(batch.len(), 1);
    match &batch.failures[0] {
        WidgetError::DuplicateId { id, files } => {
            assert_eq!(id, "users");
            assert_eq!(files.len(), 2);
        }
        other => panic!("unexpected failure: {other:?}"),
    }
    assert!(engine.get("users").is_err());
    assert!(engine.get("orders").is_ok());
}

#[test]
fn test_reload_is_idempotent() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "users.json",
        json!({
            "name": "Users",
            "action": { "bind": { "model": "user" } },
            "fields": { "table": {
                "Name": { "bind": "name", "view": { "type": "Text", "compute": "Upper" } },
                "Status": { "bind": "status", "edit": { "type": "Select", "props": {
                    "$options": { "process": "models.status.Get" }
                } } }
            }}
        }),
    );

    let engine = engine(dir.path());
    engine.init().unwrap();
    let first = engine.get("users").unwrap();

    engine.reload().unwrap();
    let second = engine.get("users").unwrap();

    assert_eq!(*first, *second);
    assert_eq!(second.cprops.len(), 1);
    assert_eq!(engine.registry().len(), 1);
}

#[test]
fn test_reload_keeps_vanished_ids() {
    let dir = tempdir().unwrap();
    write(dir.path(), "users.json", json!({}));
    write(dir.path(), "orders.json", json!({}));

    let engine = engine(dir.path());
    engine.init().unwrap();

    fs::remove_file(dir.path().join("tables").join("orders.json")).unwrap();
    let report = engine.reload().unwrap();

    assert_eq!(report.loaded, vec!["users"]);
    assert!(engine.get("orders").is_ok());
}

#[test]
fn test_missing_directory_is_reported() {
    let dir = tempdir().unwrap();
    let engine = engine(dir.path());
    let err = engine.init().unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_load_from_with_prefix() {
    let dir = tempdir().unwrap();
    let plugin = dir.path().join("plugins").join("crm");
    fs::create_dir_all(&plugin).unwrap();
    fs::write(plugin.join("contacts.json"), "{}").unwrap();

    let engine = engine(dir.path());
    let report = engine.load_from(&plugin, "crm.").unwrap();
    assert_eq!(report.loaded, vec!["crm.contacts"]);
    assert!(engine.get("crm.contacts").is_ok());
}
