use super::WidgetKind;
use crate::core::Value;
use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Operations
// ============================================================================

/// Operations a widget exposes through the generic handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Setting,
    Component,
    Search,
    Get,
    Find,
    Save,
    Create,
    Insert,
    Update,
    UpdateWhere,
    UpdateIn,
    Delete,
    DeleteWhere,
    DeleteIn,
}

impl Operation {
    pub const ALL: [Operation; 14] = [
        Operation::Setting,
        Operation::Component,
        Operation::Search,
        Operation::Get,
        Operation::Find,
        Operation::Save,
        Operation::Create,
        Operation::Insert,
        Operation::Update,
        Operation::UpdateWhere,
        Operation::UpdateIn,
        Operation::Delete,
        Operation::DeleteWhere,
        Operation::DeleteIn,
    ];

    /// Data operations; only these accept before/after hooks.
    pub const CRUD: [Operation; 12] = [
        Operation::Search,
        Operation::Get,
        Operation::Find,
        Operation::Save,
        Operation::Create,
        Operation::Insert,
        Operation::Update,
        Operation::UpdateWhere,
        Operation::UpdateIn,
        Operation::Delete,
        Operation::DeleteWhere,
        Operation::DeleteIn,
    ];

    /// Key used in definition files.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Setting => "setting",
            Self::Component => "component",
            Self::Search => "search",
            Self::Get => "get",
            Self::Find => "find",
            Self::Save => "save",
            Self::Create => "create",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::UpdateWhere => "update-where",
            Self::UpdateIn => "update-in",
            Self::Delete => "delete",
            Self::DeleteWhere => "delete-where",
            Self::DeleteIn => "delete-in",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Operation::ALL.into_iter().find(|op| op.key() == key)
    }

    pub fn is_crud(&self) -> bool {
        !matches!(self, Self::Setting | Self::Component)
    }

    /// Built-in process serving this operation, e.g. `yao.table.UpdateWhere`.
    pub fn default_process(&self, kind: WidgetKind) -> String {
        let method = match self {
            Self::Setting => "Xgen",
            Self::Component => "Component",
            Self::Search => "Search",
            Self::Get => "Get",
            Self::Find => "Find",
            Self::Save => "Save",
            Self::Create => "Create",
            Self::Insert => "Insert",
            Self::Update => "Update",
            Self::UpdateWhere => "UpdateWhere",
            Self::UpdateIn => "UpdateIn",
            Self::Delete => "Delete",
            Self::DeleteWhere => "DeleteWhere",
            Self::DeleteIn => "DeleteIn",
        };
        format!("yao.{}.{}", kind.as_str(), method)
    }

    fn route(&self) -> (Method, &'static str) {
        match self {
            Self::Setting => (Method::GET, "setting"),
            Self::Component => (Method::GET, "component/:xpath/:method"),
            Self::Search => (Method::GET, "search"),
            Self::Get => (Method::GET, "get"),
            Self::Find => (Method::GET, "find/:primary"),
            Self::Save => (Method::POST, "save"),
            Self::Create => (Method::POST, "create"),
            Self::Insert => (Method::POST, "insert"),
            Self::Update => (Method::POST, "update/:primary"),
            Self::UpdateWhere => (Method::POST, "update/where"),
            Self::UpdateIn => (Method::POST, "update/in"),
            Self::Delete => (Method::POST, "delete/:primary"),
            Self::DeleteWhere => (Method::POST, "delete/where"),
            Self::DeleteIn => (Method::POST, "delete/in"),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HookStage {
    Before,
    After,
}

/// A `before:<op>` / `after:<op>` script binding point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hook {
    pub stage: HookStage,
    pub operation: Operation,
}

impl Hook {
    pub fn key(&self) -> String {
        let stage = match self.stage {
            HookStage::Before => "before",
            HookStage::After => "after",
        };
        format!("{}:{}", stage, self.operation.key())
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let (stage, op) = key.split_once(':')?;
        let stage = match stage {
            "before" => HookStage::Before,
            "after" => HookStage::After,
            _ => return None,
        };
        let operation = Operation::from_key(op).filter(Operation::is_crud)?;
        Some(Hook { stage, operation })
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ============================================================================
// Bindings
// ============================================================================

/// Process bound to one operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessBinding {
    #[serde(default)]
    pub process: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    /// Default arguments, positional.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default: Vec<Value>,
    #[serde(skip)]
    defaulted: bool,
}

impl ProcessBinding {
    pub fn new(process: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            ..Default::default()
        }
    }

    /// True when the process was filled in by defaulting rather than authored.
    pub fn is_defaulted(&self) -> bool {
        self.defaulted
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBinding {
    Process(String),
    Full(ProcessBinding),
}

/// Data source the widget reads and writes through.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BindDsl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub option: Value,
}

/// Action section: data-source binding, one process per operation and the
/// optional before/after hooks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, serde_json::Value>",
    into = "BTreeMap<String, serde_json::Value>"
)]
pub struct ActionDsl {
    pub bind: Option<BindDsl>,
    operations: BTreeMap<Operation, ProcessBinding>,
    hooks: BTreeMap<Hook, String>,
}

impl ActionDsl {
    pub fn binding(&self, op: Operation) -> Option<&ProcessBinding> {
        self.operations.get(&op)
    }

    pub fn process(&self, op: Operation) -> Option<&str> {
        self.binding(op).map(|b| b.process.as_str())
    }

    pub fn bindings(&self) -> impl Iterator<Item = (Operation, &ProcessBinding)> {
        self.operations.iter().map(|(op, binding)| (*op, binding))
    }

    pub fn set_binding(&mut self, op: Operation, binding: ProcessBinding) {
        self.operations.insert(op, binding);
    }

    pub fn hook(&self, hook: Hook) -> Option<&str> {
        self.hooks.get(&hook).map(String::as_str)
    }

    pub fn hooks(&self) -> impl Iterator<Item = (Hook, &str)> {
        self.hooks.iter().map(|(hook, process)| (*hook, process.as_str()))
    }

    pub fn set_hook(&mut self, hook: Hook, process: impl Into<String>) {
        self.hooks.insert(hook, process.into());
    }

    /// Give every operation without an explicit process its built-in one.
    pub fn set_default_process(&mut self, kind: WidgetKind) {
        for op in Operation::ALL {
            let binding = self.operations.entry(op).or_default();
            if binding.process.trim().is_empty() {
                binding.process = op.default_process(kind);
                binding.defaulted = true;
            }
        }
    }
}

impl TryFrom<BTreeMap<String, serde_json::Value>> for ActionDsl {
    type Error = String;

    fn try_from(raw: BTreeMap<String, serde_json::Value>) -> Result<Self, Self::Error> {
        let mut action = ActionDsl::default();

        for (key, value) in raw {
            if value.is_null() {
                continue;
            }

            if key == "bind" {
                let bind = serde_json::from_value(value)
                    .map_err(|e| format!("action.bind: {}", e))?;
                action.bind = Some(bind);
            } else if let Some(op) = Operation::from_key(&key) {
                let binding = match serde_json::from_value(value)
                    .map_err(|e| format!("action.{}: {}", key, e))?
                {
                    RawBinding::Process(process) => ProcessBinding::new(process),
                    RawBinding::Full(binding) => binding,
                };
                action.operations.insert(op, binding);
            } else if let Some(hook) = Hook::from_key(&key) {
                let process = value
                    .as_str()
                    .ok_or_else(|| format!("action.{}: hook must be a process name", key))?;
                action.hooks.insert(hook, process.to_string());
            } else {
                return Err(format!("unknown action key '{}'", key));
            }
        }

        Ok(action)
    }
}

impl From<ActionDsl> for BTreeMap<String, serde_json::Value> {
    fn from(action: ActionDsl) -> Self {
        let mut raw = BTreeMap::new();
        if let Some(bind) = action.bind {
            raw.insert(
                "bind".to_string(),
                serde_json::to_value(bind).unwrap_or(serde_json::Value::Null),
            );
        }
        for (op, binding) in action.operations {
            raw.insert(
                op.key().to_string(),
                serde_json::to_value(binding).unwrap_or(serde_json::Value::Null),
            );
        }
        for (hook, process) in action.hooks {
            raw.insert(hook.key(), serde_json::Value::String(process));
        }
        raw
    }
}

// ============================================================================
// Routes
// ============================================================================

/// One endpoint the HTTP layer registers for a widget.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub operation: Operation,
    pub process: String,
}

impl ActionDsl {
    /// Endpoints for every bound operation, under
    /// `/api/<namespace>/<kind>/<id>/...`.
    pub fn routes(&self, namespace: &str, kind: WidgetKind, id: &str) -> Vec<Route> {
        self.bindings()
            .map(|(op, binding)| {
                let (method, suffix) = op.route();
                Route {
                    method,
                    path: format!("/api/{}/{}/{}/{}", namespace, kind.as_str(), id, suffix),
                    operation: op,
                    process: binding.process.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<ActionDsl, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_parse_string_and_object_bindings() {
        let action = parse(json!({
            "bind": { "model": "user" },
            "search": "scripts.user.Search",
            "find": { "process": "scripts.user.Find", "guard": "bearer-jwt", "default": [null] },
            "before:search": "scripts.user.BeforeSearch"
        }))
        .unwrap();

        assert_eq!(action.bind.as_ref().unwrap().model.as_deref(), Some("user"));
        assert_eq!(action.process(Operation::Search), Some("scripts.user.Search"));
        let find = action.binding(Operation::Find).unwrap();
        assert_eq!(find.guard.as_deref(), Some("bearer-jwt"));
        assert_eq!(find.default, vec![Value::Null]);
        assert_eq!(
            action.hook(Hook::from_key("before:search").unwrap()),
            Some("scripts.user.BeforeSearch")
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = parse(json!({ "serach": "x" })).unwrap_err();
        assert!(err.to_string().contains("unknown action key 'serach'"));

        let err = parse(json!({ "before:setting": "x" })).unwrap_err();
        assert!(err.to_string().contains("before:setting"));
    }

    #[test]
    fn test_default_process_fills_every_operation() {
        let mut action = parse(json!({ "search": "scripts.user.Search", "get": "" })).unwrap();
        action.set_default_process(WidgetKind::Table);

        for op in Operation::ALL {
            let binding = action.binding(op).unwrap();
            assert!(!binding.process.is_empty(), "{} left unbound", op);
        }
        assert!(!action.binding(Operation::Search).unwrap().is_defaulted());
        assert_eq!(action.process(Operation::Get), Some("yao.table.Get"));
        assert_eq!(action.process(Operation::UpdateWhere), Some("yao.table.UpdateWhere"));
        assert_eq!(action.process(Operation::Setting), Some("yao.table.Xgen"));
        assert!(action.binding(Operation::DeleteIn).unwrap().is_defaulted());
    }

    #[test]
    fn test_serialize_keeps_file_keys() {
        let mut action = ActionDsl::default();
        action.set_binding(Operation::UpdateIn, ProcessBinding::new("scripts.x.UpdateIn"));
        action.set_hook(
            Hook { stage: HookStage::After, operation: Operation::DeleteWhere },
            "scripts.x.After",
        );
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["update-in"]["process"], "scripts.x.UpdateIn");
        assert_eq!(json["after:delete-where"], "scripts.x.After");

        let back: ActionDsl = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn test_routes() {
        let mut action = ActionDsl::default();
        action.set_default_process(WidgetKind::Table);
        let routes = action.routes("__yao", WidgetKind::Table, "users");

        assert_eq!(routes.len(), Operation::ALL.len());
        let find = routes.iter().find(|r| r.operation == Operation::Find).unwrap();
        assert_eq!(find.method, Method::GET);
        assert_eq!(find.path, "/api/__yao/table/users/find/:primary");
        assert_eq!(find.process, "yao.table.Find");

        let update_where = routes
            .iter()
            .find(|r| r.operation == Operation::UpdateWhere)
            .unwrap();
        assert_eq!(update_where.method, Method::POST);
        assert_eq!(update_where.path, "/api/__yao/table/users/update/where");
    }
}
