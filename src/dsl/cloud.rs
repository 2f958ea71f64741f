use super::WidgetKind;
use crate::core::Value;
use serde::{Deserialize, Serialize};

/// A configuration value resolved at render time through a server process.
///
/// `xpath` addresses an object in the client settings and `name` the member
/// of that object which is replaced by the remote-call descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudProp {
    pub xpath: String,
    pub name: String,
    pub process: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub query: Value,
}

impl CloudProp {
    /// Endpoint the client calls to fetch the value, e.g.
    /// `/api/__yao/table/users/component/fields.table.status.edit.props/options`.
    pub fn api(&self, namespace: &str, kind: WidgetKind, id: &str) -> String {
        format!(
            "/api/{}/{}/{}/component/{}/{}",
            namespace,
            kind.as_str(),
            id,
            self.xpath,
            self.name
        )
    }

    /// Descriptor injected into the settings in place of the static value.
    pub fn remote(&self, namespace: &str, kind: WidgetKind, id: &str) -> Value {
        let params = if self.query.is_null() {
            Value::object()
        } else {
            self.query.clone()
        };
        [
            ("api".to_string(), Value::from(self.api(namespace, kind, id))),
            ("params".to_string(), params),
        ]
        .into_iter()
        .collect()
    }

    /// Same target location as `other`.
    pub fn same_target(&self, other: &CloudProp) -> bool {
        self.xpath == other.xpath && self.name == other.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_path() {
        let prop = CloudProp {
            xpath: "fields.table.status.edit.props".into(),
            name: "options".into(),
            process: "models.status.Get".into(),
            query: Value::Null,
        };
        assert_eq!(
            prop.api("__yao", WidgetKind::Table, "users"),
            "/api/__yao/table/users/component/fields.table.status.edit.props/options"
        );
        let remote = prop.remote("__yao", WidgetKind::Table, "users");
        assert_eq!(remote.get("params"), Some(&Value::object()));
    }
}
