use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Generic configuration tree.
///
/// Layout sections, component props, query parameters and the client-facing
/// settings are all held as `Value`, and addressed with dotted xpaths such as
/// `fields.table.status.edit.props`. Object keys are kept sorted so two trees
/// built from the same input serialize identically.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Empty object.
    pub fn object() -> Self {
        Value::Object(BTreeMap::new())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Object member lookup; `None` for non-objects.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Insert a member, turning `Null` into an empty object first.
    ///
    /// Returns `false` if the value is neither an object nor null.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> bool {
        if self.is_null() {
            *self = Value::object();
        }
        match self {
            Value::Object(map) => {
                map.insert(key.into(), value);
                true
            }
            _ => false,
        }
    }

    /// Resolve a dotted address. Object members are addressed by key, array
    /// items by decimal index. An empty xpath addresses the value itself.
    pub fn resolve(&self, xpath: &str) -> Option<&Value> {
        let mut current = self;
        for segment in segments(xpath) {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn resolve_mut(&mut self, xpath: &str) -> Option<&mut Value> {
        let mut current = self;
        for segment in segments(xpath) {
            current = match current {
                Value::Object(map) => map.get_mut(segment)?,
                Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Replace member `name` of the object at `xpath`.
    ///
    /// The xpath itself must resolve to an existing object; `name` does not
    /// have to exist yet. Returns the previous member (or `Null`) on success
    /// and `None` when the address does not resolve.
    pub fn replace(&mut self, xpath: &str, name: &str, value: Value) -> Option<Value> {
        let target = self.resolve_mut(xpath)?.as_object_mut()?;
        Some(target.insert(name.to_string(), value).unwrap_or(Value::Null))
    }

    /// Visit every string in the tree together with the key it is stored under
    /// (`None` for array items and the root). Objects for which `skip` returns
    /// true are not entered.
    pub fn for_each_text_mut<S, F>(&mut self, skip: &S, f: &mut F)
    where
        S: Fn(&BTreeMap<String, Value>) -> bool,
        F: FnMut(Option<&str>, &mut String),
    {
        walk_text(self, None, skip, f);
    }
}

fn segments(xpath: &str) -> impl Iterator<Item = &str> {
    xpath.split('.').filter(|segment| !segment.is_empty())
}

fn walk_text<S, F>(value: &mut Value, key: Option<&str>, skip: &S, f: &mut F)
where
    S: Fn(&BTreeMap<String, Value>) -> bool,
    F: FnMut(Option<&str>, &mut String),
{
    match value {
        Value::Text(text) => f(key, text),
        Value::Array(items) => {
            for item in items {
                walk_text(item, key, skip, f);
            }
        }
        Value::Object(map) if skip(map) => {}
        Value::Object(map) => {
            for (member, item) in map.iter_mut() {
                walk_text(item, Some(member.as_str()), skip, f);
            }
        }
        _ => {}
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::Value::from(self.clone());
        write!(f, "{}", json)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Object(iter.into_iter().collect())
    }
}
