use super::null_as_default;
use crate::core::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Derivation applied to a field value: on write (`in`) or on read (`out`).
///
/// Authored either as a bare process name (`"Trim"`) or as
/// `{"process": "Upper", "args": ["$value"]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCompute")]
pub struct Compute {
    pub process: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

impl Compute {
    pub fn new(process: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            args: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCompute {
    Name(String),
    Full {
        process: String,
        #[serde(default)]
        args: Vec<Value>,
    },
}

impl From<RawCompute> for Compute {
    fn from(raw: RawCompute) -> Self {
        match raw {
            RawCompute::Name(process) => Compute::new(process),
            RawCompute::Full { process, args } => Compute { process, args },
        }
    }
}

/// Compute overlays keyed by field name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Computes {
    #[serde(rename = "in", default, deserialize_with = "null_as_default")]
    pub input: BTreeMap<String, Compute>,
    #[serde(rename = "out", default, deserialize_with = "null_as_default")]
    pub output: BTreeMap<String, Compute>,
}

impl Computes {
    pub fn is_empty(&self) -> bool {
        self.input.is_empty() && self.output.is_empty()
    }
}
