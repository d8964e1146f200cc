//! Asset references found inside workflow documents, and the resolutions
//! callers send back.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// Node identifier as written in the document.
///
/// Node-list documents use integers, dict-of-nodes documents use string keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Int(i64),
    Str(String),
}

impl NodeId {
    /// Read a node id from a JSON value.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(NodeId::Int),
            Value::String(s) => Some(NodeId::Str(s.clone())),
            _ => None,
        }
    }

    /// Compare against a JSON id, treating `5` and `"5"` as the same node.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (NodeId::Int(a), Value::Number(n)) => n.as_i64() == Some(*a),
            (NodeId::Str(a), Value::String(b)) => a == b,
            (NodeId::Int(a), Value::String(b)) => b.parse::<i64>().ok() == Some(*a),
            (NodeId::Str(a), Value::Number(n)) => n.to_string() == *a,
            _ => false,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Int(i) => write!(f, "{}", i),
            NodeId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        NodeId::Int(id)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId::Str(id.to_string())
    }
}

/// Where a reference sits inside its node.
///
/// Dict-of-nodes documents address inputs by field name; node-list documents
/// address widget values by position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Locator {
    Index(usize),
    Field(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Index(i) => write!(f, "[{}]", i),
            Locator::Field(name) => write!(f, ".{}", name),
        }
    }
}

fn default_true() -> bool {
    true
}

/// One model filename referenced by a workflow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetReference {
    pub node_id: NodeId,
    pub node_type: String,
    #[serde(alias = "widget_index")]
    pub locator: Locator,
    /// The value exactly as written in the document.
    #[serde(alias = "original_path")]
    pub original_value: String,
    /// Category the file resolved in, else the node's hint, else `"unknown"`.
    pub category: String,
    #[serde(alias = "full_path")]
    pub resolved_path: Option<PathBuf>,
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgraph_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgraph_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_top_level: bool,
}

impl AssetReference {
    pub fn is_missing(&self) -> bool {
        !self.exists
    }

    /// Human-readable position, e.g. `12[0]` or `subgraph/7.ckpt_name`.
    pub fn describe(&self) -> String {
        match &self.subgraph_id {
            Some(sg) => format!("{}/{}{}", sg, self.node_id, self.locator),
            None => format!("{}{}", self.node_id, self.locator),
        }
    }
}

/// A caller's decision for one reference.
///
/// `replacement: None` leaves the stored value untouched (the reference stays
/// unresolved).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub node_id: NodeId,
    #[serde(alias = "widget_index")]
    pub locator: Locator,
    #[serde(default)]
    pub subgraph_id: Option<String>,
    #[serde(default, alias = "resolved_path", alias = "new_value")]
    pub replacement: Option<String>,
}

impl Resolution {
    /// Replace the value at `reference` with `filename`.
    pub fn replace(reference: &AssetReference, filename: impl Into<String>) -> Self {
        Self {
            node_id: reference.node_id.clone(),
            locator: reference.locator.clone(),
            subgraph_id: reference.subgraph_id.clone(),
            replacement: Some(filename.into()),
        }
    }

    /// Leave `reference` as it is.
    pub fn unresolved(reference: &AssetReference) -> Self {
        Self {
            node_id: reference.node_id.clone(),
            locator: reference.locator.clone(),
            subgraph_id: reference.subgraph_id.clone(),
            replacement: None,
        }
    }
}
