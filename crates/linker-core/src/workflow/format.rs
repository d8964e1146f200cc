//! Workflow document shape detection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Serialization shape of a workflow document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowFormat {
    /// Editor export: `{"nodes": [{"id", "type", "widgets_values"}, ...]}`.
    Graph,
    /// Execution format: `{"<node id>": {"class_type", "inputs": {...}}}`.
    Api,
    Unknown,
}

impl WorkflowFormat {
    /// Classify a document. Never fails; unrecognized shapes are `Unknown`.
    pub fn detect(document: &Value) -> Self {
        let Value::Object(map) = document else {
            return WorkflowFormat::Unknown;
        };
        if matches!(map.get("nodes"), Some(Value::Array(_))) {
            return WorkflowFormat::Graph;
        }
        let is_api_node = |value: &Value| {
            value
                .as_object()
                .is_some_and(|node| node.contains_key("class_type") && node.contains_key("inputs"))
        };
        if map.values().any(is_api_node) {
            return WorkflowFormat::Api;
        }
        WorkflowFormat::Unknown
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowFormat::Graph => "graph",
            WorkflowFormat::Api => "api",
            WorkflowFormat::Unknown => "unknown",
        }
    }
}

impl fmt::Display for WorkflowFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_graph() {
        let doc = json!({"nodes": [], "links": []});
        assert_eq!(WorkflowFormat::detect(&doc), WorkflowFormat::Graph);
    }

    #[test]
    fn test_detect_api() {
        let doc = json!({
            "3": {"class_type": "KSampler", "inputs": {"seed": 1}},
            "extra": 5
        });
        assert_eq!(WorkflowFormat::detect(&doc), WorkflowFormat::Api);
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(
            WorkflowFormat::detect(&json!({"nodes": {"1": {}}})),
            WorkflowFormat::Unknown
        );
        assert_eq!(
            WorkflowFormat::detect(&json!({"4": {"class_type": "VAELoader"}})),
            WorkflowFormat::Unknown
        );
        assert_eq!(WorkflowFormat::detect(&json!([1, 2])), WorkflowFormat::Unknown);
        assert_eq!(WorkflowFormat::detect(&json!("text")), WorkflowFormat::Unknown);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(WorkflowFormat::Graph).unwrap(),
            json!("graph")
        );
        assert_eq!(WorkflowFormat::Api.to_string(), "api");
    }
}
