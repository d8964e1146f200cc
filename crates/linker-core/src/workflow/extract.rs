//! Per-format reference extraction.
//!
//! Each format gets its own [`ReferenceExtractor`]. Failures are contained at
//! node granularity: a malformed node produces a warning and the walk moves on.

use super::hints::{category_hint, is_model_field, is_model_filename};
use super::resolve::CategoryResolver;
use crate::models::{AssetReference, Locator, NodeId};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Why a single node could not be read.
#[derive(Debug, Error)]
enum NodeError {
    #[error("node is not an object")]
    NotAnObject,
    #[error("node has no usable id")]
    MissingId,
    #[error("`{0}` has an unexpected type")]
    BadField(&'static str),
}

/// References and warnings produced by one extraction pass.
#[derive(Debug, Default)]
pub struct Extraction {
    pub references: Vec<AssetReference>,
    pub warnings: Vec<String>,
}

impl Extraction {
    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

/// Walks one document shape and emits its asset references.
pub trait ReferenceExtractor: Send + Sync {
    fn extract(&self, document: &Value, resolver: &CategoryResolver<'_>) -> Extraction;
}

fn reference(
    resolver: &CategoryResolver<'_>,
    node_id: NodeId,
    node_type: &str,
    locator: Locator,
    value: &str,
) -> AssetReference {
    let resolved = resolver.resolve(value, category_hint(node_type));
    AssetReference {
        node_id,
        node_type: node_type.to_string(),
        locator,
        original_value: value.to_string(),
        exists: resolved.exists(),
        category: resolved.category,
        resolved_path: resolved.path,
        subgraph_id: None,
        subgraph_name: None,
        is_top_level: true,
    }
}

/// Dict-of-nodes execution format.
pub struct ApiExtractor;

impl ApiExtractor {
    fn extract_node(
        node_id: &str,
        node: &Map<String, Value>,
        resolver: &CategoryResolver<'_>,
    ) -> Result<Vec<AssetReference>, NodeError> {
        let node_type = match node.get("class_type") {
            Some(Value::String(ty)) => ty.as_str(),
            _ => return Err(NodeError::BadField("class_type")),
        };
        let inputs = match node.get("inputs") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Object(inputs)) => inputs,
            Some(_) => return Err(NodeError::BadField("inputs")),
        };

        let refs = inputs
            .iter()
            // Links are arrays, widget values are scalars
            .filter_map(|(field, value)| value.as_str().map(|v| (field, v)))
            .filter(|(field, value)| is_model_field(field) || is_model_filename(value))
            .map(|(field, value)| {
                reference(
                    resolver,
                    NodeId::from(node_id),
                    node_type,
                    Locator::Field(field.clone()),
                    value,
                )
            })
            .collect();
        Ok(refs)
    }
}

impl ReferenceExtractor for ApiExtractor {
    fn extract(&self, document: &Value, resolver: &CategoryResolver<'_>) -> Extraction {
        let mut extraction = Extraction::default();
        let Some(nodes) = document.as_object() else {
            return extraction;
        };

        for (node_id, node) in nodes {
            let Some(node) = node.as_object() else {
                continue;
            };
            if !node.contains_key("class_type") {
                continue;
            }
            match Self::extract_node(node_id, node, resolver) {
                Ok(refs) => extraction.references.extend(refs),
                Err(e) => extraction.warn(format!("Skipped API node {}: {}", node_id, e)),
            }
        }
        extraction
    }
}

/// Node-list editor format, including `definitions.subgraphs`.
pub struct GraphExtractor;

impl GraphExtractor {
    fn extract_node(
        node: &Value,
        resolver: &CategoryResolver<'_>,
    ) -> Result<Vec<AssetReference>, NodeError> {
        let node = node.as_object().ok_or(NodeError::NotAnObject)?;
        let node_id = node
            .get("id")
            .and_then(NodeId::from_value)
            .ok_or(NodeError::MissingId)?;
        let node_type = match node.get("type") {
            None | Some(Value::Null) => "",
            Some(Value::String(ty)) => ty.as_str(),
            Some(_) => return Err(NodeError::BadField("type")),
        };
        let widgets = match node.get("widgets_values") {
            Some(Value::Array(widgets)) => widgets,
            // Some custom nodes store named widget maps; those carry no
            // positional references.
            None | Some(Value::Null) | Some(Value::Object(_)) => return Ok(Vec::new()),
            Some(_) => return Err(NodeError::BadField("widgets_values")),
        };

        let refs = widgets
            .iter()
            .enumerate()
            .filter_map(|(index, value)| value.as_str().map(|v| (index, v)))
            .filter(|(_, value)| is_model_filename(value))
            .map(|(index, value)| {
                reference(
                    resolver,
                    node_id.clone(),
                    node_type,
                    Locator::Index(index),
                    value,
                )
            })
            .collect();
        Ok(refs)
    }

    fn extract_nodes(
        nodes: &[Value],
        resolver: &CategoryResolver<'_>,
        scope: &str,
        extraction: &mut Extraction,
    ) -> Vec<AssetReference> {
        let mut refs = Vec::new();
        for (position, node) in nodes.iter().enumerate() {
            match Self::extract_node(node, resolver) {
                Ok(found) => refs.extend(found),
                Err(e) => {
                    let id = node
                        .get("id")
                        .map(Value::to_string)
                        .unwrap_or_else(|| format!("#{}", position));
                    extraction.warn(format!("Skipped {} node {}: {}", scope, id, e));
                }
            }
        }
        refs
    }
}

fn subgraph_label(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl ReferenceExtractor for GraphExtractor {
    fn extract(&self, document: &Value, resolver: &CategoryResolver<'_>) -> Extraction {
        let mut extraction = Extraction::default();

        if let Some(nodes) = document.get("nodes").and_then(Value::as_array) {
            let refs = Self::extract_nodes(nodes, resolver, "graph", &mut extraction);
            extraction.references.extend(refs);
        }

        let subgraphs = match document.get("definitions").and_then(|d| d.get("subgraphs")) {
            None | Some(Value::Null) => return extraction,
            Some(Value::Array(subgraphs)) => subgraphs,
            Some(_) => {
                extraction.warn("Ignored definitions.subgraphs: not a list".to_string());
                return extraction;
            }
        };

        for (position, subgraph) in subgraphs.iter().enumerate() {
            let Some(subgraph) = subgraph.as_object() else {
                extraction.warn(format!("Skipped subgraph #{}: not an object", position));
                continue;
            };
            let subgraph_id = subgraph_label(subgraph.get("id"));
            let subgraph_name =
                subgraph_label(subgraph.get("name")).or_else(|| subgraph_id.clone());
            let nodes = match subgraph.get("nodes") {
                Some(Value::Array(nodes)) => nodes.as_slice(),
                None | Some(Value::Null) => &[],
                Some(_) => {
                    extraction.warn(format!(
                        "Skipped subgraph {}: `nodes` is not a list",
                        subgraph_id.as_deref().unwrap_or("?")
                    ));
                    continue;
                }
            };

            let refs = Self::extract_nodes(nodes, resolver, "subgraph", &mut extraction);
            extraction
                .references
                .extend(refs.into_iter().map(|mut r| {
                    r.subgraph_id = subgraph_id.clone();
                    r.subgraph_name = subgraph_name.clone();
                    r.is_top_level = false;
                    r
                }));
        }

        extraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FolderPaths;
    use serde_json::json;

    fn empty_registry() -> FolderPaths {
        FolderPaths::comfyui_defaults(std::path::Path::new("/nonexistent/models"))
    }

    #[test]
    fn test_api_fields() {
        let folders = empty_registry();
        let resolver = CategoryResolver::new(&folders);
        let doc = json!({
            "4": {
                "class_type": "CheckpointLoaderSimple",
                "inputs": {"ckpt_name": "missing.safetensors"}
            },
            "7": {
                "class_type": "CustomLoader",
                "inputs": {
                    "weights": "x.pth",
                    "preset_name": "fast",
                    "seed": 42,
                    "model": ["4", 0],
                    "prompt": "a photo"
                }
            }
        });

        let extraction = ApiExtractor.extract(&doc, &resolver);
        assert!(extraction.warnings.is_empty());
        let refs = extraction.references;
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].node_id, NodeId::from("4"));
        assert_eq!(refs[0].locator, Locator::Field("ckpt_name".into()));
        assert_eq!(refs[0].category, "checkpoints");
        assert!(!refs[0].exists);
        assert_eq!(refs[1].locator, Locator::Field("weights".into()));
        assert_eq!(refs[1].category, "unknown");
        assert_eq!(refs[2].original_value, "fast");
    }

    #[test]
    fn test_api_bad_node_does_not_abort() {
        let folders = empty_registry();
        let resolver = CategoryResolver::new(&folders);
        let doc = json!({
            "1": {"class_type": "VAELoader", "inputs": ["broken"]},
            "2": {"class_type": "VAELoader", "inputs": {"vae_name": "ae.safetensors"}},
            "3": {"inputs": {"vae_name": "ignored.safetensors"}}
        });

        let extraction = ApiExtractor.extract(&doc, &resolver);
        assert_eq!(extraction.references.len(), 1);
        assert_eq!(extraction.references[0].category, "vae");
        assert_eq!(extraction.warnings.len(), 1);
        assert!(extraction.warnings[0].contains("inputs"));
    }

    #[test]
    fn test_graph_widgets_and_bad_nodes() {
        let folders = empty_registry();
        let resolver = CategoryResolver::new(&folders);
        let doc = json!({
            "nodes": [
                {"id": 1, "type": "LoraLoader", "widgets_values": ["foo.txt", "bar.safetensors", 1.0, 1.0]},
                {"type": "VAELoader", "widgets_values": ["ae.safetensors"]},
                "garbage",
                {"id": 3, "type": "VHS_LoadVideo", "widgets_values": {"video": "clip.pt"}},
                {"id": 4, "type": "Note"}
            ]
        });

        let extraction = GraphExtractor.extract(&doc, &resolver);
        assert_eq!(extraction.references.len(), 1);
        let r = &extraction.references[0];
        assert_eq!(r.node_id, NodeId::Int(1));
        assert_eq!(r.locator, Locator::Index(1));
        assert_eq!(r.category, "loras");
        assert!(r.is_top_level);
        assert_eq!(extraction.warnings.len(), 2);
    }

    #[test]
    fn test_graph_subgraphs() {
        let folders = empty_registry();
        let resolver = CategoryResolver::new(&folders);
        let doc = json!({
            "nodes": [],
            "definitions": {
                "subgraphs": [
                    {
                        "id": "a1b2",
                        "nodes": [{"id": 9, "type": "UNETLoader", "widgets_values": ["flux.sft", "default"]}]
                    },
                    {
                        "id": "c3d4",
                        "name": "Upscale",
                        "nodes": [{"id": 2, "type": "UpscaleModelLoader", "widgets_values": ["4x.pth"]}]
                    }
                ]
            }
        });

        let refs = GraphExtractor.extract(&doc, &resolver).references;
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].subgraph_id.as_deref(), Some("a1b2"));
        assert_eq!(refs[0].subgraph_name.as_deref(), Some("a1b2"));
        assert_eq!(refs[0].category, "diffusion_models");
        assert!(!refs[0].is_top_level);
        assert_eq!(refs[1].subgraph_name.as_deref(), Some("Upscale"));
    }
}
