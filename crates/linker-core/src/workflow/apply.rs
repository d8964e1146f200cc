//! Writing chosen replacements back into a workflow document.

use super::format::WorkflowFormat;
use crate::models::{Locator, NodeId, Resolution};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Rewritten document plus what happened to each resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub workflow: Value,
    /// Resolutions written into the document.
    pub applied: usize,
    /// Resolutions left alone: no replacement, or a stale locator.
    pub skipped: usize,
    pub warnings: Vec<String>,
}

fn find_node<'a>(nodes: &'a mut Value, node_id: &NodeId) -> Option<&'a mut Value> {
    nodes
        .as_array_mut()?
        .iter_mut()
        .find(|node| node.get("id").is_some_and(|id| node_id.matches(id)))
}

fn find_subgraph<'a>(document: &'a mut Value, subgraph_id: &str) -> Option<&'a mut Value> {
    document
        .get_mut("definitions")?
        .get_mut("subgraphs")?
        .as_array_mut()?
        .iter_mut()
        .find(|sg| match sg.get("id") {
            Some(Value::String(id)) => id == subgraph_id,
            Some(other) => other.to_string() == subgraph_id,
            None => false,
        })
}

/// The stored value a resolution points at.
fn target_slot<'a>(
    document: &'a mut Value,
    format: WorkflowFormat,
    resolution: &Resolution,
) -> Result<&'a mut Value, String> {
    match (&resolution.subgraph_id, format, &resolution.locator) {
        (Some(subgraph_id), _, Locator::Index(index)) => {
            let subgraph = find_subgraph(document, subgraph_id)
                .ok_or_else(|| format!("subgraph {} not found", subgraph_id))?;
            let nodes = subgraph
                .get_mut("nodes")
                .ok_or_else(|| format!("subgraph {} has no nodes", subgraph_id))?;
            widget_slot(nodes, &resolution.node_id, *index)
        }
        (None, WorkflowFormat::Graph, Locator::Index(index)) => {
            let nodes = document
                .get_mut("nodes")
                .ok_or_else(|| "document has no nodes".to_string())?;
            widget_slot(nodes, &resolution.node_id, *index)
        }
        (None, WorkflowFormat::Api, Locator::Field(field)) => document
            .get_mut(resolution.node_id.to_string())
            .ok_or_else(|| format!("node {} not found", resolution.node_id))?
            .get_mut("inputs")
            .and_then(|inputs| inputs.get_mut(field.as_str()))
            .ok_or_else(|| format!("node {} has no input {}", resolution.node_id, field)),
        (_, format, locator) => Err(format!(
            "locator {} does not fit a {} workflow",
            locator, format
        )),
    }
}

fn widget_slot<'a>(
    nodes: &'a mut Value,
    node_id: &NodeId,
    index: usize,
) -> Result<&'a mut Value, String> {
    find_node(nodes, node_id)
        .ok_or_else(|| format!("node {} not found", node_id))?
        .get_mut("widgets_values")
        .and_then(|widgets| widgets.get_mut(index))
        .ok_or_else(|| format!("node {} has no widget value [{}]", node_id, index))
}

/// Apply resolutions to a copy of `document`.
///
/// The caller's document is never modified. A resolution whose locator no
/// longer points at a string value is skipped with a warning; the rest still
/// apply.
pub fn apply_resolutions(document: &Value, resolutions: &[Resolution]) -> ApplyOutcome {
    let format = WorkflowFormat::detect(document);
    let mut workflow = document.clone();
    let mut applied = 0;
    let mut skipped = 0;
    let mut warnings = Vec::new();

    for resolution in resolutions {
        let Some(replacement) = &resolution.replacement else {
            skipped += 1;
            continue;
        };

        let slot = target_slot(&mut workflow, format, resolution).and_then(|slot| {
            if slot.is_string() {
                Ok(slot)
            } else {
                Err(format!(
                    "value at {}{} is not a filename",
                    resolution.node_id, resolution.locator
                ))
            }
        });

        match slot {
            Ok(slot) => {
                debug!(
                    "Relinked {}{}: {} -> {}",
                    resolution.node_id, resolution.locator, slot, replacement
                );
                *slot = Value::String(replacement.clone());
                applied += 1;
            }
            Err(reason) => {
                let message = format!("Skipped stale resolution: {}", reason);
                warn!("{}", message);
                warnings.push(message);
                skipped += 1;
            }
        }
    }

    ApplyOutcome {
        workflow,
        applied,
        skipped,
        warnings,
    }
}
