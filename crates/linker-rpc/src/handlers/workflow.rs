//! Workflow analysis and relinking handlers.

use super::{invalid_params, require_object_param};
use crate::server::AppState;
use model_linker::{LinkerError, Resolution, WorkflowFormat};
use serde_json::Value;
use tracing::info;

fn require_known_format(workflow: &Value) -> model_linker::Result<()> {
    match WorkflowFormat::detect(workflow) {
        WorkflowFormat::Unknown => Err(LinkerError::UnknownFormat),
        _ => Ok(()),
    }
}

fn parse_resolutions(params: &Value) -> model_linker::Result<Vec<Resolution>> {
    let raw = params
        .get("resolutions")
        .ok_or_else(|| invalid_params("Missing required parameter: resolutions"))?;
    let resolutions: Vec<Resolution> = serde_json::from_value(raw.clone())
        .map_err(|e| invalid_params(format!("Invalid resolutions: {}", e)))?;
    if resolutions.is_empty() {
        return Err(invalid_params("Resolutions array is required"));
    }
    Ok(resolutions)
}

pub async fn analyze_workflow(state: &AppState, params: &Value) -> model_linker::Result<Value> {
    let workflow = require_object_param(params, "workflow")?;
    let report = state.linker.analyze(workflow).await?;
    info!(
        "Analyzed {} workflow: {} references, {} missing",
        report.format,
        report.total_references,
        report.missing.len()
    );
    Ok(serde_json::to_value(report)?)
}

pub async fn resolve_models(state: &AppState, params: &Value) -> model_linker::Result<Value> {
    let workflow = require_object_param(params, "workflow")?;
    let resolutions = parse_resolutions(params)?;
    require_known_format(workflow)?;

    let outcome = state.linker.apply(workflow, &resolutions);
    Ok(serde_json::to_value(outcome)?)
}

pub async fn auto_resolve(state: &AppState, params: &Value) -> model_linker::Result<Value> {
    let workflow = require_object_param(params, "workflow")?;
    require_known_format(workflow)?;

    let outcome = state.linker.auto_resolve(workflow).await?;
    Ok(serde_json::to_value(outcome)?)
}
