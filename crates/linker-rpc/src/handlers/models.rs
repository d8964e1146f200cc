//! Local model listing handlers.

use super::get_bool_param;
use crate::server::AppState;
use serde_json::{json, Value};

pub async fn get_models(state: &AppState, params: &Value) -> model_linker::Result<Value> {
    let use_cache = get_bool_param(params, "use_cache", "useCache").unwrap_or(true);
    let models = state.linker.get_models(use_cache).await?;
    Ok(serde_json::to_value(models.as_slice())?)
}

pub async fn refresh_cache(state: &AppState, _params: &Value) -> model_linker::Result<Value> {
    let count = state.linker.refresh_models().await?;
    Ok(json!({
        "models_found": count,
        "message": format!("Cache refreshed with {} models", count),
    }))
}
