//! JSON-RPC request handlers, split by domain.

mod downloads;
mod models;
mod workflow;

use crate::server::AppState;
use crate::wrapper::wrap_response;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use model_linker::LinkerError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

// ============================================================================
// JSON-RPC types
// ============================================================================

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
            id,
        }
    }
}

// ============================================================================
// Parameter extraction helpers
// ============================================================================

pub(crate) fn invalid_params(message: impl Into<String>) -> LinkerError {
    LinkerError::InvalidParams {
        message: message.into(),
    }
}

/// Extract an optional bool parameter, supporting both snake_case and camelCase.
pub(crate) fn get_bool_param(params: &Value, snake: &str, camel: &str) -> Option<bool> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_bool())
}

/// Extract a required non-empty string parameter, snake_case or camelCase.
pub(crate) fn require_str_param<'a>(
    params: &'a Value,
    snake: &str,
    camel: &str,
) -> model_linker::Result<&'a str> {
    match params.get(snake).or_else(|| params.get(camel)) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::String(_)) | None => Err(invalid_params(format!(
            "Missing required parameter: {}",
            snake
        ))),
        Some(_) => Err(invalid_params(format!(
            "Parameter '{}' must be a string",
            snake
        ))),
    }
}

/// Extract a required JSON object parameter or return an error.
pub(crate) fn require_object_param<'a>(
    params: &'a Value,
    name: &str,
) -> model_linker::Result<&'a Value> {
    match params.get(name) {
        Some(value) if value.is_object() => Ok(value),
        Some(_) => Err(invalid_params(format!(
            "Parameter '{}' must be a JSON object",
            name
        ))),
        None => Err(invalid_params(format!(
            "Missing required parameter: {}",
            name
        ))),
    }
}

// ============================================================================
// HTTP endpoints
// ============================================================================

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

/// Main JSON-RPC handler.
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let method = &request.method;
    let params = request.params.unwrap_or(Value::Object(Default::default()));
    let id = request.id.clone();

    debug!("RPC call: {}", method);

    if method == "health_check" {
        return (
            StatusCode::OK,
            Json(JsonRpcResponse::success(
                id,
                json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}),
            )),
        );
    }

    let result = dispatch_method(&state, method, &params).await;

    match result {
        Ok(value) => {
            let wrapped = wrap_response(method, value);
            (StatusCode::OK, Json(JsonRpcResponse::success(id, wrapped)))
        }
        Err(e) => {
            error!("RPC error for {}: {}", method, e);
            let code = e.to_rpc_error_code();
            (
                StatusCode::OK,
                Json(JsonRpcResponse::error(id, code, e.to_string())),
            )
        }
    }
}

// ============================================================================
// Method dispatcher
// ============================================================================

/// Dispatch a method call to the appropriate domain handler.
async fn dispatch_method(
    state: &AppState,
    method: &str,
    params: &Value,
) -> model_linker::Result<Value> {
    match method {
        // Workflow
        "analyze_workflow" => workflow::analyze_workflow(state, params).await,
        "resolve_models" => workflow::resolve_models(state, params).await,
        "auto_resolve" => workflow::auto_resolve(state, params).await,

        // Local models
        "get_models" => models::get_models(state, params).await,
        "refresh_cache" => models::refresh_cache(state, params).await,

        // Downloads
        "download_model" => downloads::download_model(state, params).await,
        "get_download_progress" => downloads::get_download_progress(state, params).await,
        "cancel_download" => downloads::cancel_download(state, params).await,

        _ => {
            warn!("Method not found: {}", method);
            Err(LinkerError::MethodNotFound(method.to_string()))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
