//! Response wrapping for frontend compatibility.
//!
//! Editors expect every result in the shape `{success: bool, ...data}`.
//! Handlers return raw data; this module adds the envelope per method.

use serde_json::{json, Map, Value};

/// Wrap handler results in the `{success, ...}` envelope editors expect.
pub fn wrap_response(method: &str, result: Value) -> Value {
    match method {
        // List wrappers
        "get_models" => {
            let models = if result.is_null() { json!([]) } else { result };
            let count = models.as_array().map_or(0, Vec::len);
            json!({
                "success": true,
                "models": models,
                "count": count
            })
        }

        // Object results merged into the envelope
        "analyze_workflow" | "auto_resolve" | "resolve_models" | "refresh_cache"
        | "download_model" | "cancel_download" => merge_success(result),

        // A failed download is still a successful poll, but editors key off `success`
        "get_download_progress" => {
            let failed = result.get("status").and_then(Value::as_str) == Some("failed");
            let mut wrapped = merge_success(result);
            wrapped["success"] = Value::Bool(!failed);
            wrapped
        }

        _ => json!({
            "success": true,
            "result": result
        }),
    }
}

fn merge_success(result: Value) -> Value {
    let mut wrapped = Map::new();
    wrapped.insert("success".to_string(), Value::Bool(true));
    match result {
        Value::Object(fields) => wrapped.extend(fields),
        Value::Null => {}
        other => {
            wrapped.insert("result".to_string(), other);
        }
    }
    Value::Object(wrapped)
}
