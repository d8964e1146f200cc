//! Model download handlers.

use super::{invalid_params, require_str_param};
use crate::server::AppState;
use model_linker::{DownloadConfig, DownloadRequest};
use serde_json::{json, Value};

pub async fn download_model(state: &AppState, params: &Value) -> model_linker::Result<Value> {
    let (url, filename, download_id) = match (
        require_str_param(params, "url", "url"),
        require_str_param(params, "filename", "filename"),
        require_str_param(params, "download_id", "downloadId"),
    ) {
        (Ok(url), Ok(filename), Ok(download_id)) => (url, filename, download_id),
        _ => return Err(invalid_params("url, filename, and download_id are required")),
    };
    let category = params
        .get("category")
        .and_then(Value::as_str)
        .unwrap_or(DownloadConfig::DEFAULT_CATEGORY);

    let started = state
        .linker
        .download_model(DownloadRequest {
            url: url.to_string(),
            category: category.to_string(),
            filename: filename.to_string(),
            download_id: download_id.to_string(),
        })
        .await?;
    Ok(serde_json::to_value(started)?)
}

pub async fn get_download_progress(
    state: &AppState,
    params: &Value,
) -> model_linker::Result<Value> {
    let download_id = require_str_param(params, "download_id", "downloadId")?;
    let snapshot = state.linker.download_progress(download_id).await?;
    Ok(serde_json::to_value(snapshot)?)
}

pub async fn cancel_download(state: &AppState, params: &Value) -> model_linker::Result<Value> {
    let download_id = require_str_param(params, "download_id", "downloadId")?;
    state.linker.cancel_download(download_id).await?;
    Ok(json!({"message": "Download cancelled"}))
}
