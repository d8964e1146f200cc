//! HTTP server implementation using Axum.

use crate::handlers::{handle_health, handle_rpc};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use model_linker::ModelLinker;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Application state shared across handlers.
pub struct AppState {
    pub linker: ModelLinker,
}

/// Build the router serving `/health` and `/rpc`.
pub fn router(linker: ModelLinker) -> Router {
    let state = Arc::new(AppState { linker });

    // Editors call from a browser origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/rpc", post(handle_rpc))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Start the JSON-RPC HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(
    linker: ModelLinker,
    host: &str,
    port: u16,
) -> anyhow::Result<SocketAddr> {
    let app = router(linker);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_linker::LinkerSettings;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_server_starts() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("models")).unwrap();
        let linker = ModelLinker::builder(temp_dir.path().join("models"))
            .with_settings(LinkerSettings::default())
            .with_cache_path(temp_dir.path().join("cache.json"))
            .build()
            .unwrap();

        let addr = start_server(linker, "127.0.0.1", 0).await.unwrap();
        assert!(addr.port() > 0);
    }

    #[tokio::test]
    async fn test_start_server_rejects_bad_host() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("models")).unwrap();
        let linker = ModelLinker::builder(temp_dir.path().join("models"))
            .with_settings(LinkerSettings::default())
            .build()
            .unwrap();

        assert!(start_server(linker, "not a host", 0).await.is_err());
    }
}
