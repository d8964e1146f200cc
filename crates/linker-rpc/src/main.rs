//! Model Linker RPC Server - JSON-RPC backend for workflow editors.
//!
//! This binary provides a JSON-RPC 2.0 server that wraps the model-linker
//! library so an editor front end can analyze and relink workflows.

mod handlers;
mod server;
mod wrapper;

use anyhow::{Context, Result};
use clap::Parser;
use model_linker::ModelLinker;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "model-linker-rpc")]
#[command(about = "JSON-RPC server for relinking missing workflow models")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// ComfyUI models directory (defaults to ./models)
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Linker config file checked before the default locations
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cache file (defaults to <comfyui root>/user/model_linker_cache.json)
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// Extra model paths YAML to merge; may be repeated
    #[arg(long)]
    extra_model_paths: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Model Linker RPC Server");

    let models_dir = match args.models_dir {
        Some(path) => path,
        None => std::env::current_dir()?.join("models"),
    };
    info!("Models directory: {}", models_dir.display());

    let mut builder = ModelLinker::builder(&models_dir);
    if let Some(config) = args.config {
        builder = builder.with_config_file(config);
    }
    if let Some(cache_file) = args.cache_file {
        builder = builder.with_cache_path(cache_file);
    }
    for extra in args.extra_model_paths {
        builder = builder.with_extra_model_paths(extra);
    }
    let linker = builder
        .build()
        .with_context(|| format!("failed to open models directory {}", models_dir.display()))?;

    // Start the server
    let addr = server::start_server(linker, &args.host, args.port).await?;

    // Print port for the editor to read (intentional stdout for IPC)
    println!("RPC_PORT={}", addr.port());

    info!("RPC server running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
