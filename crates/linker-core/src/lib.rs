//! Model Linker - Headless library for relinking missing model files in
//! node-graph workflows.
//!
//! Given a workflow document (either the editor's node-list export or the
//! dict-of-nodes execution format), the crate finds every model filename it
//! references, checks which ones exist under the registered model
//! directories, and ranks local files that could stand in for the missing
//! ones by filename similarity.
//!
//! The building blocks are usable on their own:
//! - [`matcher`]: filename normalization, similarity scoring and ranking
//! - [`workflow`]: format detection, reference extraction, rewriting
//! - [`registry`]: category → directory registry and directory scanning
//! - [`cache`]: on-disk snapshot of scanned records
//! - [`download`]: background model downloads into category directories
//!
//! [`ModelLinker`] wires them together for a ComfyUI install.
//!
//! # Example
//!
//! ```rust,ignore
//! use model_linker::ModelLinker;
//!
//! #[tokio::main]
//! async fn main() -> model_linker::Result<()> {
//!     let linker = ModelLinker::new("/opt/ComfyUI/models")?;
//!     let workflow: serde_json::Value =
//!         serde_json::from_str(&std::fs::read_to_string("workflow.json")?)?;
//!
//!     let report = linker.analyze(&workflow).await?;
//!     for missing in &report.missing {
//!         println!("{} -> {:?}", missing.reference.original_value, missing.matches.first());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod download;
pub mod error;
pub mod linker;
pub mod matcher;
pub mod models;
pub mod registry;
pub mod workflow;

mod api;

// Re-export commonly used types
pub use cache::{AssetCache, CacheData};
pub use config::{DownloadConfig, LinkerConfig, LinkerSettings, MatchTuning};
pub use download::{
    DownloadManager, DownloadProgress, DownloadRequest, DownloadResult, DownloadSnapshot,
    DownloadStarted, DownloadStatus,
};
pub use error::{LinkerError, Result};
pub use linker::{analyze_and_find_matches, auto_resolutions, AnalysisReport, MissingAsset};
pub use matcher::{find_matches, MatchOptions, MatchResult, TieBreak};
pub use models::{AssetRecord, AssetReference, Locator, NodeId, Resolution};
pub use registry::{AssetRegistry, FolderPaths};
pub use workflow::{analyze, apply_resolutions, identify_missing, Analysis, ApplyOutcome, WorkflowFormat};

// Re-export builder from api module
pub use api::{AutoResolveOutcome, ModelLinkerBuilder};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use api::LinkerState;

/// Main entry point for a ComfyUI install.
///
/// Cheap to clone; clones share the record snapshot and cache.
#[derive(Clone)]
pub struct ModelLinker {
    state: Arc<LinkerState>,
}

impl ModelLinker {
    /// Create a builder for ModelLinker.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let linker = ModelLinker::builder("/opt/ComfyUI/models")
    ///     .with_cache_path("/tmp/model_linker_cache.json")
    ///     .build()?;
    /// ```
    pub fn builder(models_dir: impl Into<PathBuf>) -> ModelLinkerBuilder {
        ModelLinkerBuilder::new(models_dir)
    }

    /// Create a linker with discovered settings.
    pub fn new(models_dir: impl Into<PathBuf>) -> Result<Self> {
        ModelLinkerBuilder::new(models_dir).build()
    }

    pub fn models_dir(&self) -> &Path {
        &self.state.models_dir
    }

    /// Category registry the linker resolves against.
    pub fn folders(&self) -> &FolderPaths {
        &self.state.folders
    }

    pub fn settings(&self) -> &LinkerSettings {
        &self.state.settings
    }

    /// `None` when caching is disabled.
    pub fn cache(&self) -> Option<&AssetCache> {
        self.state.cache.as_ref()
    }
}
