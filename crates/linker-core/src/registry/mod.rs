//! Asset folder registry and directory scanning.
//!
//! The host application owns a mapping of logical categories (checkpoints,
//! loras, vae, ...) to one or more base directories. The analyzer never reads
//! that mapping from a global; it receives an [`AssetRegistry`] at call time,
//! which keeps analysis reproducible and lets tests supply fixture registries.
//!
//! - [`FolderPaths`] is the filesystem-backed registry, seeded from the
//!   standard ComfyUI layout and extended with `extra_model_paths.yaml`.
//! - [`scanner`] walks those directories and produces [`AssetRecord`]s.
//!
//! [`AssetRecord`]: crate::models::AssetRecord

mod extra_paths;
mod folders;
pub mod scanner;

pub use extra_paths::canonical_category;
pub use folders::{CategoryFolders, FolderPaths};
pub use scanner::{scan_all, scan_directory};

use std::path::PathBuf;

/// Category → directories capability the analyzer resolves references against.
///
/// Implementations may be stale or partially rebuilt while an analysis runs;
/// callers take whatever they return at face value.
pub trait AssetRegistry: Send + Sync {
    /// Every known category, in a stable order.
    fn categories(&self) -> Vec<String>;

    /// Path of an existing file named `filename` under any directory of
    /// `category`, first directory wins.
    fn locate(&self, category: &str, filename: &str) -> Option<PathBuf>;
}

impl<T: AssetRegistry + ?Sized> AssetRegistry for std::sync::Arc<T> {
    fn categories(&self) -> Vec<String> {
        (**self).categories()
    }

    fn locate(&self, category: &str, filename: &str) -> Option<PathBuf> {
        (**self).locate(category, filename)
    }
}
