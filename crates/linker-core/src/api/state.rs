//! State shared by every `ModelLinker` method.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cache::AssetCache;
use crate::config::LinkerSettings;
use crate::download::DownloadManager;
use crate::models::AssetRecord;
use crate::registry::FolderPaths;

/// Everything a built linker owns.
///
/// The record snapshot is swapped wholesale on refresh; analyses clone the
/// `Arc` and keep working against the snapshot they started with.
pub(crate) struct LinkerState {
    pub(crate) models_dir: PathBuf,
    pub(crate) folders: Arc<FolderPaths>,
    pub(crate) settings: LinkerSettings,
    pub(crate) cache: Option<AssetCache>,
    pub(crate) records: RwLock<Option<Arc<Vec<AssetRecord>>>>,
    pub(crate) downloads: DownloadManager,
}
