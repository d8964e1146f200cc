//! On-disk snapshot of scanned asset records.
//!
//! The cache lets the linker answer model listings without rescanning every
//! directory, and keeps records from drives that are temporarily unmounted.
//! Format:
//!
//! ```json
//! { "models": [...], "last_updated": 1718000000.5, "version": 1, "count": 42, "metadata": {} }
//! ```

mod atomic;

pub use atomic::{atomic_read_json, atomic_write_json};

use crate::config::{CacheSettings, LinkerConfig};
use crate::error::Result;
use crate::models::AssetRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

fn default_version() -> u32 {
    LinkerConfig::CACHE_VERSION
}

/// Contents of the cache file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheData {
    #[serde(default)]
    pub models: Vec<AssetRecord>,
    /// Unix timestamp in seconds; zero when never written.
    #[serde(default)]
    pub last_updated: f64,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Default for CacheData {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            last_updated: 0.0,
            version: LinkerConfig::CACHE_VERSION,
            count: 0,
            metadata: None,
        }
    }
}

impl CacheData {
    /// Hours elapsed since the cache was written.
    pub fn age_hours(&self) -> f64 {
        (unix_now() - self.last_updated) / 3600.0
    }
}

fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// JSON cache file of asset records.
#[derive(Debug, Clone)]
pub struct AssetCache {
    path: PathBuf,
}

impl AssetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache named `filename` in the `user/` directory of a ComfyUI root.
    pub fn in_user_dir(comfyui_root: &Path, filename: &str) -> Self {
        Self::new(comfyui_root.join("user").join(filename))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cache, falling back to an empty snapshot when the file is
    /// missing or unreadable.
    pub fn load(&self) -> CacheData {
        match atomic_read_json::<CacheData>(&self.path) {
            Ok(Some(data)) => {
                info!("Loaded cache with {} models", data.models.len());
                data
            }
            Ok(None) => {
                debug!("No cache at {}", self.path.display());
                CacheData::default()
            }
            Err(e) => {
                warn!("Failed to load cache: {}", e);
                CacheData::default()
            }
        }
    }

    /// Cached records, empty when no usable cache exists.
    pub fn cached_models(&self) -> Vec<AssetRecord> {
        self.load().models
    }

    /// Write `models` to the cache, stamped with the current time.
    pub fn save(&self, models: &[AssetRecord], metadata: Option<Value>) -> Result<()> {
        let data = CacheData {
            models: models.to_vec(),
            last_updated: unix_now(),
            version: LinkerConfig::CACHE_VERSION,
            count: models.len(),
            metadata,
        };
        atomic_write_json(&self.path, &data)?;
        info!(
            "Saved cache with {} models to {}",
            models.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Whether a rescan should replace the cache.
    pub fn should_refresh(&self, settings: &CacheSettings) -> bool {
        if !settings.enabled || !settings.auto_refresh {
            return false;
        }
        let data = self.load();
        if data.last_updated == 0.0 {
            return true;
        }
        if settings.refresh_interval_hours == 0.0 {
            return true;
        }
        data.age_hours() >= settings.refresh_interval_hours
    }
}

fn absolute_key(path: &str) -> Option<PathBuf> {
    if path.is_empty() {
        return None;
    }
    std::path::absolute(path).ok()
}

/// Combine a fresh scan with cached records.
///
/// Scanned records come first. Cached records are kept only when their path
/// was not scanned and the file still exists (e.g. a drive the scan did not
/// cover).
pub fn merge_with_cache(scanned: Vec<AssetRecord>, cached: Vec<AssetRecord>) -> Vec<AssetRecord> {
    let scanned_paths: HashSet<PathBuf> = scanned
        .iter()
        .filter_map(|r| absolute_key(&r.absolute_path))
        .collect();

    let mut merged = scanned;
    for record in cached {
        let Some(path) = absolute_key(&record.absolute_path) else {
            continue;
        };
        if !scanned_paths.contains(&path) && path.exists() {
            debug!("Kept cached model from other location: {}", path.display());
            merged.push(record);
        }
    }
    merged
}
