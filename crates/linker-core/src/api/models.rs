//! Local model listing methods on ModelLinker.

use std::sync::Arc;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::cache::merge_with_cache;
use crate::error::{LinkerError, Result};
use crate::models::AssetRecord;
use crate::registry::scan_all;
use crate::ModelLinker;

impl ModelLinker {
    // ========================================
    // Model Listing Methods
    // ========================================

    /// Current record snapshot.
    ///
    /// With `use_cache`, the in-memory snapshot is returned when present,
    /// then a fresh cache file is loaded. Otherwise directories are rescanned
    /// and merged with cached records from locations the scan did not reach.
    pub async fn get_models(&self, use_cache: bool) -> Result<Arc<Vec<AssetRecord>>> {
        if use_cache {
            if let Some(records) = self.state.records.read().await.as_ref() {
                return Ok(records.clone());
            }
            if let Some(records) = self.load_fresh_cache() {
                let records = Arc::new(records);
                *self.state.records.write().await = Some(records.clone());
                return Ok(records);
            }
        }
        self.rescan(true).await
    }

    /// Rescan every directory, replace the cache and the snapshot.
    ///
    /// Returns the number of records found.
    pub async fn refresh_models(&self) -> Result<usize> {
        info!("Manual cache refresh requested");
        let records = self.rescan(false).await?;
        Ok(records.len())
    }

    fn load_fresh_cache(&self) -> Option<Vec<AssetRecord>> {
        let cache = self.state.cache.as_ref()?;
        if cache.should_refresh(&self.state.settings.cache) {
            debug!("Cache is stale or refresh is due");
            return None;
        }
        let records = cache.cached_models();
        (!records.is_empty()).then_some(records)
    }

    async fn rescan(&self, merge_cached: bool) -> Result<Arc<Vec<AssetRecord>>> {
        let folders = self.state.folders.clone();
        let scanning = self.state.settings.scanning.clone();
        let started = std::time::Instant::now();

        let scanned = tokio::task::spawn_blocking(move || scan_all(&folders, &scanning))
            .await
            .map_err(|e| LinkerError::Other(format!("Scan task failed: {}", e)))?;
        let elapsed = started.elapsed();

        let records = match (&self.state.cache, merge_cached) {
            (Some(cache), true) => merge_with_cache(scanned, cache.cached_models()),
            _ => scanned,
        };

        if let Some(cache) = &self.state.cache {
            let metadata = json!({
                "scan_duration_secs": elapsed.as_secs_f64(),
                "manual_refresh": !merge_cached,
            });
            if let Err(e) = cache.save(&records, Some(metadata)) {
                warn!("Failed to save cache: {}", e);
            }
        }

        let records = Arc::new(records);
        *self.state.records.write().await = Some(records.clone());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{CacheSettings, LinkerSettings};
    use crate::ModelLinker;
    use tempfile::TempDir;

    fn install(root: &std::path::Path) {
        let checkpoints = root.join("models").join("checkpoints");
        std::fs::create_dir_all(&checkpoints).unwrap();
        std::fs::write(checkpoints.join("a.safetensors"), b"x").unwrap();
    }

    #[tokio::test]
    async fn test_get_models_scans_and_caches() {
        let temp_dir = TempDir::new().unwrap();
        install(temp_dir.path());
        let cache_path = temp_dir.path().join("cache.json");

        let linker = ModelLinker::builder(temp_dir.path().join("models"))
            .with_settings(LinkerSettings::default())
            .with_cache_path(&cache_path)
            .build()
            .unwrap();

        let records = linker.get_models(true).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(cache_path.is_file());

        // New file is invisible until a refresh
        let checkpoints = temp_dir.path().join("models").join("checkpoints");
        std::fs::write(checkpoints.join("b.safetensors"), b"x").unwrap();
        assert_eq!(linker.get_models(true).await.unwrap().len(), 1);

        assert_eq!(linker.refresh_models().await.unwrap(), 2);
        assert_eq!(linker.get_models(true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fresh_cache_is_used_on_startup() {
        let temp_dir = TempDir::new().unwrap();
        install(temp_dir.path());
        let cache_path = temp_dir.path().join("cache.json");
        let settings = LinkerSettings {
            cache: CacheSettings {
                refresh_interval_hours: 24.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let first = ModelLinker::builder(temp_dir.path().join("models"))
            .with_settings(settings.clone())
            .with_cache_path(&cache_path)
            .build()
            .unwrap();
        assert_eq!(first.get_models(false).await.unwrap().len(), 1);

        std::fs::remove_file(
            temp_dir
                .path()
                .join("models")
                .join("checkpoints")
                .join("a.safetensors"),
        )
        .unwrap();

        // Cache is younger than the interval, so the deleted file is still listed
        let second = ModelLinker::builder(temp_dir.path().join("models"))
            .with_settings(settings)
            .with_cache_path(&cache_path)
            .build()
            .unwrap();
        assert_eq!(second.get_models(true).await.unwrap().len(), 1);
        assert_eq!(second.get_models(false).await.unwrap().len(), 0);
    }
}
