//! Builder for configuring ModelLinker initialization.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::LinkerState;
use crate::cache::AssetCache;
use crate::config::{LinkerConfig, LinkerSettings, MODEL_EXTENSIONS};
use crate::download::DownloadManager;
use crate::error::{LinkerError, Result};
use crate::registry::FolderPaths;
use crate::ModelLinker;

/// Builder for configuring ModelLinker initialization.
///
/// # Example
///
/// ```rust,ignore
/// use model_linker::ModelLinker;
///
/// let linker = ModelLinker::builder("/opt/ComfyUI/models")
///     .with_config_file("/etc/model_linker_config.yaml")
///     .with_extra_model_paths("/opt/ComfyUI/extra_model_paths.yaml")
///     .build()?;
/// ```
pub struct ModelLinkerBuilder {
    models_dir: PathBuf,
    settings: Option<LinkerSettings>,
    config_file: Option<PathBuf>,
    cache_path: Option<PathBuf>,
    extra_model_paths: Vec<PathBuf>,
}

impl ModelLinkerBuilder {
    /// Create a new builder for the ComfyUI `models/` directory.
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            settings: None,
            config_file: None,
            cache_path: None,
            extra_model_paths: Vec::new(),
        }
    }

    /// Use these settings instead of discovering a config file.
    pub fn with_settings(mut self, settings: LinkerSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Config file checked before the default locations.
    ///
    /// Ignored when [`with_settings`](Self::with_settings) is used.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Cache file location.
    ///
    /// Default: `<comfyui root>/user/<cache.filename>`
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Merge an `extra_model_paths.yaml` file. May be called more than once.
    ///
    /// `<comfyui root>/extra_model_paths.yaml` is merged automatically when it
    /// exists.
    pub fn with_extra_model_paths(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_model_paths.push(path.into());
        self
    }

    fn comfyui_root(models_dir: &Path) -> PathBuf {
        models_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| models_dir.to_path_buf())
    }

    /// Build the ModelLinker instance.
    ///
    /// No directory is scanned here; records load lazily on first use.
    pub fn build(self) -> Result<ModelLinker> {
        if !self.models_dir.is_dir() {
            return Err(LinkerError::NotADirectory(self.models_dir));
        }
        let models_dir = std::path::absolute(&self.models_dir)
            .map_err(|e| LinkerError::io_with_path(e, &self.models_dir))?;
        let comfyui_root = Self::comfyui_root(&models_dir);

        let (settings, settings_source) = match self.settings {
            Some(settings) => (settings, None),
            None => LinkerSettings::discover(self.config_file.as_deref()),
        };

        let mut folders = FolderPaths::comfyui_defaults(&models_dir);

        let default_extra = comfyui_root.join(LinkerConfig::EXTRA_MODEL_PATHS_FILENAME);
        if default_extra.is_file() && !self.extra_model_paths.contains(&default_extra) {
            if let Err(e) = folders.merge_extra_model_paths(&default_extra) {
                warn!("Ignoring {}: {}", default_extra.display(), e);
            }
        }
        for path in &self.extra_model_paths {
            folders.merge_extra_model_paths(path)?;
        }

        let config_dir = settings_source.as_deref().and_then(Path::parent);
        let additional = settings.resolve_additional_directories(config_dir);
        if !additional.is_empty() {
            for dir in additional {
                folders.add_path(LinkerConfig::ADDITIONAL_CATEGORY, dir);
            }
            folders.set_extensions(
                LinkerConfig::ADDITIONAL_CATEGORY,
                MODEL_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            );
        }

        let cache = settings.cache.enabled.then(|| match &self.cache_path {
            Some(path) => AssetCache::new(path),
            None => AssetCache::in_user_dir(&comfyui_root, &settings.cache.filename),
        });
        match &cache {
            Some(cache) => debug!("Using cache {}", cache.path().display()),
            None => debug!("Cache disabled"),
        }

        let downloads = DownloadManager::new()?;

        info!(
            "Model linker ready: {} categories under {}",
            folders.len(),
            models_dir.display()
        );

        Ok(ModelLinker {
            state: Arc::new(LinkerState {
                models_dir,
                folders: Arc::new(folders),
                settings,
                cache,
                records: RwLock::new(None),
                downloads,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_requires_models_dir() {
        let temp_dir = TempDir::new().unwrap();
        let result = ModelLinker::builder(temp_dir.path().join("missing")).build();
        assert!(matches!(result, Err(LinkerError::NotADirectory(_))));
    }

    #[test]
    fn test_build_merges_default_extra_paths_and_additional_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("models")).unwrap();
        std::fs::create_dir_all(root.join("share").join("loras")).unwrap();
        std::fs::create_dir_all(root.join("more")).unwrap();
        std::fs::write(
            root.join("extra_model_paths.yaml"),
            "shared:\n  base_path: share\n  loras: loras\n",
        )
        .unwrap();

        let settings = LinkerSettings {
            additional_directories: vec![root.join("more")],
            ..Default::default()
        };
        let linker = ModelLinker::builder(root.join("models"))
            .with_settings(settings)
            .build()
            .unwrap();

        let folders = linker.folders();
        assert!(folders
            .paths("loras")
            .contains(&root.join("share").join("loras")));
        assert_eq!(folders.paths(LinkerConfig::ADDITIONAL_CATEGORY).len(), 1);
        assert_eq!(
            linker.cache().unwrap().path(),
            root.join("user").join(LinkerConfig::CACHE_FILENAME)
        );
    }

    #[test]
    fn test_explicit_extra_paths_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("models")).unwrap();
        let result = ModelLinker::builder(temp_dir.path().join("models"))
            .with_settings(LinkerSettings::default())
            .with_extra_model_paths(temp_dir.path().join("nope.yaml"))
            .build();
        assert!(result.is_err());
    }
}
