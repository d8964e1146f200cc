//! Centralized configuration for the model linker.
//!
//! Static constants live on unit structs the way the rest of the crate reads
//! them (`LinkerConfig::CACHE_FILENAME`). User-tunable settings are loaded from
//! `model_linker_config.yaml`; any section or key missing from the file keeps
//! its default.

use crate::error::{LinkerError, Result};
use crate::matcher::MatchOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Application-level constants.
pub struct LinkerConfig;

impl LinkerConfig {
    pub const APP_NAME: &'static str = "Model Linker";
    pub const CONFIG_FILENAME: &'static str = "model_linker_config.yaml";
    pub const CONFIG_DIR_NAME: &'static str = "model-linker";
    pub const CACHE_FILENAME: &'static str = "model_linker_cache.json";
    pub const CACHE_VERSION: u32 = 1;
    pub const EXTRA_MODEL_PATHS_FILENAME: &'static str = "extra_model_paths.yaml";
    /// Category assigned to files found under `additional_directories`.
    pub const ADDITIONAL_CATEGORY: &'static str = "additional";
}

/// Download constants.
pub struct DownloadConfig;

impl DownloadConfig {
    /// Appended to the destination while bytes are still arriving.
    pub const TEMP_SUFFIX: &'static str = ".tmp";
    pub const DEFAULT_CATEGORY: &'static str = "checkpoints";
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const USER_AGENT: &'static str = concat!("model-linker/", env!("CARGO_PKG_VERSION"));
}

/// Model file extensions, lowercase and dot-prefixed.
pub const MODEL_EXTENSIONS: &[&str] = &[
    ".ckpt",
    ".pt",
    ".pt2",
    ".bin",
    ".pth",
    ".safetensors",
    ".pkl",
    ".sft",
    ".onnx",
];

/// Registry categories that never hold model assets.
pub const NON_ASSET_CATEGORIES: &[&str] = &["custom_nodes", "configs"];

/// Check whether a dot-prefixed extension is a known model extension.
pub fn is_model_extension(ext: &str) -> bool {
    let ext = ext.to_lowercase();
    MODEL_EXTENSIONS.contains(&ext.as_str())
}

/// Check whether a category holds model assets.
pub fn is_asset_category(category: &str) -> bool {
    !NON_ASSET_CATEGORIES.contains(&category)
}

/// Scoring constants for the fuzzy matcher.
///
/// The values are empirical. They are kept overridable so a deployment can
/// tune them without touching the scoring code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTuning {
    /// Ceiling for any pair whose normalized names differ.
    pub exact_match_cap: f64,
    /// Maximum bonus added to the Jaccard term for tokens in matching positions.
    pub order_bonus_weight: f64,
    /// How many leading token positions the order bonus inspects.
    pub order_bonus_positions: usize,
    pub token_weight: f64,
    pub char_weight: f64,
}

impl MatchTuning {
    pub const EXACT_MATCH_CAP: f64 = 0.999;
    pub const ORDER_BONUS_WEIGHT: f64 = 0.2;
    pub const ORDER_BONUS_POSITIONS: usize = 3;
    pub const TOKEN_WEIGHT: f64 = 0.7;
    pub const CHAR_WEIGHT: f64 = 0.3;
}

impl MatchTuning {
    /// Reject values that would let a non-exact pair score 1.0 or push
    /// scores outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(LinkerError::Config {
                    message: format!("matching.tuning.{} must be within [0, 1], got {}", name, value),
                })
            }
        };
        unit("order_bonus_weight", self.order_bonus_weight)?;
        unit("token_weight", self.token_weight)?;
        unit("char_weight", self.char_weight)?;

        if !(0.0..1.0).contains(&self.exact_match_cap) {
            return Err(LinkerError::Config {
                message: format!(
                    "matching.tuning.exact_match_cap must be within [0, 1), got {}",
                    self.exact_match_cap
                ),
            });
        }
        if self.token_weight + self.char_weight > 1.0 + f64::EPSILON {
            return Err(LinkerError::Config {
                message: format!(
                    "matching.tuning.token_weight + char_weight must not exceed 1, got {}",
                    self.token_weight + self.char_weight
                ),
            });
        }
        Ok(())
    }
}

impl Default for MatchTuning {
    fn default() -> Self {
        Self {
            exact_match_cap: Self::EXACT_MATCH_CAP,
            order_bonus_weight: Self::ORDER_BONUS_WEIGHT,
            order_bonus_positions: Self::ORDER_BONUS_POSITIONS,
            token_weight: Self::TOKEN_WEIGHT,
            char_weight: Self::CHAR_WEIGHT,
        }
    }
}

/// `cache:` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub filename: String,
    pub auto_refresh: bool,
    /// Zero refreshes on every startup.
    pub refresh_interval_hours: f64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            filename: LinkerConfig::CACHE_FILENAME.to_string(),
            auto_refresh: true,
            refresh_interval_hours: 0.0,
        }
    }
}

/// `scanning:` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Zero means unlimited depth.
    pub max_depth: usize,
    pub follow_symlinks: bool,
    pub skip_hidden: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_depth: 0,
            follow_symlinks: true,
            skip_hidden: true,
        }
    }
}

/// Contents of `model_linker_config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkerSettings {
    pub additional_directories: Vec<PathBuf>,
    pub cache: CacheSettings,
    pub scanning: ScanSettings,
    pub matching: MatchOptions,
}

impl LinkerSettings {
    /// Parse settings from a YAML string.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(contents)?;
        settings.matching.tuning.validate()?;
        Ok(settings)
    }

    /// Load settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| LinkerError::io_with_path(e, path))?;
        Self::from_yaml(&contents).map_err(|e| LinkerError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })
    }

    /// Candidate config file locations in priority order.
    pub fn search_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(path) = explicit {
            paths.push(path.to_path_buf());
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(
                config_dir
                    .join(LinkerConfig::CONFIG_DIR_NAME)
                    .join(LinkerConfig::CONFIG_FILENAME),
            );
        }
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join(LinkerConfig::CONFIG_FILENAME));
        }
        paths
    }

    /// Find and load the first existing config file.
    ///
    /// Returns the settings and the file they came from. A file that fails to
    /// parse is logged and defaults are used instead.
    pub fn discover(explicit: Option<&Path>) -> (Self, Option<PathBuf>) {
        let Some(path) = Self::search_paths(explicit)
            .into_iter()
            .find(|p| p.is_file())
        else {
            debug!("No config file found, using defaults");
            return (Self::default(), None);
        };

        match Self::load(&path) {
            Ok(settings) => {
                info!("Loaded config from {}", path.display());
                (settings, Some(path))
            }
            Err(e) => {
                warn!("Failed to load config {}: {}", path.display(), e);
                (Self::default(), Some(path))
            }
        }
    }

    /// Resolve `additional_directories` to existing absolute directories.
    ///
    /// Relative entries resolve against `base_dir` (the config file's directory)
    /// or the working directory when no config file was used.
    pub fn resolve_additional_directories(&self, base_dir: Option<&Path>) -> Vec<PathBuf> {
        let base = base_dir
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();

        self.additional_directories
            .iter()
            .filter(|p| !p.as_os_str().is_empty())
            .filter_map(|p| {
                let joined = if p.is_absolute() { p.clone() } else { base.join(p) };
                match joined.canonicalize() {
                    Ok(abs) if abs.is_dir() => {
                        debug!("Added additional directory: {}", abs.display());
                        Some(abs)
                    }
                    _ => {
                        warn!(
                            "Additional directory not found or invalid: {}",
                            p.display()
                        );
                        None
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::TieBreak;
    use tempfile::TempDir;

    #[test]
    fn test_model_extensions() {
        assert!(is_model_extension(".safetensors"));
        assert!(is_model_extension(".CKPT"));
        assert!(!is_model_extension(".txt"));
        assert!(!is_model_extension("safetensors"));
    }

    #[test]
    fn test_asset_categories() {
        assert!(is_asset_category("checkpoints"));
        assert!(!is_asset_category("custom_nodes"));
        assert!(!is_asset_category("configs"));
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let settings = LinkerSettings::from_yaml("").unwrap();
        assert_eq!(settings, LinkerSettings::default());
        assert!(settings.cache.enabled);
        assert_eq!(settings.matching.max_results, 10);
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let yaml = r#"
cache:
  refresh_interval_hours: 12
scanning:
  skip_hidden: false
matching:
  max_results: 3
  tie_break: input_order
  tuning:
    order_bonus_weight: 0.1
"#;
        let settings = LinkerSettings::from_yaml(yaml).unwrap();
        assert_eq!(settings.cache.refresh_interval_hours, 12.0);
        assert!(settings.cache.auto_refresh);
        assert_eq!(settings.cache.filename, LinkerConfig::CACHE_FILENAME);
        assert!(!settings.scanning.skip_hidden);
        assert!(settings.scanning.follow_symlinks);
        assert_eq!(settings.matching.max_results, 3);
        assert_eq!(settings.matching.tie_break, TieBreak::InputOrder);
        assert_eq!(settings.matching.tuning.order_bonus_weight, 0.1);
        assert_eq!(
            settings.matching.tuning.exact_match_cap,
            MatchTuning::EXACT_MATCH_CAP
        );
    }

    #[test]
    fn test_tuning_that_allows_non_exact_one_is_rejected() {
        for yaml in [
            "matching:\n  tuning:\n    exact_match_cap: 1.0\n    token_weight: 1.0\n    char_weight: 0.0\n",
            "matching:\n  tuning:\n    token_weight: 0.9\n    char_weight: 0.9\n",
            "matching:\n  tuning:\n    order_bonus_weight: -0.5\n",
        ] {
            let err = LinkerSettings::from_yaml(yaml).unwrap_err();
            assert!(matches!(err, LinkerError::Config { .. }), "{}", yaml);
        }

        let settings = LinkerSettings::from_yaml(
            "matching:\n  tuning:\n    exact_match_cap: 0.95\n    token_weight: 1.0\n    char_weight: 0.0\n",
        )
        .unwrap();
        assert_eq!(settings.matching.tuning.exact_match_cap, 0.95);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(LinkerConfig::CONFIG_FILENAME);
        std::fs::write(&path, "cache: [not, a, mapping]").unwrap();

        let err = LinkerSettings::load(&path).unwrap_err();
        assert!(matches!(err, LinkerError::Config { .. }));
    }

    #[test]
    fn test_discover_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.yaml");
        std::fs::write(&path, "matching:\n  threshold: 0.4\n").unwrap();

        let (settings, source) = LinkerSettings::discover(Some(&path));
        assert_eq!(source.as_deref(), Some(path.as_path()));
        assert_eq!(settings.matching.threshold, 0.4);
    }

    #[test]
    fn test_resolve_additional_directories() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("extra")).unwrap();

        let settings = LinkerSettings {
            additional_directories: vec![PathBuf::from("extra"), PathBuf::from("missing")],
            ..Default::default()
        };

        let resolved = settings.resolve_additional_directories(Some(temp_dir.path()));
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].ends_with("extra"));
    }
}
