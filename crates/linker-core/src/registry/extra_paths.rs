//! `extra_model_paths.yaml` support.
//!
//! The host lets users point categories at extra directories:
//!
//! ```yaml
//! comfyui:
//!   base_path: /mnt/models-share/
//!   is_default: true
//!   checkpoints: checkpoints/
//!   loras: |
//!     loras/
//!     lycoris/
//! ```
//!
//! Each value may hold several newline-separated paths, relative to
//! `base_path` (itself relative to the YAML file). `is_default` sections take
//! precedence over the built-in directories.

use super::folders::FolderPaths;
use crate::error::{LinkerError, Result};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Keys of a section that are not categories.
const RESERVED_KEYS: &[&str] = &["base_path", "is_default"];

/// Map legacy category names to the names the registry uses.
pub fn canonical_category(name: &str) -> &str {
    match name {
        "clip" => "text_encoders",
        "unet" => "diffusion_models",
        other => other,
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

impl FolderPaths {
    /// Merge an `extra_model_paths.yaml` file.
    ///
    /// Returns the number of directories added. Directories that do not exist
    /// are skipped.
    pub fn merge_extra_model_paths(&mut self, yaml_path: &Path) -> Result<usize> {
        let contents = std::fs::read_to_string(yaml_path)
            .map_err(|e| LinkerError::io_with_path(e, yaml_path))?;
        let yaml_dir = yaml_path.parent().unwrap_or(Path::new("."));
        let added = self.merge_extra_model_paths_str(&contents, yaml_dir)?;
        info!(
            "Merged {} extra model directories from {}",
            added,
            yaml_path.display()
        );
        Ok(added)
    }

    /// Merge `extra_model_paths.yaml` contents; relative paths resolve against
    /// `yaml_dir`.
    pub fn merge_extra_model_paths_str(&mut self, contents: &str, yaml_dir: &Path) -> Result<usize> {
        let root: Value = serde_yaml::from_str(contents)?;
        let Value::Mapping(sections) = root else {
            if root.is_null() {
                return Ok(0);
            }
            return Err(LinkerError::Config {
                message: "extra model paths must be a mapping of sections".to_string(),
            });
        };

        let mut added = 0;
        for (section_name, section) in &sections {
            let Value::Mapping(section) = section else {
                debug!("Skipping non-mapping section {:?}", section_name);
                continue;
            };

            let base = match section.get("base_path").and_then(Value::as_str) {
                Some(base) => {
                    let base = expand_home(base);
                    if base.is_absolute() {
                        base
                    } else {
                        yaml_dir.join(base)
                    }
                }
                None => yaml_dir.to_path_buf(),
            };
            let is_default = section
                .get("is_default")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            for (key, value) in section {
                let (Some(category), Some(paths)) = (key.as_str(), value.as_str()) else {
                    continue;
                };
                if RESERVED_KEYS.contains(&category) {
                    continue;
                }
                let category = canonical_category(category);

                for line in paths.lines().map(str::trim).filter(|l| !l.is_empty()) {
                    let dir = base.join(expand_home(line));
                    if !dir.is_dir() {
                        warn!("Extra model path does not exist: {}", dir.display());
                        continue;
                    }
                    let inserted = if is_default {
                        self.prepend_path(category, dir)
                    } else {
                        self.add_path(category, dir)
                    };
                    if inserted {
                        added += 1;
                    }
                }
            }
        }

        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_canonical_category() {
        assert_eq!(canonical_category("clip"), "text_encoders");
        assert_eq!(canonical_category("unet"), "diffusion_models");
        assert_eq!(canonical_category("loras"), "loras");
    }

    #[test]
    fn test_merge_sections() {
        let temp_dir = TempDir::new().unwrap();
        let share = temp_dir.path().join("share");
        for dir in ["checkpoints", "loras", "lycoris", "clip"] {
            std::fs::create_dir_all(share.join(dir)).unwrap();
        }

        let yaml = r#"
shared:
  base_path: share
  checkpoints: checkpoints/
  loras: |
    loras/
    lycoris/
    missing/
  clip: clip
"#;
        let mut folders = FolderPaths::comfyui_defaults(Path::new("/comfy/models"));
        let added = folders
            .merge_extra_model_paths_str(yaml, temp_dir.path())
            .unwrap();
        assert_eq!(added, 4);

        let loras = folders.paths("loras");
        assert_eq!(loras[0], PathBuf::from("/comfy/models/loras"));
        assert_eq!(loras[1], share.join("loras/"));
        assert_eq!(loras[2], share.join("lycoris/"));
        assert!(folders
            .paths("text_encoders")
            .contains(&share.join("clip")));
    }

    #[test]
    fn test_default_section_is_probed_first() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("vae")).unwrap();
        let yaml = format!(
            "primary:\n  base_path: {}\n  is_default: true\n  vae: vae\n",
            temp_dir.path().display()
        );

        let mut folders = FolderPaths::comfyui_defaults(Path::new("/comfy/models"));
        folders
            .merge_extra_model_paths_str(&yaml, Path::new("/"))
            .unwrap();
        assert_eq!(folders.paths("vae")[0], temp_dir.path().join("vae"));
    }

    #[test]
    fn test_empty_and_invalid_documents() {
        let mut folders = FolderPaths::new();
        assert_eq!(
            folders
                .merge_extra_model_paths_str("", Path::new("."))
                .unwrap(),
            0
        );
        assert!(folders
            .merge_extra_model_paths_str("- a\n- b\n", Path::new("."))
            .is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut folders = FolderPaths::new();
        let err = folders
            .merge_extra_model_paths(Path::new("/nonexistent/extra_model_paths.yaml"))
            .unwrap_err();
        assert!(err.is_filesystem());
    }
}
