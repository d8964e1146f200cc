//! Resolving a referenced filename against the asset registry.

use crate::config::is_asset_category;
use crate::registry::AssetRegistry;
use std::path::PathBuf;
use tracing::debug;

/// Category assigned when a reference has no hint and no file was found.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Outcome of probing the registry for one value.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub category: String,
    pub path: Option<PathBuf>,
}

impl Resolved {
    pub fn exists(&self) -> bool {
        self.path.is_some()
    }
}

/// Ordered category probe over an injected registry.
///
/// A hinted reference probes only its hint. Anything else probes every
/// registry category in the registry's order, minus non-asset categories.
pub struct CategoryResolver<'a> {
    registry: &'a dyn AssetRegistry,
    asset_categories: Vec<String>,
}

impl<'a> CategoryResolver<'a> {
    pub fn new(registry: &'a dyn AssetRegistry) -> Self {
        let asset_categories = registry
            .categories()
            .into_iter()
            .filter(|c| is_asset_category(c))
            .collect();
        Self {
            registry,
            asset_categories,
        }
    }

    /// Categories probed for a value, in order.
    pub fn probe_order<'h>(&'h self, hint: Option<&'h str>) -> Vec<&'h str> {
        match hint {
            Some(hint) if is_asset_category(hint) => vec![hint],
            Some(_) => Vec::new(),
            None => self.asset_categories.iter().map(String::as_str).collect(),
        }
    }

    /// First category holding `value`, else the hint (or `"unknown"`) with no
    /// path.
    pub fn resolve(&self, value: &str, hint: Option<&str>) -> Resolved {
        let filename = value.trim();
        if !filename.is_empty() {
            for category in self.probe_order(hint) {
                if let Some(path) = self.registry.locate(category, filename) {
                    debug!("Resolved {} in {} -> {}", filename, category, path.display());
                    return Resolved {
                        category: category.to_string(),
                        path: Some(path),
                    };
                }
            }
        }

        Resolved {
            category: hint.unwrap_or(UNKNOWN_CATEGORY).to_string(),
            path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FolderPaths;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, FolderPaths) {
        let temp_dir = TempDir::new().unwrap();
        let models = temp_dir.path().join("models");
        for (dir, file) in [
            ("checkpoints", "base.safetensors"),
            ("loras", "detail.safetensors"),
            ("configs", "v1.safetensors"),
        ] {
            std::fs::create_dir_all(models.join(dir)).unwrap();
            std::fs::write(models.join(dir).join(file), b"x").unwrap();
        }
        let folders = FolderPaths::comfyui_defaults(&models);
        (temp_dir, folders)
    }

    #[test]
    fn test_hinted_reference_probes_only_hint() {
        let (_temp_dir, folders) = fixture();
        let resolver = CategoryResolver::new(&folders);

        let found = resolver.resolve("base.safetensors", Some("checkpoints"));
        assert_eq!(found.category, "checkpoints");
        assert!(found.exists());

        // Present in loras, but the node said checkpoints
        let missing = resolver.resolve("detail.safetensors", Some("checkpoints"));
        assert_eq!(missing.category, "checkpoints");
        assert!(!missing.exists());
    }

    #[test]
    fn test_unhinted_reference_probes_all_asset_categories() {
        let (_temp_dir, folders) = fixture();
        let resolver = CategoryResolver::new(&folders);

        let found = resolver.resolve(" detail.safetensors ", None);
        assert_eq!(found.category, "loras");

        // configs is never probed
        let skipped = resolver.resolve("v1.safetensors", None);
        assert_eq!(skipped.category, UNKNOWN_CATEGORY);
        assert!(skipped.path.is_none());

        assert!(!resolver.probe_order(None).contains(&"custom_nodes"));
        assert_eq!(resolver.probe_order(None)[0], "checkpoints");
    }

    #[test]
    fn test_empty_value_is_unresolved() {
        let (_temp_dir, folders) = fixture();
        let resolver = CategoryResolver::new(&folders);
        let resolved = resolver.resolve("   ", Some("vae"));
        assert_eq!(resolved.category, "vae");
        assert!(!resolved.exists());
    }
}
