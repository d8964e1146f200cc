//! Local asset records.

use serde::{Deserialize, Serialize};

/// One model file discovered on local storage.
///
/// Records are snapshots: a rescan produces new records rather than updating
/// old ones. `absolute_path` is unique within one scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Basename only.
    #[serde(default)]
    pub filename: String,
    #[serde(default, rename = "path", alias = "absolute_path")]
    pub absolute_path: String,
    /// Relative to `base_directory`, using the platform's native separator.
    ///
    /// Hosts compare this against their own native-separator file lists, so
    /// it is never rewritten to forward slashes.
    #[serde(default)]
    pub relative_path: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub base_directory: String,
}

impl AssetRecord {
    pub fn in_category(&self, category: &str) -> bool {
        self.category == category
    }
}
