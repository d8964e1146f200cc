//! Workflow analysis and relinking methods on ModelLinker.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::linker::{analyze_and_find_matches, auto_resolutions, AnalysisReport};
use crate::models::Resolution;
use crate::workflow::{apply_resolutions, ApplyOutcome};
use crate::ModelLinker;

/// Resolutions chosen automatically and the document they produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoResolveOutcome {
    pub resolutions: Vec<Resolution>,
    #[serde(flatten)]
    pub outcome: ApplyOutcome,
}

impl ModelLinker {
    // ========================================
    // Workflow Methods
    // ========================================

    /// Find missing models in `document` and rank local replacements.
    pub async fn analyze(&self, document: &Value) -> Result<AnalysisReport> {
        let records = self.get_models(true).await?;
        Ok(analyze_and_find_matches(
            document,
            self.state.folders.as_ref(),
            &records,
            &self.state.settings.matching,
        ))
    }

    /// Rewrite a copy of `document` with the given resolutions.
    pub fn apply(&self, document: &Value, resolutions: &[Resolution]) -> ApplyOutcome {
        apply_resolutions(document, resolutions)
    }

    /// Relink every missing model that has an exact filename match elsewhere
    /// in the library.
    pub async fn auto_resolve(&self, document: &Value) -> Result<AutoResolveOutcome> {
        let report = self.analyze(document).await?;
        let resolutions = auto_resolutions(&report);
        info!(
            "Auto-resolved {} of {} missing models",
            resolutions.len(),
            report.missing.len()
        );

        let mut outcome = apply_resolutions(document, &resolutions);
        outcome.warnings.splice(0..0, report.warnings);
        Ok(AutoResolveOutcome {
            resolutions,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::LinkerSettings;
    use crate::ModelLinker;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_auto_resolve_relinks_moved_file() {
        let temp_dir = TempDir::new().unwrap();
        let sdxl = temp_dir.path().join("models").join("checkpoints").join("sdxl");
        std::fs::create_dir_all(&sdxl).unwrap();
        std::fs::write(sdxl.join("juggernaut_XL.safetensors"), b"x").unwrap();

        let linker = ModelLinker::builder(temp_dir.path().join("models"))
            .with_settings(LinkerSettings::default())
            .with_cache_path(temp_dir.path().join("cache.json"))
            .build()
            .unwrap();

        let doc = json!({
            "4": {"class_type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "Juggernaut-XL.safetensors"}}
        });

        let report = linker.analyze(&doc).await.unwrap();
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].matches[0].similarity, 1.0);

        let auto = linker.auto_resolve(&doc).await.unwrap();
        assert_eq!(auto.resolutions.len(), 1);
        assert_eq!(auto.outcome.applied, 1);
        let expected = std::path::Path::new("sdxl")
            .join("juggernaut_XL.safetensors")
            .to_string_lossy()
            .to_string();
        assert_eq!(auto.outcome.workflow["4"]["inputs"]["ckpt_name"], expected);

        // Relinked document resolves cleanly
        let report = linker.analyze(&auto.outcome.workflow).await.unwrap();
        assert!(report.missing.is_empty());
        assert_eq!(report.total_references, 1);
    }
}
