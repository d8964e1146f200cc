//! Workflow analysis: find every model a workflow references and check
//! whether it exists locally.
//!
//! ```text
//! document ── WorkflowFormat::detect ──┬── Api   → ApiExtractor
//!                                      ├── Graph → GraphExtractor (+ subgraphs)
//!                                      └── Unknown → no references, one warning
//!                                                  │
//!                              CategoryResolver (hint, else every asset category)
//!                                                  │
//!                                        Vec<AssetReference>
//! ```
//!
//! The registry is passed in on every call; nothing here holds global state.

mod apply;
mod extract;
mod format;
mod hints;
mod resolve;

pub use apply::{apply_resolutions, ApplyOutcome};
pub use extract::{ApiExtractor, Extraction, GraphExtractor, ReferenceExtractor};
pub use format::WorkflowFormat;
pub use hints::{
    category_hint, is_model_field, is_model_filename, MODEL_INPUT_FIELDS, NODE_CATEGORY_HINTS,
};
pub use resolve::{CategoryResolver, Resolved, UNKNOWN_CATEGORY};

use crate::models::AssetReference;
use crate::registry::AssetRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Result of analyzing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub format: WorkflowFormat,
    pub references: Vec<AssetReference>,
    pub warnings: Vec<String>,
}

impl WorkflowFormat {
    /// Extraction strategy for this shape.
    pub fn extractor(self) -> Option<&'static dyn ReferenceExtractor> {
        match self {
            WorkflowFormat::Api => Some(&ApiExtractor),
            WorkflowFormat::Graph => Some(&GraphExtractor),
            WorkflowFormat::Unknown => None,
        }
    }
}

/// Extract and resolve every model reference in `document`.
pub fn analyze(document: &Value, registry: &dyn AssetRegistry) -> Analysis {
    let format = WorkflowFormat::detect(document);
    info!("Detected workflow format: {}", format);

    let Some(extractor) = format.extractor() else {
        let message = "Unknown workflow format; no model references extracted".to_string();
        warn!("{}", message);
        return Analysis {
            format,
            references: Vec::new(),
            warnings: vec![message],
        };
    };

    let resolver = CategoryResolver::new(registry);
    let Extraction {
        references,
        warnings,
    } = extractor.extract(document, &resolver);
    info!("Found {} model references", references.len());

    Analysis {
        format,
        references,
        warnings,
    }
}

/// References whose file was not found.
pub fn identify_missing(references: &[AssetReference]) -> Vec<AssetReference> {
    references.iter().filter(|r| r.is_missing()).cloned().collect()
}
