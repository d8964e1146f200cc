//! Analysis report combining reference extraction with fuzzy matching.

use crate::matcher::{find_matches, MatchOptions, MatchResult};
use crate::models::{AssetRecord, AssetReference, Resolution};
use crate::registry::AssetRegistry;
use crate::workflow::{analyze, identify_missing, WorkflowFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A missing reference and its ranked replacement candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingAsset {
    pub reference: AssetReference,
    pub matches: Vec<MatchResult>,
}

impl MissingAsset {
    /// Top match when it is a normalized-identical filename.
    pub fn exact_match(&self) -> Option<&MatchResult> {
        self.matches.first().filter(|m| m.is_exact())
    }
}

/// What a workflow needs and what could stand in for the missing parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub format: WorkflowFormat,
    pub total_references: usize,
    pub missing: Vec<MissingAsset>,
    pub warnings: Vec<String>,
}

/// Candidates a missing reference is ranked against.
///
/// Restricted to the reference's category when that category has records;
/// otherwise every record is eligible.
fn candidates_for<'a>(reference: &AssetReference, records: &'a [AssetRecord]) -> Vec<&'a AssetRecord> {
    let in_category: Vec<&AssetRecord> = records
        .iter()
        .filter(|r| r.in_category(&reference.category))
        .collect();
    if in_category.is_empty() {
        records.iter().collect()
    } else {
        in_category
    }
}

/// Analyze `document` and rank local records for every missing reference.
pub fn analyze_and_find_matches(
    document: &Value,
    registry: &dyn AssetRegistry,
    records: &[AssetRecord],
    options: &MatchOptions,
) -> AnalysisReport {
    let analysis = analyze(document, registry);
    let missing = identify_missing(&analysis.references)
        .into_iter()
        .map(|reference| {
            let candidates = candidates_for(&reference, records);
            let matches = find_matches(&reference.original_value, candidates, options);
            debug!(
                "{} ({}): {} candidates",
                reference.original_value,
                reference.describe(),
                matches.len()
            );
            MissingAsset { reference, matches }
        })
        .collect();

    AnalysisReport {
        format: analysis.format,
        total_references: analysis.references.len(),
        missing,
        warnings: analysis.warnings,
    }
}

/// Resolutions for every missing reference whose best match is exact.
///
/// The replacement is the candidate's path relative to its base directory,
/// the form the host lists filenames in.
pub fn auto_resolutions(report: &AnalysisReport) -> Vec<Resolution> {
    report
        .missing
        .iter()
        .filter_map(|missing| {
            let best = missing.exact_match()?;
            Some(Resolution::replace(
                &missing.reference,
                best.candidate.relative_path.clone(),
            ))
        })
        .collect()
}
