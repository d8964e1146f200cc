//! Ranking candidate assets against a missing filename.

use super::normalize::{basename, normalize_filename, strip_extension};
use super::similarity::combined_similarity;
use crate::config::MatchTuning;
use crate::models::AssetRecord;
use serde::{Deserialize, Serialize};

/// Ordering applied among candidates with equal similarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep the order the candidates were supplied in.
    InputOrder,
    /// Order by candidate filename, then absolute path.
    #[default]
    Filename,
}

/// Options for [`find_matches`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Minimum similarity a candidate needs to be returned.
    pub threshold: f64,
    pub max_results: usize,
    pub tie_break: TieBreak,
    pub tuning: MatchTuning,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            max_results: 10,
            tie_break: TieBreak::default(),
            tuning: MatchTuning::default(),
        }
    }
}

/// One scored candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub candidate: AssetRecord,
    pub filename: String,
    /// Similarity in `[0, 1]`; 1.0 only for normalized-identical names.
    pub similarity: f64,
    /// `similarity` as a percentage rounded to one decimal.
    pub confidence: f64,
    /// Target and candidate normalize to the same name.
    #[serde(default)]
    pub exact: bool,
}

impl MatchResult {
    /// Decided by name equality, never by the score, so tuning cannot turn
    /// a near match into an exact one.
    pub fn is_exact(&self) -> bool {
        self.exact
    }
}

/// Percentage with one decimal place, exact halves rounded to even.
///
/// Only products that are exactly a half in binary tie. A product landing
/// just beside a half rounds by the value actually computed, which can
/// differ from decimal rounding of the written similarity.
pub fn confidence_percent(similarity: f64) -> f64 {
    (similarity * 1000.0).round_ties_even() / 10.0
}

/// Ceiling for non-exact scores: the configured cap, never above the default.
fn effective_cap(tuning: &MatchTuning) -> f64 {
    tuning.exact_match_cap.min(MatchTuning::EXACT_MATCH_CAP)
}

fn is_exact_pair(target_filename: &str, candidate_filename: &str) -> bool {
    normalize_filename(candidate_filename) == normalize_filename(target_filename)
}

/// Filename a candidate is compared by, if it has one.
fn candidate_filename(candidate: &AssetRecord) -> Option<&str> {
    if !candidate.filename.is_empty() {
        return Some(candidate.filename.as_str());
    }
    [&candidate.absolute_path, &candidate.relative_path]
        .into_iter()
        .map(|p| basename(p))
        .find(|name| !name.is_empty())
}

/// Score one candidate filename against the target filename.
///
/// Both the full names and the names without extension are scored and the
/// higher value kept. A pair whose normalized forms differ never reaches 1.0.
pub fn score_filename(target_filename: &str, candidate_filename: &str, tuning: &MatchTuning) -> f64 {
    if is_exact_pair(target_filename, candidate_filename) {
        return 1.0;
    }

    let with_ext = combined_similarity(target_filename, candidate_filename, tuning);
    let without_ext = combined_similarity(
        strip_extension(target_filename),
        strip_extension(candidate_filename),
        tuning,
    );

    with_ext.max(without_ext).min(effective_cap(tuning))
}

/// Rank candidates by similarity to `target_name`.
///
/// Only the final path component of `target_name` is compared. Candidates
/// without a usable filename are skipped. Results are sorted by descending
/// similarity, filtered by `options.threshold` and truncated to
/// `options.max_results`.
pub fn find_matches<'a, I>(target_name: &str, candidates: I, options: &MatchOptions) -> Vec<MatchResult>
where
    I: IntoIterator<Item = &'a AssetRecord>,
{
    if options.max_results == 0 {
        return Vec::new();
    }

    let target_filename = basename(target_name);

    let mut matches: Vec<MatchResult> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let filename = candidate_filename(candidate)?;
            let similarity = score_filename(target_filename, filename, &options.tuning);
            (similarity >= options.threshold).then(|| MatchResult {
                candidate: candidate.clone(),
                filename: filename.to_string(),
                similarity,
                confidence: confidence_percent(similarity),
                exact: is_exact_pair(target_filename, filename),
            })
        })
        .collect();

    // sort_by is stable, so InputOrder keeps supply order among ties
    matches.sort_by(|a, b| {
        let by_score = b.similarity.total_cmp(&a.similarity);
        match options.tie_break {
            TieBreak::InputOrder => by_score,
            TieBreak::Filename => by_score
                .then_with(|| a.filename.cmp(&b.filename))
                .then_with(|| a.candidate.absolute_path.cmp(&b.candidate.absolute_path)),
        }
    });
    matches.truncate(options.max_results);

    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(filename: &str, category: &str) -> AssetRecord {
        AssetRecord {
            filename: filename.to_string(),
            absolute_path: format!("/models/{}/{}", category, filename),
            relative_path: filename.to_string(),
            category: category.to_string(),
            base_directory: format!("/models/{}", category),
        }
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let candidates = vec![record("model.ckpt", "checkpoints")];
        let matches = find_matches("MODEL.CKPT", &candidates, &MatchOptions::default());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].similarity, 1.0);
        assert_eq!(matches[0].confidence, 100.0);
        assert!(matches[0].is_exact());
    }

    #[test]
    fn test_near_match_is_capped_below_exact() {
        let candidates = vec![record("sd_xl_base_1.safetensors", "checkpoints")];
        let matches = find_matches(
            "sd_xl_base_1.0.safetensors",
            &candidates,
            &MatchOptions::default(),
        );
        assert_eq!(matches.len(), 1);
        assert!(matches[0].similarity > 0.5);
        assert!(matches[0].similarity < 0.999 + f64::EPSILON);
        assert!(!matches[0].is_exact());
    }

    #[test]
    fn test_cap_applies_when_score_reaches_one() {
        // Normalized forms differ ("a b" vs "a.b") while the tokens agree.
        let tuning = MatchTuning {
            token_weight: 1.0,
            char_weight: 0.0,
            ..MatchTuning::default()
        };
        let score = score_filename("a_b.pt", "a.b.pt", &tuning);
        assert_eq!(score, MatchTuning::EXACT_MATCH_CAP);
    }

    #[test]
    fn test_configured_cap_cannot_reach_one() {
        let tuning = MatchTuning {
            exact_match_cap: 1.0,
            token_weight: 1.0,
            char_weight: 0.0,
            ..MatchTuning::default()
        };
        let score = score_filename("a_b.safetensors", "a.b.safetensors", &tuning);
        assert!(score < 1.0);
        assert_eq!(score, MatchTuning::EXACT_MATCH_CAP);

        // A lower cap still applies
        let strict = MatchTuning {
            exact_match_cap: 0.9,
            ..tuning
        };
        assert_eq!(score_filename("a_b.safetensors", "a.b.safetensors", &strict), 0.9);
    }

    #[test]
    fn test_is_exact_follows_names_not_score() {
        let options = MatchOptions {
            tuning: MatchTuning {
                exact_match_cap: 1.0,
                token_weight: 1.0,
                char_weight: 0.0,
                ..MatchTuning::default()
            },
            ..MatchOptions::default()
        };
        let candidates = vec![
            record("a.b.safetensors", "loras"),
            record("A-B.safetensors", "loras"),
        ];
        let matches = find_matches("a_b.safetensors", &candidates, &options);
        assert_eq!(matches[0].filename, "A-B.safetensors");
        assert!(matches[0].is_exact());
        assert!(!matches[1].is_exact());
        assert!(matches[1].similarity < 1.0);
    }

    #[test]
    fn test_target_path_is_reduced_to_filename() {
        let candidates = vec![record("realvis.safetensors", "checkpoints")];
        let matches = find_matches(
            "SDXL\\realvis.safetensors",
            &candidates,
            &MatchOptions::default(),
        );
        assert_eq!(matches[0].similarity, 1.0);
    }

    #[test]
    fn test_sorted_thresholded_and_truncated() {
        let candidates = vec![
            record("unrelated_thing.pt", "loras"),
            record("anime_style_v1.safetensors", "loras"),
            record("anime_style_v2.safetensors", "loras"),
            record("anime_style.safetensors", "loras"),
        ];
        let options = MatchOptions {
            threshold: 0.3,
            max_results: 2,
            ..MatchOptions::default()
        };
        let matches = find_matches("anime_style_v2.safetensors", &candidates, &options);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].filename, "anime_style_v2.safetensors");
        assert!(matches
            .windows(2)
            .all(|w| w[0].similarity >= w[1].similarity));
        assert!(matches.iter().all(|m| m.similarity >= 0.3));
    }

    #[test]
    fn test_max_results_zero() {
        let candidates = vec![record("a.pt", "loras"), record("b.pt", "loras")];
        let options = MatchOptions {
            max_results: 0,
            ..MatchOptions::default()
        };
        assert!(find_matches("a.pt", &candidates, &options).is_empty());
    }

    #[test]
    fn test_candidates_without_filename_fall_back_or_skip() {
        let mut from_path = record("", "vae");
        from_path.absolute_path = "/models/vae/sdxl_vae.safetensors".into();
        let mut nameless = record("", "vae");
        nameless.absolute_path = String::new();
        nameless.relative_path = String::new();

        let candidates = vec![from_path, nameless];
        let matches = find_matches("sdxl_vae.safetensors", &candidates, &MatchOptions::default());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].filename, "sdxl_vae.safetensors");
    }

    #[test]
    fn test_tie_break_orders() {
        let candidates = vec![record("b_model.pt", "loras"), record("a_model.pt", "loras")];

        let by_name = find_matches("model.pt", &candidates, &MatchOptions::default());
        assert_eq!(by_name[0].similarity, by_name[1].similarity);
        assert_eq!(by_name[0].filename, "a_model.pt");

        let options = MatchOptions {
            tie_break: TieBreak::InputOrder,
            ..MatchOptions::default()
        };
        let by_input = find_matches("model.pt", &candidates, &options);
        assert_eq!(by_input[0].filename, "b_model.pt");
    }

    #[test]
    fn test_confidence_rounding() {
        assert_eq!(confidence_percent(1.0), 100.0);
        assert_eq!(confidence_percent(0.999), 99.9);
        assert_eq!(confidence_percent(0.12345), 12.3);
        assert_eq!(confidence_percent(0.0), 0.0);
    }

    #[test]
    fn test_confidence_halves_round_to_even() {
        assert_eq!(confidence_percent(0.8125), 81.2);
        assert_eq!(confidence_percent(0.0125), 1.2);
        assert_eq!(confidence_percent(0.5625), 56.2);
        assert_eq!(confidence_percent(0.1875), 18.8);
    }
}
