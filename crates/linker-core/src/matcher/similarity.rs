//! Blended token/character similarity between two filenames.

use super::normalize::{normalize_filename, tokenize_model_name};
use super::sequence::sequence_ratio;
use crate::config::MatchTuning;
use std::collections::HashSet;

/// Token-set similarity with a bonus for tokens in matching leading positions.
///
/// Jaccard over the token sets plus up to `order_bonus_weight` for the share
/// of the first `order_bonus_positions` positions that agree. The bonus only
/// applies when both sides have more than one token. Capped at 1.0.
pub fn token_similarity(tokens_a: &[String], tokens_b: &[String], tuning: &MatchTuning) -> f64 {
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let set_a: HashSet<&str> = tokens_a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = tokens_b.iter().map(String::as_str).collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    let jaccard = intersection as f64 / union as f64;

    let mut order_bonus = 0.0;
    if tokens_a.len() > 1 && tokens_b.len() > 1 {
        let checked = tuning
            .order_bonus_positions
            .min(tokens_a.len())
            .min(tokens_b.len());
        if checked > 0 {
            let in_place = tokens_a
                .iter()
                .zip(tokens_b)
                .take(checked)
                .filter(|(a, b)| a == b)
                .count();
            order_bonus = in_place as f64 / checked as f64 * tuning.order_bonus_weight;
        }
    }

    (jaccard + order_bonus).min(1.0)
}

/// Character-level similarity of two raw strings.
pub fn char_similarity(a: &str, b: &str) -> f64 {
    sequence_ratio(a, b)
}

/// Weighted blend of token and character similarity.
///
/// Returns exactly 1.0 only when both names normalize to the same string;
/// every other pair is scored as `token_weight * token + char_weight * char`.
pub fn combined_similarity(a: &str, b: &str, tuning: &MatchTuning) -> f64 {
    let norm_a = normalize_filename(a);
    let norm_b = normalize_filename(b);
    if norm_a == norm_b {
        return 1.0;
    }

    let token_sim = token_similarity(&tokenize_model_name(a), &tokenize_model_name(b), tuning);
    let char_sim = char_similarity(&norm_a, &norm_b);

    token_sim * tuning.token_weight + char_sim * tuning.char_weight
}
