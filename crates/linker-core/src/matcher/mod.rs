//! Fuzzy filename matcher.
//!
//! Scores how likely a local asset is the file a workflow asked for, using
//! only filenames:
//!
//! ```text
//! normalize / tokenize        (normalize.rs)
//!     │
//!     ├── token_similarity    Jaccard + leading-position bonus
//!     ├── char_similarity     longest-matching-blocks ratio (sequence.rs)
//!     │
//! combined_similarity         0.7 * token + 0.3 * char, 1.0 only for exact
//!     │
//! find_matches                threshold, sort, truncate   (ranking.rs)
//! ```

mod normalize;
mod ranking;
mod sequence;
mod similarity;

pub use normalize::{
    basename, normalize_filename, split_extension, strip_extension, tokenize_model_name,
};
pub use ranking::{
    confidence_percent, find_matches, score_filename, MatchOptions, MatchResult, TieBreak,
};
pub use sequence::{sequence_ratio, Block, SequenceMatcher};
pub use similarity::{char_similarity, combined_similarity, token_similarity};
