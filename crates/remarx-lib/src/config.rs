use crate::error::{RemarxError, Result};

/// Sentence-transformer model used when none is requested explicitly.
pub const DEFAULT_MODEL_NAME: &str = "paraphrase-multilingual-mpnet-base-v2";

/// Pseudo model name selecting the token-hashing encoder, which needs no
/// model files. Useful for offline smoke runs.
pub const HASH_MODEL_NAME: &str = "hash";

/// Dimension of the hashing encoder's vectors.
pub const HASH_EMBEDDING_DIMENSION: usize = 768;

/// Number of sentences handed to the embedding model per batch.
pub const EMBEDDING_BATCH_SIZE: usize = 64;

/// Minimum similarity for a nearest neighbor to count as a quotation.
///
/// Documented API default. Exploratory tuning has landed anywhere between 0.2
/// and 0.45 depending on model and metric, so callers should choose one.
pub const DEFAULT_SCORE_CUTOFF: f32 = 0.8;

/// Number of trees in the nearest-neighbor forest.
pub const DEFAULT_N_TREES: usize = 10;

/// Maximum number of items kept in a single forest leaf.
pub const DEFAULT_LEAF_SIZE: usize = 32;

/// Required sentence-table columns.
pub const ID_COLUMN: &str = "sent_id";
pub const FILE_COLUMN: &str = "file";
pub const TEXT_COLUMN: &str = "text";

/// Separator of the constituent id lists in consolidated output. Sentence
/// ids may not contain it.
pub const ID_SEPARATOR: &str = ";";

/// File name of the embedding cache database.
pub const CACHE_DB_FILENAME: &str = "embeddings.db";

/// Tunable parameters of the pair matcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchParams {
    /// Matches must score strictly above this value.
    pub score_cutoff: f32,
    /// Trees built in the nearest-neighbor forest.
    pub n_trees: usize,
    /// Candidate budget per query; `None` means `n_trees * k * leaf_size`.
    pub search_k: Option<usize>,
    /// Seed making index construction reproducible.
    pub random_seed: Option<u64>,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            score_cutoff: DEFAULT_SCORE_CUTOFF,
            n_trees: DEFAULT_N_TREES,
            search_k: None,
            random_seed: None,
        }
    }
}

impl MatchParams {
    /// Reject parameters that would make the search meaningless.
    ///
    /// Runs before any embedding work is started.
    pub fn validate(&self) -> Result<()> {
        if !self.score_cutoff.is_finite() || !(-1.0..=1.0).contains(&self.score_cutoff) {
            return Err(RemarxError::InvalidConfig(format!(
                "score cutoff must be within [-1, 1], got {}",
                self.score_cutoff
            )));
        }
        if self.n_trees == 0 {
            return Err(RemarxError::InvalidConfig(
                "number of trees must be positive".to_string(),
            ));
        }
        if self.search_k == Some(0) {
            return Err(RemarxError::InvalidConfig(
                "search_k must be positive when given".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        MatchParams::default().validate().unwrap();
    }

    #[test]
    fn cutoff_outside_similarity_range_is_rejected() {
        for cutoff in [1.5, -1.01, f32::NAN, f32::INFINITY] {
            let params = MatchParams {
                score_cutoff: cutoff,
                ..MatchParams::default()
            };
            assert!(matches!(
                params.validate(),
                Err(RemarxError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn cutoff_bounds_are_accepted() {
        for cutoff in [-1.0, 0.0, 0.225, 1.0] {
            let params = MatchParams {
                score_cutoff: cutoff,
                ..MatchParams::default()
            };
            params.validate().unwrap();
        }
    }

    #[test]
    fn zero_trees_is_rejected() {
        let params = MatchParams {
            n_trees: 0,
            ..MatchParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(RemarxError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_search_k_is_rejected() {
        let params = MatchParams {
            search_k: Some(0),
            ..MatchParams::default()
        };
        assert!(params.validate().is_err());
    }
}
