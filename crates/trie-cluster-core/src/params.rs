//! Parameter sets for one clustering invocation.
//!
//! A [`ParameterSet`] carries every tunable knob of the pipeline. Parameter
//! search harnesses treat it as the genome; configuration files and the CLI
//! fill it in directly.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::base_cluster::{ScoreParams, SortOrder};
use crate::error::{EngineError, EngineResult};
use crate::expansion::ExpansionStrategy;
use crate::similarity::SimilarityMethod;

/// All algorithm parameters of a clustering run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct ParameterSet {
    /// How snippets are expanded before trie insertion.
    pub expansion: ExpansionStrategy,
    /// How many scored base clusters are kept for merging.
    pub top_base_clusters: usize,
    /// Words found in this many sources or fewer do not count towards a score.
    pub min_term_occurrence: usize,
    /// Words found in a larger fraction of sources do not count towards a score.
    pub max_term_ratio: f64,
    /// Labels with this many effective words or fewer score zero.
    pub min_score_limit: usize,
    /// Labels with more effective words score the ceiling value.
    pub max_score_limit: usize,
    /// Remove base clusters with a single source before merging.
    pub drop_singleton_base_clusters: bool,
    /// Remove clusters made of one single-word base cluster.
    pub drop_one_word_clusters: bool,
    /// Similarity used to merge base clusters.
    pub similarity: SimilarityMethod,
    /// Ranking direction for base cluster scores.
    pub sort_order: SortOrder,
    /// Text types to cluster. `None` selects all of them.
    pub text_types: Option<BTreeMap<String, bool>>,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            expansion: ExpansionStrategy::Suffix,
            top_base_clusters: 500,
            min_term_occurrence: 3,
            max_term_ratio: 0.4,
            min_score_limit: 1,
            max_score_limit: 6,
            drop_singleton_base_clusters: false,
            drop_one_word_clusters: false,
            similarity: SimilarityMethod::default(),
            sort_order: SortOrder::Descending,
            text_types: None,
        }
    }
}

impl ParameterSet {
    /// The scoring thresholds.
    pub const fn score_params(&self) -> ScoreParams {
        ScoreParams {
            min_term_occurrence: self.min_term_occurrence,
            max_term_ratio: self.max_term_ratio,
            min_score_limit: self.min_score_limit,
            max_score_limit: self.max_score_limit,
        }
    }

    /// Whether the text type selection leaves nothing to cluster.
    ///
    /// `None` selects everything; an explicit map must enable at least one
    /// text type.
    pub fn selects_no_text_types(&self) -> bool {
        self.text_types
            .as_ref()
            .is_some_and(|selection| !selection.values().any(|&on| on))
    }

    /// Check that the parameters are mutually consistent.
    pub fn validate(&self) -> EngineResult<()> {
        self.expansion.validate()?;
        self.similarity.validate()?;
        if !self.max_term_ratio.is_finite() || self.max_term_ratio < 0.0 {
            return Err(EngineError::InvalidParameters(format!(
                "max_term_ratio must be a non-negative number, got {}",
                self.max_term_ratio
            )));
        }
        if self.min_score_limit > self.max_score_limit {
            return Err(EngineError::InvalidParameters(format!(
                "min_score_limit ({}) exceeds max_score_limit ({})",
                self.min_score_limit, self.max_score_limit
            )));
        }
        Ok(())
    }
}
