//! Base cluster extraction and scoring.
//!
//! Every trie node below the root yields one base cluster: its full path
//! label plus the sources recorded anywhere in its subtree. Base clusters
//! are scored by how many of their label words are neither too rare nor
//! too common in the corpus, and only the best ones go on to merging.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::corpus::{SourceId, WordIndex};
use crate::trie::{CompactTrie, NodeId};

/// Score returned by [`score_function`] once a label has more effective
/// words than the upper limit.
pub const SCORE_CEILING: f64 = 7.0;

/// A candidate cluster derived from one trie node.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseCluster {
    /// Creation sequence number within one extraction.
    pub id: usize,
    /// Full phrase from the trie root to the node.
    pub label: Vec<String>,
    /// Sources of the node and all of its descendants.
    pub sources: BTreeSet<SourceId>,
    /// Score assigned by [`top_base_clusters`]; zero until then.
    pub score: f64,
}

impl BaseCluster {
    /// Number of distinct sources.
    pub fn size(&self) -> usize {
        self.sources.len()
    }
}

/// Direction in which scored base clusters are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum SortOrder {
    /// Best scores first.
    #[default]
    Descending,
    /// Worst scores first.
    Ascending,
}

/// Thresholds used by [`score`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreParams {
    /// A word counts only if more sources than this contain it.
    pub min_term_occurrence: usize,
    /// A word counts only if at most this fraction of sources contain it.
    pub max_term_ratio: f64,
    /// Labels with this many effective words or fewer score zero.
    pub min_score_limit: usize,
    /// Labels with more effective words than this score [`SCORE_CEILING`].
    pub max_score_limit: usize,
}

/// Extract one base cluster per trie node.
///
/// Descendants are listed before their ancestors. Ids follow creation
/// order, so an ancestor's id is always lower than its descendants'.
#[tracing::instrument(skip_all, fields(nodes = trie.len()))]
pub fn extract_base_clusters(trie: &CompactTrie) -> Vec<BaseCluster> {
    let mut out = Vec::with_capacity(trie.len().saturating_sub(1));
    let mut next_id = 0;
    for &child in trie.children(trie.root()) {
        extract_subtree(trie, child, &mut next_id, &mut out);
    }
    tracing::debug!(base_clusters = out.len(), "base clusters extracted");
    out
}

fn extract_subtree(
    trie: &CompactTrie,
    node: NodeId,
    next_id: &mut usize,
    out: &mut Vec<BaseCluster>,
) -> usize {
    let id = *next_id;
    *next_id += 1;
    let mut sources: BTreeSet<SourceId> = trie.sources(node).keys().copied().collect();
    for &child in trie.children(node) {
        let position = extract_subtree(trie, child, next_id, out);
        sources.extend(out[position].sources.iter().copied());
    }
    out.push(BaseCluster {
        id,
        label: trie.node_label(node),
        sources,
        score: 0.0,
    });
    out.len() - 1
}

/// Count label words that are neither too rare nor too common.
///
/// A word is effective when more than `min_in_collection` sources contain
/// it and at most `max_ratio` of all sources do.
#[allow(clippy::cast_precision_loss)]
pub fn effective_words(
    label: &[String],
    words: &WordIndex,
    min_in_collection: usize,
    max_ratio: f64,
) -> usize {
    let no_of_sources = words.no_of_sources();
    if no_of_sources == 0 {
        return 0;
    }
    label
        .iter()
        .filter(|word| {
            let df = words.document_frequency(word);
            df > min_in_collection && (df as f64 / no_of_sources as f64) <= max_ratio
        })
        .count()
}

/// Plateau-shaped length reward.
#[allow(clippy::cast_precision_loss)]
pub fn score_function(n: usize, min_limit: usize, max_limit: usize) -> f64 {
    if n <= min_limit {
        0.0
    } else if n > max_limit {
        SCORE_CEILING
    } else {
        n as f64
    }
}

/// Score of a base cluster: size times the length reward of its label.
#[allow(clippy::cast_precision_loss)]
pub fn score(base_cluster: &BaseCluster, words: &WordIndex, params: &ScoreParams) -> f64 {
    let n = effective_words(
        &base_cluster.label,
        words,
        params.min_term_occurrence,
        params.max_term_ratio,
    );
    base_cluster.size() as f64 * score_function(n, params.min_score_limit, params.max_score_limit)
}

/// Score every base cluster, rank them, and keep the first `amount`.
///
/// The sort is stable, so equal scores keep extraction order.
#[tracing::instrument(skip_all, fields(candidates = base_clusters.len(), amount = amount, order = ?order))]
pub fn top_base_clusters(
    mut base_clusters: Vec<BaseCluster>,
    words: &WordIndex,
    params: &ScoreParams,
    amount: usize,
    order: SortOrder,
) -> Vec<BaseCluster> {
    for base_cluster in &mut base_clusters {
        base_cluster.score = score(base_cluster, words, params);
    }
    match order {
        SortOrder::Descending => base_clusters.sort_by(|a, b| b.score.total_cmp(&a.score)),
        SortOrder::Ascending => base_clusters.sort_by(|a, b| a.score.total_cmp(&b.score)),
    }
    base_clusters.truncate(amount);
    base_clusters
}

/// Remove base clusters with exactly one source.
pub fn drop_singleton_base_clusters(mut base_clusters: Vec<BaseCluster>) -> Vec<BaseCluster> {
    base_clusters.retain(|bc| bc.size() != 1);
    base_clusters
}
