//! The end-to-end clustering pipeline.
//!
//! snippets → expansion → compact trie → scored base clusters → merged
//! components → clusters → metrics. Each call owns every structure it
//! builds, so one [`Clusterer`] can serve many parameter sets, including
//! from several threads at once.

use std::borrow::Cow;
use std::time::Instant;

use tracing::{debug, info};

use crate::base_cluster::{
    BaseCluster, drop_singleton_base_clusters, extract_base_clusters, top_base_clusters,
};
use crate::cluster::{Cluster, assemble_clusters, drop_one_word_clusters};
use crate::components::merge_components;
use crate::corpus::{Corpus, GroundTruthIndex};
use crate::error::EngineResult;
use crate::metrics::{
    OverlapBucket, f_measures, ground_truth_precision, ground_truth_represented,
    overall_f_measure, overall_precision, overall_recall, tag_accuracy,
};
use crate::params::ParameterSet;
use crate::result::{ClusterResult, ResultDetails};
use crate::similarity::SimilarityMeasure;
use crate::trie::CompactTrie;

/// Evaluation settings that stay fixed across parameter sets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterSettings {
    /// Beta of every F-measure.
    pub f_beta: f64,
    /// Leave single-source ground-truth categories out of evaluation.
    pub drop_singleton_ground_truth: bool,
    /// Keep human-readable report text in the result.
    pub store_result_details: bool,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            f_beta: 0.5,
            drop_singleton_ground_truth: true,
            store_result_details: false,
        }
    }
}

/// Runs clustering invocations over one corpus.
#[derive(Debug, Clone, Copy)]
pub struct Clusterer<'a> {
    corpus: &'a Corpus,
    settings: ClusterSettings,
}

impl<'a> Clusterer<'a> {
    /// Create a clusterer for `corpus`.
    pub const fn new(corpus: &'a Corpus, settings: ClusterSettings) -> Self {
        Self { corpus, settings }
    }

    /// The evaluation settings.
    pub const fn settings(&self) -> &ClusterSettings {
        &self.settings
    }

    /// Build the trie for `params` and return the base clusters that would
    /// be merged, best first.
    pub fn base_clusters(&self, params: &ParameterSet) -> EngineResult<Vec<BaseCluster>> {
        params.validate()?;
        if params.selects_no_text_types() {
            return Ok(Vec::new());
        }
        Ok(self.select_base_clusters(params))
    }

    /// Cluster the corpus with one parameter set.
    ///
    /// Degenerate runs (no text types selected, fewer than two base
    /// clusters, no clusters left) yield [`ClusterResult::empty`].
    #[tracing::instrument(
        skip_all,
        fields(expansion = %params.expansion, similarity = %params.similarity)
    )]
    pub fn cluster(&self, params: &ParameterSet) -> EngineResult<ClusterResult> {
        params.validate()?;
        if params.selects_no_text_types() {
            info!("no text types selected");
            return Ok(ClusterResult::empty(0.0, 0));
        }

        let ground_truth = if self.settings.drop_singleton_ground_truth {
            Cow::Owned(self.corpus.ground_truth().drop_singletons())
        } else {
            Cow::Borrowed(self.corpus.ground_truth())
        };

        let start = Instant::now();
        let base_clusters = self.select_base_clusters(params);
        if base_clusters.len() < 2 {
            info!(base_clusters = base_clusters.len(), "too few base clusters to merge");
            return Ok(ClusterResult::empty(
                start.elapsed().as_secs_f64(),
                base_clusters.len(),
            ));
        }

        let measure = SimilarityMeasure::new(params.similarity, self.corpus.words());
        let components = merge_components(&base_clusters, &measure);
        let mut clusters = assemble_clusters(&components);
        if params.drop_one_word_clusters {
            clusters = drop_one_word_clusters(clusters);
        }
        let elapsed_secs = start.elapsed().as_secs_f64();

        if clusters.is_empty() {
            info!("no clusters left after filtering");
            return Ok(ClusterResult::empty(elapsed_secs, base_clusters.len()));
        }

        let result = self.evaluate(params, &ground_truth, &base_clusters, &clusters, elapsed_secs);
        info!(
            clusters = result.clusters,
            precision = result.precision,
            recall = result.recall,
            f_measure = result.f_measure,
            elapsed_secs,
            "clustering complete"
        );
        Ok(result)
    }

    fn select_base_clusters(&self, params: &ParameterSet) -> Vec<BaseCluster> {
        let snippets = self.corpus.snippets().filter(params.text_types.as_ref());
        debug!(snippets = snippets.len(), "snippets selected");
        let trie = CompactTrie::build(&params.expansion, snippets);
        let base_clusters = top_base_clusters(
            extract_base_clusters(&trie),
            self.corpus.words(),
            &params.score_params(),
            params.top_base_clusters,
            params.sort_order,
        );
        if params.drop_singleton_base_clusters {
            drop_singleton_base_clusters(base_clusters)
        } else {
            base_clusters
        }
    }

    fn evaluate(
        &self,
        params: &ParameterSet,
        ground_truth: &GroundTruthIndex,
        base_clusters: &[BaseCluster],
        clusters: &[Cluster],
        elapsed_secs: f64,
    ) -> ClusterResult {
        let tags = self.corpus.tags();
        let beta = self.settings.f_beta;
        let no_of_sources = tags.len();

        let tag_accuracy = tag_accuracy(clusters, tags);
        let precision_rows = ground_truth_precision(clusters, ground_truth, tags);
        let recall_rows = ground_truth_represented(clusters, ground_truth, tags);
        let f_rows = f_measures(&precision_rows, &recall_rows, beta);

        let mut result = ClusterResult {
            elapsed_secs,
            base_clusters: base_clusters.len(),
            clusters: clusters.len(),
            ground_truth_clusters: ground_truth.len(),
            precision: overall_precision(ground_truth, clusters, no_of_sources),
            recall: overall_recall(ground_truth, clusters, no_of_sources),
            f_measure: overall_f_measure(ground_truth, clusters, no_of_sources, beta),
            tag_accuracy,
            ground_truth: precision_rows,
            ground_truth_represented: recall_rows,
            f_measures: f_rows,
            details: None,
        };

        if self.settings.store_result_details {
            result.details = Some(ResultDetails {
                options: self.options_text(params, elapsed_secs),
                summary: summary_text(&result, beta),
                buckets: buckets_text(&result),
                clusters: clusters
                    .iter()
                    .map(|c| c.display(self.corpus.sources()).to_string())
                    .collect(),
            });
        }
        result
    }

    fn options_text(&self, params: &ParameterSet, elapsed_secs: f64) -> String {
        let included = |dropped: bool| if dropped { "excluded" } else { "included" };
        let text_types = params.text_types.as_ref().map_or_else(
            || "all".to_string(),
            |selection| {
                selection
                    .iter()
                    .filter(|(_, on)| **on)
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        );
        [
            format!(
                "Clustered {} snippets in {elapsed_secs:.4} seconds",
                self.corpus.snippets().filter(params.text_types.as_ref()).len()
            ),
            format!("Text types: {text_types}"),
            format!("Tree type: {}", params.expansion),
            format!("Number of top base clusters: {}", params.top_base_clusters),
            format!(
                "Minimum term/word occurrence in collection: {}",
                params.min_term_occurrence
            ),
            format!(
                "Maximum term/word occurrence ratio in collection: {}",
                params.max_term_ratio
            ),
            format!(
                "Singleton ground truth clusters {}",
                included(self.settings.drop_singleton_ground_truth)
            ),
            format!(
                "Singleton base clusters {}",
                included(params.drop_singleton_base_clusters)
            ),
            format!(
                "One word clusters {}",
                included(params.drop_one_word_clusters)
            ),
            format!("Similarity: {}", params.similarity),
            format!("F-beta constant used for F-Measure: {}", self.settings.f_beta),
        ]
        .join("\n")
    }
}

fn summary_text(result: &ClusterResult, beta: f64) -> String {
    format!(
        "Precision:\t\t{:.3}\nRecall:\t\t\t{:.3}\nF-Measure (b={beta:.1}):\t{:.3}",
        result.precision, result.recall, result.f_measure
    )
}

fn table(title: &str, rows: &[OverlapBucket], total: usize) -> String {
    let mut lines = vec![
        format!("{title}:"),
        "Overlap - Number/Total - Fraction - Accumulated".to_string(),
        "-".repeat(48),
    ];
    lines.extend(rows.iter().map(|row| {
        format!(
            "{}\t   {:2}/{total}\t\t{:.3}\t   {:.3}",
            row.overlap, row.count, row.fraction, row.accumulated
        )
    }));
    lines.join("\n")
}

fn buckets_text(result: &ClusterResult) -> String {
    [
        table("Tag accuracy", &result.tag_accuracy, result.clusters),
        table("Ground truth", &result.ground_truth, result.clusters),
        table(
            "Ground truth represented",
            &result.ground_truth_represented,
            result.ground_truth_clusters,
        ),
    ]
    .join("\n\n")
}
