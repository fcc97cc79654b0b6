//! The value object produced by one clustering invocation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::metrics::{BucketFMeasure, MAX_SHARED_TAG_WORDS, OverlapBucket};

/// Human-readable report text, kept only when requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct ResultDetails {
    /// The options the run used.
    pub options: String,
    /// Overall precision, recall and F-measure.
    pub summary: String,
    /// Tag accuracy, ground truth and ground truth represented tables.
    pub buckets: String,
    /// One rendered block per cluster.
    pub clusters: Vec<String>,
}

/// Timing, counts and quality measures of one clustering run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ClusterResult {
    /// Wall-clock seconds from trie construction to cluster assembly.
    pub elapsed_secs: f64,
    /// Base clusters that went into merging.
    pub base_clusters: usize,
    /// Final clusters.
    pub clusters: usize,
    /// Ground-truth categories evaluated against.
    pub ground_truth_clusters: usize,
    /// Overall precision.
    pub precision: f64,
    /// Overall recall.
    pub recall: f64,
    /// Overall F-measure.
    pub f_measure: f64,
    /// Shared tag words within clusters.
    pub tag_accuracy: Vec<OverlapBucket>,
    /// Precision rows.
    pub ground_truth: Vec<OverlapBucket>,
    /// Recall rows.
    pub ground_truth_represented: Vec<OverlapBucket>,
    /// Row-wise F-measures.
    pub f_measures: Vec<BucketFMeasure>,
    /// Report text, present only when details were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ResultDetails>,
}

fn zero_buckets() -> Vec<OverlapBucket> {
    (0..=MAX_SHARED_TAG_WORDS)
        .map(|overlap| OverlapBucket {
            overlap,
            count: 0,
            fraction: 0.0,
            accumulated: 0.0,
        })
        .collect()
}

impl ClusterResult {
    /// The zero-valued result of a degenerate run.
    pub fn empty(elapsed_secs: f64, base_clusters: usize) -> Self {
        Self {
            elapsed_secs,
            base_clusters,
            clusters: 0,
            ground_truth_clusters: 0,
            precision: 0.0,
            recall: 0.0,
            f_measure: 0.0,
            tag_accuracy: zero_buckets(),
            ground_truth: zero_buckets(),
            ground_truth_represented: zero_buckets(),
            f_measures: (0..=MAX_SHARED_TAG_WORDS)
                .map(|overlap| BucketFMeasure {
                    overlap,
                    f_measure: 0.0,
                })
                .collect(),
            details: None,
        }
    }

    /// Whether the run produced no clusters.
    pub const fn is_empty(&self) -> bool {
        self.clusters == 0
    }

    /// Sum of the F-measures of the two best rows.
    ///
    /// This is the quantity parameter search maximizes.
    pub fn fitness(&self) -> f64 {
        self.f_measures.iter().take(2).map(|f| f.f_measure).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_has_six_zero_rows() {
        let r = ClusterResult::empty(0.25, 3);
        assert!(r.is_empty());
        assert_eq!(r.base_clusters, 3);
        assert_eq!(r.tag_accuracy.len(), 6);
        assert_eq!(r.ground_truth.len(), 6);
        assert_eq!(r.ground_truth_represented.len(), 6);
        assert_eq!(r.f_measures.len(), 6);
        assert!(r.fitness().abs() < f64::EPSILON);
        assert!((r.elapsed_secs - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn fitness_sums_best_two_rows() {
        let mut r = ClusterResult::empty(0.0, 0);
        r.f_measures[0].f_measure = 0.5;
        r.f_measures[1].f_measure = 0.25;
        r.f_measures[2].f_measure = 0.9;
        assert!((r.fitness() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn details_are_omitted_from_json_when_absent() {
        let json = serde_json::to_value(ClusterResult::empty(0.0, 0)).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["f_measures"].as_array().map(Vec::len), Some(6));
    }

    #[test]
    fn result_schema_names_core_fields() {
        let schema = schemars::schema_for!(ClusterResult);
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("elapsed_secs"));
        assert!(json.contains("ground_truth_represented"));
    }
}
