//! Cluster quality measured against ground truth.
//!
//! Two families of measures live here. The bucketed measures compare the
//! tag words of a cluster's sources and report how many clusters (or
//! ground-truth categories) reach each level of shared tag words, from all
//! five shared down to none. The overall measures weight each ground-truth
//! category by its share of the corpus and credit it with the best matching
//! cluster.
//!
//! Every ratio with a zero denominator is 0.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cluster::{Cluster, common};
use crate::corpus::{GroundTruthIndex, SourceId, TagIndex, tag_words};

/// Highest number of shared tag words that is told apart; larger overlaps
/// count as this many.
pub const MAX_SHARED_TAG_WORDS: usize = 5;

/// One row of a bucketed measure.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct OverlapBucket {
    /// Row label: `5 - shared tag words`, so 0 is the best row.
    pub overlap: usize,
    /// Items in this row.
    pub count: usize,
    /// `count` relative to the number of items.
    pub fraction: f64,
    /// Fraction of items in this row or any better one.
    pub accumulated: f64,
}

/// Per-row F-measure.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct BucketFMeasure {
    /// Row label, as in [`OverlapBucket::overlap`].
    pub overlap: usize,
    /// Weighted harmonic mean of the row's precision and recall fractions.
    pub f_measure: f64,
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// F-beta of a precision/recall pair; 0 when both are 0.
pub fn f_beta(precision: f64, recall: f64, beta: f64) -> f64 {
    let beta2 = beta * beta;
    let denominator = beta2 * precision + recall;
    if denominator == 0.0 {
        0.0
    } else {
        (1.0 + beta2) * precision * recall / denominator
    }
}

/// Turn counts indexed by shared tag words into the six rows, best first.
fn buckets(by_shared: &[usize; MAX_SHARED_TAG_WORDS + 1], total: usize) -> Vec<OverlapBucket> {
    let mut accumulated = 0;
    (0..=MAX_SHARED_TAG_WORDS)
        .map(|overlap| {
            let count = by_shared[MAX_SHARED_TAG_WORDS - overlap];
            accumulated += count;
            OverlapBucket {
                overlap,
                count,
                fraction: ratio(count, total),
                accumulated: ratio(accumulated, total),
            }
        })
        .collect()
}

/// A cluster prepared for repeated containment and tag-word checks.
struct Prepared<'a> {
    sources: HashSet<SourceId>,
    tag_lists: Vec<&'a [String]>,
}

impl<'a> Prepared<'a> {
    fn new(cluster: &Cluster, tags: &'a TagIndex) -> Self {
        Self {
            sources: cluster.sources.iter().copied().collect(),
            tag_lists: cluster.sources.iter().map(|&s| tags.words(s)).collect(),
        }
    }

    fn contains_all(&self, category: &[SourceId]) -> bool {
        category.iter().all(|s| self.sources.contains(s))
    }

    /// Tag words shared by every source and the category key.
    fn shared_with(&self, key_words: &[String]) -> usize {
        let mut lists: Vec<&[String]> = self.tag_lists.clone();
        lists.push(key_words);
        common::<String, _>(&lists).len().min(MAX_SHARED_TAG_WORDS)
    }

    /// Best shared-word count over categories this cluster fully contains.
    fn best_match(&self, categories: &[(&[SourceId], Vec<String>)]) -> usize {
        categories
            .iter()
            .filter(|(sources, _)| self.contains_all(sources))
            .map(|(_, key_words)| self.shared_with(key_words))
            .max()
            .unwrap_or(0)
    }
}

fn categories(ground_truth: &GroundTruthIndex) -> Vec<(&[SourceId], Vec<String>)> {
    ground_truth
        .iter()
        .map(|(tag, sources)| (sources, tag_words(tag)))
        .collect()
}

/// How many tag words the sources of each cluster share.
pub fn tag_accuracy(clusters: &[Cluster], tags: &TagIndex) -> Vec<OverlapBucket> {
    let mut by_shared = [0; MAX_SHARED_TAG_WORDS + 1];
    for cluster in clusters {
        let lists: Vec<&[String]> = cluster.sources.iter().map(|&s| tags.words(s)).collect();
        by_shared[common::<String, _>(&lists).len().min(MAX_SHARED_TAG_WORDS)] += 1;
    }
    buckets(&by_shared, clusters.len())
}

/// Precision side: for each cluster, the best tag-word match among the
/// ground-truth categories it fully contains.
#[tracing::instrument(skip_all, fields(clusters = clusters.len(), categories = ground_truth.len()))]
pub fn ground_truth_precision(
    clusters: &[Cluster],
    ground_truth: &GroundTruthIndex,
    tags: &TagIndex,
) -> Vec<OverlapBucket> {
    let categories = categories(ground_truth);
    let mut by_shared = [0; MAX_SHARED_TAG_WORDS + 1];
    for cluster in clusters {
        by_shared[Prepared::new(cluster, tags).best_match(&categories)] += 1;
    }
    buckets(&by_shared, clusters.len())
}

/// Recall side: for each ground-truth category, the best tag-word match
/// among the clusters that fully contain it.
#[tracing::instrument(skip_all, fields(clusters = clusters.len(), categories = ground_truth.len()))]
pub fn ground_truth_represented(
    clusters: &[Cluster],
    ground_truth: &GroundTruthIndex,
    tags: &TagIndex,
) -> Vec<OverlapBucket> {
    let prepared: Vec<Prepared<'_>> = clusters.iter().map(|c| Prepared::new(c, tags)).collect();
    let mut by_shared = [0; MAX_SHARED_TAG_WORDS + 1];
    for (sources, key_words) in categories(ground_truth) {
        let best = prepared
            .iter()
            .filter(|p| p.contains_all(sources))
            .map(|p| p.shared_with(&key_words))
            .max()
            .unwrap_or(0);
        by_shared[best] += 1;
    }
    buckets(&by_shared, ground_truth.len())
}

/// Row-wise F-measure of matching precision and recall rows.
pub fn f_measures(
    precision: &[OverlapBucket],
    recall: &[OverlapBucket],
    beta: f64,
) -> Vec<BucketFMeasure> {
    precision
        .iter()
        .zip(recall)
        .map(|(p, r)| BucketFMeasure {
            overlap: p.overlap,
            f_measure: f_beta(p.fraction, r.fraction, beta),
        })
        .collect()
}

/// Sum over categories of `|category| / no_of_sources` times the best
/// per-cluster score computed by `score(intersection, |cluster|, |category|)`.
#[allow(clippy::cast_precision_loss)]
fn weighted_best<F>(
    ground_truth: &GroundTruthIndex,
    clusters: &[Cluster],
    no_of_sources: usize,
    score: F,
) -> f64
where
    F: Fn(usize, usize, usize) -> f64,
{
    if no_of_sources == 0 {
        return 0.0;
    }
    let cluster_sets: Vec<HashSet<SourceId>> = clusters
        .iter()
        .map(|c| c.sources.iter().copied().collect())
        .collect();
    ground_truth
        .iter()
        .map(|(_, category)| {
            let factor = ratio(category.len(), no_of_sources);
            let best = cluster_sets
                .iter()
                .map(|set| {
                    let intersection = category.iter().filter(|s| set.contains(s)).count();
                    score(intersection, set.len(), category.len())
                })
                .fold(0.0, f64::max);
            factor * best
        })
        .sum()
}

/// Overall precision: per category, the best `|C ∩ G| / |C|`.
pub fn overall_precision(
    ground_truth: &GroundTruthIndex,
    clusters: &[Cluster],
    no_of_sources: usize,
) -> f64 {
    weighted_best(ground_truth, clusters, no_of_sources, |inter, cluster, _| {
        ratio(inter, cluster)
    })
}

/// Overall recall: per category, the best `|C ∩ G| / |G|`.
pub fn overall_recall(
    ground_truth: &GroundTruthIndex,
    clusters: &[Cluster],
    no_of_sources: usize,
) -> f64 {
    weighted_best(ground_truth, clusters, no_of_sources, |inter, _, category| {
        ratio(inter, category)
    })
}

/// Overall F-measure: per category, the best F-beta of a single cluster.
pub fn overall_f_measure(
    ground_truth: &GroundTruthIndex,
    clusters: &[Cluster],
    no_of_sources: usize,
    beta: f64,
) -> f64 {
    weighted_best(
        ground_truth,
        clusters,
        no_of_sources,
        |inter, cluster, category| f_beta(ratio(inter, cluster), ratio(inter, category), beta),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::assemble_cluster;
    use crate::corpus::{Corpus, Document};
    use crate::phrase::tokenize;

    fn doc(source: &str, tags: &str) -> Document {
        Document {
            source: source.to_string(),
            tags: tags.to_string(),
            texts: Vec::new(),
        }
    }

    fn corpus() -> Corpus {
        Corpus::from_documents(vec![
            doc("d1", "sport-football-cup-final-oslo"),
            doc("d2", "sport-football-cup-final-oslo"),
            doc("d3", "culture-music-concert"),
            doc("d4", "culture-music-concert"),
        ])
    }

    fn cluster_of(corpus: &Corpus, names: &[&str]) -> Cluster {
        let base = crate::base_cluster::BaseCluster {
            id: 0,
            label: tokenize("x y"),
            sources: names
                .iter()
                .map(|n| corpus.sources().get(n).unwrap())
                .collect(),
            score: 0.0,
        };
        assemble_cluster(&[&base])
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn f_beta_guards_zero() {
        assert!(approx(f_beta(0.0, 0.0, 0.5), 0.0));
        assert!(approx(f_beta(1.0, 1.0, 0.5), 1.0));
        // beta 1 is the plain harmonic mean
        assert!(approx(f_beta(0.5, 1.0, 1.0), 2.0 / 3.0));
    }

    #[test]
    fn perfect_clustering_scores_one() {
        let corpus = corpus();
        let clusters = vec![
            cluster_of(&corpus, &["d1", "d2"]),
            cluster_of(&corpus, &["d3", "d4"]),
        ];
        let gt = corpus.ground_truth();
        let n = corpus.tags().len();
        assert!(approx(overall_precision(gt, &clusters, n), 1.0));
        assert!(approx(overall_recall(gt, &clusters, n), 1.0));
        assert!(approx(overall_f_measure(gt, &clusters, n, 0.5), 1.0));
    }

    #[test]
    fn merged_categories_lose_precision_not_recall() {
        let corpus = corpus();
        let clusters = vec![cluster_of(&corpus, &["d1", "d2", "d3", "d4"])];
        let gt = corpus.ground_truth();
        assert!(approx(overall_precision(gt, &clusters, 4), 0.5));
        assert!(approx(overall_recall(gt, &clusters, 4), 1.0));
        let f = overall_f_measure(gt, &clusters, 4, 1.0);
        assert!(approx(f, 2.0 / 3.0));
    }

    #[test]
    fn overall_measures_with_no_sources_are_zero() {
        let corpus = corpus();
        let clusters = vec![cluster_of(&corpus, &["d1"])];
        assert!(approx(overall_precision(corpus.ground_truth(), &clusters, 0), 0.0));
        assert!(approx(overall_recall(corpus.ground_truth(), &[], 4), 0.0));
    }

    #[test]
    fn tag_accuracy_buckets_by_shared_words() {
        let corpus = corpus();
        let clusters = vec![
            // five shared words
            cluster_of(&corpus, &["d1", "d2"]),
            // three shared words
            cluster_of(&corpus, &["d3", "d4"]),
            // nothing shared
            cluster_of(&corpus, &["d1", "d3"]),
        ];
        let rows = tag_accuracy(&clusters, corpus.tags());
        assert_eq!(rows.len(), 6);
        let counts: Vec<usize> = rows.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 0, 1]);
        assert_eq!(rows[0].overlap, 0);
        assert!(approx(rows[0].fraction, 1.0 / 3.0));
        assert!(approx(rows[2].accumulated, 2.0 / 3.0));
        assert!(approx(rows[5].accumulated, 1.0));
    }

    #[test]
    fn ground_truth_requires_containment() {
        let corpus = corpus();
        let clusters = vec![
            cluster_of(&corpus, &["d1", "d2"]),
            // contains only half of the music category
            cluster_of(&corpus, &["d3"]),
        ];
        let precision = ground_truth_precision(&clusters, corpus.ground_truth(), corpus.tags());
        let counts: Vec<usize> = precision.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 0, 0, 1]);
        assert!(approx(precision[0].fraction, 0.5));

        let recall = ground_truth_represented(&clusters, corpus.ground_truth(), corpus.tags());
        let counts: Vec<usize> = recall.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 0, 0, 1]);

        let f = f_measures(&precision, &recall, 0.5);
        assert_eq!(f.len(), 6);
        assert!(approx(f[0].f_measure, 0.5));
        assert!(approx(f[1].f_measure, 0.0));
    }

    #[test]
    fn long_shared_tags_land_in_the_top_row() {
        let corpus = Corpus::from_documents(vec![
            doc("e1", "news-sport-football-cup-final-oslo-tonight"),
            doc("e2", "news-sport-football-cup-final-oslo-tonight"),
            doc("e3", "culture-music-concert"),
            doc("e4", "culture-music-concert"),
        ]);
        let clusters = vec![
            // seven shared words
            cluster_of(&corpus, &["e1", "e2"]),
            cluster_of(&corpus, &["e3", "e4"]),
        ];
        let gt = corpus.ground_truth();

        let accuracy = tag_accuracy(&clusters, corpus.tags());
        let counts: Vec<usize> = accuracy.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 0, 0]);

        let precision = ground_truth_precision(&clusters, gt, corpus.tags());
        let counts: Vec<usize> = precision.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 0, 0]);

        let recall = ground_truth_represented(&clusters, gt, corpus.tags());
        let counts: Vec<usize> = recall.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 0, 0]);
        assert!(approx(recall[0].fraction, 0.5));
        assert!(approx(recall[5].accumulated, 1.0));
    }

    #[test]
    fn empty_inputs_produce_zero_rows() {
        let corpus = corpus();
        let rows = ground_truth_precision(&[], corpus.ground_truth(), corpus.tags());
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.count == 0 && r.fraction == 0.0));

        let rows = ground_truth_represented(&[], &GroundTruthIndex::default(), corpus.tags());
        assert!(rows.iter().all(|r| r.accumulated == 0.0));
    }
}
