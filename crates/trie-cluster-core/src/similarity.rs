//! Pairwise similarity between base clusters.
//!
//! All threshold comparisons are strict: a ratio exactly equal to the
//! threshold is not similar. Every ratio with a zero denominator resolves
//! to "not similar" (or a zero similarity value).

use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::base_cluster::BaseCluster;
use crate::corpus::WordIndex;
use crate::error::{EngineError, EngineResult};

/// Anything that can judge two base clusters similar.
pub trait Similarity {
    /// Whether `a` and `b` belong in the same component.
    fn similar(&self, a: &BaseCluster, b: &BaseCluster) -> bool;
}

impl<F> Similarity for F
where
    F: Fn(&BaseCluster, &BaseCluster) -> bool,
{
    fn similar(&self, a: &BaseCluster, b: &BaseCluster) -> bool {
        self(a, b)
    }
}

/// The similarity method and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum SimilarityMethod {
    /// Source overlap relative to each cluster's own size; both ratios must
    /// exceed the threshold.
    Etzioni {
        /// Minimum overlap ratio (exclusive).
        threshold: f64,
    },
    /// Etzioni overlap, then cosine similarity of tf-idf label vectors.
    Cosine {
        /// Etzioni threshold gating the cosine test.
        overlap_threshold: f64,
        /// Minimum cosine similarity (exclusive).
        cosine_threshold: f64,
    },
    /// Etzioni overlap, then a check that the labels share enough words
    /// that are not too frequent in the corpus.
    FrequencyAmendment {
        /// Etzioni threshold gating the frequency test.
        overlap_threshold: f64,
        /// Average document frequency of the label words must stay below this.
        max_average_frequency: f64,
        /// The labels must share more words than this.
        min_common_words: usize,
    },
    /// Source overlap relative to the size of the union.
    Jaccard {
        /// Minimum Jaccard coefficient (exclusive).
        threshold: f64,
    },
}

impl Default for SimilarityMethod {
    fn default() -> Self {
        Self::Etzioni { threshold: 0.5 }
    }
}

/// Similarity method names, without their parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum SimilarityKind {
    /// Overlap relative to each cluster.
    Etzioni,
    /// Tf-idf cosine gated on Etzioni.
    Cosine,
    /// Word-frequency heuristic gated on Etzioni.
    FrequencyAmendment,
    /// Overlap relative to the union.
    Jaccard,
}

impl SimilarityMethod {
    /// Decode the numeric gene encoding used by parameter search.
    ///
    /// `0` Etzioni, `1` cosine, `2` frequency amendment, `3` Jaccard. The
    /// parameter slots are read in declaration order of each variant.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_selector(id: u8, params: [f64; 3]) -> EngineResult<Self> {
        let [first, second, third] = params;
        match id {
            0 => Ok(Self::Etzioni { threshold: first }),
            1 => Ok(Self::Cosine {
                overlap_threshold: first,
                cosine_threshold: second,
            }),
            2 => Ok(Self::FrequencyAmendment {
                overlap_threshold: first,
                max_average_frequency: second,
                min_common_words: third.max(0.0).round() as usize,
            }),
            3 => Ok(Self::Jaccard { threshold: first }),
            _ => Err(EngineError::UnsupportedSelector {
                kind: "similarity",
                id,
            }),
        }
    }

    /// Build a method of the given kind with default parameters.
    pub const fn with_defaults(kind: SimilarityKind) -> Self {
        match kind {
            SimilarityKind::Etzioni => Self::Etzioni { threshold: 0.5 },
            SimilarityKind::Cosine => Self::Cosine {
                overlap_threshold: 0.5,
                cosine_threshold: 0.5,
            },
            SimilarityKind::FrequencyAmendment => Self::FrequencyAmendment {
                overlap_threshold: 0.5,
                max_average_frequency: 73.0,
                min_common_words: 1,
            },
            SimilarityKind::Jaccard => Self::Jaccard { threshold: 0.5 },
        }
    }

    /// The method name without parameters.
    pub const fn kind(&self) -> SimilarityKind {
        match self {
            Self::Etzioni { .. } => SimilarityKind::Etzioni,
            Self::Cosine { .. } => SimilarityKind::Cosine,
            Self::FrequencyAmendment { .. } => SimilarityKind::FrequencyAmendment,
            Self::Jaccard { .. } => SimilarityKind::Jaccard,
        }
    }

    /// Replace the primary overlap threshold.
    #[must_use]
    pub const fn with_threshold(self, value: f64) -> Self {
        match self {
            Self::Etzioni { .. } => Self::Etzioni { threshold: value },
            Self::Jaccard { .. } => Self::Jaccard { threshold: value },
            Self::Cosine {
                cosine_threshold, ..
            } => Self::Cosine {
                overlap_threshold: value,
                cosine_threshold,
            },
            Self::FrequencyAmendment {
                max_average_frequency,
                min_common_words,
                ..
            } => Self::FrequencyAmendment {
                overlap_threshold: value,
                max_average_frequency,
                min_common_words,
            },
        }
    }

    /// Check that thresholds are finite and non-negative.
    pub fn validate(&self) -> EngineResult<()> {
        let values = match *self {
            Self::Etzioni { threshold } | Self::Jaccard { threshold } => vec![threshold],
            Self::Cosine {
                overlap_threshold,
                cosine_threshold,
            } => vec![overlap_threshold, cosine_threshold],
            Self::FrequencyAmendment {
                overlap_threshold,
                max_average_frequency,
                ..
            } => vec![overlap_threshold, max_average_frequency],
        };
        if values.iter().all(|v| v.is_finite() && *v >= 0.0) {
            Ok(())
        } else {
            Err(EngineError::InvalidParameters(format!(
                "similarity thresholds must be finite and non-negative: {self}"
            )))
        }
    }
}

impl std::fmt::Display for SimilarityMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Etzioni { threshold } => write!(f, "etzioni (threshold {threshold})"),
            Self::Jaccard { threshold } => write!(f, "jaccard (threshold {threshold})"),
            Self::Cosine {
                overlap_threshold,
                cosine_threshold,
            } => write!(
                f,
                "cosine (overlap {overlap_threshold}, cosine {cosine_threshold})"
            ),
            Self::FrequencyAmendment {
                overlap_threshold,
                max_average_frequency,
                min_common_words,
            } => write!(
                f,
                "frequency amendment (overlap {overlap_threshold}, max average frequency \
                 {max_average_frequency}, min common words {min_common_words})"
            ),
        }
    }
}

/// A [`SimilarityMethod`] bound to the corpus word index it needs.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityMeasure<'a> {
    method: SimilarityMethod,
    words: &'a WordIndex,
}

impl<'a> SimilarityMeasure<'a> {
    /// Bind `method` to `words`.
    pub const fn new(method: SimilarityMethod, words: &'a WordIndex) -> Self {
        Self { method, words }
    }

    /// The configured method.
    pub const fn method(&self) -> SimilarityMethod {
        self.method
    }
}

impl Similarity for SimilarityMeasure<'_> {
    fn similar(&self, a: &BaseCluster, b: &BaseCluster) -> bool {
        match self.method {
            SimilarityMethod::Etzioni { threshold } => etzioni(a, b, threshold),
            SimilarityMethod::Jaccard { threshold } => jaccard(a, b, threshold),
            SimilarityMethod::Cosine {
                overlap_threshold,
                cosine_threshold,
            } => {
                etzioni(a, b, overlap_threshold)
                    && cosine_similarity(a, b, self.words) > cosine_threshold
            }
            SimilarityMethod::FrequencyAmendment {
                overlap_threshold,
                max_average_frequency,
                min_common_words,
            } => {
                etzioni(a, b, overlap_threshold)
                    && frequency_amendment(
                        a,
                        b,
                        self.words,
                        max_average_frequency,
                        min_common_words,
                    )
            }
        }
    }
}

/// Number of sources shared by both clusters.
pub fn source_overlap(a: &BaseCluster, b: &BaseCluster) -> usize {
    a.sources.intersection(&b.sources).count()
}

/// Overlap relative to each cluster's own size, both strictly above `threshold`.
#[allow(clippy::cast_precision_loss)]
pub fn etzioni(a: &BaseCluster, b: &BaseCluster, threshold: f64) -> bool {
    if a.size() == 0 || b.size() == 0 {
        return false;
    }
    let overlap = source_overlap(a, b) as f64;
    overlap / a.size() as f64 > threshold && overlap / b.size() as f64 > threshold
}

/// Overlap relative to the union size, strictly above `threshold`.
#[allow(clippy::cast_precision_loss)]
pub fn jaccard(a: &BaseCluster, b: &BaseCluster, threshold: f64) -> bool {
    let overlap = source_overlap(a, b);
    let union = a.size() + b.size() - overlap;
    if union == 0 {
        return false;
    }
    overlap as f64 / union as f64 > threshold
}

#[allow(clippy::cast_precision_loss)]
fn tf_idf_vector<'w>(cluster: &'w BaseCluster, words: &WordIndex) -> BTreeMap<&'w str, f64> {
    let no_of_sources = words.no_of_sources() as f64;
    let mut vector = BTreeMap::new();
    for word in &cluster.label {
        if vector.contains_key(word.as_str()) {
            continue;
        }
        let (tf, df) = words.sources(word).map_or((0, 0), |docs| {
            (cluster.sources.intersection(docs).count(), docs.len())
        });
        let idf = (no_of_sources / (1.0 + df as f64)).ln();
        vector.insert(word.as_str(), tf as f64 * idf);
    }
    vector
}

/// Cosine similarity of the two labels' tf-idf vectors.
///
/// Term frequency is the number of the cluster's sources containing the
/// word; inverse document frequency is `ln(N / (1 + df))`. Returns 0 when
/// the corpus is empty or either vector has zero magnitude. Sums run in
/// word order so repeated calls agree to the last bit.
pub fn cosine_similarity(a: &BaseCluster, b: &BaseCluster, words: &WordIndex) -> f64 {
    if words.no_of_sources() == 0 {
        return 0.0;
    }
    let va = tf_idf_vector(a, words);
    let vb = tf_idf_vector(b, words);
    let dot: f64 = va
        .iter()
        .filter_map(|(word, wa)| vb.get(word).map(|wb| wa * wb))
        .sum();
    let magnitude_a = va.values().map(|w| w * w).sum::<f64>().sqrt();
    let magnitude_b = vb.values().map(|w| w * w).sum::<f64>().sqrt();
    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }
    dot / (magnitude_a * magnitude_b)
}

/// Average document frequency over the union of label words is below
/// `max_average_frequency` and the labels share more than
/// `min_common_words` words.
#[allow(clippy::cast_precision_loss)]
pub fn frequency_amendment(
    a: &BaseCluster,
    b: &BaseCluster,
    words: &WordIndex,
    max_average_frequency: f64,
    min_common_words: usize,
) -> bool {
    let label_a: BTreeSet<&str> = a.label.iter().map(String::as_str).collect();
    let label_b: BTreeSet<&str> = b.label.iter().map(String::as_str).collect();
    let union: Vec<&str> = label_a.union(&label_b).copied().collect();
    if union.is_empty() {
        return false;
    }
    let total: usize = union.iter().map(|w| words.document_frequency(w)).sum();
    let average = total as f64 / union.len() as f64;
    let common = label_a.intersection(&label_b).count();
    average < max_average_frequency && common > min_common_words
}
