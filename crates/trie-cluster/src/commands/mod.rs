//! Command implementations.

use anyhow::Context;
use camino::Utf8Path;
use clap::Args;
use trie_cluster_core::{
    Corpus, ExpansionKind, ExpansionStrategy, ParameterSet, SimilarityKind, SimilarityMethod,
};

pub mod base_clusters;
pub mod cluster;
pub mod info;

/// Read a file and validate its size against the configured limit.
pub fn read_input_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    // Preflight: check file size via metadata before reading into memory.
    let metadata =
        std::fs::metadata(path.as_std_path()).with_context(|| format!("failed to read {path}"))?;
    if let Some(max) = max_bytes {
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if size > max {
            anyhow::bail!("input too large: {path} is {size} bytes (limit: {max} bytes)");
        }
    }

    let content = std::fs::read_to_string(path.as_std_path())
        .with_context(|| format!("failed to read {path}"))?;
    Ok(content)
}

/// Read and parse a corpus file.
pub fn load_corpus(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<Corpus> {
    let content = read_input_file(path, max_bytes)?;
    let corpus = Corpus::from_json(&content).with_context(|| format!("invalid corpus {path}"))?;
    tracing::info!(
        corpus = %path,
        sources = corpus.sources().len(),
        snippets = corpus.snippets().len(),
        "corpus loaded"
    );
    Ok(corpus)
}

/// Parameter overrides shared by the commands that build a trie.
#[derive(Args, Debug, Default, Clone)]
pub struct ParameterArgs {
    /// Phrase expansion strategy.
    #[arg(long, value_enum)]
    pub expansion: Option<ExpansionKind>,

    /// Window length for n-slice expansion.
    #[arg(long, value_name = "N")]
    pub slice_n: Option<usize>,

    /// Lower window bound for range-slice expansion, as a fraction of the phrase length.
    #[arg(long, value_name = "FRACTION")]
    pub range_min: Option<f64>,

    /// Upper window bound for range-slice expansion, as a fraction of the phrase length.
    #[arg(long, value_name = "FRACTION")]
    pub range_max: Option<f64>,

    /// Number of top scored base clusters to keep.
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Similarity method used to merge base clusters.
    #[arg(long, value_enum)]
    pub similarity: Option<SimilarityKind>,

    /// Primary overlap threshold of the similarity method.
    #[arg(long)]
    pub threshold: Option<f64>,
}

impl ParameterArgs {
    /// Layer the command-line overrides on top of configured parameters.
    pub fn apply(&self, mut params: ParameterSet) -> anyhow::Result<ParameterSet> {
        params.expansion = self.resolve_expansion(params.expansion)?;
        if let Some(top) = self.top {
            params.top_base_clusters = top;
        }
        if let Some(kind) = self.similarity
            && kind != params.similarity.kind()
        {
            params.similarity = SimilarityMethod::with_defaults(kind);
        }
        if let Some(threshold) = self.threshold {
            params.similarity = params.similarity.with_threshold(threshold);
        }
        params.validate()?;
        Ok(params)
    }

    fn resolve_expansion(&self, current: ExpansionStrategy) -> anyhow::Result<ExpansionStrategy> {
        let kind = self.expansion.unwrap_or_else(|| current.kind());
        Ok(match kind {
            ExpansionKind::Suffix => ExpansionStrategy::Suffix,
            ExpansionKind::MidSlice => ExpansionStrategy::MidSlice,
            ExpansionKind::NSlice => {
                let configured = match current {
                    ExpansionStrategy::NSlice { n } => Some(n),
                    _ => None,
                };
                let n = self
                    .slice_n
                    .or(configured)
                    .context("--slice-n is required for n-slice expansion")?;
                ExpansionStrategy::NSlice { n }
            }
            ExpansionKind::RangeSlice => {
                let (min, max) = match current {
                    ExpansionStrategy::RangeSlice { min, max } => (Some(min), Some(max)),
                    _ => (None, None),
                };
                ExpansionStrategy::RangeSlice {
                    min: self
                        .range_min
                        .or(min)
                        .context("--range-min is required for range-slice expansion")?,
                    max: self
                        .range_max
                        .or(max)
                        .context("--range-max is required for range-slice expansion")?,
                }
            }
        })
    }
}
