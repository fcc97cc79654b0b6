//! Base-clusters command: inspect the scored trie nodes that feed merging.

use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};
use trie_cluster_core::phrase::phrase_to_string;
use trie_cluster_core::{BaseCluster, Clusterer, Config, Corpus};

use super::{ParameterArgs, load_corpus};

/// Arguments for the `base-clusters` subcommand.
#[derive(Args, Debug)]
pub struct BaseClustersArgs {
    /// Corpus JSON file.
    pub corpus: Utf8PathBuf,

    #[command(flatten)]
    pub parameters: ParameterArgs,

    /// Leave out base clusters with a single source.
    #[arg(long)]
    pub drop_singletons: bool,
}

#[derive(Serialize)]
struct BaseClusterRow {
    label: String,
    size: usize,
    score: f64,
    sources: Vec<String>,
}

impl BaseClusterRow {
    fn new(base_cluster: &BaseCluster, corpus: &Corpus) -> Self {
        Self {
            label: phrase_to_string(&base_cluster.label),
            size: base_cluster.size(),
            score: base_cluster.score,
            sources: base_cluster
                .sources
                .iter()
                .filter_map(|&id| corpus.sources().name(id))
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Print the top scored base clusters of a corpus.
#[instrument(name = "cmd_base_clusters", skip_all, fields(corpus = %args.corpus))]
pub fn cmd_base_clusters(
    args: BaseClustersArgs,
    global_json: bool,
    config: &Config,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(drop_singletons = args.drop_singletons, "executing base-clusters command");

    let mut params = args.parameters.apply(config.parameters.clone())?;
    params.drop_singleton_base_clusters |= args.drop_singletons;

    let corpus = load_corpus(&args.corpus, max_input_bytes)?;
    let base_clusters = Clusterer::new(&corpus, config.cluster_settings()).base_clusters(&params)?;
    let rows: Vec<BaseClusterRow> = base_clusters
        .iter()
        .map(|bc| BaseClusterRow::new(bc, &corpus))
        .collect();

    if global_json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("{}", "No base clusters.".yellow());
    } else {
        for row in &rows {
            println!(
                "{:>7.1}  {:>4}  {}",
                row.score,
                row.size,
                row.label.bold()
            );
        }
    }
    Ok(())
}
