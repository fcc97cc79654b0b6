//! Cluster command: one clustering run over a corpus file.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};
use trie_cluster_core::metrics::OverlapBucket;
use trie_cluster_core::{ClusterResult, Clusterer, Config};

use super::{ParameterArgs, load_corpus};

/// Arguments for the `cluster` subcommand.
#[derive(Args, Debug)]
pub struct ClusterArgs {
    /// Corpus JSON file.
    pub corpus: Utf8PathBuf,

    #[command(flatten)]
    pub parameters: ParameterArgs,

    /// Include options, tables and every cluster in the output.
    #[arg(long)]
    pub details: bool,

    /// Beta of the F-measures.
    #[arg(long, value_name = "BETA")]
    pub f_beta: Option<f64>,
}

/// Cluster a corpus and report the result.
#[instrument(name = "cmd_cluster", skip_all, fields(corpus = %args.corpus))]
pub fn cmd_cluster(
    args: ClusterArgs,
    global_json: bool,
    config: &Config,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(details = args.details, f_beta = ?args.f_beta, "executing cluster command");

    let params = args.parameters.apply(config.parameters.clone())?;
    let mut settings = config.cluster_settings();
    settings.store_result_details |= args.details;
    if let Some(beta) = args.f_beta {
        settings.f_beta = beta;
    }

    let corpus = load_corpus(&args.corpus, max_input_bytes)?;
    let result = Clusterer::new(&corpus, settings).cluster(&params)?;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&args.corpus, &result, settings.f_beta);
    }
    Ok(())
}

fn print_result(corpus: &Utf8Path, result: &ClusterResult, beta: f64) {
    if let Some(ref details) = result.details {
        println!("{}", details.options);
        println!();
    }

    println!(
        "{} {}: {} base clusters, {} clusters in {:.3}s",
        "Clustered".bold(),
        corpus.cyan(),
        result.base_clusters,
        result.clusters,
        result.elapsed_secs,
    );
    if result.is_empty() {
        println!("{}", "No clusters formed.".yellow());
        return;
    }

    println!(
        "{}: {}",
        "Ground truth categories".dimmed(),
        result.ground_truth_clusters
    );
    println!("{}: {:.3}", "Precision".dimmed(), result.precision);
    println!("{}: {:.3}", "Recall".dimmed(), result.recall);
    println!(
        "{}: {}",
        format!("F-measure (b={beta:.1})").dimmed(),
        format!("{:.3}", result.f_measure).green()
    );
    println!("{}: {:.3}", "Fitness".dimmed(), result.fitness());

    match result.details {
        Some(ref details) => {
            println!();
            println!("{}", details.buckets);
            println!();
            println!("{}", "Clusters".bold().underline());
            for cluster in &details.clusters {
                println!("{cluster}");
            }
        }
        None => {
            println!();
            print_accumulated("Tag accuracy", &result.tag_accuracy);
            print_accumulated("Ground truth", &result.ground_truth);
            print_accumulated("Represented", &result.ground_truth_represented);
        }
    }
}

/// One line of accumulated fractions, best row first.
fn print_accumulated(label: &str, rows: &[OverlapBucket]) {
    let values: Vec<String> = rows
        .iter()
        .map(|row| format!("{:.2}", row.accumulated))
        .collect();
    println!("{}: {}", label.dimmed(), values.join(" "));
}
