//! Logging and tracing setup.
//!
//! Two sinks share one [`EnvFilter`]: human-readable events on stderr and
//! JSONL records in a log file. The file lives at `TRIE_CLUSTER_LOG_PATH`
//! when set, otherwise `trie-cluster.jsonl` inside `TRIE_CLUSTER_LOG_DIR`,
//! the configured `log_dir`, or the platform's local data directory.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const LOG_PATH_ENV: &str = "TRIE_CLUSTER_LOG_PATH";
const LOG_DIR_ENV: &str = "TRIE_CLUSTER_LOG_DIR";
const LOG_FILE_NAME: &str = "trie-cluster.jsonl";

/// Where log records go.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Target log file, if one could be determined.
    pub log_file: Option<PathBuf>,
    /// Most verbose level echoed to stderr.
    pub stderr_level: LevelFilter,
}

impl ObservabilityConfig {
    /// Resolve the log file from the environment, falling back to
    /// `config_log_dir` and then the platform default.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        let log_file = std::env::var_os(LOG_PATH_ENV).map(PathBuf::from).or_else(|| {
            std::env::var_os(LOG_DIR_ENV)
                .map(PathBuf::from)
                .or(config_log_dir)
                .or_else(|| {
                    trie_cluster_core::config::user_data_local_dir()
                        .map(camino::Utf8PathBuf::into_std_path_buf)
                })
                .map(|dir| dir.join(LOG_FILE_NAME))
        });
        Self {
            log_file,
            stderr_level: LevelFilter::WARN,
        }
    }

    /// Set the stderr verbosity.
    #[must_use]
    pub const fn with_stderr_level(mut self, level: LevelFilter) -> Self {
        self.stderr_level = level;
        self
    }
}

/// Stderr verbosity for the `-q` / `-v` flags.
pub const fn stderr_level(quiet: bool, verbose: u8) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// The global filter: `RUST_LOG` when set, otherwise the configured level
/// raised by `-v` flags.
pub fn env_filter(quiet: bool, verbose: u8, config_level: &str) -> EnvFilter {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0 | 1) => config_level,
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber.
///
/// The returned guard flushes the log file on drop; keep it alive for the
/// rest of `main`. An unwritable log file downgrades to stderr-only logging.
pub fn init_observability(
    config: &ObservabilityConfig,
    env_filter: EnvFilter,
) -> anyhow::Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(config.stderr_level);

    let mut open_error = None;
    let (file_layer, guard) = match config.log_file.as_ref().map(|p| (p, open_log_file(p))) {
        Some((_, Ok(file))) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        Some((path, Err(err))) => {
            open_error = Some((path.clone(), err));
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    if let Some((path, err)) = open_error {
        tracing::warn!(path = %path.display(), error = %err, "log file unavailable, logging to stderr only");
    }
    Ok(guard)
}
