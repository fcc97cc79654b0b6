//! Error types for trie-cluster-core.

use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while setting up or running a clustering invocation.
///
/// Degenerate inputs (no text types, too few base clusters, empty
/// denominators) are not errors; they resolve to a zero-valued
/// [`ClusterResult`](crate::result::ClusterResult).
#[derive(Error, Debug)]
pub enum EngineError {
    /// A numeric selector did not name a known expansion strategy or
    /// similarity method.
    #[error("unsupported {kind} selector: {id}")]
    UnsupportedSelector {
        /// What the selector was meant to choose (e.g. "expansion").
        kind: &'static str,
        /// The selector value that was supplied.
        id: u8,
    },

    /// A parameter set is internally inconsistent.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The serialized corpus could not be decoded.
    #[error("invalid corpus: {0}")]
    Corpus(#[from] serde_json::Error),
}

/// Result type alias using [`EngineError`].
pub type EngineResult<T> = Result<T, EngineError>;
