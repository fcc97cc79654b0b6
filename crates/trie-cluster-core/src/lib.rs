//! Core library for trie-cluster.
//!
//! Groups short text snippets by the phrases they share. Snippets are
//! expanded into sub-phrases and inserted into a compact trie; every trie
//! node becomes a scored base cluster, similar base clusters are merged,
//! and the resulting clusters are measured against the ground truth
//! implied by each source's tags.
//!
//! # Modules
//!
//! - [`phrase`] - Tokenizing and comparing phrases
//! - [`expansion`] - Phrase expansion strategies
//! - [`trie`] - The compact trie
//! - [`corpus`] - Sources, snippets, tags and ground truth
//! - [`base_cluster`] - Base cluster extraction and scoring
//! - [`similarity`] - Base cluster similarity measures
//! - [`components`] - Merging similar base clusters
//! - [`cluster`] - Final cluster assembly
//! - [`metrics`] - Quality measures against ground truth
//! - [`params`] - Algorithm parameters
//! - [`clustering`] - The end-to-end pipeline
//! - [`result`] - Results of a clustering run
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```no_run
//! use trie_cluster_core::{ClusterSettings, Clusterer, Corpus, ParameterSet};
//!
//! let json = std::fs::read_to_string("corpus.json").expect("readable corpus");
//! let corpus = Corpus::from_json(&json).expect("valid corpus");
//! let result = Clusterer::new(&corpus, ClusterSettings::default())
//!     .cluster(&ParameterSet::default())
//!     .expect("valid parameters");
//!
//! println!("F-measure: {:.3}", result.f_measure);
//! ```
#![deny(unsafe_code)]

pub mod base_cluster;
pub mod cluster;
pub mod clustering;
pub mod components;
pub mod config;
pub mod corpus;
pub mod error;
pub mod expansion;
pub mod metrics;
pub mod params;
pub mod phrase;
pub mod result;
pub mod similarity;
pub mod trie;

pub use base_cluster::{BaseCluster, SortOrder};
pub use cluster::Cluster;
pub use clustering::{ClusterSettings, Clusterer};
pub use config::{Config, ConfigLoader, LogLevel};
pub use corpus::{Corpus, Document, SourceId};
pub use error::{ConfigError, ConfigResult, EngineError, EngineResult};
pub use expansion::{ExpansionKind, ExpansionStrategy};
pub use params::ParameterSet;
pub use result::ClusterResult;
pub use similarity::{Similarity, SimilarityKind, SimilarityMeasure, SimilarityMethod};
pub use trie::CompactTrie;
