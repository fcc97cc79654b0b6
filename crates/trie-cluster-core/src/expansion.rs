//! Phrase expansion strategies.
//!
//! Before insertion into the compact trie every snippet phrase is expanded
//! into a set of sub-phrases. Which sub-phrases are produced decides the
//! shape of the trie, and with it which base clusters can exist at all.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// How a tokenized snippet is expanded into sub-phrases.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ExpansionStrategy {
    /// Every suffix of the phrase.
    #[default]
    Suffix,
    /// Every window of length `ceil((len + 1) / 2)`.
    MidSlice,
    /// Every window of length `n` (clamped to the phrase length).
    NSlice {
        /// Window length.
        n: usize,
    },
    /// Every window whose length lies between `floor(len * min)` (at least 1)
    /// and `ceil(len * max)`.
    RangeSlice {
        /// Lower bound as a fraction of the phrase length.
        min: f64,
        /// Upper bound as a fraction of the phrase length.
        max: f64,
    },
}

/// Expansion strategy names, without their arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ExpansionKind {
    /// All suffixes.
    Suffix,
    /// Half-length sliding windows.
    MidSlice,
    /// Fixed-length sliding windows.
    NSlice,
    /// Sliding windows over a range of lengths.
    RangeSlice,
}

impl ExpansionStrategy {
    /// Decode the numeric gene encoding used by parameter search.
    ///
    /// `0` suffix, `1` mid-slice, `2` range-slice (`first..second`),
    /// `3` n-slice (`first` is the window length).
    pub fn from_selector(id: u8, first: f64, second: f64) -> EngineResult<Self> {
        match id {
            0 => Ok(Self::Suffix),
            1 => Ok(Self::MidSlice),
            2 => Ok(Self::RangeSlice {
                min: first,
                max: second,
            }),
            3 => {
                if !first.is_finite() || first < 0.0 {
                    return Err(EngineError::InvalidParameters(format!(
                        "n-slice length must be a positive number, got {first}"
                    )));
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let n = first.round() as usize;
                Ok(Self::NSlice { n })
            }
            _ => Err(EngineError::UnsupportedSelector {
                kind: "expansion",
                id,
            }),
        }
    }

    /// The strategy name without arguments.
    pub const fn kind(&self) -> ExpansionKind {
        match self {
            Self::Suffix => ExpansionKind::Suffix,
            Self::MidSlice => ExpansionKind::MidSlice,
            Self::NSlice { .. } => ExpansionKind::NSlice,
            Self::RangeSlice { .. } => ExpansionKind::RangeSlice,
        }
    }

    /// Check that the strategy arguments are usable.
    pub fn validate(&self) -> EngineResult<()> {
        match *self {
            Self::NSlice { n: 0 } => Err(EngineError::InvalidParameters(
                "n-slice length must be at least 1".to_string(),
            )),
            Self::RangeSlice { min, max }
                if !min.is_finite() || !max.is_finite() || min < 0.0 || max < min =>
            {
                Err(EngineError::InvalidParameters(format!(
                    "range-slice bounds must satisfy 0 <= min <= max, got {min}..{max}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Expand a phrase into the sub-phrases to insert.
    ///
    /// An empty phrase always expands to nothing.
    pub fn expand<'a>(&self, phrase: &'a [String]) -> Vec<&'a [String]> {
        if phrase.is_empty() {
            return Vec::new();
        }
        match *self {
            Self::Suffix => suffixes(phrase),
            Self::MidSlice => n_slices((phrase.len() + 2) / 2, phrase),
            Self::NSlice { n } => n_slices(n.min(phrase.len()), phrase),
            Self::RangeSlice { min, max } => range_slices(min, max, phrase),
        }
    }
}

impl std::fmt::Display for ExpansionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Suffix => f.write_str("suffix"),
            Self::MidSlice => f.write_str("mid slice"),
            Self::NSlice { n } => write!(f, "n slice of length {n}"),
            Self::RangeSlice { min, max } => {
                write!(f, "range slice with min {min} & max {max}")
            }
        }
    }
}

fn suffixes(phrase: &[String]) -> Vec<&[String]> {
    (0..phrase.len()).map(|i| &phrase[i..]).collect()
}

fn n_slices(n: usize, phrase: &[String]) -> Vec<&[String]> {
    if n == 0 || n > phrase.len() {
        return Vec::new();
    }
    phrase.windows(n).collect()
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn range_slices(min: f64, max: f64, phrase: &[String]) -> Vec<&[String]> {
    let len = phrase.len() as f64;
    let lower = ((len * min).floor() as usize).max(1);
    let upper = ((len * max).ceil() as usize).min(phrase.len());
    (lower..=upper).flat_map(|n| n_slices(n, phrase)).collect()
}
