//! Final clusters assembled from merged components.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use crate::base_cluster::BaseCluster;
use crate::corpus::{SourceId, SourceTable};
use crate::phrase::phrase_to_string;

/// A cluster built from one component of base clusters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Distinct label words, most frequent first; ties keep encounter order.
    pub label: Vec<String>,
    /// The label of every member base cluster, in member order.
    pub labels: Vec<Vec<String>>,
    /// Union of member sources in first-seen order.
    pub sources: Vec<SourceId>,
    /// Length of `sources`.
    pub number_of_sources: usize,
    /// How often each word occurs across member labels, in encounter order.
    pub word_frequency: Vec<(String, usize)>,
    /// Words present in every member label.
    pub label_overlap: Vec<String>,
    /// Sources present in every member.
    pub source_overlap: Vec<SourceId>,
}

impl Cluster {
    /// Render the cluster with source names resolved through `sources`.
    pub const fn display<'a>(&'a self, sources: &'a SourceTable) -> ClusterDisplay<'a> {
        ClusterDisplay {
            cluster: self,
            sources,
        }
    }
}

/// Human-readable rendering of a [`Cluster`], see [`Cluster::display`].
#[derive(Debug)]
pub struct ClusterDisplay<'a> {
    cluster: &'a Cluster,
    sources: &'a SourceTable,
}

impl fmt::Display for ClusterDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |ids: &[SourceId]| {
            ids.iter()
                .map(|&id| self.sources.name(id).unwrap_or("?"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let labels: Vec<String> = self
            .cluster
            .labels
            .iter()
            .map(|l| phrase_to_string(l))
            .collect();
        writeln!(f, "<{}>", phrase_to_string(&self.cluster.label))?;
        writeln!(f, "Labels: {}", labels.join("|"))?;
        writeln!(f, "Sources: {}", names(&self.cluster.sources))?;
        writeln!(f, "Label overlap: {}", self.cluster.label_overlap.join(", "))?;
        writeln!(f, "Source overlap: {}", names(&self.cluster.source_overlap))
    }
}

/// Elements present in every list, deduplicated, in first-seen order.
///
/// Returns an empty list when `lists` is empty.
pub fn common<T, L>(lists: &[L]) -> Vec<T>
where
    T: Eq + Hash + Clone,
    L: AsRef<[T]>,
{
    let Some((first, rest)) = lists.split_first() else {
        return Vec::new();
    };
    let rest: Vec<HashSet<&T>> = rest.iter().map(|l| l.as_ref().iter().collect()).collect();
    let mut seen = HashSet::new();
    first
        .as_ref()
        .iter()
        .filter(|x| seen.insert(*x) && rest.iter().all(|set| set.contains(x)))
        .cloned()
        .collect()
}

/// Build a cluster from one component.
pub fn assemble_cluster(component: &[&BaseCluster]) -> Cluster {
    let mut sources = Vec::new();
    let mut seen_sources = HashSet::new();
    let mut labels = Vec::with_capacity(component.len());
    let mut word_frequency: Vec<(String, usize)> = Vec::new();
    let mut word_position: HashMap<&str, usize> = HashMap::new();

    for base_cluster in component {
        for &source in &base_cluster.sources {
            if seen_sources.insert(source) {
                sources.push(source);
            }
        }
        for word in &base_cluster.label {
            if let Some(&pos) = word_position.get(word.as_str()) {
                word_frequency[pos].1 += 1;
            } else {
                word_position.insert(word.as_str(), word_frequency.len());
                word_frequency.push((word.clone(), 1));
            }
        }
        labels.push(base_cluster.label.clone());
    }

    let mut ranked: Vec<&(String, usize)> = word_frequency.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let label = ranked.into_iter().map(|(word, _)| word.clone()).collect();

    let member_sources: Vec<Vec<SourceId>> = component
        .iter()
        .map(|bc| bc.sources.iter().copied().collect())
        .collect();

    Cluster {
        label,
        label_overlap: common(&labels),
        labels,
        number_of_sources: sources.len(),
        sources,
        word_frequency,
        source_overlap: common(&member_sources),
    }
}

/// Build one cluster per component.
#[tracing::instrument(skip_all, fields(components = components.len()))]
pub fn assemble_clusters(components: &[Vec<&BaseCluster>]) -> Vec<Cluster> {
    components.iter().map(|c| assemble_cluster(c)).collect()
}

/// Remove clusters that stem from a single one-word base cluster.
pub fn drop_one_word_clusters(mut clusters: Vec<Cluster>) -> Vec<Cluster> {
    clusters.retain(|c| c.labels.len() > 1 || c.labels.first().is_some_and(|l| l.len() > 1));
    clusters
}
