//! Merging base clusters into connected components.
//!
//! Every unordered pair of base clusters is compared once, so the cost is
//! quadratic in the number of base clusters kept by scoring. Groups are
//! tracked in a disjoint-set forest without path compression; the
//! representative of a group is always its lowest base-cluster index.

use std::collections::BTreeMap;

use crate::base_cluster::BaseCluster;
use crate::similarity::Similarity;

#[derive(Debug)]
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&self, mut i: usize) -> usize {
        while self.parent[i] != i {
            i = self.parent[i];
        }
        i
    }

    /// Attach the group with the higher representative to the lower one.
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[high] = low;
        }
    }
}

/// Partition base clusters into components of transitively similar ones.
///
/// Components come out ordered by their lowest base-cluster index, and the
/// members of each component keep their input order.
#[tracing::instrument(skip_all, fields(base_clusters = base_clusters.len()))]
pub fn merge_components<'a, S>(
    base_clusters: &'a [BaseCluster],
    similarity: &S,
) -> Vec<Vec<&'a BaseCluster>>
where
    S: Similarity + ?Sized,
{
    let count = base_clusters.len();
    let mut sets = DisjointSet::new(count);
    let mut merges = 0usize;

    for i in 0..count {
        for j in (i + 1)..count {
            if sets.find(i) != sets.find(j)
                && similarity.similar(&base_clusters[i], &base_clusters[j])
            {
                sets.union(i, j);
                merges += 1;
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<&'a BaseCluster>> = BTreeMap::new();
    for (i, base_cluster) in base_clusters.iter().enumerate() {
        groups.entry(sets.find(i)).or_default().push(base_cluster);
    }
    tracing::debug!(merges, components = groups.len(), "components merged");
    groups.into_values().collect()
}
