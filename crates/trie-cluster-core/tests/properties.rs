//! Property-based tests for the trie and merging invariants.

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;
use trie_cluster_core::base_cluster::extract_base_clusters;
use trie_cluster_core::components::merge_components;
use trie_cluster_core::corpus::SourceTable;
use trie_cluster_core::phrase::common_start_segment;
use trie_cluster_core::trie::NodeId;
use trie_cluster_core::{BaseCluster, CompactTrie, ExpansionStrategy, SourceId};

const VOCABULARY: &[&str] = &["a", "b", "c", "d"];

fn phrase() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(VOCABULARY), 0..6)
        .prop_map(|words| words.into_iter().map(str::to_string).collect())
}

fn phrases() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(phrase(), 1..12)
}

fn source_ids(n: usize) -> Vec<SourceId> {
    let mut table = SourceTable::new();
    (0..n).map(|i| table.intern(&format!("s{i}"))).collect()
}

fn build(phrases: &[Vec<String>], ids: &[SourceId]) -> CompactTrie {
    let mut trie = CompactTrie::new();
    for (i, phrase) in phrases.iter().enumerate() {
        for sub in ExpansionStrategy::Suffix.expand(phrase) {
            trie.insert(sub, &ids[i..=i]);
        }
    }
    trie
}

fn all_nodes(trie: &CompactTrie) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![trie.root()];
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(trie.children(node).iter().copied());
    }
    out
}

fn labels(trie: &CompactTrie) -> BTreeSet<Vec<String>> {
    all_nodes(trie)
        .into_iter()
        .filter(|&n| n != trie.root())
        .map(|n| trie.node_label(n))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn common_start_segment_splits_both_inputs(a in phrase(), b in phrase()) {
        let (common, rest_a, rest_b) = common_start_segment(&a, &b);
        prop_assert_eq!([common, rest_a].concat(), a.clone());
        prop_assert_eq!([common, rest_b].concat(), b.clone());
        if let (Some(x), Some(y)) = (rest_a.first(), rest_b.first()) {
            prop_assert_ne!(x, y);
        }
    }

    #[test]
    fn common_start_segment_is_symmetric_in_length(a in phrase(), b in phrase()) {
        let (ab, _, _) = common_start_segment(&a, &b);
        let (ba, _, _) = common_start_segment(&b, &a);
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn siblings_start_with_distinct_words(input in phrases()) {
        let ids = source_ids(input.len());
        let trie = build(&input, &ids);
        for node in all_nodes(&trie) {
            let mut firsts = HashSet::new();
            for &child in trie.children(node) {
                let segment = trie.phrase(child);
                prop_assert!(!segment.is_empty());
                prop_assert!(firsts.insert(segment[0].clone()));
                prop_assert_eq!(trie.parent(child), Some(node));
            }
        }
    }

    #[test]
    fn node_labels_are_unique(input in phrases()) {
        let ids = source_ids(input.len());
        let trie = build(&input, &ids);
        prop_assert_eq!(labels(&trie).len(), trie.len() - 1);
    }

    #[test]
    fn every_inserted_phrase_is_a_node(input in phrases()) {
        let ids = source_ids(input.len());
        let trie = build(&input, &ids);
        for phrase in input.iter().filter(|p| !p.is_empty()) {
            let node = trie.find(phrase);
            prop_assert!(node.is_some());
            prop_assert_eq!(&trie.node_label(node.unwrap()), phrase);
        }
    }

    #[test]
    fn reinsertion_keeps_the_shape(input in phrases()) {
        let ids = source_ids(input.len());
        let once = build(&input, &ids);
        let mut twice = build(&input, &ids);
        for (i, phrase) in input.iter().enumerate() {
            for sub in ExpansionStrategy::Suffix.expand(phrase) {
                twice.insert(sub, &ids[i..=i]);
            }
        }
        prop_assert_eq!(once.len(), twice.len());
        prop_assert_eq!(labels(&once), labels(&twice));
    }

    #[test]
    fn ancestors_cover_descendant_sources(input in phrases()) {
        let ids = source_ids(input.len());
        let base_clusters = extract_base_clusters(&build(&input, &ids));
        for outer in &base_clusters {
            for inner in &base_clusters {
                let is_descendant = inner.label.len() > outer.label.len()
                    && inner.label.starts_with(&outer.label);
                if is_descendant {
                    prop_assert!(outer.sources.is_superset(&inner.sources));
                }
            }
        }
    }

    #[test]
    fn merging_partitions_the_input(
        memberships in prop::collection::vec(prop::collection::btree_set(0usize..6, 1..4), 0..16)
    ) {
        let ids = source_ids(6);
        let base_clusters: Vec<BaseCluster> = memberships
            .iter()
            .enumerate()
            .map(|(id, members)| BaseCluster {
                id,
                label: vec![format!("w{id}")],
                sources: members.iter().map(|&m| ids[m]).collect(),
                score: 0.0,
            })
            .collect();
        let shares_source =
            |a: &BaseCluster, b: &BaseCluster| !a.sources.is_disjoint(&b.sources);

        let components = merge_components(&base_clusters, &shares_source);

        let mut seen: Vec<usize> = components.iter().flatten().map(|bc| bc.id).collect();
        prop_assert_eq!(seen.len(), base_clusters.len());
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), base_clusters.len());

        let firsts: Vec<usize> = components.iter().map(|c| c[0].id).collect();
        prop_assert!(firsts.windows(2).all(|w| w[0] < w[1]));

        let component_of = |id: usize| components.iter().position(|c| c.iter().any(|bc| bc.id == id));
        for a in &base_clusters {
            for b in &base_clusters {
                if shares_source(a, b) {
                    prop_assert_eq!(component_of(a.id), component_of(b.id));
                }
            }
        }
    }
}
