//! Compact trie over word sequences.
//!
//! Each node stores only its own slice of the path (possibly several words),
//! the sources whose phrases end at or were split through it, and its
//! children keyed by their first word. Nodes live in an arena and refer to
//! each other by [`NodeId`]; the parent link is a plain index used only to
//! rebuild labels.

use std::collections::{BTreeMap, HashMap};

use crate::corpus::{Snippet, SourceId};
use crate::expansion::ExpansionStrategy;
use crate::phrase::common_start_segment;

/// Handle to a node in a [`CompactTrie`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node, which holds an empty phrase.
    pub const ROOT: Self = Self(0);

    /// Arena position of this node.
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
struct Node {
    phrase: Vec<String>,
    sources: BTreeMap<SourceId, u32>,
    children: Vec<NodeId>,
    child_index: HashMap<String, NodeId>,
    parent: Option<NodeId>,
}

/// Arena-backed compact trie.
#[derive(Debug, Clone)]
pub struct CompactTrie {
    nodes: Vec<Node>,
}

impl Default for CompactTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl CompactTrie {
    /// Create a trie holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// Expand every snippet with `strategy` and insert each sub-phrase.
    #[tracing::instrument(skip_all, fields(strategy = %strategy))]
    pub fn build<'a, I>(strategy: &ExpansionStrategy, snippets: I) -> Self
    where
        I: IntoIterator<Item = &'a Snippet>,
    {
        let mut trie = Self::new();
        let mut inserted = 0usize;
        for snippet in snippets {
            for sub_phrase in strategy.expand(&snippet.phrase) {
                trie.insert(sub_phrase, &snippet.sources);
                inserted += 1;
            }
        }
        tracing::debug!(inserted, nodes = trie.len(), "compact trie built");
        trie
    }

    /// Insert a phrase owned by `sources`.
    ///
    /// Inserting an empty phrase does nothing. Inserting a phrase that is
    /// already present increments the per-source counts of its node.
    pub fn insert(&mut self, phrase: &[String], sources: &[SourceId]) {
        let mut node = NodeId::ROOT;
        let mut phrase = phrase;
        loop {
            let Some(first) = phrase.first() else {
                return;
            };
            let Some(&child) = self.nodes[node.0].child_index.get(first) else {
                self.add_child(node, phrase.to_vec(), sources);
                return;
            };
            let child_phrase = &self.nodes[child.0].phrase;
            if child_phrase.as_slice() == phrase {
                self.add_sources(child, sources);
                return;
            }

            let (common, child_rest, phrase_rest) = common_start_segment(child_phrase, phrase);
            let shared = common.len();
            let child_exhausted = child_rest.is_empty();

            if phrase_rest.is_empty() {
                // The input ends inside the child: split the child and let the
                // new upper half own the sources.
                let upper = self.split(node, child, shared);
                self.add_sources(upper, sources);
                return;
            }
            if child_exhausted {
                node = child;
                phrase = &phrase[shared..];
                continue;
            }
            let upper = self.split(node, child, shared);
            self.add_sources(upper, sources);
            self.add_child(upper, phrase[shared..].to_vec(), sources);
            return;
        }
    }

    /// The root handle.
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// The node's own phrase segment.
    pub fn phrase(&self, node: NodeId) -> &[String] {
        &self.nodes[node.0].phrase
    }

    /// Per-source occurrence counts recorded at the node itself.
    pub fn sources(&self, node: NodeId) -> &BTreeMap<SourceId, u32> {
        &self.nodes[node.0].sources
    }

    /// Children in insertion order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// The child whose phrase starts with `word`.
    pub fn child(&self, node: NodeId, word: &str) -> Option<NodeId> {
        self.nodes[node.0].child_index.get(word).copied()
    }

    /// Parent of the node (`None` for the root).
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Full phrase from the root down to and including `node`.
    pub fn node_label(&self, node: NodeId) -> Vec<String> {
        let mut segments = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            segments.push(self.phrase(id));
            current = self.parent(id);
        }
        segments.into_iter().rev().flatten().cloned().collect()
    }

    /// Locate the node whose label is exactly `phrase`.
    pub fn find(&self, phrase: &[String]) -> Option<NodeId> {
        let mut node = NodeId::ROOT;
        let mut rest = phrase;
        while let Some(first) = rest.first() {
            let child = self.child(node, first)?;
            let segment = self.phrase(child);
            if !rest.starts_with(segment) {
                return None;
            }
            rest = &rest[segment.len()..];
            node = child;
        }
        (node != NodeId::ROOT).then_some(node)
    }

    fn add_child(&mut self, parent: NodeId, phrase: Vec<String>, sources: &[SourceId]) -> NodeId {
        let id = NodeId(self.nodes.len());
        let key = phrase[0].clone();
        self.nodes.push(Node {
            phrase,
            parent: Some(parent),
            ..Node::default()
        });
        self.add_sources(id, sources);
        let parent_node = &mut self.nodes[parent.0];
        parent_node.children.push(id);
        parent_node.child_index.insert(key, id);
        id
    }

    fn add_sources(&mut self, node: NodeId, sources: &[SourceId]) {
        let counts = &mut self.nodes[node.0].sources;
        for &source in sources {
            *counts.entry(source).or_insert(0) += 1;
        }
    }

    /// Split `child` after `at` words. The new upper node takes the child's
    /// slot under `parent` and the truncated child becomes its only child.
    fn split(&mut self, parent: NodeId, child: NodeId, at: usize) -> NodeId {
        let upper = NodeId(self.nodes.len());
        let lower_phrase = self.nodes[child.0].phrase.split_off(at);
        let upper_phrase = std::mem::replace(&mut self.nodes[child.0].phrase, lower_phrase);
        let lower_key = self.nodes[child.0].phrase[0].clone();
        let upper_key = upper_phrase[0].clone();

        self.nodes[child.0].parent = Some(upper);
        self.nodes.push(Node {
            phrase: upper_phrase,
            sources: BTreeMap::new(),
            children: vec![child],
            child_index: HashMap::from([(lower_key, child)]),
            parent: Some(parent),
        });

        let parent_node = &mut self.nodes[parent.0];
        if let Some(slot) = parent_node.children.iter_mut().find(|c| **c == child) {
            *slot = upper;
        }
        parent_node.child_index.insert(upper_key, upper);
        upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phrase::tokenize;

    fn ids(n: u32) -> Vec<SourceId> {
        let mut table = crate::corpus::SourceTable::new();
        (0..n).map(|i| table.intern(&format!("s{i}"))).collect()
    }

    fn labels(trie: &CompactTrie, node: NodeId) -> Vec<String> {
        trie.children(node)
            .iter()
            .map(|&c| trie.node_label(c).join(" "))
            .collect()
    }

    #[test]
    fn empty_phrase_is_ignored() {
        let s = ids(1);
        let mut trie = CompactTrie::new();
        trie.insert(&[], &s);
        assert!(trie.is_empty());
    }

    #[test]
    fn new_branch_holds_whole_phrase() {
        let s = ids(1);
        let mut trie = CompactTrie::new();
        trie.insert(&tokenize("a b c"), &s);
        let child = trie.child(trie.root(), "a").unwrap();
        assert_eq!(trie.phrase(child), tokenize("a b c"));
        assert_eq!(trie.sources(child).get(&s[0]), Some(&1));
        assert_eq!(trie.parent(child), Some(NodeId::ROOT));
    }

    #[test]
    fn inserting_twice_counts_occurrences() {
        let s = ids(1);
        let mut trie = CompactTrie::new();
        trie.insert(&tokenize("a b"), &s);
        trie.insert(&tokenize("a b"), &s);
        assert_eq!(trie.children(trie.root()).len(), 1);
        let node = trie.find(&tokenize("a b")).unwrap();
        assert_eq!(trie.sources(node).get(&s[0]), Some(&2));
    }

    #[test]
    fn branching_splits_common_prefix() {
        let s = ids(2);
        let mut trie = CompactTrie::new();
        trie.insert(&tokenize("a b c"), &s[..1]);
        trie.insert(&tokenize("a b d"), &s[1..]);

        let branch = trie.find(&tokenize("a b")).unwrap();
        assert_eq!(trie.phrase(branch), tokenize("a b"));
        assert_eq!(labels(&trie, branch), vec!["a b c", "a b d"]);

        let c = trie.find(&tokenize("a b c")).unwrap();
        let d = trie.find(&tokenize("a b d")).unwrap();
        assert_eq!(trie.phrase(c), tokenize("c"));
        assert_eq!(trie.sources(c).keys().collect::<Vec<_>>(), vec![&s[0]]);
        assert_eq!(trie.sources(d).keys().collect::<Vec<_>>(), vec![&s[1]]);
        assert_eq!(trie.parent(c), Some(branch));
        assert_eq!(trie.parent(d), Some(branch));
    }

    #[test]
    fn shorter_phrase_splits_existing_child() {
        let s = ids(2);
        let mut trie = CompactTrie::new();
        trie.insert(&tokenize("a b c"), &s[..1]);
        trie.insert(&tokenize("a b"), &s[1..]);

        let upper = trie.find(&tokenize("a b")).unwrap();
        assert_eq!(trie.children(trie.root()), &[upper]);
        assert_eq!(trie.sources(upper).keys().collect::<Vec<_>>(), vec![&s[1]]);
        assert_eq!(labels(&trie, upper), vec!["a b c"]);
    }

    #[test]
    fn longer_phrase_descends_into_child() {
        let s = ids(2);
        let mut trie = CompactTrie::new();
        trie.insert(&tokenize("a b"), &s[..1]);
        trie.insert(&tokenize("a b c d"), &s[1..]);

        let ab = trie.find(&tokenize("a b")).unwrap();
        assert_eq!(trie.sources(ab).len(), 1);
        let leaf = trie.find(&tokenize("a b c d")).unwrap();
        assert_eq!(trie.phrase(leaf), tokenize("c d"));
        assert_eq!(trie.parent(leaf), Some(ab));
    }

    #[test]
    fn split_keeps_sibling_order() {
        let s = ids(1);
        let mut trie = CompactTrie::new();
        trie.insert(&tokenize("x"), &s);
        trie.insert(&tokenize("a b"), &s);
        trie.insert(&tokenize("z"), &s);
        trie.insert(&tokenize("a c"), &s);
        assert_eq!(labels(&trie, trie.root()), vec!["x", "a", "z"]);
    }

    #[test]
    fn suffix_build_matches_worked_example() {
        let s = ids(2);
        let snippets = vec![
            Snippet {
                phrase: tokenize("a b c"),
                sources: vec![s[0]],
            },
            Snippet {
                phrase: tokenize("a b d"),
                sources: vec![s[1]],
            },
        ];
        let trie = CompactTrie::build(&ExpansionStrategy::Suffix, &snippets);
        let branch = trie.find(&tokenize("a b")).unwrap();
        assert_eq!(labels(&trie, branch), vec!["a b c", "a b d"]);
        assert_eq!(labels(&trie, trie.root()), vec!["a b", "b", "c", "d"]);
    }

    #[test]
    fn find_rejects_partial_segments() {
        let s = ids(1);
        let mut trie = CompactTrie::new();
        trie.insert(&tokenize("a b c"), &s);
        assert!(trie.find(&tokenize("a b")).is_none());
        assert!(trie.find(&tokenize("a b c d")).is_none());
        assert!(trie.find(&[]).is_none());
    }
}
