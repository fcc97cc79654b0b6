//! Corpus data model.
//!
//! A [`Corpus`] bundles everything a clustering invocation reads but never
//! writes: the snippet collection grouped by text type, the source-to-tag
//! index, the ground-truth categories and the corpus-wide word document
//! frequencies. It is built once and reused across many parameter sets.
//!
//! Source strings are interned into [`SourceId`]s on construction so the
//! engine works on small copyable ids.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::phrase::tokenize;

/// Interned document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourceId(u32);

impl SourceId {
    /// Position of this source in its [`SourceTable`].
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bidirectional map between source strings and [`SourceId`]s.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    names: Vec<String>,
    ids: HashMap<String, SourceId>,
}

impl SourceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, allocating one on first sight.
    #[allow(clippy::cast_possible_truncation)]
    pub fn intern(&mut self, name: &str) -> SourceId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = SourceId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Look up an already interned source.
    pub fn get(&self, name: &str) -> Option<SourceId> {
        self.ids.get(name).copied()
    }

    /// The source string behind an id.
    pub fn name(&self, id: SourceId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    /// Number of distinct sources.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no source has been interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A tokenized text fragment and the documents it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    /// The snippet's words.
    pub phrase: Vec<String>,
    /// Contributing sources.
    pub sources: Vec<SourceId>,
}

impl Snippet {
    /// Tokenize `text` into a snippet owned by `sources`.
    pub fn new(text: &str, sources: Vec<SourceId>) -> Self {
        Self {
            phrase: tokenize(text),
            sources,
        }
    }
}

/// Snippets grouped by text type (e.g. `ArticleHeading`).
///
/// Text types keep the order in which they were first added.
#[derive(Debug, Clone, Default)]
pub struct SnippetCollection {
    groups: Vec<(String, Vec<Snippet>)>,
}

impl SnippetCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snippet under `text_type`.
    pub fn push(&mut self, text_type: &str, snippet: Snippet) {
        if let Some((_, snippets)) = self.groups.iter_mut().find(|(t, _)| t == text_type) {
            snippets.push(snippet);
        } else {
            self.groups.push((text_type.to_string(), vec![snippet]));
        }
    }

    /// Text type names in first-seen order.
    pub fn text_types(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(t, _)| t.as_str())
    }

    /// Snippets of one text type.
    pub fn get(&self, text_type: &str) -> Option<&[Snippet]> {
        self.groups
            .iter()
            .find(|(t, _)| t == text_type)
            .map(|(_, s)| s.as_slice())
    }

    /// All snippets across every text type.
    pub fn iter(&self) -> impl Iterator<Item = &Snippet> {
        self.groups.iter().flat_map(|(_, s)| s.iter())
    }

    /// Total number of snippets.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, s)| s.len()).sum()
    }

    /// Whether the collection holds no snippets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snippets of the selected text types.
    ///
    /// `None` selects everything; `Some(map)` selects exactly the text types
    /// mapped to `true`. Unknown names are ignored.
    pub fn filter(&self, selection: Option<&BTreeMap<String, bool>>) -> Vec<&Snippet> {
        self.groups
            .iter()
            .filter(|(t, _)| selection.is_none_or(|sel| sel.get(t).copied().unwrap_or(false)))
            .flat_map(|(_, s)| s.iter())
            .collect()
    }
}

/// Split a ground-truth tag string into normalized words.
///
/// Hyphens separate words like whitespace does, and words are lower-cased.
pub fn tag_words(tag: &str) -> Vec<String> {
    tokenize(&tag.replace('-', " ").to_lowercase())
}

/// Source-to-tag index with the tag words precomputed.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    entries: HashMap<SourceId, (String, Vec<String>)>,
}

impl TagIndex {
    /// Record the tag string of a source. A later call replaces it.
    pub fn insert(&mut self, source: SourceId, tag: &str) {
        self.entries
            .insert(source, (tag.to_string(), tag_words(tag)));
    }

    /// Raw tag string of a source.
    pub fn tag(&self, source: SourceId) -> Option<&str> {
        self.entries.get(&source).map(|(t, _)| t.as_str())
    }

    /// Normalized tag words of a source (empty when untagged).
    pub fn words(&self, source: SourceId) -> &[String] {
        self.entries
            .get(&source)
            .map(|(_, words)| words.as_slice())
            .unwrap_or_default()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ground-truth categories: tag string to the sources carrying it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundTruthIndex {
    categories: BTreeMap<String, Vec<SourceId>>,
}

impl GroundTruthIndex {
    /// Add a source to the category named by `tag`.
    pub fn insert(&mut self, tag: &str, source: SourceId) {
        let sources = self.categories.entry(tag.to_string()).or_default();
        if !sources.contains(&source) {
            sources.push(source);
        }
    }

    /// A copy without categories that hold a single source.
    #[must_use]
    pub fn drop_singletons(&self) -> Self {
        Self {
            categories: self
                .categories
                .iter()
                .filter(|(_, sources)| sources.len() > 1)
                .map(|(tag, sources)| (tag.clone(), sources.clone()))
                .collect(),
        }
    }

    /// Sources of one category.
    pub fn get(&self, tag: &str) -> Option<&[SourceId]> {
        self.categories.get(tag).map(Vec::as_slice)
    }

    /// Categories ordered by tag.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SourceId])> {
        self.categories
            .iter()
            .map(|(tag, sources)| (tag.as_str(), sources.as_slice()))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether there are no categories.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl FromIterator<(String, Vec<SourceId>)> for GroundTruthIndex {
    fn from_iter<I: IntoIterator<Item = (String, Vec<SourceId>)>>(iter: I) -> Self {
        Self {
            categories: iter.into_iter().collect(),
        }
    }
}

/// Corpus-wide word document frequencies.
#[derive(Debug, Clone, Default)]
pub struct WordIndex {
    words: HashMap<String, BTreeSet<SourceId>>,
    no_of_sources: usize,
}

impl WordIndex {
    /// Index every word of every snippet.
    pub fn from_snippets<'a, I>(snippets: I) -> Self
    where
        I: IntoIterator<Item = &'a Snippet>,
    {
        let mut words: HashMap<String, BTreeSet<SourceId>> = HashMap::new();
        let mut all_sources = BTreeSet::new();
        for snippet in snippets {
            all_sources.extend(snippet.sources.iter().copied());
            for word in &snippet.phrase {
                words
                    .entry(word.clone())
                    .or_default()
                    .extend(snippet.sources.iter().copied());
            }
        }
        Self {
            words,
            no_of_sources: all_sources.len(),
        }
    }

    /// Sources containing `word`.
    pub fn sources(&self, word: &str) -> Option<&BTreeSet<SourceId>> {
        self.words.get(word)
    }

    /// Number of sources containing `word` (0 for unknown words).
    pub fn document_frequency(&self, word: &str) -> usize {
        self.words.get(word).map_or(0, BTreeSet::len)
    }

    /// Number of distinct sources in the indexed collection.
    pub const fn no_of_sources(&self) -> usize {
        self.no_of_sources
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether no word was indexed.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// One document of a serialized corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct Document {
    /// Document identifier.
    pub source: String,
    /// Ground-truth tag string (hyphen separated words). Empty when untagged.
    #[serde(default)]
    pub tags: String,
    /// Snippets keyed by text type, in file order.
    #[serde(default, with = "text_map")]
    #[schemars(with = "BTreeMap<String, Vec<String>>")]
    pub texts: Vec<(String, Vec<String>)>,
}

/// A JSON object of text type to snippets, read into a list so the file's
/// key order survives. Repeated keys append to the first entry.
mod text_map {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        texts: &[(String, Vec<String>)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(texts.len()))?;
        for (text_type, snippets) in texts {
            map.serialize_entry(text_type, snippets)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, Vec<String>)>, D::Error> {
        deserializer.deserialize_map(TextMapVisitor)
    }

    struct TextMapVisitor;

    impl<'de> Visitor<'de> for TextMapVisitor {
        type Value = Vec<(String, Vec<String>)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of text type to snippet lists")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut texts: Self::Value = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((text_type, snippets)) = access.next_entry::<String, Vec<String>>()? {
                match texts.iter_mut().find(|(t, _)| *t == text_type) {
                    Some((_, existing)) => existing.extend(snippets),
                    None => texts.push((text_type, snippets)),
                }
            }
            Ok(texts)
        }
    }
}

#[derive(Debug, Deserialize)]
struct CorpusFile {
    documents: Vec<Document>,
}

/// A snippet corpus with its evaluation indexes.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    sources: SourceTable,
    snippets: SnippetCollection,
    tags: TagIndex,
    ground_truth: GroundTruthIndex,
    words: WordIndex,
}

impl Corpus {
    /// Build a corpus from documents.
    ///
    /// Every document is tag-indexed; documents with a non-empty tag string
    /// also join the ground-truth category of that tag.
    #[tracing::instrument(skip_all, fields(documents = documents.len()))]
    pub fn from_documents(documents: Vec<Document>) -> Self {
        let mut sources = SourceTable::new();
        let mut snippets = SnippetCollection::new();
        let mut tags = TagIndex::default();
        let mut ground_truth = GroundTruthIndex::default();

        for document in documents {
            let id = sources.intern(&document.source);
            tags.insert(id, &document.tags);
            if !document.tags.trim().is_empty() {
                ground_truth.insert(&document.tags, id);
            }
            for (text_type, texts) in &document.texts {
                for text in texts {
                    snippets.push(text_type, Snippet::new(text, vec![id]));
                }
            }
        }

        let words = WordIndex::from_snippets(snippets.iter());
        tracing::debug!(
            sources = sources.len(),
            snippets = snippets.len(),
            categories = ground_truth.len(),
            words = words.len(),
            "corpus indexed"
        );

        Self {
            sources,
            snippets,
            tags,
            ground_truth,
            words,
        }
    }

    /// Decode a corpus from its JSON form.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let file: CorpusFile = serde_json::from_str(json)?;
        Ok(Self::from_documents(file.documents))
    }

    /// Interned sources.
    pub const fn sources(&self) -> &SourceTable {
        &self.sources
    }

    /// Snippets by text type.
    pub const fn snippets(&self) -> &SnippetCollection {
        &self.snippets
    }

    /// Source-to-tag index.
    pub const fn tags(&self) -> &TagIndex {
        &self.tags
    }

    /// Ground-truth categories.
    pub const fn ground_truth(&self) -> &GroundTruthIndex {
        &self.ground_truth
    }

    /// Word document frequencies.
    pub const fn words(&self) -> &WordIndex {
        &self.words
    }
}
