//! Paragraphs, documents, and cross-sentence coreference grouping.
//!
//! A [`Document`] aggregates paragraphs plus a title paragraph and the
//! coreference state accumulated by a resolution pass: a many-to-one map
//! from constituency node ids to group ids and its multi-valued inverse.
//! Group ids come from a document-scoped counter and are never reused.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sentence::Sentence;

/// An ordered collection of sentences validated as a paragraph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    sentences: Vec<Sentence>,
}

impl Paragraph {
    /// Create an empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sentence.
    pub fn push_sentence(&mut self, sentence: Sentence) {
        self.sentences.push(sentence);
    }

    /// Sentences in paragraph order.
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Mutable access to the sentences.
    pub fn sentences_mut(&mut self) -> &mut [Sentence] {
        &mut self.sentences
    }

    /// Number of sentences.
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    /// Whether the paragraph has no sentences.
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Iterate over the sentences.
    pub fn iter(&self) -> std::slice::Iter<'_, Sentence> {
        self.sentences.iter()
    }
}

impl From<Vec<Sentence>> for Paragraph {
    fn from(sentences: Vec<Sentence>) -> Self {
        Self { sentences }
    }
}

impl<'a> IntoIterator for &'a Paragraph {
    type Item = &'a Sentence;
    type IntoIter = std::slice::Iter<'a, Sentence>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An ordered collection of paragraphs with a title and coreference groups.
///
/// # Example
///
/// ```
/// use annotated_doc::Document;
///
/// let mut doc = Document::new();
/// doc.add_positive("n1", "n2");
/// doc.add_positive("n2", "n3");
///
/// assert!(doc.is_coref("n1", "n3"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    paragraphs: Vec<Paragraph>,
    title: Paragraph,
    /// Coreference group id to its member node ids.
    group_members: BTreeMap<usize, BTreeSet<String>>,
    /// Node id to the group it belongs to.
    node_group: HashMap<String, usize>,
    /// Last group id handed out. Document-scoped; ids are never reused.
    last_group: usize,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a paragraph.
    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
    }

    /// Paragraphs in document order.
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Mutable access to the paragraphs.
    pub fn paragraphs_mut(&mut self) -> &mut [Paragraph] {
        &mut self.paragraphs
    }

    /// Number of paragraphs.
    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    /// Whether the document has no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Iterate over the paragraphs.
    pub fn iter(&self) -> std::slice::Iter<'_, Paragraph> {
        self.paragraphs.iter()
    }

    /// The title paragraph.
    pub fn title(&self) -> &Paragraph {
        &self.title
    }

    /// Mutable access to the title paragraph.
    pub fn title_mut(&mut self) -> &mut Paragraph {
        &mut self.title
    }

    /// Replace the title paragraph.
    pub fn set_title(&mut self, title: Paragraph) {
        self.title = title;
    }

    // ---- coreference grouping ----

    fn insert_member(&mut self, node: &str, group: usize) {
        self.node_group.insert(node.to_string(), group);
        self.group_members
            .entry(group)
            .or_insert_with(BTreeSet::new)
            .insert(node.to_string());
    }

    /// Add one node to an explicit coreference group, creating the group's
    /// member set if absent.
    ///
    /// The internal counter ratchets past explicit ids so that ids handed
    /// out later can never collide with `group`.
    pub fn add_positive_group(&mut self, node: &str, group: usize) {
        self.insert_member(node, group);
        self.last_group = self.last_group.max(group);
    }

    /// Record that `node1` and `node2` corefer, merging group assumptions.
    ///
    /// Creates a fresh group if neither node had one, reuses the existing
    /// group if exactly one had one, and merges both groups (keeping one
    /// id, reassigning the other's members) if they differed.
    pub fn add_positive(&mut self, node1: &str, node2: &str) {
        let g1 = self.node_group.get(node1).copied();
        let g2 = self.node_group.get(node2).copied();

        match (g1, g2) {
            (None, None) => {
                self.last_group += 1;
                let group = self.last_group;
                self.insert_member(node1, group);
                self.insert_member(node2, group);
            }
            (Some(group), None) => self.insert_member(node2, group),
            (None, Some(group)) => self.insert_member(node1, group),
            (Some(kept), Some(merged)) if kept != merged => {
                let members = self.group_members.remove(&merged).unwrap_or_default();
                debug!(kept, merged, moved = members.len(), "merging coreference groups");
                for member in members {
                    self.insert_member(&member, kept);
                }
            }
            // Already in the same group.
            (Some(_), Some(_)) => {}
        }
    }

    /// Group id of the node, or `None` if the node is in no group.
    pub fn get_coref_group(&self, node: &str) -> Option<usize> {
        self.node_group.get(node).copied()
    }

    /// Member node ids of a group. Empty if the group does not exist.
    pub fn get_coref_nodes(&self, group: usize) -> impl Iterator<Item = &str> {
        self.group_members
            .get(&group)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Whether both nodes resolve to the same existing group.
    pub fn is_coref(&self, node1: &str, node2: &str) -> bool {
        match (self.get_coref_group(node1), self.get_coref_group(node2)) {
            (Some(g1), Some(g2)) => g1 == g2,
            _ => false,
        }
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Paragraph;
    type IntoIter = std::slice::Iter<'a, Paragraph>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::Word;

    fn members(doc: &Document, group: usize) -> Vec<&str> {
        doc.get_coref_nodes(group).collect()
    }

    #[test]
    fn test_fresh_group_for_two_new_nodes() {
        let mut doc = Document::new();
        doc.add_positive("n1", "n2");

        let g = doc.get_coref_group("n1").unwrap();
        assert_eq!(doc.get_coref_group("n2"), Some(g));
        assert_eq!(members(&doc, g), vec!["n1", "n2"]);
    }

    #[test]
    fn test_existing_group_is_reused() {
        let mut doc = Document::new();
        doc.add_positive("n1", "n2");
        let g = doc.get_coref_group("n1").unwrap();

        doc.add_positive("n1", "n3");
        assert_eq!(doc.get_coref_group("n3"), Some(g));

        doc.add_positive("n4", "n2"); // known node on the right side
        assert_eq!(doc.get_coref_group("n4"), Some(g));
        assert_eq!(members(&doc, g), vec!["n1", "n2", "n3", "n4"]);
    }

    #[test]
    fn test_coref_is_transitive_through_merges() {
        let mut doc = Document::new();
        doc.add_positive("a", "b");
        doc.add_positive("b", "c");

        assert!(doc.is_coref("a", "c"));
        let g = doc.get_coref_group("a").unwrap();
        assert_eq!(members(&doc, g), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_merge_of_two_existing_groups() {
        let mut doc = Document::new();
        doc.add_positive("n1", "n2");
        doc.add_positive_group("n3", 7);
        doc.add_positive("n1", "n3");

        // n1, n2, n3 end up in one common group with exactly those members.
        let g = doc.get_coref_group("n1").unwrap();
        assert_eq!(doc.get_coref_group("n2"), Some(g));
        assert_eq!(doc.get_coref_group("n3"), Some(g));
        assert_eq!(members(&doc, g), vec!["n1", "n2", "n3"]);

        // The merged-away group keeps no members.
        for group in [1usize, 7] {
            if group != g {
                assert_eq!(doc.get_coref_nodes(group).count(), 0);
            }
        }
    }

    #[test]
    fn test_explicit_group_ids_are_not_reused() {
        let mut doc = Document::new();
        doc.add_positive_group("n1", 7);
        doc.add_positive("n2", "n3");

        // The fresh group must not collide with the explicit id 7.
        let g = doc.get_coref_group("n2").unwrap();
        assert_ne!(g, 7);
        assert!(g > 7);
    }

    #[test]
    fn test_same_group_pair_is_a_no_op() {
        let mut doc = Document::new();
        doc.add_positive("n1", "n2");
        let g = doc.get_coref_group("n1").unwrap();

        doc.add_positive("n2", "n1");
        assert_eq!(doc.get_coref_group("n1"), Some(g));
        assert_eq!(members(&doc, g), vec!["n1", "n2"]);
    }

    #[test]
    fn test_ungrouped_nodes() {
        let doc = Document::new();
        assert_eq!(doc.get_coref_group("nope"), None);
        assert!(!doc.is_coref("nope", "nada"));
        assert_eq!(doc.get_coref_nodes(3).count(), 0);
    }

    #[test]
    fn test_title_and_paragraphs() {
        let mut doc = Document::new();
        assert!(doc.is_empty());
        assert!(doc.title().is_empty());

        let mut title = Paragraph::new();
        title.push_sentence(crate::Sentence::from_words(vec![Word::new("Headline")]));
        doc.set_title(title);
        assert_eq!(doc.title().len(), 1);

        let mut body = Paragraph::new();
        body.push_sentence(crate::Sentence::from_words(vec![Word::new("Text")]));
        doc.push_paragraph(body);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.iter().count(), 1);
    }
}
