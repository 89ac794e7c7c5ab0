//! A validated sentence: ordered words, per-hypothesis trees, and
//! per-stage scratch state.
//!
//! Word positions are 0-based, contiguous, and match collection order.
//! Any structural edit of the word collection invalidates the positional
//! index until [`rebuild_word_index`](Sentence::rebuild_word_index) runs —
//! this is a manual synchronization point, and the single most important
//! correctness contract in the model: stale positions silently desync tree
//! leaf lookups, so positional reads performed against a stale index fail
//! loudly instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::constituency::ConstituencyTree;
use crate::dependency::DependencyTree;
use crate::error::{ModelError, ModelResult};
use crate::word::Word;

/// Predicate annotation for one word: its role label plus the argument
/// positions and their role labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredArgSet {
    /// Role of the predicate itself.
    pub role: String,
    /// Argument word position to argument role label.
    pub args: BTreeMap<usize, String>,
}

impl PredArgSet {
    /// Create a predicate annotation with no arguments yet.
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            args: BTreeMap::new(),
        }
    }
}

/// Scratch state pushed by an analysis stage while it works on a sentence.
///
/// Stages nest (a sub-analyzer may run inside a larger stage), so states
/// stack: each stage pushes on entry and pops on exit, and only the top is
/// queryable.
#[derive(Debug, Clone, PartialEq)]
pub enum StageStatus {
    /// Bookkeeping kept by the statistical tagger while ranking sequences.
    Tagging { requested_kbest: usize },
    /// Bookkeeping kept by a parser while its chart is under construction.
    Parsing { pending_edges: usize },
    /// Any other stage: identifying name plus free-form payload.
    Custom { stage: String, data: Vec<String> },
}

/// An ordered collection of words with per-k parse and dependency trees,
/// predicate-argument annotations and a processing-status stack.
///
/// # Example
///
/// ```
/// use annotated_doc::{Sentence, Word};
///
/// let mut s = Sentence::new();
/// s.push_word(Word::new("the"));
/// s.push_word(Word::new("cat"));
/// s.rebuild_word_index();
///
/// assert_eq!(s.word(1).unwrap().form(), "cat");
/// assert_eq!(s.word(1).unwrap().position(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sentence {
    /// Words in sentence order.
    words: Vec<Word>,
    /// Sentence identifier, if the application assigned one.
    sent_id: Option<String>,
    /// Constituency tree per k-best hypothesis; absent k means not parsed
    /// at that hypothesis.
    parse_trees: BTreeMap<usize, ConstituencyTree>,
    /// Dependency tree per k-best hypothesis.
    dep_trees: BTreeMap<usize, DependencyTree>,
    /// Predicate word position to its predicate-argument annotation.
    pred_args: BTreeMap<usize, PredArgSet>,
    /// Per-stage scratch states, top of stack last. Transient: not part of
    /// the persisted surface.
    #[serde(skip)]
    status: Vec<StageStatus>,
    /// Structural version of the word collection.
    version: u64,
    /// Version the positional index was last rebuilt at.
    indexed_at: u64,
}

impl Sentence {
    /// Create an empty sentence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sentence from words, with the positional index already
    /// rebuilt.
    pub fn from_words(words: Vec<Word>) -> Self {
        let mut s = Self {
            words,
            ..Self::default()
        };
        s.rebuild_word_index();
        s
    }

    /// Sentence identifier, if assigned.
    pub fn id(&self) -> Option<&str> {
        self.sent_id.as_deref()
    }

    /// Assign the sentence identifier.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.sent_id = Some(id.into());
    }

    // ---- word collection ----

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the sentence has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words in sentence order.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Mutable access to the words, without permitting structural edits.
    ///
    /// In-place word mutation cannot desynchronize positions; insertion
    /// and removal go through [`insert_word`](Self::insert_word) /
    /// [`remove_word`](Self::remove_word), which track the structural
    /// version.
    pub fn words_mut(&mut self) -> &mut [Word] {
        &mut self.words
    }

    /// Iterate over the words.
    pub fn iter(&self) -> std::slice::Iter<'_, Word> {
        self.words.iter()
    }

    /// Append a word. Invalidates the positional index until
    /// [`rebuild_word_index`](Self::rebuild_word_index).
    pub fn push_word(&mut self, word: Word) {
        self.words.push(word);
        self.version += 1;
    }

    /// Insert a word at `pos`. Invalidates the positional index.
    pub fn insert_word(&mut self, pos: usize, word: Word) {
        self.words.insert(pos, word);
        self.version += 1;
    }

    /// Remove and return the word at `pos`. Invalidates the positional
    /// index.
    pub fn remove_word(&mut self, pos: usize) -> ModelResult<Word> {
        if pos >= self.words.len() {
            return Err(ModelError::WordPosNotFound { pos });
        }
        self.version += 1;
        Ok(self.words.remove(pos))
    }

    /// Rebuild the positional index: word at index i gets `position == i`.
    ///
    /// Must be invoked by any caller that structurally mutated the word
    /// collection, before any downstream consumer reads positions.
    pub fn rebuild_word_index(&mut self) {
        for (i, w) in self.words.iter_mut().enumerate() {
            w.set_position(i);
        }
        self.indexed_at = self.version;
        trace!(words = self.words.len(), "rebuilt sentence word index");
    }

    /// Whether the positional index matches the current word collection.
    pub fn index_is_current(&self) -> bool {
        self.indexed_at == self.version
    }

    fn check_fresh(&self) -> ModelResult<()> {
        if self.indexed_at != self.version {
            return Err(ModelError::StaleIndex {
                indexed: self.indexed_at,
                current: self.version,
            });
        }
        Ok(())
    }

    /// Word at the given position. Fails loudly if the positional index is
    /// stale.
    pub fn word(&self, pos: usize) -> ModelResult<&Word> {
        self.check_fresh()?;
        self.words.get(pos).ok_or(ModelError::WordPosNotFound { pos })
    }

    /// Mutable word at the given position.
    pub fn word_mut(&mut self, pos: usize) -> ModelResult<&mut Word> {
        self.check_fresh()?;
        self.words
            .get_mut(pos)
            .ok_or(ModelError::WordPosNotFound { pos })
    }

    /// How many k-best sequences the tagger computed for this sentence.
    pub fn num_kbest(&self) -> usize {
        self.words.iter().map(Word::num_kbest).max().unwrap_or(0)
    }

    // ---- tree pairs per hypothesis ----

    /// Store a constituency tree under hypothesis k, replacing any prior
    /// tree at that k.
    pub fn set_parse_tree(&mut self, tree: ConstituencyTree, k: usize) {
        self.parse_trees.insert(k, tree);
    }

    /// Constituency tree at hypothesis k.
    pub fn get_parse_tree(&self, k: usize) -> ModelResult<&ConstituencyTree> {
        self.parse_trees.get(&k).ok_or(ModelError::NoParseTree { k })
    }

    /// Mutable constituency tree at hypothesis k.
    pub fn get_parse_tree_mut(&mut self, k: usize) -> ModelResult<&mut ConstituencyTree> {
        self.parse_trees
            .get_mut(&k)
            .ok_or(ModelError::NoParseTree { k })
    }

    /// Whether hypothesis 0 (the conventional primary parse) has a
    /// constituency tree.
    pub fn is_parsed(&self) -> bool {
        self.parse_trees.contains_key(&0)
    }

    /// Store a dependency tree under hypothesis k, replacing any prior
    /// tree at that k.
    pub fn set_dep_tree(&mut self, tree: DependencyTree, k: usize) {
        self.dep_trees.insert(k, tree);
    }

    /// Dependency tree at hypothesis k.
    pub fn get_dep_tree(&self, k: usize) -> ModelResult<&DependencyTree> {
        self.dep_trees.get(&k).ok_or(ModelError::NoDepTree { k })
    }

    /// Mutable dependency tree at hypothesis k.
    pub fn get_dep_tree_mut(&mut self, k: usize) -> ModelResult<&mut DependencyTree> {
        self.dep_trees.get_mut(&k).ok_or(ModelError::NoDepTree { k })
    }

    /// Whether hypothesis 0 has a dependency tree.
    pub fn is_dep_parsed(&self) -> bool {
        self.dep_trees.contains_key(&0)
    }

    // ---- predicate-argument annotations ----

    /// Record the word at `pred_pos` as a predicate with the given role.
    pub fn add_predicate(&mut self, pred_pos: usize, role: impl Into<String>) {
        self.pred_args.insert(pred_pos, PredArgSet::new(role));
    }

    /// Attach an argument to the predicate at `pred_pos`.
    ///
    /// The predicate must have been recorded first.
    pub fn add_argument(
        &mut self,
        pred_pos: usize,
        arg_pos: usize,
        role: impl Into<String>,
    ) -> ModelResult<()> {
        let pred = self
            .pred_args
            .get_mut(&pred_pos)
            .ok_or(ModelError::WordPosNotFound { pos: pred_pos })?;
        pred.args.insert(arg_pos, role.into());
        Ok(())
    }

    /// Predicate-argument table: predicate word position to annotation.
    pub fn pred_args(&self) -> &BTreeMap<usize, PredArgSet> {
        &self.pred_args
    }

    // ---- processing-status stack ----

    /// Push a stage's scratch state. Ownership transfers to the sentence.
    pub fn set_processing_status(&mut self, status: StageStatus) {
        self.status.push(status);
    }

    /// Peek the top scratch state, if any stage pushed one.
    pub fn get_processing_status(&self) -> Option<&StageStatus> {
        self.status.last()
    }

    /// Pop and drop the top scratch state.
    ///
    /// Stages must nest: popping with nothing pushed is an error.
    pub fn clear_processing_status(&mut self) -> ModelResult<()> {
        self.status.pop().map(|_| ()).ok_or(ModelError::EmptyStatusStack)
    }
}

impl From<Vec<Word>> for Sentence {
    fn from(words: Vec<Word>) -> Self {
        Self::from_words(words)
    }
}

impl<'a> IntoIterator for &'a Sentence {
    type Item = &'a Word;
    type IntoIter = std::slice::Iter<'a, Word>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constituency::ConstituencyNode;
    use crate::dependency::DependencyNode;

    fn the_cat_sat() -> Sentence {
        Sentence::from_words(vec![Word::new("the"), Word::new("cat"), Word::new("sat")])
    }

    #[test]
    fn test_positions_match_iteration_order() {
        let s = the_cat_sat();
        for (i, w) in s.iter().enumerate() {
            assert_eq!(w.position(), i);
        }
    }

    #[test]
    fn test_structural_edit_invalidates_index() {
        let mut s = the_cat_sat();
        assert!(s.index_is_current());

        s.insert_word(0, Word::new("yesterday"));
        assert!(!s.index_is_current());
        assert!(matches!(s.word(0), Err(ModelError::StaleIndex { .. })));

        s.rebuild_word_index();
        assert_eq!(s.word(0).unwrap().form(), "yesterday");
        assert_eq!(s.word(3).unwrap().form(), "sat");
        assert_eq!(s.word(3).unwrap().position(), 3);
    }

    #[test]
    fn test_remove_word() {
        let mut s = the_cat_sat();
        let removed = s.remove_word(1).unwrap();
        assert_eq!(removed.form(), "cat");

        s.rebuild_word_index();
        assert_eq!(s.len(), 2);
        assert_eq!(s.word(1).unwrap().form(), "sat");

        assert!(matches!(
            s.remove_word(9),
            Err(ModelError::WordPosNotFound { pos: 9 })
        ));
    }

    #[test]
    fn test_in_place_word_edits_keep_index_valid() {
        let mut s = the_cat_sat();
        s.words_mut()[1].set_form("dog");
        assert!(s.index_is_current());
        assert_eq!(s.word(1).unwrap().form(), "dog");
    }

    #[test]
    fn test_word_position_out_of_range() {
        let s = the_cat_sat();
        assert!(matches!(s.word(5), Err(ModelError::WordPosNotFound { pos: 5 })));
    }

    #[test]
    fn test_trees_are_stored_per_hypothesis() {
        let mut s = the_cat_sat();
        assert!(!s.is_parsed());
        assert!(!s.is_dep_parsed());
        s.set_parse_tree(ConstituencyTree::with_root(ConstituencyNode::new("S")), 0);
        s.set_parse_tree(ConstituencyTree::with_root(ConstituencyNode::new("S2")), 1);
        s.set_dep_tree(DependencyTree::with_root(DependencyNode::new("top")), 1);

        assert!(s.is_parsed());
        assert!(!s.is_dep_parsed()); // only k=1 has a dependency tree
        assert!(s.get_parse_tree(1).is_ok());
        assert!(matches!(s.get_parse_tree(2), Err(ModelError::NoParseTree { k: 2 })));
        assert!(matches!(s.get_dep_tree(0), Err(ModelError::NoDepTree { k: 0 })));

        // Setting again at the same k replaces the prior tree.
        s.set_parse_tree(ConstituencyTree::new(), 1);
        assert!(s.get_parse_tree(1).unwrap().tree().is_empty());
    }

    #[test]
    fn test_predicate_arguments() {
        let mut s = the_cat_sat();
        s.add_predicate(2, "sit.01");
        s.add_argument(2, 1, "A0").unwrap();

        let pred = &s.pred_args()[&2];
        assert_eq!(pred.role, "sit.01");
        assert_eq!(pred.args[&1], "A0");

        // Arguments need their predicate recorded first.
        assert!(s.add_argument(0, 1, "A1").is_err());
    }

    #[test]
    fn test_status_stack_nests() {
        let mut s = the_cat_sat();
        assert_eq!(s.get_processing_status(), None);

        s.set_processing_status(StageStatus::Tagging { requested_kbest: 3 });
        s.set_processing_status(StageStatus::Custom {
            stage: "sense".to_string(),
            data: vec![],
        });

        assert!(matches!(
            s.get_processing_status(),
            Some(StageStatus::Custom { .. })
        ));

        s.clear_processing_status().unwrap();
        assert!(matches!(
            s.get_processing_status(),
            Some(StageStatus::Tagging { requested_kbest: 3 })
        ));

        s.clear_processing_status().unwrap();
        assert_eq!(s.clear_processing_status(), Err(ModelError::EmptyStatusStack));
    }

    #[test]
    fn test_num_kbest() {
        let mut s = the_cat_sat();
        assert_eq!(s.num_kbest(), 0);

        let w = s.word_mut(1).unwrap();
        w.add_analysis(crate::Analysis::new("cat", "NN"));
        w.select_analysis(0, 0).unwrap();
        w.select_analysis(0, 1).unwrap();
        assert_eq!(s.num_kbest(), 2);
    }
}
