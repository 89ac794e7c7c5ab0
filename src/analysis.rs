//! A single morphological reading of a word.
//!
//! An [`Analysis`] is one candidate lemma + tag interpretation, optionally
//! carrying a probability (from the tagger), an edit distance (from a
//! spelling corrector), ranked word senses, and a retokenization payload.
//! Selection into the tagger's k-best sequences is tracked per-analysis via
//! a set of sequence indices, never by reordering the owning word's list.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::word::Word;

/// One candidate reading (lemma, tag, probability, senses) for a word.
///
/// # Example
///
/// ```
/// use annotated_doc::Analysis;
///
/// let mut a = Analysis::new("bank", "NCFP000");
/// a.set_prob(0.7);
/// a.mark_selected(0);
///
/// assert!(a.is_selected(0));
/// assert!(!a.is_selected(1));
/// assert_eq!(a.max_kbest(), Some(0));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analysis {
    /// Lemma of this reading.
    lemma: String,
    /// PoS tag of this reading.
    tag: String,
    /// Probability of this lemma-tag pair given the word, if the tagger ran.
    prob: Option<f64>,
    /// Edit distance from the original form, if a corrector produced this.
    distance: Option<f64>,
    /// Ranked senses for this reading: (sense id, score).
    senses: Vec<(String, f64)>,
    /// Words to replace the owner with if this reading is finally chosen.
    /// A deferred-edit marker: never applied automatically.
    retok: Vec<Word>,
    /// Which of the tagger's k-best sequences select this reading.
    selected_kbest: BTreeSet<usize>,
}

impl Analysis {
    /// Create a reading from a lemma and a tag.
    pub fn new(lemma: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            lemma: lemma.into(),
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Lemma of this reading.
    pub fn lemma(&self) -> &str {
        &self.lemma
    }

    /// PoS tag of this reading.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Replace the lemma.
    pub fn set_lemma(&mut self, lemma: impl Into<String>) {
        self.lemma = lemma.into();
    }

    /// Replace the tag.
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    /// Whether a probability has been assigned.
    pub fn has_prob(&self) -> bool {
        self.prob.is_some()
    }

    /// Probability of this reading, if assigned.
    pub fn prob(&self) -> Option<f64> {
        self.prob
    }

    /// Assign the probability of this reading.
    pub fn set_prob(&mut self, prob: f64) {
        self.prob = Some(prob);
    }

    /// Whether a corrector distance has been assigned.
    pub fn has_distance(&self) -> bool {
        self.distance.is_some()
    }

    /// Corrector edit distance, if assigned.
    pub fn distance(&self) -> Option<f64> {
        self.distance
    }

    /// Assign the corrector edit distance.
    pub fn set_distance(&mut self, distance: f64) {
        self.distance = Some(distance);
    }

    /// Ranked senses of this reading.
    pub fn senses(&self) -> &[(String, f64)] {
        &self.senses
    }

    /// Mutable access to the sense list.
    pub fn senses_mut(&mut self) -> &mut Vec<(String, f64)> {
        &mut self.senses
    }

    /// Replace the sense list.
    pub fn set_senses(&mut self, senses: Vec<(String, f64)>) {
        self.senses = senses;
    }

    /// Render the sense list as `id:score` pairs joined by `/`.
    pub fn senses_string(&self) -> String {
        self.senses
            .iter()
            .map(|(id, score)| format!("{}:{}", id, score))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Whether choosing this reading implies retokenizing the word.
    pub fn is_retokenizable(&self) -> bool {
        !self.retok.is_empty()
    }

    /// Replacement words to apply if this reading is finally chosen.
    pub fn retokenizable(&self) -> &[Word] {
        &self.retok
    }

    /// Mutable access to the retokenization payload.
    pub fn retokenizable_mut(&mut self) -> &mut Vec<Word> {
        &mut self.retok
    }

    /// Set the retokenization payload.
    pub fn set_retokenizable(&mut self, words: Vec<Word>) {
        self.retok = words;
    }

    /// Largest k-best sequence index this reading is selected in, or `None`
    /// if it was never selected.
    pub fn max_kbest(&self) -> Option<usize> {
        self.selected_kbest.iter().next_back().copied()
    }

    /// Whether this reading is selected in the k-th best sequence.
    pub fn is_selected(&self, k: usize) -> bool {
        self.selected_kbest.contains(&k)
    }

    /// Mark this reading as selected in the k-th best sequence.
    /// Idempotent: marking an already-selected k changes nothing.
    pub fn mark_selected(&mut self, k: usize) {
        self.selected_kbest.insert(k);
    }

    /// Unmark this reading from the k-th best sequence.
    /// Unmarking an absent k is a no-op, not a failure.
    pub fn unmark_selected(&mut self, k: usize) {
        self.selected_kbest.remove(&k);
    }

    /// Comparison to sort analyses by *decreasing* probability.
    ///
    /// Unassigned probabilities sort last.
    pub fn cmp_by_decreasing_prob(a: &Analysis, b: &Analysis) -> Ordering {
        b.prob.partial_cmp(&a.prob).unwrap_or(Ordering::Equal)
    }
}

/// Equality compares lemma, tag and probability only; senses and the
/// retokenization payload are excluded, exactly as the selection machinery
/// treats readings. Two readings that differ only in senses compare equal.
impl PartialEq for Analysis {
    fn eq(&self, other: &Self) -> bool {
        self.lemma == other.lemma && self.tag == other.tag && self.prob == other.prob
    }
}
