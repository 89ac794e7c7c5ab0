//! A word-like unit of text with its candidate readings.
//!
//! A [`Word`] owns an ordered list of [`Analysis`] candidates and exposes
//! three filtered views over it for a given k-best sequence: all readings,
//! only the selected ones, only the unselected ones. The views are a single
//! cursor parameterized by [`AnalysisView`] and k, so they can never drift
//! apart from the live list. Selection never reorders analyses; it only
//! toggles per-analysis membership in a k-best sequence.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::Analysis;
use crate::error::{ModelError, ModelResult};

/// A character span within the source text.
///
/// Both offsets count from the start of the input; `end` is exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// An alternative surface form proposed by a spelling or phonetic corrector,
/// with its edit distance from the original form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    pub text: String,
    pub distance: i32,
}

impl Alternative {
    /// Create a new alternative form.
    pub fn new(text: impl Into<String>, distance: i32) -> Self {
        Self {
            text: text.into(),
            distance,
        }
    }
}

/// Which readings a filtered cursor yields for a given k-best sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisView {
    /// Every reading of the word.
    All,
    /// Only readings selected in the k-th best sequence.
    Selected,
    /// Only readings not selected in the k-th best sequence.
    Unselected,
}

/// Forward cursor over a word's readings, filtered by view mode and k.
///
/// All three modes traverse the same underlying list; advancing skips
/// readings that do not match the mode.
#[derive(Debug, Clone)]
pub struct AnalysisIter<'a> {
    inner: std::slice::Iter<'a, Analysis>,
    view: AnalysisView,
    k: usize,
}

impl<'a> Iterator for AnalysisIter<'a> {
    type Item = &'a Analysis;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let a = self.inner.next()?;
            let matches = match self.view {
                AnalysisView::All => true,
                AnalysisView::Selected => a.is_selected(self.k),
                AnalysisView::Unselected => !a.is_selected(self.k),
            };
            if matches {
                return Some(a);
            }
        }
    }
}

/// One token of text: surface form, candidate readings, multiword
/// decomposition, corrector alternatives and span/position metadata.
///
/// # Example
///
/// ```
/// use annotated_doc::{Analysis, Word};
///
/// let mut w = Word::new("banks");
/// let mut noun = Analysis::new("bank", "NCFP000");
/// noun.set_prob(0.7);
/// w.add_analysis(noun);
///
/// w.select_analysis(0, 0).unwrap();
/// assert_eq!(w.get_lemma(0).unwrap(), "bank");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Word {
    /// Surface form.
    form: String,
    /// Surface form, lowercased.
    lc_form: String,
    /// Phonetic form, if a phonetic encoder ran.
    ph_form: String,
    /// Candidate readings, in the order producers added them.
    analyses: Vec<Analysis>,
    /// Component words if this is a multiword compound; empty otherwise.
    multiword: Vec<Word>,
    /// Whether the multiword segmentation is ambiguous (could be no compound).
    ambiguous_mw: bool,
    /// Alternative forms proposed by correctors.
    alternatives: Vec<Alternative>,
    /// Character span in the source text.
    span: Span,
    /// Whether the form was found in the dictionary.
    in_dict: bool,
    /// Whether the analysis list is frozen against further stage mutation.
    /// A pipeline contract: the type itself does not enforce it.
    locked: bool,
    /// Position of the word in its sentence, valid after the sentence's
    /// `rebuild_word_index`.
    position: usize,
    /// User-managed data, stored verbatim.
    user: Vec<String>,
}

impl Word {
    /// Create a word from its surface form.
    pub fn new(form: impl Into<String>) -> Self {
        let form = form.into();
        Self {
            lc_form: form.to_lowercase(),
            form,
            ..Self::default()
        }
    }

    /// Create a multiword compound from its component words.
    ///
    /// The span covers from the first component's start to the last
    /// component's end.
    pub fn multiword(form: impl Into<String>, parts: Vec<Word>) -> Self {
        let mut w = Self::new(form);
        w.span = Span::new(
            parts.first().map_or(0, |p| p.span.start),
            parts.last().map_or(0, |p| p.span.end),
        );
        w.multiword = parts;
        w
    }

    /// Surface form.
    pub fn form(&self) -> &str {
        &self.form
    }

    /// Surface form, lowercased.
    pub fn lc_form(&self) -> &str {
        &self.lc_form
    }

    /// Phonetic form (empty if no phonetic encoder ran).
    pub fn ph_form(&self) -> &str {
        &self.ph_form
    }

    /// Replace the surface form, recomputing the lowercased form.
    pub fn set_form(&mut self, form: impl Into<String>) {
        self.form = form.into();
        self.lc_form = self.form.to_lowercase();
    }

    /// Set the phonetic form.
    pub fn set_ph_form(&mut self, ph_form: impl Into<String>) {
        self.ph_form = ph_form.into();
    }

    /// Character span in the source text.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Set the character span.
    pub fn set_span(&mut self, start: usize, end: usize) {
        self.span = Span::new(start, end);
    }

    /// Position of the word in its sentence.
    ///
    /// Authoritative only after the owning sentence ran
    /// `rebuild_word_index`.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Set the sentence position. Normally called by
    /// `Sentence::rebuild_word_index`.
    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    /// Whether the form was found in the dictionary.
    pub fn found_in_dict(&self) -> bool {
        self.in_dict
    }

    /// Record whether the form was found in the dictionary.
    pub fn set_found_in_dict(&mut self, in_dict: bool) {
        self.in_dict = in_dict;
    }

    /// Mark the word as having a definitive analysis list.
    pub fn lock_analysis(&mut self) {
        self.locked = true;
    }

    /// Whether the analysis list is frozen.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// User-managed data.
    pub fn user_data(&self) -> &[String] {
        &self.user
    }

    /// Mutable access to user-managed data.
    pub fn user_data_mut(&mut self) -> &mut Vec<String> {
        &mut self.user
    }

    // ---- multiword decomposition ----

    /// Whether the word is a multiword compound.
    pub fn is_multiword(&self) -> bool {
        !self.multiword.is_empty()
    }

    /// Whether the compound segmentation is ambiguous.
    pub fn is_ambiguous_mw(&self) -> bool {
        self.ambiguous_mw
    }

    /// Set the compound segmentation ambiguity flag.
    pub fn set_ambiguous_mw(&mut self, ambiguous: bool) {
        self.ambiguous_mw = ambiguous;
    }

    /// Number of component words in the compound.
    pub fn n_words_mw(&self) -> usize {
        self.multiword.len()
    }

    /// Component words of the compound.
    pub fn words_mw(&self) -> &[Word] {
        &self.multiword
    }

    // ---- corrector alternatives ----

    /// Append an alternative form.
    pub fn add_alternative(&mut self, text: impl Into<String>, distance: i32) {
        self.alternatives.push(Alternative::new(text, distance));
    }

    /// Replace the alternatives list.
    pub fn set_alternatives(&mut self, alternatives: Vec<Alternative>) {
        self.alternatives = alternatives;
    }

    /// Clear the alternatives list.
    pub fn clear_alternatives(&mut self) {
        self.alternatives.clear();
    }

    /// Whether any corrector proposed alternatives.
    pub fn has_alternatives(&self) -> bool {
        !self.alternatives.is_empty()
    }

    /// Proposed alternative forms.
    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    /// Mutable access to the alternatives list.
    pub fn alternatives_mut(&mut self) -> &mut Vec<Alternative> {
        &mut self.alternatives
    }

    // ---- analysis list ----

    /// Append one analysis. No duplicate check is performed; avoiding
    /// duplicates is the caller's responsibility.
    pub fn add_analysis(&mut self, analysis: Analysis) {
        self.analyses.push(analysis);
    }

    /// Replace the analysis list with a single analysis.
    pub fn set_analysis(&mut self, analysis: Analysis) {
        self.analyses = vec![analysis];
    }

    /// Replace the analysis list wholesale.
    pub fn set_analyses(&mut self, analyses: Vec<Analysis>) {
        self.analyses = analyses;
    }

    /// Copy the analysis list from another word.
    pub fn copy_analysis(&mut self, other: &Word) {
        self.analyses = other.analyses.clone();
    }

    /// Number of analyses in the list.
    pub fn n_analyses(&self) -> usize {
        self.analyses.len()
    }

    /// All analyses, in list order.
    pub fn analyses(&self) -> &[Analysis] {
        &self.analyses
    }

    /// Mutable access to the analyses.
    pub fn analyses_mut(&mut self) -> &mut [Analysis] {
        &mut self.analyses
    }

    /// Sort the analysis list by decreasing probability.
    pub fn sort_analyses(&mut self) {
        self.analyses.sort_by(Analysis::cmp_by_decreasing_prob);
    }

    /// Whether any analysis carries a retokenization payload.
    pub fn has_retokenizable(&self) -> bool {
        self.analyses.iter().any(Analysis::is_retokenizable)
    }

    /// Whether any analysis has a tag matching the given pattern.
    pub fn find_tag_match(&self, pattern: &Regex) -> bool {
        self.analyses.iter().any(|a| pattern.is_match(a.tag()))
    }

    // ---- filtered views and selection ----

    /// Cursor over the analyses filtered by view mode and k-best sequence.
    pub fn iter_analyses(&self, view: AnalysisView, k: usize) -> AnalysisIter<'_> {
        AnalysisIter {
            inner: self.analyses.iter(),
            view,
            k,
        }
    }

    /// Cursor over the analyses selected in the k-th best sequence.
    pub fn selected(&self, k: usize) -> AnalysisIter<'_> {
        self.iter_analyses(AnalysisView::Selected, k)
    }

    /// Cursor over the analyses not selected in the k-th best sequence.
    pub fn unselected(&self, k: usize) -> AnalysisIter<'_> {
        self.iter_analyses(AnalysisView::Unselected, k)
    }

    /// Number of analyses selected in the k-th best sequence.
    pub fn get_n_selected(&self, k: usize) -> usize {
        self.selected(k).count()
    }

    /// Number of analyses not selected in the k-th best sequence.
    pub fn get_n_unselected(&self, k: usize) -> usize {
        self.unselected(k).count()
    }

    /// How many k-best sequences have at least one selected analysis.
    pub fn num_kbest(&self) -> usize {
        self.analyses
            .iter()
            .filter_map(Analysis::max_kbest)
            .max()
            .map_or(0, |m| m + 1)
    }

    /// Select the analysis at cursor position `pos` in the k-th best
    /// sequence.
    pub fn select_analysis(&mut self, pos: usize, k: usize) -> ModelResult<()> {
        self.analyses
            .get_mut(pos)
            .ok_or(ModelError::AnalysisNotFound { pos })?
            .mark_selected(k);
        Ok(())
    }

    /// Unselect the analysis at cursor position `pos` from the k-th best
    /// sequence.
    pub fn unselect_analysis(&mut self, pos: usize, k: usize) -> ModelResult<()> {
        self.analyses
            .get_mut(pos)
            .ok_or(ModelError::AnalysisNotFound { pos })?
            .unmark_selected(k);
        Ok(())
    }

    /// Select every analysis in the k-th best sequence.
    pub fn select_all_analysis(&mut self, k: usize) {
        for a in &mut self.analyses {
            a.mark_selected(k);
        }
    }

    /// Unselect every analysis from the k-th best sequence.
    pub fn unselect_all_analysis(&mut self, k: usize) {
        for a in &mut self.analyses {
            a.unmark_selected(k);
        }
    }

    /// First analysis selected in the k-th best sequence.
    pub fn selected_analysis(&self, k: usize) -> ModelResult<&Analysis> {
        self.selected(k)
            .next()
            .ok_or(ModelError::NoSelectedAnalysis { k })
    }

    /// Lemma of the first analysis selected in the k-th best sequence.
    pub fn get_lemma(&self, k: usize) -> ModelResult<&str> {
        Ok(self.selected_analysis(k)?.lemma())
    }

    /// Tag of the first analysis selected in the k-th best sequence.
    pub fn get_tag(&self, k: usize) -> ModelResult<&str> {
        Ok(self.selected_analysis(k)?.tag())
    }

    /// Senses of the first analysis selected in the k-th best sequence.
    pub fn get_senses(&self, k: usize) -> ModelResult<&[(String, f64)]> {
        Ok(self.selected_analysis(k)?.senses())
    }

    /// Replace the senses of the first analysis selected in the k-th best
    /// sequence.
    pub fn set_senses(&mut self, senses: Vec<(String, f64)>, k: usize) -> ModelResult<()> {
        let a = self
            .analyses
            .iter_mut()
            .find(|a| a.is_selected(k))
            .ok_or(ModelError::NoSelectedAnalysis { k })?;
        a.set_senses(senses);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banks() -> Word {
        let mut w = Word::new("banks");
        let mut noun = Analysis::new("bank", "NCFP000");
        noun.set_prob(0.7);
        let mut verb = Analysis::new("bank", "VMIP000");
        verb.set_prob(0.3);
        w.add_analysis(noun);
        w.add_analysis(verb);
        w
    }

    #[test]
    fn test_form_and_lowercase() {
        let w = Word::new("Banks");
        assert_eq!(w.form(), "Banks");
        assert_eq!(w.lc_form(), "banks");

        let mut w = w;
        w.set_form("RIVER");
        assert_eq!(w.lc_form(), "river");
    }

    #[test]
    fn test_selected_reading_lookup() {
        let mut w = banks();
        w.select_analysis(0, 0).unwrap();

        assert_eq!(w.get_lemma(0).unwrap(), "bank");
        assert_eq!(w.get_tag(0).unwrap(), "NCFP000");
        assert_eq!(w.get_n_selected(0), 1);
        assert_eq!(w.get_n_unselected(0), 1);
    }

    #[test]
    fn test_views_partition_the_analysis_list() {
        let mut w = banks();
        w.add_analysis(Analysis::new("bank", "JJ"));
        w.select_analysis(0, 1).unwrap();
        w.select_analysis(2, 1).unwrap();

        for k in 0..3 {
            assert_eq!(
                w.get_n_selected(k) + w.get_n_unselected(k),
                w.n_analyses(),
                "selected + unselected must cover all analyses at k={}",
                k
            );
        }
        assert_eq!(w.selected(1).count(), 2);
        assert_eq!(w.unselected(1).count(), 1);
    }

    #[test]
    fn test_view_cursor_skips_nonmatching() {
        let mut w = banks();
        w.select_analysis(1, 0).unwrap();

        let selected: Vec<&str> = w.selected(0).map(|a| a.tag()).collect();
        assert_eq!(selected, vec!["VMIP000"]);

        let unselected: Vec<&str> = w.unselected(0).map(|a| a.tag()).collect();
        assert_eq!(unselected, vec!["NCFP000"]);

        let all: Vec<&str> = w.iter_analyses(AnalysisView::All, 0).map(|a| a.tag()).collect();
        assert_eq!(all, vec!["NCFP000", "VMIP000"]);
    }

    #[test]
    fn test_bulk_selection() {
        let mut w = banks();
        w.select_all_analysis(0);
        assert_eq!(w.get_n_selected(0), 2);

        w.unselect_all_analysis(0);
        assert_eq!(w.get_n_selected(0), 0);
        assert_eq!(w.get_n_unselected(0), 2);
    }

    #[test]
    fn test_selection_does_not_reorder() {
        let mut w = banks();
        w.select_analysis(1, 0).unwrap();

        // Physical order is untouched by selection.
        assert_eq!(w.analyses()[0].tag(), "NCFP000");
        assert_eq!(w.analyses()[1].tag(), "VMIP000");
    }

    #[test]
    fn test_select_out_of_range_reports_not_found() {
        let mut w = banks();
        assert_eq!(
            w.select_analysis(5, 0),
            Err(ModelError::AnalysisNotFound { pos: 5 })
        );
    }

    #[test]
    fn test_lemma_without_selection_is_absent() {
        let w = banks();
        assert_eq!(w.get_lemma(0), Err(ModelError::NoSelectedAnalysis { k: 0 }));
    }

    #[test]
    fn test_num_kbest() {
        let mut w = banks();
        assert_eq!(w.num_kbest(), 0);

        w.select_analysis(0, 0).unwrap();
        w.select_analysis(1, 2).unwrap();
        assert_eq!(w.num_kbest(), 3);
    }

    #[test]
    fn test_add_analysis_performs_no_duplicate_check() {
        let mut w = Word::new("run");
        w.add_analysis(Analysis::new("run", "VB"));
        w.add_analysis(Analysis::new("run", "VB"));
        assert_eq!(w.n_analyses(), 2);
    }

    #[test]
    fn test_multiword_span_covers_parts() {
        let mut a = Word::new("New");
        a.set_span(0, 3);
        let mut b = Word::new("York");
        b.set_span(4, 8);

        let mw = Word::multiword("New_York", vec![a, b]);
        assert!(mw.is_multiword());
        assert_eq!(mw.n_words_mw(), 2);
        assert_eq!(mw.span(), Span::new(0, 8));
    }

    #[test]
    fn test_alternatives_management() {
        let mut w = Word::new("bakns");
        assert!(!w.has_alternatives());

        w.add_alternative("banks", 1);
        w.add_alternative("bakes", 2);
        assert!(w.has_alternatives());
        assert_eq!(w.alternatives().len(), 2);
        assert_eq!(w.alternatives()[0], Alternative::new("banks", 1));

        w.clear_alternatives();
        assert!(!w.has_alternatives());
    }

    #[test]
    fn test_find_tag_match() {
        let w = banks();
        assert!(w.find_tag_match(&Regex::new("^NC").unwrap()));
        assert!(w.find_tag_match(&Regex::new("^V").unwrap()));
        assert!(!w.find_tag_match(&Regex::new("^RG").unwrap()));
    }

    #[test]
    fn test_lock_is_a_flag_only() {
        let mut w = banks();
        w.lock_analysis();
        assert!(w.is_locked());

        // Locking is a pipeline contract; the type still permits edits.
        w.add_analysis(Analysis::new("bank", "JJ"));
        assert_eq!(w.n_analyses(), 3);
    }

    #[test]
    fn test_set_senses_on_selected_analysis() {
        let mut w = banks();
        assert_eq!(
            w.set_senses(vec![("x-n".to_string(), 1.0)], 0),
            Err(ModelError::NoSelectedAnalysis { k: 0 })
        );

        w.select_analysis(0, 0).unwrap();
        w.set_senses(vec![("x-n".to_string(), 1.0)], 0).unwrap();
        assert_eq!(w.get_senses(0).unwrap().len(), 1);
    }
}
