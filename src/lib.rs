//! In-memory annotation model for multi-stage NLP pipelines.
//!
//! A document is a hierarchy of paragraphs, sentences, words and readings,
//! carrying the output of tokenization, morphological analysis, statistical
//! tagging (with multiple ranked hypotheses), constituency parsing,
//! dependency parsing and coreference resolution. Pipeline stages mutate
//! the model in place, bottom-up during construction and cross-referentially
//! afterwards; this crate is the data model only, not the analyzers.
//!
//! ## Core Types
//!
//! - [`Analysis`] - one candidate lemma+tag reading of a word, with k-best
//!   selection bookkeeping
//! - [`Word`] - a token with its readings, multiword decomposition and span
//! - [`ConstituencyTree`] / [`DependencyTree`] - the two tree views of a
//!   sentence, cross-linked by arena handles ([`NodeRef`])
//! - [`Sentence`] - words plus per-hypothesis tree pairs, predicate
//!   annotations and a per-stage status stack
//! - [`Paragraph`] / [`Document`] - document structure and coreference
//!   groups
//!
//! ## Index discipline
//!
//! Positional and id lookups are O(1) against explicitly built indices.
//! Producers that change a sentence's word collection or a tree's shape
//! must rebuild the matching index before consumers read positions or ids;
//! reads against a stale index fail with [`ModelError::StaleIndex`] rather
//! than silently resolving to the wrong node.
//!
//! ## Example
//!
//! ```
//! use annotated_doc::{Analysis, Sentence, Word};
//!
//! let mut banks = Word::new("banks");
//! let mut noun = Analysis::new("bank", "NCFP000");
//! noun.set_prob(0.7);
//! banks.add_analysis(noun);
//! banks.select_analysis(0, 0).unwrap();
//!
//! let mut sentence = Sentence::from_words(vec![Word::new("the"), banks]);
//! assert_eq!(sentence.word(1).unwrap().get_lemma(0).unwrap(), "bank");
//! ```

mod analysis;
mod constituency;
mod dependency;
mod document;
mod error;
mod sentence;
mod tree;
mod word;

// Readings and words
pub use analysis::Analysis;
pub use word::{Alternative, AnalysisIter, AnalysisView, Span, Word};

// Trees
pub use constituency::{ConstituencyNode, ConstituencyTree};
pub use dependency::{DependencyNode, DependencyTree};
pub use tree::{NodeRef, Preorder, Tree};

// Sentence and document structure
pub use document::{Document, Paragraph};
pub use sentence::{PredArgSet, Sentence, StageStatus};

// Errors
pub use error::{ModelError, ModelResult};
