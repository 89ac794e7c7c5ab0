//! Error types for the annotation model.
//!
//! All failures in this crate are local and synchronous: lookups that miss,
//! indices read after a structural edit, and misuse of the per-stage status
//! stack. Nothing here retries or crosses a process boundary.

use thiserror::Error;

/// Errors reported by the annotation model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// No tree node carries the requested identifier.
    #[error("no node with id `{id}`")]
    NodeIdNotFound { id: String },

    /// No tree node covers the requested word position.
    #[error("no node at word position {pos}")]
    NodePosNotFound { pos: usize },

    /// The sentence has no word at the requested position.
    #[error("no word at position {pos}")]
    WordPosNotFound { pos: usize },

    /// The word has no analysis at the requested cursor position.
    #[error("no analysis at position {pos}")]
    AnalysisNotFound { pos: usize },

    /// No analysis of the word is selected in the requested k-best sequence.
    #[error("no analysis selected in k-best sequence {k}")]
    NoSelectedAnalysis { k: usize },

    /// The sentence has no constituency tree stored for this k-best sequence.
    #[error("sentence has no parse tree for k-best sequence {k}")]
    NoParseTree { k: usize },

    /// The sentence has no dependency tree stored for this k-best sequence.
    #[error("sentence has no dependency tree for k-best sequence {k}")]
    NoDepTree { k: usize },

    /// An index was read after a structural edit without being rebuilt.
    ///
    /// `indexed` is the structural version the index was built against,
    /// `current` is the structure's version now.
    #[error("index built at structural version {indexed} but structure is at {current}; rebuild the index")]
    StaleIndex { indexed: u64, current: u64 },

    /// `clear_processing_status` was called with no status pushed.
    #[error("processing status stack is empty")]
    EmptyStatusStack,

    /// A dependency cross-link target is not a node of the paired
    /// constituency tree.
    #[error("link target is not a node of the paired constituency tree")]
    InvalidLink,

    /// Reattaching a node under its own subtree would create a cycle.
    #[error("cannot reattach a node under its own subtree")]
    ReattachCycle,

    /// The root has no parent to detach from.
    #[error("cannot reattach the root node")]
    ReattachRoot,
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
