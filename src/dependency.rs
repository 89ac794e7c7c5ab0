//! Dependency parse trees.
//!
//! A [`DependencyTree`] holds one [`DependencyNode`] per word of the
//! sentence, indexed by word position (dependency nodes are identified by
//! the word they dominate, so no separate id index exists). Each node may
//! cross-reference the corresponding constituency node of the same sentence
//! via a [`NodeRef`] into the paired [`ConstituencyTree`]; the link target
//! is validated when set.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::constituency::ConstituencyTree;
use crate::error::{ModelError, ModelResult};
use crate::tree::{NodeRef, Tree};

/// Payload of one dependency tree node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyNode {
    /// Syntactic function label (e.g. `subj`, `obj`).
    label: String,
    /// Sentence position of the word this node dominates.
    word: Option<usize>,
    /// Handle of the corresponding node in the paired constituency tree.
    link: Option<NodeRef>,
}

impl DependencyNode {
    /// Create a node with the given function label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Create a node for the word at the given sentence position.
    pub fn for_word(label: impl Into<String>, word_pos: usize) -> Self {
        Self {
            label: label.into(),
            word: Some(word_pos),
            ..Self::default()
        }
    }

    /// Syntactic function label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Replace the function label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Sentence position of the dominated word.
    pub fn word_pos(&self) -> Option<usize> {
        self.word
    }

    /// Set the sentence position of the dominated word.
    pub fn set_word_pos(&mut self, pos: usize) {
        self.word = Some(pos);
    }

    /// Handle of the linked constituency node, if set.
    pub fn link(&self) -> Option<NodeRef> {
        self.link
    }
}

/// A dependency tree with a word-position index and validated cross-links
/// into the paired constituency tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyTree {
    tree: Tree<DependencyNode>,
    word_index: HashMap<usize, NodeRef>,
    indexed_at: u64,
}

impl DependencyTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree with a single root node.
    pub fn with_root(root: DependencyNode) -> Self {
        Self {
            tree: Tree::with_root(root),
            ..Self::default()
        }
    }

    /// The underlying generic tree (read access).
    pub fn tree(&self) -> &Tree<DependencyNode> {
        &self.tree
    }

    /// The underlying generic tree (write access).
    ///
    /// Structural edits made through this handle invalidate the
    /// word-position index until a rebuild.
    pub fn tree_mut(&mut self) -> &mut Tree<DependencyNode> {
        &mut self.tree
    }

    /// Whether the word-position index matches the tree's current shape.
    pub fn index_is_current(&self) -> bool {
        self.indexed_at == self.tree.version() && !self.tree.is_empty()
    }

    /// Rebuild the word-position index. Word positions are unique per
    /// sentence, so this is the only index a dependency tree needs.
    pub fn rebuild_node_index(&mut self) {
        self.word_index.clear();
        for n in self.tree.preorder() {
            if let Some(pos) = self.tree.payload(n).word_pos() {
                self.word_index.insert(pos, n);
            }
        }
        self.indexed_at = self.tree.version();
        trace!(nodes = self.tree.len(), "rebuilt dependency node index");
    }

    /// Handle of the node dominating the word at the given position.
    /// O(1) after a valid index.
    pub fn get_node_by_pos(&self, pos: usize) -> ModelResult<NodeRef> {
        if self.indexed_at != self.tree.version() {
            return Err(ModelError::StaleIndex {
                indexed: self.indexed_at,
                current: self.tree.version(),
            });
        }
        self.word_index
            .get(&pos)
            .copied()
            .ok_or(ModelError::NodePosNotFound { pos })
    }

    /// Payload of the node dominating the word at the given position.
    pub fn node_by_pos(&self, pos: usize) -> ModelResult<&DependencyNode> {
        Ok(self.tree.payload(self.get_node_by_pos(pos)?))
    }

    /// Link the node `at` to `target` in the paired constituency tree.
    ///
    /// The target handle is validated against the paired tree's arena and
    /// rejected with [`ModelError::InvalidLink`] if it does not name one of
    /// its nodes. The caller remains responsible for pairing trees of the
    /// same sentence and k-best index.
    pub fn set_link(
        &mut self,
        at: NodeRef,
        target: NodeRef,
        paired: &ConstituencyTree,
    ) -> ModelResult<()> {
        if !paired.tree().contains(target) {
            return Err(ModelError::InvalidLink);
        }
        self.tree.payload_mut(at).link = Some(target);
        Ok(())
    }

    /// Link target of the node `at`, if one was set.
    pub fn get_link(&self, at: NodeRef) -> Option<NodeRef> {
        self.tree.payload(at).link()
    }
}

/// Indented rendering: one node per line, `label <wN>` with four spaces per
/// depth level.
impl fmt::Display for DependencyTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn walk(
            t: &DependencyTree,
            f: &mut fmt::Formatter<'_>,
            node: NodeRef,
            depth: usize,
        ) -> fmt::Result {
            let payload = t.tree.payload(node);
            write!(f, "{:indent$}{}", "", payload.label(), indent = depth * 4)?;
            if let Some(pos) = payload.word_pos() {
                write!(f, " <w{}>", pos)?;
            }
            writeln!(f)?;
            for child in t.tree.children(node) {
                walk(t, f, *child, depth + 1)?;
            }
            Ok(())
        }
        match self.tree.root() {
            Some(root) => walk(self, f, root, 0),
            None => Ok(()),
        }
    }
}
