//! Constituency (phrase-structure) parse trees.
//!
//! A [`ConstituencyTree`] is a [`Tree`] of [`ConstituencyNode`] payloads
//! plus two lookup indices: node identifier to handle, and leaf word
//! position to handle. Identifiers are assigned once by
//! [`build_node_index`](ConstituencyTree::build_node_index) and stay stable
//! across structural edits, so external references (dependency cross-links,
//! coreference node ids) remain valid; the positional index is recomputed
//! freely via [`rebuild_node_index`](ConstituencyTree::rebuild_node_index).

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{ModelError, ModelResult};
use crate::tree::{NodeRef, Tree};

/// Payload of one constituency tree node.
///
/// Intermediate nodes carry a syntactic label; only leaves reference a word,
/// by its position in the owning sentence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstituencyNode {
    /// Node identifier, unique within one tree once assigned.
    id: Option<String>,
    /// Syntactic label.
    label: String,
    /// Whether this node is the head of its parent's rule.
    head: bool,
    /// Position of the chunk in the sentence, if this node roots a chunk.
    chunk_ord: Option<usize>,
    /// Sentence position of the word this leaf covers.
    word: Option<usize>,
}

impl ConstituencyNode {
    /// Create an intermediate node with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Create a leaf node covering the word at the given sentence position.
    pub fn leaf(label: impl Into<String>, word_pos: usize) -> Self {
        Self {
            label: label.into(),
            word: Some(word_pos),
            ..Self::default()
        }
    }

    /// Node identifier, if one has been assigned.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Assign the node identifier.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Syntactic label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Replace the syntactic label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Whether this node is the head of its parent's rule.
    pub fn is_head(&self) -> bool {
        self.head
    }

    /// Set the head flag.
    pub fn set_head(&mut self, head: bool) {
        self.head = head;
    }

    /// Whether this node roots a chunk.
    pub fn is_chunk(&self) -> bool {
        self.chunk_ord.is_some()
    }

    /// Position of the chunk in the sentence, if this node roots one.
    pub fn chunk_ord(&self) -> Option<usize> {
        self.chunk_ord
    }

    /// Mark this node as the root of the chunk at the given position.
    pub fn set_chunk(&mut self, ord: usize) {
        self.chunk_ord = Some(ord);
    }

    /// Sentence position of the covered word, if this is a leaf.
    pub fn word_pos(&self) -> Option<usize> {
        self.word
    }

    /// Set the sentence position of the covered word.
    pub fn set_word_pos(&mut self, pos: usize) {
        self.word = Some(pos);
    }
}

/// A constituency parse tree with id and word-position indices.
///
/// # Index discipline
///
/// Call [`build_node_index`](Self::build_node_index) once after the parser
/// finishes building the shape; call
/// [`rebuild_node_index`](Self::rebuild_node_index) after any later
/// structural edit. Lookups against an index older than the tree's
/// structural version fail with
/// [`ModelError::StaleIndex`](crate::ModelError::StaleIndex) rather than
/// silently returning wrong nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstituencyTree {
    tree: Tree<ConstituencyNode>,
    id_index: HashMap<String, NodeRef>,
    word_index: HashMap<usize, NodeRef>,
    indexed_at: u64,
}

impl ConstituencyTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree with a single root node.
    pub fn with_root(root: ConstituencyNode) -> Self {
        Self {
            tree: Tree::with_root(root),
            ..Self::default()
        }
    }

    /// The underlying generic tree (read access).
    pub fn tree(&self) -> &Tree<ConstituencyNode> {
        &self.tree
    }

    /// The underlying generic tree (write access).
    ///
    /// Structural edits made through this handle bump the tree's version
    /// and invalidate the indices until a rebuild.
    pub fn tree_mut(&mut self) -> &mut Tree<ConstituencyNode> {
        &mut self.tree
    }

    /// Whether the indices match the tree's current structural version.
    pub fn index_is_current(&self) -> bool {
        self.indexed_at == self.tree.version() && !self.tree.is_empty()
    }

    /// Assign an id to every node missing one and build both indices.
    ///
    /// Fresh ids are `prefix` followed by a running counter, skipping ids
    /// already taken by other nodes. Existing ids are kept untouched. Must
    /// be called once after a parser first builds the tree.
    pub fn build_node_index(&mut self, prefix: &str) {
        let taken: HashSet<String> = self
            .tree
            .preorder()
            .filter_map(|n| self.tree.payload(n).id().map(str::to_string))
            .collect();

        let mut counter = 0usize;
        let nodes: Vec<NodeRef> = self.tree.preorder().collect();
        for n in nodes {
            if self.tree.payload(n).id().is_none() {
                let mut id = format!("{}{}", prefix, counter);
                while taken.contains(&id) {
                    counter += 1;
                    id = format!("{}{}", prefix, counter);
                }
                counter += 1;
                self.tree.payload_mut(n).set_id(id);
            }
        }
        self.reindex();
        trace!(prefix, nodes = self.tree.len(), "built constituency node index");
    }

    /// Rebuild both indices without reassigning existing ids.
    ///
    /// Use after structural edits that preserved ids but moved positions,
    /// such as subtree reattachment.
    pub fn rebuild_node_index(&mut self) {
        self.reindex();
        trace!(nodes = self.tree.len(), "rebuilt constituency node index");
    }

    fn reindex(&mut self) {
        self.id_index.clear();
        self.word_index.clear();
        for n in self.tree.preorder() {
            let payload = self.tree.payload(n);
            if let Some(id) = payload.id() {
                self.id_index.insert(id.to_string(), n);
            }
            if let Some(pos) = payload.word_pos() {
                self.word_index.insert(pos, n);
            }
        }
        self.indexed_at = self.tree.version();
    }

    fn check_fresh(&self) -> ModelResult<()> {
        if self.indexed_at != self.tree.version() {
            return Err(ModelError::StaleIndex {
                indexed: self.indexed_at,
                current: self.tree.version(),
            });
        }
        Ok(())
    }

    /// Handle of the node with the given id. O(1) after a valid index.
    pub fn get_node_by_id(&self, id: &str) -> ModelResult<NodeRef> {
        self.check_fresh()?;
        self.id_index
            .get(id)
            .copied()
            .ok_or_else(|| ModelError::NodeIdNotFound { id: id.to_string() })
    }

    /// Handle of the leaf covering the given word position. O(1) after a
    /// valid index.
    pub fn get_node_by_pos(&self, pos: usize) -> ModelResult<NodeRef> {
        self.check_fresh()?;
        self.word_index
            .get(&pos)
            .copied()
            .ok_or(ModelError::NodePosNotFound { pos })
    }

    /// Payload of the node with the given id.
    pub fn node_by_id(&self, id: &str) -> ModelResult<&ConstituencyNode> {
        Ok(self.tree.payload(self.get_node_by_id(id)?))
    }

    /// Payload of the leaf covering the given word position.
    pub fn node_by_pos(&self, pos: usize) -> ModelResult<&ConstituencyNode> {
        Ok(self.tree.payload(self.get_node_by_pos(pos)?))
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, node: NodeRef, depth: usize) -> fmt::Result {
        let payload = self.tree.payload(node);
        write!(f, "{:indent$}{}", "", payload.label(), indent = depth * 4)?;
        if payload.is_head() {
            write!(f, " +")?;
        }
        if let Some(pos) = payload.word_pos() {
            write!(f, " <w{}>", pos)?;
        }
        writeln!(f)?;
        for child in self.tree.children(node) {
            self.fmt_node(f, *child, depth + 1)?;
        }
        Ok(())
    }
}

/// Indented rendering of the tree: one node per line, four spaces per
/// depth level, ` +` marking heads and ` <wN>` marking leaf word positions.
impl fmt::Display for ConstituencyTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tree.root() {
            Some(root) => self.fmt_node(f, root, 0),
            None => Ok(()),
        }
    }
}
