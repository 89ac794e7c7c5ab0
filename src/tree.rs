//! Generic arena-backed labeled tree.
//!
//! [`Tree<P>`] stores nodes of payload type `P` in an arena `Vec` addressed
//! by [`NodeRef`] handles. The constituency and dependency trees are two
//! instantiations of this one shape; external references hold a `NodeRef`
//! instead of a pointer, so rebuilding indices can never dangle.
//!
//! Every structural edit bumps a monotonically increasing version counter.
//! Index structures built over a tree record the version they were built
//! at and refuse lookups once the shape has moved on (see
//! [`ModelError::StaleIndex`](crate::ModelError::StaleIndex)).

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Handle to a node in a [`Tree`] arena.
///
/// Valid for the lifetime of the tree it came from: arena entries are never
/// removed, so a handle obtained from a tree stays in bounds for that tree.
/// Handles are plain indices and must not be used across trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef(pub(crate) usize);

impl NodeRef {
    /// Arena index of this handle.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry<P> {
    payload: P,
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
}

/// A rooted, ordered, n-ary tree over payloads of type `P`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree<P> {
    nodes: Vec<Entry<P>>,
    root: Option<NodeRef>,
    version: u64,
}

impl<P> Default for Tree<P> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            version: 0,
        }
    }
}

impl<P> Tree<P> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree with a single root node.
    pub fn with_root(payload: P) -> Self {
        let mut t = Self::new();
        t.set_root(payload);
        t
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Structural version of the tree. Bumped by every edit that changes
    /// the tree's shape.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether the handle refers to a node of this tree's arena.
    pub fn contains(&self, node: NodeRef) -> bool {
        node.0 < self.nodes.len()
    }

    /// The root node, if any.
    pub fn root(&self) -> Option<NodeRef> {
        self.root
    }

    /// Install a new root.
    ///
    /// If the tree already has a root, the old root becomes the first child
    /// of the new one (parsers building bottom-up rely on this).
    pub fn set_root(&mut self, payload: P) -> NodeRef {
        let new_root = NodeRef(self.nodes.len());
        let old_root = self.root;
        self.nodes.push(Entry {
            payload,
            parent: None,
            children: old_root.into_iter().collect(),
        });
        if let Some(old) = old_root {
            self.nodes[old.0].parent = Some(new_root);
        }
        self.root = Some(new_root);
        self.version += 1;
        new_root
    }

    /// Append a child under `parent` and return its handle.
    ///
    /// Panics if `parent` is not a node of this tree.
    pub fn add_child(&mut self, parent: NodeRef, payload: P) -> NodeRef {
        assert!(self.contains(parent), "parent handle out of arena bounds");
        let child = NodeRef(self.nodes.len());
        self.nodes.push(Entry {
            payload,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(child);
        self.version += 1;
        child
    }

    /// Payload of a node.
    ///
    /// Panics if the handle is not from this tree.
    pub fn payload(&self, node: NodeRef) -> &P {
        &self.nodes[node.0].payload
    }

    /// Mutable payload of a node.
    ///
    /// Panics if the handle is not from this tree.
    pub fn payload_mut(&mut self, node: NodeRef) -> &mut P {
        &mut self.nodes[node.0].payload
    }

    /// Parent of a node, or `None` for the root.
    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.nodes[node.0].parent
    }

    /// Children of a node, in order.
    pub fn children(&self, node: NodeRef) -> &[NodeRef] {
        &self.nodes[node.0].children
    }

    /// Number of children of a node.
    pub fn num_children(&self, node: NodeRef) -> usize {
        self.nodes[node.0].children.len()
    }

    /// Whether a node has no children.
    pub fn is_leaf(&self, node: NodeRef) -> bool {
        self.nodes[node.0].children.is_empty()
    }

    /// Depth-first preorder traversal from the root.
    pub fn preorder(&self) -> Preorder<'_, P> {
        Preorder {
            tree: self,
            stack: self.root.into_iter().collect(),
        }
    }

    /// Leaves of the tree, in left-to-right order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.preorder().filter(move |n| self.is_leaf(*n))
    }

    /// Detach `node` from its parent and append it under `new_parent`.
    ///
    /// Fails with [`ModelError::ReattachRoot`] if `node` is the root and
    /// with [`ModelError::ReattachCycle`] if `new_parent` lies inside
    /// `node`'s own subtree.
    pub fn reattach(&mut self, node: NodeRef, new_parent: NodeRef) -> ModelResult<()> {
        assert!(
            self.contains(node) && self.contains(new_parent),
            "handle out of arena bounds"
        );
        let old_parent = self.nodes[node.0].parent.ok_or(ModelError::ReattachRoot)?;

        // Walk up from new_parent; hitting `node` would make a cycle.
        let mut cursor = Some(new_parent);
        while let Some(c) = cursor {
            if c == node {
                return Err(ModelError::ReattachCycle);
            }
            cursor = self.nodes[c.0].parent;
        }

        let siblings = &mut self.nodes[old_parent.0].children;
        siblings.retain(|c| *c != node);
        self.nodes[new_parent.0].children.push(node);
        self.nodes[node.0].parent = Some(new_parent);
        self.version += 1;
        Ok(())
    }
}

/// Iterator over a tree in depth-first preorder.
#[derive(Debug)]
pub struct Preorder<'a, P> {
    tree: &'a Tree<P>,
    stack: Vec<NodeRef>,
}

impl<'a, P> Iterator for Preorder<'a, P> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Push children reversed so the leftmost child pops first.
        for child in self.tree.children(node).iter().rev() {
            self.stack.push(*child);
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// S(NP(a b) VP(c))
    fn sample() -> (Tree<&'static str>, Vec<NodeRef>) {
        let mut t = Tree::with_root("S");
        let root = t.root().unwrap();
        let np = t.add_child(root, "NP");
        let a = t.add_child(np, "a");
        let b = t.add_child(np, "b");
        let vp = t.add_child(root, "VP");
        let c = t.add_child(vp, "c");
        (t, vec![root, np, a, b, vp, c])
    }

    #[test]
    fn test_empty_tree() {
        let t: Tree<&str> = Tree::new();
        assert!(t.is_empty());
        assert_eq!(t.root(), None);
        assert_eq!(t.preorder().count(), 0);
    }

    #[test]
    fn test_preorder_is_left_to_right() {
        let (t, _) = sample();
        let labels: Vec<&str> = t.preorder().map(|n| *t.payload(n)).collect();
        assert_eq!(labels, vec!["S", "NP", "a", "b", "VP", "c"]);
    }

    #[test]
    fn test_leaves_in_order() {
        let (t, _) = sample();
        let leaves: Vec<&str> = t.leaves().map(|n| *t.payload(n)).collect();
        assert_eq!(leaves, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parent_child_links() {
        let (t, refs) = sample();
        let (root, np, a) = (refs[0], refs[1], refs[2]);

        assert_eq!(t.parent(root), None);
        assert_eq!(t.parent(a), Some(np));
        assert_eq!(t.children(root).len(), 2);
        assert!(t.is_leaf(a));
        assert!(!t.is_leaf(np));
    }

    #[test]
    fn test_set_root_adopts_previous_root() {
        let mut t = Tree::with_root("NP");
        let np = t.root().unwrap();
        let top = t.set_root("S");

        assert_eq!(t.root(), Some(top));
        assert_eq!(t.children(top), &[np]);
        assert_eq!(t.parent(np), Some(top));
    }

    #[test]
    fn test_version_counts_structural_edits() {
        let mut t = Tree::with_root("S");
        let v0 = t.version();
        let root = t.root().unwrap();

        t.add_child(root, "NP");
        assert!(t.version() > v0);

        // Payload edits do not move the structural version.
        let v1 = t.version();
        *t.payload_mut(root) = "TOP";
        assert_eq!(t.version(), v1);
    }

    #[test]
    fn test_reattach_moves_subtree() {
        let (mut t, refs) = sample();
        let (np, vp, c) = (refs[1], refs[4], refs[5]);

        t.reattach(c, np).unwrap();
        let labels: Vec<&str> = t.preorder().map(|n| *t.payload(n)).collect();
        assert_eq!(labels, vec!["S", "NP", "a", "b", "c", "VP"]);
        assert!(t.is_leaf(vp));
    }

    #[test]
    fn test_reattach_rejects_cycle() {
        let (mut t, refs) = sample();
        let (np, a) = (refs[1], refs[2]);

        assert_eq!(t.reattach(np, a), Err(ModelError::ReattachCycle));
    }

    #[test]
    fn test_reattach_rejects_root() {
        let (mut t, refs) = sample();
        let (root, np) = (refs[0], refs[1]);

        assert!(t.reattach(root, np).is_err());
    }
}
