// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The normalized parse tree both backends produce.
//!
//! The tree owns its nodes in a flat arena; spans index back into the source
//! unit's bytes, which must outlive any text lookup. Interior nodes never
//! duplicate source text: [`ParseTree::node_text`] slices the original bytes
//! on demand, which also keeps extracted content byte-exact.

use serde::{Deserialize, Serialize};

use crate::source::{Point, Span};

/// Index of a node in a [`ParseTree`] arena.
pub type NodeId = usize;

/// One node of the normalized tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub kind: String,
    pub span: Span,
    pub start_point: Point,
    pub end_point: Point,
    pub has_error: bool,
    pub is_missing: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A rooted labelled tree over a source unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseTree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl ParseTree {
    #[must_use]
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn root(&self) -> &TreeNode {
        &self.nodes[self.root]
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of `id` in source order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|n| n.children.iter().copied())
            .filter_map(|c| self.nodes.get(c).map(|n| (c, n)))
    }

    /// Direct children of the root, i.e. the unit's top-level constructs.
    pub fn top_level(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.children(self.root)
    }

    /// Walk from `id`'s parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.nodes.get(id).and_then(|n| n.parent),
        }
    }

    /// Depth-first pre-order traversal from the root.
    pub fn preorder(&self) -> Preorder<'_> {
        let mut stack = Vec::with_capacity(16);
        if !self.nodes.is_empty() {
            stack.push(self.root);
        }
        Preorder { tree: self, stack }
    }

    /// The exact byte slice of `source` covered by node `id`.
    #[must_use]
    pub fn node_text<'s>(&self, id: NodeId, source: &'s [u8]) -> &'s [u8] {
        self.nodes
            .get(id)
            .map_or(&source[0..0], |n| n.span.slice(source))
    }

    /// Whether any node in the tree carries a syntax error flag.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.nodes.iter().any(|n| n.has_error || n.is_missing)
    }

    /// First node with the given kind in pre-order, if any.
    #[must_use]
    pub fn find_first(&self, kind: &str) -> Option<(NodeId, &TreeNode)> {
        self.preorder().find(|(_, n)| n.kind == kind)
    }

    /// The deepest node whose span contains `span`, preferring later
    /// (deeper) matches in pre-order.
    #[must_use]
    pub fn node_covering(&self, span: Span) -> Option<NodeId> {
        let mut best: Option<(NodeId, usize)> = None;
        for (id, node) in self.preorder() {
            if node.span.contains(&span) {
                let len = node.span.len();
                if best.is_none_or(|(_, best_len)| len <= best_len) {
                    best = Some((id, len));
                }
            }
        }
        best.map(|(id, _)| id)
    }
}

pub struct Ancestors<'t> {
    tree: &'t ParseTree,
    next: Option<NodeId>,
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = (NodeId, &'t TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.tree.nodes.get(id)?;
        self.next = node.parent;
        Some((id, node))
    }
}

pub struct Preorder<'t> {
    tree: &'t ParseTree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Preorder<'t> {
    type Item = (NodeId, &'t TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.nodes.get(id)?;
        // push in reverse so the leftmost child pops first
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some((id, node))
    }
}

/// Arena builder used by both backends.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<TreeNode>,
}

impl TreeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node with no parent yet; wire it up with [`Self::attach`].
    pub fn push(
        &mut self,
        kind: impl Into<String>,
        span: Span,
        start_point: Point,
        end_point: Point,
    ) -> NodeId {
        self.push_flagged(kind, span, start_point, end_point, false, false)
    }

    pub fn push_flagged(
        &mut self,
        kind: impl Into<String>,
        span: Span,
        start_point: Point,
        end_point: Point,
        has_error: bool,
        is_missing: bool,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            kind: kind.into(),
            span,
            start_point,
            end_point,
            has_error,
            is_missing,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Record `child` as the next child of `parent`.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        debug_assert_ne!(parent, child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    pub fn mark_error(&mut self, id: NodeId) {
        self.nodes[id].has_error = true;
    }

    /// Re-extent a node whose end was unknown when it was pushed (containers
    /// built top-down patch themselves once their close delimiter arrives).
    pub fn set_extent(&mut self, id: NodeId, span: Span, start_point: Point, end_point: Point) {
        let node = &mut self.nodes[id];
        node.span = span;
        node.start_point = start_point;
        node.end_point = end_point;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn finish(self, root: NodeId) -> ParseTree {
        ParseTree {
            nodes: self.nodes,
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> ParseTree {
        // root
        // ├── a (leaf)
        // └── b
        //     └── c (leaf)
        let mut b = TreeBuilder::new();
        let root = b.push("module", Span::new(0, 10), Point::new(0, 0), Point::new(2, 0));
        let a = b.push("a", Span::new(0, 3), Point::new(0, 0), Point::new(0, 3));
        let bb = b.push("b", Span::new(4, 10), Point::new(1, 0), Point::new(2, 0));
        let c = b.push("c", Span::new(4, 7), Point::new(1, 0), Point::new(1, 3));
        b.attach(root, a);
        b.attach(root, bb);
        b.attach(bb, c);
        b.finish(root)
    }

    #[test]
    fn preorder_visits_parents_before_children() {
        let tree = sample_tree();
        let kinds: Vec<_> = tree.preorder().map(|(_, n)| n.kind.as_str()).collect();
        assert_eq!(kinds, vec!["module", "a", "b", "c"]);
    }

    #[test]
    fn ancestors_walk_to_root() {
        let tree = sample_tree();
        let (c_id, _) = tree.find_first("c").unwrap();
        let kinds: Vec<_> = tree.ancestors(c_id).map(|(_, n)| n.kind.as_str()).collect();
        assert_eq!(kinds, vec!["b", "module"]);
    }

    #[test]
    fn node_text_slices_source() {
        let tree = sample_tree();
        let source = b"abc defghi";
        let (c_id, _) = tree.find_first("c").unwrap();
        assert_eq!(tree.node_text(c_id, source), b"def");
    }

    #[test]
    fn covering_prefers_deepest_node() {
        let tree = sample_tree();
        let id = tree.node_covering(Span::new(5, 6)).unwrap();
        assert_eq!(tree.get(id).unwrap().kind, "c");
    }

    #[test]
    fn error_flags_surface() {
        let mut b = TreeBuilder::new();
        let root = b.push("module", Span::new(0, 1), Point::new(0, 0), Point::new(0, 1));
        b.mark_error(root);
        let tree = b.finish(root);
        assert!(tree.has_errors());
    }
}
