// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalization of a concrete tree-sitter tree into the arena shape.
//!
//! Only named nodes are materialized; punctuation and other anonymous
//! tokens stay behind in the concrete tree, which remains available for
//! query execution. `has_error` on an arena node means the subtree contains
//! a syntax error; `is_missing` marks tokens the parser invented to recover.

use quarry_core::{ParseTree, Point, Span, TreeBuilder};
use tree_sitter::Node;

fn point(p: tree_sitter::Point) -> Point {
    Point::new(p.row, p.column)
}

fn span(node: Node<'_>) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

/// Build the normalized arena for a parsed tree.
#[must_use]
pub fn normalize_tree(tree: &tree_sitter::Tree) -> ParseTree {
    let root = tree.root_node();
    let mut builder = TreeBuilder::new();
    let root_id = builder.push_flagged(
        root.kind(),
        span(root),
        point(root.start_position()),
        point(root.end_position()),
        root.has_error(),
        root.is_missing(),
    );

    // Iterative depth-first walk; recursion would overflow on adversarially
    // deep sources.
    let mut stack: Vec<(Node<'_>, usize)> = vec![(root, root_id)];
    while let Some((node, arena_id)) = stack.pop() {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        for child in children {
            let child_id = builder.push_flagged(
                child.kind(),
                span(child),
                point(child.start_position()),
                point(child.end_position()),
                child.has_error(),
                child.is_missing(),
            );
            builder.attach(arena_id, child_id);
            stack.push((child, child_id));
        }
    }
    builder.finish(root_id)
}
