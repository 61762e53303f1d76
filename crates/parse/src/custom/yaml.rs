// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML subset: block mappings and sequences, nested by indentation.
//!
//! Kind names mirror the tree-sitter YAML grammar (`block_mapping_pair`,
//! `block_sequence_item`) so queries and regex patterns agree across
//! backends. Flow collections and anchors stay unsplit inside the value
//! slice; quarry only needs the mapping structure.

use quarry_core::{NodeId, ParseTree, Point, Span, TreeBuilder};

use super::{CustomParser, LineEntry, decode, line_entries, push_root};

pub struct YamlParser;

impl CustomParser for YamlParser {
    fn format(&self) -> &'static str {
        "yaml"
    }

    fn parse(&self, bytes: &[u8]) -> ParseTree {
        let text = match decode(bytes) {
            Ok(text) => text,
            Err(tree) => return tree,
        };
        let mut builder = TreeBuilder::new();
        let root = push_root(&mut builder, text);

        // (indent, node) pairs; deeper lines nest under the closest
        // shallower mapping pair.
        let mut stack: Vec<(usize, NodeId)> = Vec::new();
        for entry in line_entries(text) {
            let line = entry.text;
            let trimmed = line.trim_start();
            if trimmed.is_empty()
                || trimmed.starts_with('#')
                || trimmed == "---"
                || trimmed == "..."
            {
                continue;
            }
            let indent = line.len() - trimmed.len();
            while stack.last().is_some_and(|(i, _)| *i >= indent) {
                stack.pop();
            }
            let parent = stack.last().map_or(root, |(_, id)| *id);

            if let Some(rest) = trimmed.strip_prefix("- ").or_else(|| {
                (trimmed == "-").then_some("")
            }) {
                let item = builder.push(
                    "block_sequence_item",
                    Span::new(entry.start + indent, entry.span().end_byte),
                    Point::new(entry.row, indent),
                    entry.end_point(),
                );
                builder.attach(parent, item);
                let value = rest.trim();
                if !value.is_empty() {
                    let offset = entry.text.rfind(value).unwrap_or(indent);
                    let value_node = builder.push(
                        "value",
                        Span::new(entry.start + offset, entry.start + offset + value.len()),
                        Point::new(entry.row, offset),
                        Point::new(entry.row, offset + value.len()),
                    );
                    builder.attach(item, value_node);
                }
                continue;
            }

            match split_mapping(trimmed) {
                Some((key, value)) => {
                    let pair = push_pair(&mut builder, entry, indent, key, value);
                    builder.attach(parent, pair);
                    stack.push((indent, pair));
                }
                None => builder.mark_error(root),
            }
        }
        builder.finish(root)
    }
}

/// Split `key: value` at the first colon that ends a plain key.
fn split_mapping(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let key = line[..colon].trim_end();
    if key.is_empty() {
        return None;
    }
    let rest = &line[colon + 1..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        // `a:b` is a scalar, not a mapping
        return None;
    }
    Some((key, rest.trim()))
}

fn push_pair(
    builder: &mut TreeBuilder,
    entry: LineEntry<'_>,
    indent: usize,
    key: &str,
    value: &str,
) -> NodeId {
    let pair = builder.push(
        "block_mapping_pair",
        Span::new(entry.start + indent, entry.span().end_byte),
        Point::new(entry.row, indent),
        entry.end_point(),
    );
    let key_node = builder.push(
        "flow_node",
        Span::new(entry.start + indent, entry.start + indent + key.len()),
        Point::new(entry.row, indent),
        Point::new(entry.row, indent + key.len()),
    );
    builder.attach(pair, key_node);

    if !value.is_empty() {
        let offset = entry.text.rfind(value).unwrap_or(indent);
        let value_node = builder.push(
            "value",
            Span::new(entry.start + offset, entry.start + offset + value.len()),
            Point::new(entry.row, offset),
            Point::new(entry.row, offset + value.len()),
        );
        builder.attach(pair, value_node);
    }
    pair
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_follows_indentation() {
        let source = b"server:\n  host: localhost\n  port: 8080\nclient:\n  retries: 3\n";
        let tree = YamlParser.parse(source);
        let top: Vec<_> = tree
            .top_level()
            .filter(|(_, n)| n.kind == "block_mapping_pair")
            .map(|(id, _)| id)
            .collect();
        assert_eq!(top.len(), 2);
        let nested = tree
            .children(top[0])
            .filter(|(_, n)| n.kind == "block_mapping_pair")
            .count();
        assert_eq!(nested, 2);
    }

    #[test]
    fn keys_are_exact_slices() {
        let source = b"name: quarry\n";
        let tree = YamlParser.parse(source);
        let (key_id, _) = tree.find_first("flow_node").unwrap();
        assert_eq!(tree.node_text(key_id, source), b"name");
        let (value_id, _) = tree.find_first("value").unwrap();
        assert_eq!(tree.node_text(value_id, source), b"quarry");
    }

    #[test]
    fn sequence_items_attach_to_their_mapping() {
        let source = b"hosts:\n  - alpha\n  - beta\n";
        let tree = YamlParser.parse(source);
        let (pair_id, _) = tree.find_first("block_mapping_pair").unwrap();
        let items: Vec<_> = tree
            .children(pair_id)
            .filter(|(_, n)| n.kind == "block_sequence_item")
            .map(|(id, _)| id)
            .collect();
        assert_eq!(items.len(), 2);
        // each item carries its value as a child, like a mapping pair does
        let values: Vec<_> = items
            .iter()
            .flat_map(|&id| tree.children(id))
            .filter(|(_, n)| n.kind == "value")
            .map(|(id, _)| tree.node_text(id, source))
            .collect();
        assert_eq!(values, vec![b"alpha".as_slice(), b"beta".as_slice()]);
    }

    #[test]
    fn bare_dash_items_have_no_value_child() {
        let source = b"hosts:\n  -\n";
        let tree = YamlParser.parse(source);
        let (item_id, item) = tree.find_first("block_sequence_item").unwrap();
        assert!(item.is_leaf(), "{item_id}: empty item has nothing to split");
    }

    #[test]
    fn document_markers_and_comments_are_skipped() {
        let source = b"---\n# comment\nkey: value\n...\n";
        let tree = YamlParser.parse(source);
        assert_eq!(
            tree.top_level()
                .filter(|(_, n)| n.kind == "block_mapping_pair")
                .count(),
            1
        );
        assert!(!tree.root().has_error);
    }
}
