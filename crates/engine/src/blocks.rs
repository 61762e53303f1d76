// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The block extractor.
//!
//! A block is a syntactically coherent region resolved from a node or a
//! match. Content is always the exact byte slice of the source, never
//! reconstructed from the tree. Resolution walks the node's ancestors until
//! it finds a block-capable kind for the unit's language; only custom
//! backend trees may degrade to the line-range heuristic, and those blocks
//! are marked `"heuristic"`.

use quarry_core::{ExtractedBlock, LanguageId, NodeId, ParseTree, PatternMatch, Point, Span};
use quarry_parse::{BackendKind, ParsedUnit};

/// Kinds treated as coherent extractable units, per language family.
fn block_capable_kinds(language: &LanguageId) -> &'static [&'static str] {
    match language.as_str() {
        "python" => &[
            "function_definition",
            "class_definition",
            "if_statement",
            "for_statement",
            "while_statement",
            "try_statement",
            "with_statement",
            "decorated_definition",
        ],
        "rust" => &[
            "function_item",
            "impl_item",
            "struct_item",
            "enum_item",
            "trait_item",
            "mod_item",
            "block",
            "match_expression",
        ],
        "c" | "cpp" => &[
            "compound_statement",
            "function_definition",
            "class_specifier",
            "struct_specifier",
            "if_statement",
            "for_statement",
            "while_statement",
            "namespace_definition",
        ],
        "javascript" | "typescript" | "tsx" => &[
            "function_declaration",
            "class_declaration",
            "method_definition",
            "arrow_function",
            "statement_block",
            "if_statement",
            "for_statement",
            "while_statement",
            "interface_declaration",
        ],
        "go" => &[
            "function_declaration",
            "method_declaration",
            "type_declaration",
            "block",
            "if_statement",
            "for_statement",
        ],
        "java" => &[
            "method_declaration",
            "class_declaration",
            "interface_declaration",
            "block",
            "if_statement",
            "for_statement",
        ],
        "ruby" => &["method", "class", "module", "do_block", "if", "while"],
        "bash" => &[
            "function_definition",
            "if_statement",
            "for_statement",
            "while_statement",
            "compound_statement",
        ],
        "markdown" => &["fenced_code_block", "paragraph", "list_item"],
        "restructuredtext" | "asciidoc" => &["section_title", "listing_block", "paragraph"],
        "json" => &["object", "array", "pair"],
        "yaml" => &["block_mapping_pair", "block_sequence_item"],
        "toml" => &["table", "table_array_element", "pair"],
        "ini" | "editorconfig" => &["section", "property"],
        "xml" => &["element"],
        "env" => &["variable"],
        "graphql" => &[
            "object_type_definition",
            "interface_type_definition",
            "enum_type_definition",
            "input_object_type_definition",
            "operation_definition",
            "fragment_definition",
        ],
        _ => &["block", "body", "statement_block"],
    }
}

/// Child kinds that count as "the body" when the caller asks for it.
const BODY_KINDS: &[&str] = &["block", "body", "statement_block", "compound_statement"];

pub struct BlockExtractor;

impl BlockExtractor {
    /// Resolve a match's primary span to a block.
    #[must_use]
    pub fn from_match(
        unit: &ParsedUnit,
        source: &[u8],
        m: &PatternMatch,
        prefer_body: bool,
    ) -> Option<ExtractedBlock> {
        match unit.tree.node_covering(m.primary_span) {
            Some(node) => Self::from_node(unit, source, node, prefer_body),
            None if unit.backend == BackendKind::Custom => {
                Some(heuristic_block(source, m.primary_span))
            }
            None => None,
        }
    }

    /// Resolve a tree node to a block.
    #[must_use]
    pub fn from_node(
        unit: &ParsedUnit,
        source: &[u8],
        id: NodeId,
        prefer_body: bool,
    ) -> Option<ExtractedBlock> {
        let tree = &unit.tree;
        let kinds = block_capable_kinds(&unit.language);

        let chosen = if node_kind_in(tree, id, kinds) {
            Some(id)
        } else {
            tree.ancestors(id)
                .find(|(_, node)| kinds.contains(&node.kind.as_str()))
                .map(|(aid, _)| aid)
        };

        match chosen {
            Some(block_id) => {
                let target = if prefer_body {
                    body_child(tree, block_id).unwrap_or(block_id)
                } else {
                    block_id
                };
                let node = tree.get(target)?;
                let parent_kind = node
                    .parent
                    .and_then(|p| tree.get(p))
                    .map(|p| p.kind.clone());
                Some(ExtractedBlock {
                    content: String::from_utf8_lossy(node.span.slice(source)).into_owned(),
                    start_point: node.start_point,
                    end_point: node.end_point,
                    node_kind: node.kind.clone(),
                    parent_kind,
                })
            }
            None if unit.backend == BackendKind::Custom => {
                let span = tree.get(id)?.span;
                Some(heuristic_block(source, span))
            }
            None => None,
        }
    }
}

fn node_kind_in(tree: &ParseTree, id: NodeId, kinds: &[&str]) -> bool {
    tree.get(id).is_some_and(|n| kinds.contains(&n.kind.as_str()))
}

fn body_child(tree: &ParseTree, id: NodeId) -> Option<NodeId> {
    tree.children(id)
        .find(|(_, child)| {
            BODY_KINDS.contains(&child.kind.as_str()) || child.kind.ends_with("_body")
        })
        .map(|(cid, _)| cid)
}

/// Expand a span to whole lines. Only reachable for custom-backend trees.
fn heuristic_block(source: &[u8], span: Span) -> ExtractedBlock {
    let start = source[..span.start_byte.min(source.len())]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);
    let end = memchr::memchr(b'\n', &source[span.end_byte.min(source.len())..])
        .map_or(source.len(), |pos| span.end_byte + pos);

    let start_row = count_newlines(&source[..start]);
    let end_row = start_row + count_newlines(&source[start..end]);
    let end_col = source[start..end]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(end - start, |pos| end - start - pos - 1);

    ExtractedBlock {
        content: String::from_utf8_lossy(&source[start..end]).into_owned(),
        start_point: Point::new(start_row, 0),
        end_point: Point::new(end_row, end_col),
        node_kind: "heuristic".to_string(),
        parent_kind: None,
    }
}

fn count_newlines(bytes: &[u8]) -> usize {
    memchr::memchr_iter(b'\n', bytes).count()
}
