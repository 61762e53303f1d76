// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GraphQL schema subset: top-level definitions with brace-delimited bodies.
//!
//! Covers `type`, `interface`, `enum`, `input`, `union`, `scalar`,
//! `schema`, `query`, `mutation`, `subscription`, and `fragment` headers.
//! Field-level structure stays inside the body slice.

use quarry_core::{NodeId, ParseTree, Point, Span, TreeBuilder};

use super::{CustomParser, decode, line_entries, push_root};

const DEFINITION_KEYWORDS: &[(&str, &str)] = &[
    ("type", "object_type_definition"),
    ("interface", "interface_type_definition"),
    ("enum", "enum_type_definition"),
    ("input", "input_object_type_definition"),
    ("union", "union_type_definition"),
    ("scalar", "scalar_type_definition"),
    ("schema", "schema_definition"),
    ("query", "operation_definition"),
    ("mutation", "operation_definition"),
    ("subscription", "operation_definition"),
    ("fragment", "fragment_definition"),
];

pub struct GraphqlParser;

impl CustomParser for GraphqlParser {
    fn format(&self) -> &'static str {
        "graphql"
    }

    fn parse(&self, bytes: &[u8]) -> ParseTree {
        let text = match decode(bytes) {
            Ok(text) => text,
            Err(tree) => return tree,
        };
        let mut builder = TreeBuilder::new();
        let root = push_root(&mut builder, text);
        let entries = line_entries(text);

        let mut i = 0;
        while i < entries.len() {
            let entry = entries[i];
            let line = entry.text.trim_start();
            if line.is_empty() || line.starts_with('#') {
                i += 1;
                continue;
            }
            let Some((keyword, kind)) = DEFINITION_KEYWORDS
                .iter()
                .find(|(kw, _)| {
                    line.strip_prefix(kw)
                        .is_some_and(|r| r.is_empty() || r.starts_with([' ', '{', '(']))
                })
                .copied()
            else {
                i += 1;
                continue;
            };

            // a header with no brace (scalar, bare union) is a single-line
            // definition unless the block opens on the very next line
            if !entry.text.contains('{')
                && !entries
                    .get(i + 1)
                    .is_some_and(|n| n.text.trim_start().starts_with('{'))
            {
                let node = builder.push(kind, entry.span(), entry.start_point(), entry.end_point());
                builder.attach(root, node);
                push_definition_name(&mut builder, node, entry.start, entry.row, entry.text, keyword);
                i += 1;
                continue;
            }

            // find the line closing this definition's brace block
            let mut depth = 0i32;
            let mut end = i;
            let mut saw_brace = false;
            for (j, candidate) in entries.iter().enumerate().skip(i) {
                depth += brace_delta(candidate.text);
                if candidate.text.contains('{') {
                    saw_brace = true;
                }
                if saw_brace && depth <= 0 {
                    end = j;
                    break;
                }
                end = j;
            }
            let terminated = !saw_brace || depth <= 0;

            let node = builder.push_flagged(
                kind,
                Span::new(entry.start, entries[end].span().end_byte),
                entry.start_point(),
                entries[end].end_point(),
                !terminated,
                false,
            );
            builder.attach(root, node);
            push_definition_name(&mut builder, node, entry.start, entry.row, entry.text, keyword);
            i = end + 1;
        }
        builder.finish(root)
    }
}

fn brace_delta(line: &str) -> i32 {
    let mut delta = 0;
    for c in line.chars() {
        match c {
            '{' => delta += 1,
            '}' => delta -= 1,
            _ => {}
        }
    }
    delta
}

fn push_definition_name(
    builder: &mut TreeBuilder,
    definition: NodeId,
    line_start: usize,
    row: usize,
    line: &str,
    keyword: &str,
) {
    let after = &line[line.find(keyword).unwrap_or(0) + keyword.len()..];
    let name: &str = after
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '{' || c == '(')
        .next()
        .unwrap_or("");
    if name.is_empty() {
        return;
    }
    let offset = line.rfind(name).unwrap_or(0);
    let node = builder.push(
        "name",
        Span::new(line_start + offset, line_start + offset + name.len()),
        Point::new(row, offset),
        Point::new(row, offset + name.len()),
    );
    builder.attach(definition, node);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_definitions_with_names() {
        let source = b"type User {\n  id: ID!\n  name: String\n}\n\nenum Role {\n  ADMIN\n}\n";
        let tree = GraphqlParser.parse(source);
        let kinds: Vec<_> = tree
            .top_level()
            .map(|(_, n)| n.kind.clone())
            .collect();
        assert_eq!(
            kinds,
            vec!["object_type_definition", "enum_type_definition"]
        );
        let (name_id, _) = tree.find_first("name").unwrap();
        assert_eq!(tree.node_text(name_id, source), b"User");
    }

    #[test]
    fn definition_spans_cover_the_body() {
        let source = b"type User {\n  id: ID!\n}\n";
        let tree = GraphqlParser.parse(source);
        let (id, _) = tree.find_first("object_type_definition").unwrap();
        assert_eq!(tree.node_text(id, source), b"type User {\n  id: ID!\n}");
    }

    #[test]
    fn unbalanced_braces_flag_the_definition() {
        let source = b"type User {\n  id: ID!\n";
        let tree = GraphqlParser.parse(source);
        let (_, node) = tree.find_first("object_type_definition").unwrap();
        assert!(node.has_error);
    }

    #[test]
    fn prose_between_definitions_is_ignored() {
        let source = b"# a comment\nscalar Date\n";
        let tree = GraphqlParser.parse(source);
        assert!(tree.find_first("scalar_type_definition").is_some());
    }
}
