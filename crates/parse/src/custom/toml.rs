// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TOML: tables, array-of-table headers, key/value pairs.
//!
//! Line-oriented on purpose: multi-line strings and inline tables keep
//! their whole line as the value slice, which is enough for pattern
//! extraction and keeps the parser total.

use quarry_core::{NodeId, ParseTree, Point, Span, TreeBuilder};

use super::{CustomParser, LineEntry, decode, line_entries, push_root};

pub struct TomlParser;

impl CustomParser for TomlParser {
    fn format(&self) -> &'static str {
        "toml"
    }

    fn parse(&self, bytes: &[u8]) -> ParseTree {
        let text = match decode(bytes) {
            Ok(text) => text,
            Err(tree) => return tree,
        };
        let mut builder = TreeBuilder::new();
        let root = push_root(&mut builder, text);

        let mut current_table: Option<NodeId> = None;
        for entry in line_entries(text) {
            let line = entry.text.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((name, array)) = table_header(line) {
                let kind = if array { "table_array_element" } else { "table" };
                let table = builder.push(kind, entry.span(), entry.start_point(), entry.end_point());
                builder.attach(root, table);
                push_name(&mut builder, table, entry, name);
                current_table = Some(table);
            } else if let Some(pair) = push_pair(&mut builder, entry) {
                match current_table {
                    Some(table) => builder.attach(table, pair),
                    None => builder.attach(root, pair),
                }
            } else {
                builder.mark_error(root);
            }
        }
        builder.finish(root)
    }
}

fn table_header(line: &str) -> Option<(&str, bool)> {
    if let Some(inner) = line.strip_prefix("[[").and_then(|l| l.strip_suffix("]]")) {
        return (!inner.is_empty()).then_some((inner.trim(), true));
    }
    if let Some(inner) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
        return (!inner.is_empty()).then_some((inner.trim(), false));
    }
    None
}

fn push_name(builder: &mut TreeBuilder, table: NodeId, entry: LineEntry<'_>, name: &str) {
    let offset = entry.text.find(name).unwrap_or(0);
    let node = builder.push(
        "table_name",
        Span::new(entry.start + offset, entry.start + offset + name.len()),
        Point::new(entry.row, offset),
        Point::new(entry.row, offset + name.len()),
    );
    builder.attach(table, node);
}

fn push_pair(builder: &mut TreeBuilder, entry: LineEntry<'_>) -> Option<NodeId> {
    let eq = find_unquoted_eq(entry.text)?;
    let key = entry.text[..eq].trim();
    if key.is_empty() {
        return None;
    }
    let pair = builder.push("pair", entry.span(), entry.start_point(), entry.end_point());
    let key_offset = entry.text.find(key).unwrap_or(0);
    let key_node = builder.push(
        "bare_key",
        Span::new(entry.start + key_offset, entry.start + key_offset + key.len()),
        Point::new(entry.row, key_offset),
        Point::new(entry.row, key_offset + key.len()),
    );
    builder.attach(pair, key_node);

    let value = entry.text[eq + 1..].trim();
    if !value.is_empty() {
        let value_offset = eq + 1 + entry.text[eq + 1..].find(value).unwrap_or(0);
        let value_node = builder.push(
            value_kind(value),
            Span::new(
                entry.start + value_offset,
                entry.start + value_offset + value.len(),
            ),
            Point::new(entry.row, value_offset),
            Point::new(entry.row, value_offset + value.len()),
        );
        builder.attach(pair, value_node);
    }
    Some(pair)
}

/// `=` outside of quotes; TOML keys may be quoted and contain `=`.
fn find_unquoted_eq(line: &str) -> Option<usize> {
    let mut in_quotes = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' | '\'' => in_quotes = !in_quotes,
            '=' if !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

fn value_kind(value: &str) -> &'static str {
    if value.starts_with('"') || value.starts_with('\'') {
        "string"
    } else if value.starts_with('[') {
        "array"
    } else if value.starts_with('{') {
        "inline_table"
    } else if value == "true" || value == "false" {
        "boolean"
    } else if value.bytes().next().is_some_and(|b| b.is_ascii_digit() || b == b'-' || b == b'+') {
        "number"
    } else {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_group_pairs() {
        let source = b"title = \"demo\"\n\n[server]\nport = 8080\nhosts = [\"a\", \"b\"]\n";
        let tree = TomlParser.parse(source);
        let (table_id, _) = tree.find_first("table").unwrap();
        let pairs = tree
            .children(table_id)
            .filter(|(_, n)| n.kind == "pair")
            .count();
        assert_eq!(pairs, 2);
        // the top-level pair hangs off the root
        let root_pairs = tree
            .top_level()
            .filter(|(_, n)| n.kind == "pair")
            .count();
        assert_eq!(root_pairs, 1);
    }

    #[test]
    fn value_kinds() {
        let source = b"a = \"s\"\nb = 42\nc = true\nd = [1]\n";
        let tree = TomlParser.parse(source);
        let kinds: Vec<_> = tree
            .preorder()
            .filter(|(_, n)| ["string", "number", "boolean", "array"].contains(&n.kind.as_str()))
            .map(|(_, n)| n.kind.clone())
            .collect();
        assert_eq!(kinds, vec!["string", "number", "boolean", "array"]);
    }

    #[test]
    fn array_of_tables() {
        let source = b"[[bin]]\nname = \"quarry\"\n";
        let tree = TomlParser.parse(source);
        let (id, _) = tree.find_first("table_array_element").unwrap();
        let (name_id, _) = tree.find_first("table_name").unwrap();
        assert_eq!(tree.node_text(name_id, source), b"bin");
        assert!(tree.children(id).any(|(_, n)| n.kind == "pair"));
    }

    #[test]
    fn quoted_equals_does_not_split_keys() {
        let source = b"greeting = \"a = b\"\n";
        let tree = TomlParser.parse(source);
        let (key_id, _) = tree.find_first("bare_key").unwrap();
        assert_eq!(tree.node_text(key_id, source), b"greeting");
    }
}
