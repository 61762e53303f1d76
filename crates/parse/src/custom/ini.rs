// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! INI-family parser, shared by plain INI and EditorConfig.
//!
//! Sections hold the properties that follow them; properties before any
//! section attach to the document root. EditorConfig is INI with glob
//! section names, which changes nothing structurally.

use quarry_core::{NodeId, ParseTree, Point, Span, TreeBuilder};

use super::{CustomParser, LineEntry, decode, line_entries, push_root};

pub struct IniParser {
    format: &'static str,
}

impl IniParser {
    #[must_use]
    pub fn ini() -> Self {
        Self { format: "ini" }
    }

    #[must_use]
    pub fn editorconfig() -> Self {
        Self {
            format: "editorconfig",
        }
    }
}

impl CustomParser for IniParser {
    fn format(&self) -> &'static str {
        self.format
    }

    fn parse(&self, bytes: &[u8]) -> ParseTree {
        let text = match decode(bytes) {
            Ok(text) => text,
            Err(tree) => return tree,
        };
        let mut builder = TreeBuilder::new();
        let root = push_root(&mut builder, text);
        let entries = line_entries(text);

        let mut current_section: Option<NodeId> = None;
        let mut malformed = false;
        for entry in entries {
            let line = entry.text.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = section_name(line) {
                current_section = Some(push_section(&mut builder, root, entry, name));
                continue;
            }
            if let Some(property) = push_property(&mut builder, entry) {
                match current_section {
                    Some(section) => builder.attach(section, property),
                    None => builder.attach(root, property),
                }
            } else {
                malformed = true;
            }
        }
        if malformed {
            builder.mark_error(root);
        }
        builder.finish(root)
    }
}

fn section_name(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    (!inner.is_empty()).then_some(inner)
}

fn push_section(
    builder: &mut TreeBuilder,
    root: NodeId,
    entry: LineEntry<'_>,
    name: &str,
) -> NodeId {
    let section = builder.push(
        "section",
        entry.span(),
        entry.start_point(),
        entry.end_point(),
    );
    builder.attach(root, section);
    let offset = entry.text.find(name).unwrap_or(1);
    let name_node = builder.push(
        "section_name",
        Span::new(entry.start + offset, entry.start + offset + name.len()),
        Point::new(entry.row, offset),
        Point::new(entry.row, offset + name.len()),
    );
    builder.attach(section, name_node);
    section
}

/// `key = value` or `key: value`; returns None for lines matching neither.
fn push_property(builder: &mut TreeBuilder, entry: LineEntry<'_>) -> Option<NodeId> {
    let sep = entry.text.find(['=', ':'])?;
    let key = entry.text[..sep].trim();
    if key.is_empty() {
        return None;
    }
    let property = builder.push(
        "property",
        entry.span(),
        entry.start_point(),
        entry.end_point(),
    );
    let key_offset = entry.text.find(key).unwrap_or(0);
    let key_node = builder.push(
        "key",
        Span::new(entry.start + key_offset, entry.start + key_offset + key.len()),
        Point::new(entry.row, key_offset),
        Point::new(entry.row, key_offset + key.len()),
    );
    builder.attach(property, key_node);

    let value = entry.text[sep + 1..].trim();
    if !value.is_empty() {
        let value_offset = sep + 1 + entry.text[sep + 1..].find(value).unwrap_or(0);
        let value_node = builder.push(
            "value",
            Span::new(
                entry.start + value_offset,
                entry.start + value_offset + value.len(),
            ),
            Point::new(entry.row, value_offset),
            Point::new(entry.row, value_offset + value.len()),
        );
        builder.attach(property, value_node);
    }
    Some(property)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_own_their_properties() {
        let source = b"[server]\nhost = localhost\nport = 8080\n\n[client]\nretries = 3\n";
        let tree = IniParser::ini().parse(source);
        let sections: Vec<_> = tree
            .preorder()
            .filter(|(_, n)| n.kind == "section")
            .map(|(id, _)| id)
            .collect();
        assert_eq!(sections.len(), 2);
        let server_props = tree
            .children(sections[0])
            .filter(|(_, n)| n.kind == "property")
            .count();
        assert_eq!(server_props, 2);
    }

    #[test]
    fn keys_and_values_are_exact_slices() {
        let source = b"host = localhost\n";
        let tree = IniParser::ini().parse(source);
        let (key_id, _) = tree.find_first("key").unwrap();
        let (value_id, _) = tree.find_first("value").unwrap();
        assert_eq!(tree.node_text(key_id, source), b"host");
        assert_eq!(tree.node_text(value_id, source), b"localhost");
    }

    #[test]
    fn comments_are_skipped() {
        let source = b"# comment\n; other comment\nkey = v\n";
        let tree = IniParser::ini().parse(source);
        let properties = tree
            .preorder()
            .filter(|(_, n)| n.kind == "property")
            .count();
        assert_eq!(properties, 1);
    }

    #[test]
    fn malformed_lines_flag_the_root() {
        let tree = IniParser::ini().parse(b"not a property line\n");
        assert!(tree.root().has_error);
    }

    #[test]
    fn editorconfig_variant_supports_globs() {
        let source = b"root = true\n\n[*.{js,py}]\nindent_style = space\n";
        let tree = IniParser::editorconfig().parse(source);
        let (name_id, _) = tree.find_first("section_name").unwrap();
        assert_eq!(tree.node_text(name_id, source), b"*.{js,py}");
    }
}
