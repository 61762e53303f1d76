// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! dotenv files: `KEY=VALUE` lines, optional `export` prefix.

use quarry_core::{ParseTree, Point, Span, TreeBuilder};

use super::{CustomParser, decode, line_entries, push_root};

pub struct EnvParser;

impl CustomParser for EnvParser {
    fn format(&self) -> &'static str {
        "env"
    }

    fn parse(&self, bytes: &[u8]) -> ParseTree {
        let text = match decode(bytes) {
            Ok(text) => text,
            Err(tree) => return tree,
        };
        let mut builder = TreeBuilder::new();
        let root = push_root(&mut builder, text);

        for entry in line_entries(text) {
            let line = entry.text.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let stripped = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = stripped.split_once('=') else {
                builder.mark_error(root);
                continue;
            };
            let key = key.trim();
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                builder.mark_error(root);
                continue;
            }
            let variable = builder.push(
                "variable",
                entry.span(),
                entry.start_point(),
                entry.end_point(),
            );
            builder.attach(root, variable);

            let key_offset = entry.text.find(key).unwrap_or(0);
            let key_node = builder.push(
                "identifier",
                Span::new(entry.start + key_offset, entry.start + key_offset + key.len()),
                Point::new(entry.row, key_offset),
                Point::new(entry.row, key_offset + key.len()),
            );
            builder.attach(variable, key_node);

            let value = value.trim();
            if !value.is_empty() {
                let value_offset = entry.text.rfind(value).unwrap_or(0);
                let value_node = builder.push(
                    "value",
                    Span::new(
                        entry.start + value_offset,
                        entry.start + value_offset + value.len(),
                    ),
                    Point::new(entry.row, value_offset),
                    Point::new(entry.row, value_offset + value.len()),
                );
                builder.attach(variable, value_node);
            }
        }
        builder.finish(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_with_and_without_export() {
        let source = b"DATABASE_URL=postgres://localhost\nexport API_KEY=secret\n";
        let tree = EnvParser.parse(source);
        let names: Vec<_> = tree
            .preorder()
            .filter(|(_, n)| n.kind == "identifier")
            .map(|(id, _)| tree.node_text(id, source))
            .collect();
        assert_eq!(names, vec![b"DATABASE_URL".as_slice(), b"API_KEY".as_slice()]);
        assert!(!tree.root().has_error);
    }

    #[test]
    fn comments_and_blanks_are_ignored() {
        let tree = EnvParser.parse(b"# comment\n\nKEY=value\n");
        assert_eq!(
            tree.preorder().filter(|(_, n)| n.kind == "variable").count(),
            1
        );
    }

    #[test]
    fn invalid_lines_flag_the_root() {
        let tree = EnvParser.parse(b"this is not an assignment\n");
        assert!(tree.root().has_error);
    }
}
