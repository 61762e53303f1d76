// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! reStructuredText: section titles, directives, paragraphs.

use quarry_core::{NodeId, ParseTree, Point, Span, TreeBuilder};

use super::{CustomParser, LineEntry, decode, line_entries, push_root};

const ADORNMENT_CHARS: &str = "=-~^\"'`#*+.:_";

pub struct RstParser;

impl CustomParser for RstParser {
    fn format(&self) -> &'static str {
        "restructuredtext"
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
            if entry.text.trim().is_empty() {
                i += 1;
                continue;
            }
            if let Some(directive_name) = directive_name(entry.text) {
                push_directive(&mut builder, root, entry, directive_name);
                i += 1;
                continue;
            }
            if i + 1 < entries.len() && is_adornment_for(entries[i + 1].text, entry.text) {
                push_section_title(&mut builder, root, entry, entries[i + 1]);
                i += 2;
                continue;
            }
            // paragraph run up to the next blank line or structural line
            let mut end = i;
            while end + 1 < entries.len() {
                let next = &entries[end + 1];
                if next.text.trim().is_empty() || directive_name(next.text).is_some() {
                    break;
                }
                if end + 2 < entries.len()
                    && is_adornment_for(entries[end + 2].text, next.text)
                {
                    break;
                }
                end += 1;
            }
            let node = builder.push(
                "paragraph",
                Span::new(entry.start, entries[end].span().end_byte),
                entry.start_point(),
                entries[end].end_point(),
            );
            builder.attach(root, node);
            i = end + 1;
        }
        builder.finish(root)
    }
}

/// `.. name:: args` introduces a directive.
fn directive_name(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix(".. ")?;
    let (name, _) = rest.split_once("::")?;
    (!name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_'))
        .then_some(name)
}

/// An adornment underlines the preceding title: one repeated punctuation
/// character, at least as long as the title.
fn is_adornment_for(line: &str, title: &str) -> bool {
    let line = line.trim_end();
    let title_len = title.trim_end().len();
    if line.len() < title_len.max(2) || title.trim().is_empty() {
        return false;
    }
    let mut chars = line.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    ADORNMENT_CHARS.contains(first) && chars.all(|c| c == first)
}

fn push_section_title(
    builder: &mut TreeBuilder,
    root: NodeId,
    title: LineEntry<'_>,
    adornment: LineEntry<'_>,
) {
    let section = builder.push(
        "section_title",
        Span::new(title.start, adornment.span().end_byte),
        title.start_point(),
        adornment.end_point(),
    );
    builder.attach(root, section);
    let text = builder.push("title_text", title.span(), title.start_point(), title.end_point());
    builder.attach(section, text);
}

fn push_directive(builder: &mut TreeBuilder, root: NodeId, entry: LineEntry<'_>, name: &str) {
    let directive = builder.push(
        "directive",
        entry.span(),
        entry.start_point(),
        entry.end_point(),
    );
    builder.attach(root, directive);

    let name_offset = entry.text.find(name).unwrap_or(0);
    let node = builder.push(
        "directive_name",
        Span::new(entry.start + name_offset, entry.start + name_offset + name.len()),
        Point::new(entry.row, name_offset),
        Point::new(entry.row, name_offset + name.len()),
    );
    builder.attach(directive, node);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_titles_need_an_underline() {
        let source = b"Introduction\n============\n\nBody text.\n";
        let tree = RstParser.parse(source);
        let (id, _) = tree.find_first("section_title").unwrap();
        assert_eq!(tree.node_text(id, source), b"Introduction\n============");
        let (title_id, _) = tree.find_first("title_text").unwrap();
        assert_eq!(tree.node_text(title_id, source), b"Introduction");
    }

    #[test]
    fn short_underline_is_a_paragraph() {
        let source = b"A longer title line\n==\n";
        let tree = RstParser.parse(source);
        assert!(tree.find_first("section_title").is_none());
    }

    #[test]
    fn directives_carry_their_name() {
        let source = b".. code-block:: python\n";
        let tree = RstParser.parse(source);
        let (name_id, _) = tree.find_first("directive_name").unwrap();
        assert_eq!(tree.node_text(name_id, source), b"code-block");
    }
}
