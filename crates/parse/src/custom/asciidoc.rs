// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AsciiDoc: `=` section titles, listing blocks, paragraphs.

use quarry_core::{NodeId, ParseTree, Point, Span, TreeBuilder};

use super::{CustomParser, LineEntry, decode, line_entries, push_root};

pub struct AsciidocParser;

impl CustomParser for AsciidocParser {
    fn format(&self) -> &'static str {
        "asciidoc"
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
            let line = entry.text;
            if line.trim().is_empty() {
                i += 1;
            } else if let Some(level) = title_level(line) {
                push_title(&mut builder, root, entry, level);
                i += 1;
            } else if line.trim_end() == "----" {
                i = push_listing_block(&mut builder, root, &entries, i);
            } else {
                let mut end = i;
                while end + 1 < entries.len() {
                    let next = entries[end + 1].text;
                    if next.trim().is_empty()
                        || title_level(next).is_some()
                        || next.trim_end() == "----"
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
        }
        builder.finish(root)
    }
}

fn title_level(line: &str) -> Option<usize> {
    let marks = line.bytes().take_while(|&b| b == b'=').count();
    ((1..=6).contains(&marks) && line[marks..].starts_with(' ')).then_some(marks)
}

fn push_title(builder: &mut TreeBuilder, root: NodeId, entry: LineEntry<'_>, level: usize) {
    let title = builder.push(
        "section_title",
        entry.span(),
        entry.start_point(),
        entry.end_point(),
    );
    builder.attach(root, title);
    let offset = level + 1;
    if offset < entry.text.len() {
        let text = builder.push(
            "title_text",
            Span::new(entry.start + offset, entry.start + entry.text.len()),
            Point::new(entry.row, offset),
            entry.end_point(),
        );
        builder.attach(title, text);
    }
}

/// `----` delimited listing; unterminated blocks run to the end flagged.
fn push_listing_block(
    builder: &mut TreeBuilder,
    root: NodeId,
    entries: &[LineEntry<'_>],
    open: usize,
) -> usize {
    let open_entry = entries[open];
    let mut close = open + 1;
    while close < entries.len() && entries[close].text.trim_end() != "----" {
        close += 1;
    }
    let terminated = close < entries.len();
    let last = if terminated { close } else { entries.len() - 1 };
    let block = builder.push_flagged(
        "listing_block",
        Span::new(open_entry.start, entries[last].span().end_byte),
        open_entry.start_point(),
        entries[last].end_point(),
        !terminated,
        false,
    );
    builder.attach(root, block);

    if terminated && close > open + 1 {
        let first = entries[open + 1];
        let content_last = entries[close - 1];
        let content = builder.push(
            "listing_content",
            Span::new(first.start, content_last.span().end_byte),
            first.start_point(),
            content_last.end_point(),
        );
        builder.attach(block, content);
    }
    if terminated { close + 1 } else { entries.len() }
}
