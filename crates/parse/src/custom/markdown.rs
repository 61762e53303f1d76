// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Markdown: ATX headings, fenced code blocks, list items, paragraphs.
//!
//! Kind names follow the tree-sitter markdown grammar so patterns written
//! against either backend line up: `atx_heading`, `fenced_code_block`,
//! `list_item`, `paragraph`.

use quarry_core::{NodeId, ParseTree, Point, Span, TreeBuilder};

use super::{CustomParser, LineEntry, decode, line_entries, push_root};

pub struct MarkdownParser;

impl CustomParser for MarkdownParser {
    fn format(&self) -> &'static str {
        "markdown"
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
            let trimmed = entry.text.trim_start();

            if trimmed.is_empty() {
                i += 1;
            } else if heading_level(trimmed).is_some() {
                push_heading(&mut builder, root, entry);
                i += 1;
            } else if let Some(fence) = fence_marker(trimmed) {
                i = push_fenced_block(&mut builder, root, &entries, i, fence);
            } else if is_list_item(trimmed) {
                push_line_node(&mut builder, root, entry, "list_item");
                i += 1;
            } else {
                i = push_paragraph(&mut builder, root, &entries, i);
            }
        }
        builder.finish(root)
    }
}

fn heading_level(line: &str) -> Option<usize> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    ((1..=6).contains(&hashes) && line[hashes..].starts_with(' ')).then_some(hashes)
}

fn fence_marker(line: &str) -> Option<&str> {
    if line.starts_with("```") {
        Some("```")
    } else if line.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

fn is_list_item(line: &str) -> bool {
    line.starts_with("- ")
        || line.starts_with("* ")
        || line.starts_with("+ ")
        || line
            .split_once(". ")
            .is_some_and(|(n, _)| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

fn push_heading(builder: &mut TreeBuilder, root: NodeId, entry: LineEntry<'_>) {
    let trimmed = entry.text.trim_start();
    let level = heading_level(trimmed).unwrap_or(1);
    let heading = builder.push(
        "atx_heading",
        entry.span(),
        entry.start_point(),
        entry.end_point(),
    );
    builder.attach(root, heading);

    let indent = entry.text.len() - trimmed.len();
    let content_offset = indent + level + 1; // hashes plus the space
    if content_offset < entry.text.len() {
        let content = builder.push(
            "heading_content",
            Span::new(
                entry.start + content_offset,
                entry.start + entry.text.len(),
            ),
            Point::new(entry.row, content_offset),
            entry.end_point(),
        );
        builder.attach(heading, content);
    }
}

fn push_line_node(builder: &mut TreeBuilder, root: NodeId, entry: LineEntry<'_>, kind: &str) {
    let node = builder.push(kind, entry.span(), entry.start_point(), entry.end_point());
    builder.attach(root, node);
}

/// Consume a fenced block starting at `open`; returns the next line index.
/// An unterminated fence runs to end of input and flags the block.
fn push_fenced_block(
    builder: &mut TreeBuilder,
    root: NodeId,
    entries: &[LineEntry<'_>],
    open: usize,
    fence: &str,
) -> usize {
    let open_entry = entries[open];
    let mut close = open + 1;
    while close < entries.len() && !entries[close].text.trim_start().starts_with(fence) {
        close += 1;
    }
    let terminated = close < entries.len();
    let last = if terminated { close } else { entries.len() - 1 };
    let end_entry = entries[last];

    let block = builder.push_flagged(
        "fenced_code_block",
        Span::new(open_entry.start, end_entry.span().end_byte),
        open_entry.start_point(),
        end_entry.end_point(),
        !terminated,
        false,
    );
    builder.attach(root, block);

    // info string after the fence, e.g. ```rust
    let info = open_entry.text.trim_start()[fence.len()..].trim();
    if !info.is_empty() {
        let offset = open_entry.text.len() - open_entry.text.trim_start().len() + fence.len();
        let info_start = open_entry.start + open_entry.text[offset..].find(info).unwrap_or(0) + offset;
        let node = builder.push(
            "info_string",
            Span::new(info_start, info_start + info.len()),
            Point::new(open_entry.row, info_start - open_entry.start),
            Point::new(open_entry.row, info_start - open_entry.start + info.len()),
        );
        builder.attach(block, node);
    }

    if terminated && close > open + 1 {
        let first = entries[open + 1];
        let last_content = entries[close - 1];
        let node = builder.push(
            "code_fence_content",
            Span::new(first.start, last_content.span().end_byte),
            first.start_point(),
            last_content.end_point(),
        );
        builder.attach(block, node);
    }
    if terminated { close + 1 } else { entries.len() }
}

/// Consume a paragraph run; returns the next line index.
fn push_paragraph(
    builder: &mut TreeBuilder,
    root: NodeId,
    entries: &[LineEntry<'_>],
    start: usize,
) -> usize {
    let mut end = start;
    while end + 1 < entries.len() {
        let next = entries[end + 1].text.trim_start();
        if next.is_empty()
            || heading_level(next).is_some()
            || fence_marker(next).is_some()
            || is_list_item(next)
        {
            break;
        }
        end += 1;
    }
    let first = entries[start];
    let last = entries[end];
    let node = builder.push(
        "paragraph",
        Span::new(first.start, last.span().end_byte),
        first.start_point(),
        last.end_point(),
    );
    builder.attach(root, node);
    end + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_with_content() {
        let source = b"# Title\n\nSome prose here.\n";
        let tree = MarkdownParser.parse(source);
        let (id, heading) = tree.find_first("atx_heading").unwrap();
        assert_eq!(tree.node_text(id, source), b"# Title");
        assert!(!heading.has_error);
        let (content_id, _) = tree.find_first("heading_content").unwrap();
        assert_eq!(tree.node_text(content_id, source), b"Title");
        assert!(tree.find_first("paragraph").is_some());
    }

    #[test]
    fn fenced_block_with_info_string() {
        let source = b"```rust\nfn main() {}\n```\n";
        let tree = MarkdownParser.parse(source);
        let (info_id, _) = tree.find_first("info_string").unwrap();
        assert_eq!(tree.node_text(info_id, source), b"rust");
        let (content_id, _) = tree.find_first("code_fence_content").unwrap();
        assert_eq!(tree.node_text(content_id, source), b"fn main() {}");
    }

    #[test]
    fn unterminated_fence_is_partial_not_fatal() {
        let source = b"```\ncode without a closing fence\n";
        let tree = MarkdownParser.parse(source);
        let (_, block) = tree.find_first("fenced_code_block").unwrap();
        assert!(block.has_error);
    }

    #[test]
    fn list_items() {
        let source = b"- one\n- two\n1. three\n";
        let tree = MarkdownParser.parse(source);
        let items = tree
            .preorder()
            .filter(|(_, n)| n.kind == "list_item")
            .count();
        assert_eq!(items, 3);
    }
}
