// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plaintext: blank-line separated paragraphs.

use quarry_core::{ParseTree, Point, Span, TreeBuilder};

use super::{CustomParser, decode, line_entries, push_root};

#[derive(Clone, Copy)]
struct Paragraph {
    start: usize,
    end: usize,
    first_row: usize,
    last_row: usize,
    last_line_start: usize,
}

pub struct PlaintextParser;

impl CustomParser for PlaintextParser {
    fn format(&self) -> &'static str {
        "plaintext"
    }

    fn parse(&self, bytes: &[u8]) -> ParseTree {
        let text = match decode(bytes) {
            Ok(text) => text,
            Err(tree) => return tree,
        };
        let mut builder = TreeBuilder::new();
        let root = push_root(&mut builder, text);

        let mut open: Option<Paragraph> = None;
        for entry in line_entries(text) {
            if entry.text.trim().is_empty() {
                if let Some(para) = open.take() {
                    attach_paragraph(&mut builder, root, para);
                }
            } else {
                let end = entry.span().end_byte;
                open = Some(match open {
                    None => Paragraph {
                        start: entry.start,
                        end,
                        first_row: entry.row,
                        last_row: entry.row,
                        last_line_start: entry.start,
                    },
                    Some(para) => Paragraph {
                        end,
                        last_row: entry.row,
                        last_line_start: entry.start,
                        ..para
                    },
                });
            }
        }
        if let Some(para) = open {
            attach_paragraph(&mut builder, root, para);
        }
        builder.finish(root)
    }
}

fn attach_paragraph(builder: &mut TreeBuilder, root: quarry_core::NodeId, para: Paragraph) {
    let node = builder.push(
        "paragraph",
        Span::new(para.start, para.end),
        Point::new(para.first_row, 0),
        Point::new(para.last_row, para.end - para.last_line_start),
    );
    builder.attach(root, node);
}
