// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! XML subset: elements, prolog, text nodes.
//!
//! No DTD, no entity expansion; the tree records structure and spans.
//! Mismatched or unclosed tags degrade to a partial tree with the root
//! flagged, which is still a successful parse for the pipeline.

use quarry_core::{NodeId, ParseTree, Point, Span, TreeBuilder};

use super::{CustomParser, decode, end_point_of};

pub struct XmlParser;

struct OpenElement<'s> {
    node: NodeId,
    start: usize,
    name: &'s str,
}

impl CustomParser for XmlParser {
    fn format(&self) -> &'static str {
        "xml"
    }

    fn parse(&self, bytes: &[u8]) -> ParseTree {
        let text = match decode(bytes) {
            Ok(text) => text,
            Err(tree) => return tree,
        };
        let mut builder = TreeBuilder::new();
        let root = builder.push(
            "document",
            Span::new(0, text.len()),
            Point::new(0, 0),
            end_point_of(text),
        );

        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(memchr::memchr_iter(b'\n', text.as_bytes()).map(|i| i + 1))
            .collect();
        let point_at = |pos: usize| -> Point {
            let row = line_starts.partition_point(|&start| start <= pos) - 1;
            Point::new(row, pos - line_starts[row])
        };

        let raw = text.as_bytes();
        let mut stack: Vec<OpenElement<'_>> = Vec::new();
        let mut pos = 0;
        let mut broken = false;

        while pos < raw.len() {
            let parent = stack.last().map_or(root, |open| open.node);
            let Some(lt) = memchr::memchr(b'<', &raw[pos..]).map(|i| pos + i) else {
                push_text(&mut builder, text, pos, text.len(), &point_at, parent);
                break;
            };
            push_text(&mut builder, text, pos, lt, &point_at, parent);
            let Some(gt) = memchr::memchr(b'>', &raw[lt..]).map(|i| lt + i) else {
                broken = true;
                break;
            };
            let inner = &text[lt + 1..gt];
            pos = gt + 1;

            if inner.starts_with('?') {
                let node = builder.push(
                    "processing_instruction",
                    Span::new(lt, pos),
                    point_at(lt),
                    point_at(pos),
                );
                builder.attach(parent, node);
            } else if inner.starts_with("!--") {
                // comments may contain '>'; rescan for the real terminator
                match text[lt..].find("-->") {
                    Some(i) => pos = lt + i + 3,
                    None => {
                        broken = true;
                        break;
                    }
                }
            } else if inner.starts_with('!') {
                let node = builder.push("doctype", Span::new(lt, pos), point_at(lt), point_at(pos));
                builder.attach(parent, node);
            } else if let Some(name) = inner.strip_prefix('/') {
                match stack.pop() {
                    Some(open) if open.name == name.trim() => {
                        builder.set_extent(
                            open.node,
                            Span::new(open.start, pos),
                            point_at(open.start),
                            point_at(pos),
                        );
                    }
                    _ => {
                        broken = true;
                        break;
                    }
                }
            } else {
                let self_closing = inner.ends_with('/');
                let Some(name) = inner.trim_end_matches('/').split_whitespace().next() else {
                    broken = true;
                    break;
                };
                let element =
                    builder.push("element", Span::new(lt, pos), point_at(lt), point_at(pos));
                builder.attach(parent, element);
                let name_start = lt + 1;
                let tag = builder.push(
                    "tag_name",
                    Span::new(name_start, name_start + name.len()),
                    point_at(name_start),
                    point_at(name_start + name.len()),
                );
                builder.attach(element, tag);
                if !self_closing {
                    stack.push(OpenElement {
                        node: element,
                        start: lt,
                        name,
                    });
                }
            }
        }

        if broken || !stack.is_empty() {
            for open in stack.drain(..) {
                builder.set_extent(
                    open.node,
                    Span::new(open.start, text.len()),
                    point_at(open.start),
                    end_point_of(text),
                );
                builder.mark_error(open.node);
            }
            builder.mark_error(root);
        }
        builder.finish(root)
    }
}

fn push_text(
    builder: &mut TreeBuilder,
    text: &str,
    start: usize,
    end: usize,
    point_at: &impl Fn(usize) -> Point,
    parent: NodeId,
) {
    if text[start..end].trim().is_empty() {
        return;
    }
    let node = builder.push("text", Span::new(start, end), point_at(start), point_at(end));
    builder.attach(parent, node);
}
