// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON parser with byte-exact spans.
//!
//! serde would parse this faster, but it cannot report node spans, and the
//! whole point of the custom backend is producing the same span-bearing
//! tree shape the AST backend emits. Errors truncate the walk and flag the
//! root; whatever parsed before the error stays in the tree.

use quarry_core::{NodeId, ParseTree, Point, Span, TreeBuilder};

use super::{CustomParser, decode, end_point_of};

const MAX_DEPTH: usize = 128;

pub struct JsonParser;

impl CustomParser for JsonParser {
    fn format(&self) -> &'static str {
        "json"
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
        let mut scanner = Scanner::new(text);
        scanner.skip_ws();
        if !scanner.at_end() {
            match scanner.value(&mut builder, 0) {
                Ok(value) => {
                    builder.attach(root, value);
                    scanner.skip_ws();
                    if !scanner.at_end() {
                        builder.mark_error(root); // trailing garbage
                    }
                }
                Err(()) => builder.mark_error(root),
            }
        }
        builder.finish(root)
    }
}

struct Scanner<'s> {
    bytes: &'s [u8],
    pos: usize,
    line_starts: Vec<usize>,
}

impl<'s> Scanner<'s> {
    fn new(text: &'s str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(memchr::memchr_iter(b'\n', text.as_bytes()).map(|i| i + 1));
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            line_starts,
        }
    }

    fn point_at(&self, pos: usize) -> Point {
        let row = self.line_starts.partition_point(|&start| start <= pos) - 1;
        Point::new(row, pos - self.line_starts[row])
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn push_span(&self, builder: &mut TreeBuilder, kind: &str, start: usize, end: usize) -> NodeId {
        builder.push(
            kind,
            Span::new(start, end),
            self.point_at(start),
            self.point_at(end),
        )
    }

    fn value(&mut self, builder: &mut TreeBuilder, depth: usize) -> Result<NodeId, ()> {
        if depth > MAX_DEPTH {
            return Err(());
        }
        self.skip_ws();
        match self.peek().ok_or(())? {
            b'{' => self.object(builder, depth),
            b'[' => self.array(builder, depth),
            b'"' => self.string(builder),
            b't' => self.keyword(builder, "true"),
            b'f' => self.keyword(builder, "false"),
            b'n' => self.keyword(builder, "null"),
            b'-' | b'0'..=b'9' => Ok(self.number(builder)),
            _ => Err(()),
        }
    }

    fn object(&mut self, builder: &mut TreeBuilder, depth: usize) -> Result<NodeId, ()> {
        let start = self.pos;
        self.pos += 1; // '{'
        let object = self.push_span(builder, "object", start, start + 1);
        loop {
            self.skip_ws();
            match self.peek().ok_or(())? {
                b'}' => {
                    self.pos += 1;
                    break;
                }
                b'"' => {
                    let pair_start = self.pos;
                    let key = self.string(builder)?;
                    self.skip_ws();
                    if self.peek() != Some(b':') {
                        return Err(());
                    }
                    self.pos += 1;
                    let value = self.value(builder, depth + 1)?;
                    let pair = self.push_span(builder, "pair", pair_start, self.pos);
                    builder.attach(pair, key);
                    builder.attach(pair, value);
                    builder.attach(object, pair);
                    self.skip_ws();
                    if self.peek() == Some(b',') {
                        self.pos += 1;
                    }
                }
                _ => return Err(()),
            }
        }
        self.widen(builder, object, start);
        Ok(object)
    }

    fn array(&mut self, builder: &mut TreeBuilder, depth: usize) -> Result<NodeId, ()> {
        let start = self.pos;
        self.pos += 1; // '['
        let array = self.push_span(builder, "array", start, start + 1);
        loop {
            self.skip_ws();
            match self.peek().ok_or(())? {
                b']' => {
                    self.pos += 1;
                    break;
                }
                _ => {
                    let value = self.value(builder, depth + 1)?;
                    builder.attach(array, value);
                    self.skip_ws();
                    if self.peek() == Some(b',') {
                        self.pos += 1;
                    }
                }
            }
        }
        self.widen(builder, array, start);
        Ok(array)
    }

    fn string(&mut self, builder: &mut TreeBuilder) -> Result<NodeId, ()> {
        let start = self.pos;
        self.pos += 1; // opening quote
        while let Some(b) = self.peek() {
            match b {
                b'\\' => self.pos += 2,
                b'"' => {
                    self.pos += 1;
                    return Ok(self.push_span(builder, "string", start, self.pos));
                }
                _ => self.pos += 1,
            }
        }
        Err(()) // unterminated
    }

    fn number(&mut self, builder: &mut TreeBuilder) -> NodeId {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_digit() || b"+-.eE".contains(&b))
        {
            self.pos += 1;
        }
        self.push_span(builder, "number", start, self.pos)
    }

    fn keyword(&mut self, builder: &mut TreeBuilder, word: &'static str) -> Result<NodeId, ()> {
        if self.bytes[self.pos..].starts_with(word.as_bytes()) {
            let start = self.pos;
            self.pos += word.len();
            Ok(self.push_span(builder, word, start, self.pos))
        } else {
            Err(())
        }
    }

    /// Containers are pushed before their contents are known; patch the
    /// span once the closing delimiter is consumed.
    fn widen(&self, builder: &mut TreeBuilder, id: NodeId, start: usize) {
        builder.set_extent(
            id,
            Span::new(start, self.pos),
            self.point_at(start),
            self.point_at(self.pos),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_structure() {
        let source = br#"{"name": "quarry", "port": 8080, "ok": true}"#;
        let tree = JsonParser.parse(source);
        assert!(!tree.root().has_error);
        let pairs = tree.preorder().filter(|(_, n)| n.kind == "pair").count();
        assert_eq!(pairs, 3);
        let (string_id, _) = tree.find_first("string").unwrap();
        assert_eq!(tree.node_text(string_id, source), br#""name""#);
        assert!(tree.find_first("number").is_some());
        assert!(tree.find_first("true").is_some());
    }

    #[test]
    fn nested_arrays() {
        let source = b"[1, [2, 3], {\"a\": null}]";
        let tree = JsonParser.parse(source);
        assert!(!tree.root().has_error);
        let arrays = tree.preorder().filter(|(_, n)| n.kind == "array").count();
        assert_eq!(arrays, 2);
        assert!(tree.find_first("null").is_some());
    }

    #[test]
    fn malformed_input_keeps_partial_tree() {
        let source = b"{\"a\": 1, \"b\": }";
        let tree = JsonParser.parse(source);
        assert!(tree.root().has_error);
        // the first pair parsed before the error
        assert!(tree.find_first("number").is_some());
    }

    #[test]
    fn trailing_garbage_is_an_error() {
        let tree = JsonParser.parse(b"{} extra");
        assert!(tree.root().has_error);
    }

    #[test]
    fn points_track_multiline_documents() {
        let source = b"{\n  \"a\": 1\n}";
        let tree = JsonParser.parse(source);
        let (_, number) = tree.find_first("number").unwrap();
        assert_eq!(number.start_point, Point::new(1, 9));
    }
}
