// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hand-written format parsers.
//!
//! Each parser emits the same normalized tree shape the AST backend
//! produces, so the pattern engine, block extractor, and feature extractor
//! never care which backend ran. Custom parsers may be partial: a tree
//! whose root carries `has_error` is still a successful parse, it just
//! steers the pattern engine toward its recovery strategies.
//!
//! Nodes without a natural kind use `kind = "text"` with a single leaf.

mod asciidoc;
mod env;
mod graphql;
mod ini;
mod json;
mod markdown;
mod rst;
mod text;
mod toml;
mod xml;
mod yaml;

pub use asciidoc::AsciidocParser;
pub use env::EnvParser;
pub use graphql::GraphqlParser;
pub use ini::IniParser;
pub use json::JsonParser;
pub use markdown::MarkdownParser;
pub use rst::RstParser;
pub use text::PlaintextParser;
pub use toml::TomlParser;
pub use xml::XmlParser;
pub use yaml::YamlParser;

use std::sync::Arc;

use quarry_core::{BackendError, LanguageId, ParseTree, Point, Span, TreeBuilder};

use crate::ParsedUnit;

/// Narrow capability set every custom parser implements.
pub trait CustomParser: Send + Sync {
    /// Canonical language id this parser serves.
    fn format(&self) -> &'static str;

    fn supports(&self, language: &LanguageId) -> bool {
        language.as_str() == self.format()
    }

    /// Total over arbitrary bytes; errors become `has_error` trees.
    fn parse(&self, bytes: &[u8]) -> ParseTree;
}

/// Static registry of custom parsers, populated at construction. Lookup is
/// first-registered-wins, which keeps dispatch deterministic.
pub struct CustomBackend {
    parsers: Vec<Arc<dyn CustomParser>>,
}

impl Default for CustomBackend {
    fn default() -> Self {
        Self::with_default_parsers()
    }
}

impl CustomBackend {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Registry with every built-in format parser.
    #[must_use]
    pub fn with_default_parsers() -> Self {
        let mut backend = Self::empty();
        backend.register(Arc::new(MarkdownParser));
        backend.register(Arc::new(RstParser));
        backend.register(Arc::new(AsciidocParser));
        backend.register(Arc::new(IniParser::ini()));
        backend.register(Arc::new(IniParser::editorconfig()));
        backend.register(Arc::new(TomlParser));
        backend.register(Arc::new(YamlParser));
        backend.register(Arc::new(JsonParser));
        backend.register(Arc::new(XmlParser));
        backend.register(Arc::new(EnvParser));
        backend.register(Arc::new(GraphqlParser));
        backend.register(Arc::new(PlaintextParser));
        backend
    }

    pub fn register(&mut self, parser: Arc<dyn CustomParser>) {
        self.parsers.push(parser);
    }

    #[must_use]
    pub fn supports(&self, language: &LanguageId) -> bool {
        self.parsers.iter().any(|p| p.supports(language))
    }

    pub fn parse(&self, language: &LanguageId, bytes: &[u8]) -> Result<ParsedUnit, BackendError> {
        let parser = self
            .parsers
            .iter()
            .find(|p| p.supports(language))
            .ok_or_else(|| BackendError::Unavailable(language.clone()))?;
        let tree = parser.parse(bytes);
        Ok(ParsedUnit::custom(language.clone(), tree))
    }

    #[must_use]
    pub fn formats(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.format()).collect()
    }
}

/// A source line with its byte offset and row.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LineEntry<'s> {
    pub start: usize,
    pub row: usize,
    pub text: &'s str,
}

impl LineEntry<'_> {
    pub(crate) fn span(&self) -> Span {
        Span::new(self.start, self.start + self.text.len())
    }

    pub(crate) fn start_point(&self) -> Point {
        Point::new(self.row, 0)
    }

    pub(crate) fn end_point(&self) -> Point {
        Point::new(self.row, self.text.len())
    }
}

/// Split text into lines, keeping byte offsets. Trailing newlines are not
/// part of any line's span.
pub(crate) fn line_entries(text: &str) -> Vec<LineEntry<'_>> {
    let mut entries = Vec::new();
    let mut start = 0;
    for (row, line) in text.split('\n').enumerate() {
        let trimmed_end = line.strip_suffix('\r').unwrap_or(line);
        entries.push(LineEntry {
            start,
            row,
            text: trimmed_end,
        });
        start += line.len() + 1;
    }
    // split('\n') yields one phantom empty line after a trailing newline
    if text.ends_with('\n') {
        entries.pop();
    }
    entries
}

/// End point of a byte buffer interpreted as text.
pub(crate) fn end_point_of(text: &str) -> Point {
    let rows = text.matches('\n').count();
    let column = text.rsplit('\n').next().map_or(0, str::len);
    Point::new(rows, column)
}

/// Push the document root node for a unit of text.
pub(crate) fn push_root(builder: &mut TreeBuilder, text: &str) -> quarry_core::NodeId {
    builder.push(
        "document",
        Span::new(0, text.len()),
        Point::new(0, 0),
        end_point_of(text),
    )
}

/// The tree for undecodable input: an error-flagged document with one text
/// leaf covering everything.
pub(crate) fn fallback_tree(bytes: &[u8]) -> ParseTree {
    let mut builder = TreeBuilder::new();
    let end = Point::new(0, bytes.len());
    let root = builder.push_flagged(
        "document",
        Span::new(0, bytes.len()),
        Point::new(0, 0),
        end,
        true,
        false,
    );
    let leaf = builder.push("text", Span::new(0, bytes.len()), Point::new(0, 0), end);
    builder.attach(root, leaf);
    builder.finish(root)
}

/// Decode UTF-8 or fall back to the error tree.
pub(crate) fn decode(bytes: &[u8]) -> Result<&str, ParseTree> {
    std::str::from_utf8(bytes).map_err(|_| fallback_tree(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_entries_track_offsets() {
        let entries = line_entries("ab\ncd\n\nef");
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[1].start, 3);
        assert_eq!(entries[1].text, "cd");
        assert_eq!(entries[2].text, "");
        assert_eq!(entries[3].start, 7);
    }

    #[test]
    fn trailing_newline_adds_no_phantom_line() {
        assert_eq!(line_entries("ab\n").len(), 1);
        assert_eq!(line_entries("").len(), 1);
    }

    #[test]
    fn end_point_counts_rows() {
        assert_eq!(end_point_of("ab\ncd"), Point::new(1, 2));
        assert_eq!(end_point_of("ab\n"), Point::new(1, 0));
        assert_eq!(end_point_of("ab"), Point::new(0, 2));
    }

    #[test]
    fn registry_dispatch() {
        let backend = CustomBackend::with_default_parsers();
        assert!(backend.supports(&LanguageId::new("markdown")));
        assert!(backend.supports(&LanguageId::new("editorconfig")));
        assert!(!backend.supports(&LanguageId::new("rust")));
        let err = backend.parse(&LanguageId::new("rust"), b"fn main() {}");
        assert!(err.is_err());
    }

    #[test]
    fn fallback_tree_is_flagged() {
        let tree = fallback_tree(&[0xff, 0xfe]);
        assert!(tree.root().has_error);
        assert_eq!(tree.root().children.len(), 1);
    }
}
