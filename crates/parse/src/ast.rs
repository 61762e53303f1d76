// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tree-sitter backend.
//!
//! Parsing is total: malformed input comes back as a tree with error and
//! missing nodes, never as an `Err`. The only failures are a missing grammar
//! and an ABI mismatch between a grammar and the linked tree-sitter
//! runtime, both of which the facade resolves through classification
//! fallbacks.

use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator, Tree};

use quarry_core::{BackendError, Deadline, LanguageId, Point, Span};

use crate::convert::normalize_tree;
use crate::{BackendKind, ParsedUnit};

/// One capture inside a query hit.
#[derive(Debug, Clone)]
pub struct QueryCapture {
    pub name: String,
    pub span: Span,
    pub node_kind: String,
    pub has_error: bool,
}

/// One query match, captures in tree traversal order.
#[derive(Debug, Clone)]
pub struct QueryHit {
    pub captures: Vec<QueryCapture>,
    /// Span of the outermost captured node.
    pub span: Span,
    pub node_kind: String,
    pub has_error: bool,
    pub start_point: Point,
    pub end_point: Point,
}

/// Stateless entry points for the tree-sitter backend. Parsers are cheap to
/// construct, so each call builds its own; grammars are cached process-wide
/// by the language crate.
pub struct AstBackend;

impl AstBackend {
    /// Parse `bytes` with the grammar registered for `language`.
    pub fn parse(language: &LanguageId, bytes: &[u8]) -> Result<ParsedUnit, BackendError> {
        Self::parse_with_deadline(language, bytes, Deadline::none())
            .map(|unit| unit.expect("unbounded parse cannot be cancelled"))
    }

    /// Deadline-aware parse. `Ok(None)` means the deadline elapsed
    /// mid-parse; nothing is produced and nothing was cached.
    pub fn parse_with_deadline(
        language: &LanguageId,
        bytes: &[u8],
        deadline: Deadline,
    ) -> Result<Option<ParsedUnit>, BackendError> {
        let grammar = quarry_language::grammar(language)
            .ok_or_else(|| BackendError::Unavailable(language.clone()))?;
        let Some(tree) = Self::parse_with(&grammar, language, bytes, deadline)? else {
            return Ok(None);
        };
        let arena = normalize_tree(&tree);
        Ok(Some(ParsedUnit::ast(language.clone(), arena, tree)))
    }

    fn parse_with(
        grammar: &Language,
        language: &LanguageId,
        bytes: &[u8],
        deadline: Deadline,
    ) -> Result<Option<Tree>, BackendError> {
        let mut parser = Parser::new();
        parser
            .set_language(grammar)
            .map_err(|_| BackendError::GrammarVersionMismatch {
                language: language.clone(),
                expected: tree_sitter::LANGUAGE_VERSION,
                actual: grammar.abi_version(),
            })?;
        let bounded = deadline.remaining();
        if let Some(remaining) = bounded {
            // cooperative cancellation inside the C parse loop
            #[allow(deprecated)]
            parser.set_timeout_micros(remaining.as_micros().max(1) as u64);
        }
        match parser.parse(bytes, None) {
            Some(tree) => Ok(Some(tree)),
            // with a bounded deadline, None is a timeout; otherwise the
            // grammar failed to load at all
            None if bounded.is_some() => Ok(None),
            None => Err(BackendError::Unavailable(language.clone())),
        }
    }

    /// Compile a query source against a language grammar. The error is the
    /// human-readable reason; the registry folds it into its own pattern
    /// error type.
    pub fn compile_query(language: &LanguageId, source: &str) -> Result<Query, String> {
        let grammar = quarry_language::grammar(language)
            .ok_or_else(|| format!("no grammar loaded for language `{language}`"))?;
        Query::new(&grammar, source).map_err(|e| {
            tracing::debug!(language = %language, error = %e, "query compilation failed");
            e.to_string()
        })
    }

    /// Run a compiled query over a parsed unit's whole tree.
    #[must_use]
    pub fn run_query(unit: &ParsedUnit, query: &Query, source: &[u8]) -> Vec<QueryHit> {
        debug_assert_eq!(unit.backend, BackendKind::Ast);
        match unit.ts_tree() {
            Some(tree) => Self::run_query_on(tree.root_node(), query, source),
            None => Vec::new(),
        }
    }

    /// Run a compiled query scoped to one node (used by partial-match
    /// recovery, which walks top-level children separately).
    #[must_use]
    pub fn run_query_on(node: Node<'_>, query: &Query, source: &[u8]) -> Vec<QueryHit> {
        let capture_names = query.capture_names();
        let mut cursor = QueryCursor::new();
        let mut hits = Vec::new();
        let mut matches = cursor.matches(query, node, source);
        while let Some(m) = matches.next() {
            let mut captures = Vec::with_capacity(m.captures.len());
            for capture in m.captures {
                captures.push(QueryCapture {
                    name: capture_names[capture.index as usize].to_string(),
                    span: Span::new(capture.node.start_byte(), capture.node.end_byte()),
                    node_kind: capture.node.kind().to_string(),
                    has_error: capture.node.has_error(),
                });
            }
            let Some(outer) = outermost(m.captures.iter().map(|c| c.node)) else {
                continue;
            };
            hits.push(QueryHit {
                span: Span::new(outer.start_byte(), outer.end_byte()),
                node_kind: outer.kind().to_string(),
                has_error: outer.has_error(),
                start_point: Point::new(outer.start_position().row, outer.start_position().column),
                end_point: Point::new(outer.end_position().row, outer.end_position().column),
                captures,
            });
        }
        // Deterministic total order: earlier start, then longer span. The
        // sort is stable, so equal spans keep registration order.
        hits.sort_by(|a, b| {
            a.span
                .start_byte
                .cmp(&b.span.start_byte)
                .then(b.span.len().cmp(&a.span.len()))
        });
        hits
    }

    /// Top-level named nodes of a unit's concrete tree.
    #[must_use]
    pub fn top_level_nodes<'t>(tree: &'t Tree) -> Vec<Node<'t>> {
        let root = tree.root_node();
        let mut cursor = root.walk();
        root.named_children(&mut cursor).collect()
    }
}

/// The capture whose span encloses the others; ties go to the earliest.
fn outermost<'t>(nodes: impl Iterator<Item = Node<'t>>) -> Option<Node<'t>> {
    nodes.max_by(|a, b| {
        let len_a = a.end_byte() - a.start_byte();
        let len_b = b.end_byte() - b.start_byte();
        len_a.cmp(&len_b).then(b.start_byte().cmp(&a.start_byte()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python() -> LanguageId {
        LanguageId::new("python")
    }

    #[test]
    fn parse_builds_both_trees() {
        let unit = AstBackend::parse(&python(), b"def foo():\n    pass\n").unwrap();
        assert_eq!(unit.backend, BackendKind::Ast);
        assert!(unit.ts_tree().is_some());
        assert!(unit.tree.find_first("function_definition").is_some());
    }

    #[test]
    fn unknown_language_is_unavailable() {
        let err = AstBackend::parse(&LanguageId::new("cobol"), b"x").unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
    }

    #[test]
    fn malformed_input_still_parses() {
        let unit = AstBackend::parse(&python(), b"def foo(:\n    pass\n").unwrap();
        assert!(unit.tree.has_errors());
    }

    #[test]
    fn query_captures_in_order() {
        let source = b"def foo():\n    pass\n\ndef bar():\n    pass\n";
        let unit = AstBackend::parse(&python(), source).unwrap();
        let query = AstBackend::compile_query(
            &python(),
            "(function_definition name: (identifier) @name) @function",
        )
        .unwrap();
        let hits = AstBackend::run_query(&unit, &query, source);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].span.start_byte < hits[1].span.start_byte);
        assert_eq!(hits[0].node_kind, "function_definition");
        let name = hits[0].captures.iter().find(|c| c.name == "name").unwrap();
        assert_eq!(name.span.slice(source), b"foo");
    }

    #[test]
    fn bad_query_fails_compilation() {
        assert!(AstBackend::compile_query(&python(), "(nonexistent_node_kind) @x").is_err());
    }

    #[test]
    fn scoped_query_sees_only_its_subtree() {
        let source = b"def foo():\n    pass\n\ndef bar():\n    pass\n";
        let unit = AstBackend::parse(&python(), source).unwrap();
        let query =
            AstBackend::compile_query(&python(), "(function_definition) @function").unwrap();
        let tree = unit.ts_tree().unwrap();
        let tops = AstBackend::top_level_nodes(tree);
        assert_eq!(tops.len(), 2);
        let hits = AstBackend::run_query_on(tops[0], &query, source);
        assert_eq!(hits.len(), 1);
    }
}
