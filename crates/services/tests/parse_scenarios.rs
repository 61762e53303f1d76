// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios over the unified parser.

use std::sync::{Arc, Mutex};

use quarry_core::{
    FileKind, LanguageId, MetricRecord, MetricSink, ParserKind, PatternCategory, SourceUnit,
};
use quarry_engine::{EngineContext, FeatureExtractor, PatternEngine, PatternRegistry};
use quarry_parse::{AstBackend, CustomBackend};
use quarry_services::{ParseOptions, UnifiedParser};

#[test]
fn python_function_extraction() {
    let parser = UnifiedParser::new();
    let source = "def foo(a, b):\n    return a + b\n";
    let result = parser.parse("demo.py", source.as_bytes().to_vec(), &ParseOptions::default());

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.classification.language, LanguageId::new("python"));

    let syntax = result.features.get(PatternCategory::Syntax);
    assert_eq!(syntax.len(), 1);
    assert_eq!(syntax[0].name, "foo");
    assert_eq!(syntax[0].span.start_byte, 0);

    assert_eq!(result.blocks.len(), 1);
    // the function construct covers the input up to the trailing newline
    assert_eq!(result.blocks[0].content, source.trim_end());
    assert_eq!(result.blocks[0].node_kind, "function_definition");
}

#[test]
fn binary_detection() {
    let parser = UnifiedParser::new();
    let result = parser.parse(
        "img.png",
        b"\x89PNG\r\n\x1a\n\x00\x01binary".to_vec(),
        &ParseOptions::default(),
    );
    assert!(result.success);
    assert_eq!(result.classification.file_kind, FileKind::Binary);
    assert_eq!(result.classification.parser_kind, ParserKind::None);
    assert!(result.matches.is_empty());
    assert!(result.blocks.is_empty());
    assert!(result.features.is_empty());
}

#[test]
fn malformed_source_regex_recovery() {
    let parser = UnifiedParser::new();
    let source = b"def foo(:\n    pass";
    let result = parser.parse("broken.py", source.to_vec(), &ParseOptions::default());

    assert!(result.success, "recovery is not a failure: {:?}", result.errors);
    let recovered: Vec<_> = result
        .matches
        .iter()
        .filter(|m| m.pattern_id == "py-function")
        .collect();
    assert_eq!(recovered.len(), 1);
    let m = recovered[0];
    assert_eq!(m.node_kind, "regex-recovery");
    assert!((m.confidence - 0.4).abs() < f32::EPSILON);
    assert_eq!(m.capture_text("name", source), Some("foo"));
    assert!(result.telemetry.recovered_patterns >= 1);
}

#[test]
fn cancellation_is_terminal_and_side_effect_free() {
    let parser = UnifiedParser::new();
    let big = "x = 1\n".repeat(200_000);
    let options = ParseOptions::default().with_timeout_ms(0);
    let started = std::time::Instant::now();
    let result = parser.parse("big.py", big.into_bytes(), &options);

    assert!(!result.success);
    assert!(result.was_cancelled());
    assert!(started.elapsed().as_millis() < 1_000, "must bail out fast");
    // nothing escaped into the persistent caches
    let metrics = parser.coordinator().metrics();
    assert_eq!(metrics.resident_bytes, 0, "{metrics:?}");
}

#[test]
fn results_are_deterministic() {
    let parser = UnifiedParser::new();
    let source = b"import os\n\ndef alpha():\n    pass\n\nclass Beta:\n    pass\n";
    let options = ParseOptions::default();
    let a = parser.parse("m.py", source.to_vec(), &options);
    let b = parser.parse("m.py", source.to_vec(), &options);

    assert_eq!(a.classification, b.classification);
    assert_eq!(a.matches, b.matches);
    assert_eq!(a.features, b.features);
    assert_eq!(a.blocks, b.blocks);
}

#[test]
fn span_integrity() {
    let parser = UnifiedParser::new();
    let source = b"def alpha():\n    return 1\n\ndef beta():\n    return 2\n";
    let result = parser.parse("m.py", source.to_vec(), &ParseOptions::default());

    for m in &result.matches {
        assert!(m.primary_span.end_byte <= source.len(), "span out of range");
        for capture in &m.captures {
            assert!(capture.span.end_byte <= source.len());
        }
    }
    for block in &result.blocks {
        assert!(
            source
                .windows(block.content.len())
                .any(|w| w == block.content.as_bytes()),
            "block content must be a literal slice of the source"
        );
    }
}

#[test]
fn matches_are_ordered_without_duplicates() {
    let parser = UnifiedParser::new();
    let source = b"import os\nimport sys\n\ndef f():\n    try:\n        pass\n    except OSError:\n        pass\n";
    let result = parser.parse("m.py", source.to_vec(), &ParseOptions::default());

    for pair in result.matches.windows(2) {
        let a = &pair[0];
        let b = &pair[1];
        let ka = (
            a.primary_span.start_byte,
            std::cmp::Reverse(a.primary_span.len()),
            a.pattern_id.as_str(),
        );
        let kb = (
            b.primary_span.start_byte,
            std::cmp::Reverse(b.primary_span.len()),
            b.pattern_id.as_str(),
        );
        assert!(ka <= kb, "ordering violated");
        assert!(
            !(a.pattern_id == b.pattern_id && a.primary_span == b.primary_span),
            "duplicate match survived dedup"
        );
    }
}

#[test]
fn backend_equivalence_for_json() {
    // json is served by both backends; the custom backend's features must
    // be a subset of the AST backend's, modulo category tags
    let language = LanguageId::new("json");
    let source = br#"{"name": "quarry", "port": 8080}"#;
    let registry = Arc::new(PatternRegistry::new());
    let engine = PatternEngine::new(registry.clone(), Arc::new(quarry_core::TelemetryHub::new()));
    let patterns = registry.patterns_for(&language);

    let custom_unit = CustomBackend::with_default_parsers()
        .parse(&language, source)
        .unwrap();
    let ast_unit = AstBackend::parse(&language, source).unwrap();

    let ctx = EngineContext::bare(source);
    let (custom_matches, _, _) = engine.process_all(&custom_unit, &ctx, &[]);
    let (ast_matches, _, _) = engine.process_all(&ast_unit, &ctx, &[]);

    let custom_features = FeatureExtractor::extract(&patterns, &custom_matches, source);
    let ast_features = FeatureExtractor::extract(&patterns, &ast_matches, source);
    assert!(
        ast_features.contains_items_of(&custom_features),
        "custom features must be a subset of AST features"
    );
}

#[test]
fn declared_language_overrides_sniffing() {
    let parser = UnifiedParser::new();
    let unit = SourceUnit::new("snippet.txt", b"def hidden(): pass\n".to_vec())
        .with_language(LanguageId::new("python"));
    let result = parser.parse_unit(unit, &ParseOptions::default());
    assert_eq!(result.classification.language, LanguageId::new("python"));
    assert!(
        result
            .features
            .get(PatternCategory::Syntax)
            .iter()
            .any(|i| i.name == "hidden")
    );
}

#[test]
fn include_ast_option_exposes_the_tree() {
    let parser = UnifiedParser::new();
    let options = ParseOptions {
        include_ast: true,
        ..ParseOptions::default()
    };
    let result = parser.parse("m.py", b"x = 1\n".to_vec(), &options);
    let tree = result.tree.expect("tree requested");
    assert_eq!(tree.root().kind, "module");

    let without = parser.parse("m.py", b"x = 1\n".to_vec(), &ParseOptions::default());
    assert!(without.tree.is_none());
}

#[test]
fn parse_many_preserves_input_order() {
    let parser = UnifiedParser::new();
    let units = vec![
        SourceUnit::new("a.py", b"def a(): pass\n".to_vec()),
        SourceUnit::new("b.rs", b"fn b() {}\n".to_vec()),
        SourceUnit::new("c.md", b"# C\n".to_vec()),
    ];
    let results = parser.parse_many(units, &ParseOptions::default());
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].classification.language, LanguageId::new("python"));
    assert_eq!(results[1].classification.language, LanguageId::new("rust"));
    assert_eq!(results[2].classification.language, LanguageId::new("markdown"));
}

struct Collecting(Mutex<Vec<MetricRecord>>);

impl MetricSink for Collecting {
    fn record(&self, record: &MetricRecord) {
        self.0.lock().unwrap().push(record.clone());
    }
}

#[test]
fn telemetry_reaches_subscribers() {
    let parser = UnifiedParser::new();
    let sink = Arc::new(Collecting(Mutex::new(Vec::new())));
    parser.telemetry().subscribe(sink.clone());

    let _ = parser.parse("m.py", b"def f(): pass\n".to_vec(), &ParseOptions::default());

    let records = sink.0.lock().unwrap();
    assert!(
        records
            .iter()
            .any(|r| matches!(r, MetricRecord::ParseCompleted { .. }))
    );
    assert!(
        records
            .iter()
            .any(|r| matches!(r, MetricRecord::PatternRun { .. }))
    );
}

#[test]
fn coordinator_invalidation_purges_cached_trees() {
    let parser = UnifiedParser::new();
    let source = b"def f(): pass\n";
    let _ = parser.parse("m.py", source.to_vec(), &ParseOptions::default());
    assert!(parser.coordinator().metrics().resident_bytes > 0);

    let before = parser.coordinator().epoch();
    parser.coordinator().clear_all();
    assert_eq!(parser.coordinator().metrics().resident_bytes, 0);
    assert!(parser.coordinator().epoch() > before);
}

#[test]
fn markdown_goes_through_the_custom_backend() {
    let parser = UnifiedParser::new();
    let source = b"# Title\n\nSome prose.\n\n```rust\nfn main() {}\n```\n";
    let result = parser.parse("README.md", source.to_vec(), &ParseOptions::default());

    assert!(result.success);
    assert_eq!(result.classification.parser_kind, ParserKind::Custom);
    let docs = result.features.get(PatternCategory::Documentation);
    assert!(docs.iter().any(|i| i.name == "Title"));
}

#[test]
fn unreadable_content_still_returns_a_result() {
    let parser = UnifiedParser::new();
    // invalid UTF-8 with no binary signature: total parse must hold
    let result = parser.parse(
        "weird.md",
        vec![0xc3, 0x28, b'\n', b'#', b' ', b'x'],
        &ParseOptions::default(),
    );
    // never panics, always a result value
    assert!(result.errors.iter().all(|e| !e.message.is_empty()));
}
