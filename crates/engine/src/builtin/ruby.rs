// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ruby patterns.

use quarry_core::{ExtractSpec, PatternCategory, PatternDef};

pub(super) fn patterns() -> Vec<PatternDef> {
    vec![
        PatternDef::ast_query(
            "rb-method",
            "ruby",
            PatternCategory::Syntax,
            "(method name: (identifier) @name) @method",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_recovery_regex(r"^\s*def\s+([\w?!]+)")
        .with_test_case("def greet\n  puts 'hi'\nend\n", true),
        PatternDef::ast_query(
            "rb-class",
            "ruby",
            PatternCategory::Syntax,
            "(class name: (constant) @name) @class",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_recovery_regex(r"^\s*class\s+(\w+)")
        .with_test_case("class Foo\nend\n", true),
        PatternDef::ast_query(
            "rb-module",
            "ruby",
            PatternCategory::Structure,
            "(module name: (constant) @name) @module",
        )
        .with_extract(ExtractSpec::named("name")),
        PatternDef::regex(
            "rb-require",
            "ruby",
            PatternCategory::Architecture,
            r#"^\s*require(?:_relative)?\s+['"]([^'"]+)['"]"#,
        ),
        PatternDef::regex(
            "rb-rescue",
            "ruby",
            PatternCategory::ErrorHandling,
            r"^\s*rescue\b",
        ),
    ]
}
