// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Python patterns.

use quarry_core::{ExtractSpec, PatternCategory, PatternDef};

pub(super) fn patterns() -> Vec<PatternDef> {
    vec![
        PatternDef::ast_query(
            "py-function",
            "python",
            PatternCategory::Syntax,
            "(function_definition name: (identifier) @name) @function",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_recovery_regex(r"^\s*def\s+(\w+)")
        .with_test_case("def foo(a, b):\n    return a + b\n", true)
        .with_test_case("x = 1\n", false),
        PatternDef::ast_query(
            "py-class",
            "python",
            PatternCategory::Syntax,
            "(class_definition name: (identifier) @name) @class",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_recovery_regex(r"^\s*class\s+(\w+)")
        .with_test_case("class Foo:\n    pass\n", true),
        PatternDef::ast_query(
            "py-import",
            "python",
            PatternCategory::Architecture,
            "[(import_statement) (import_from_statement)] @import",
        )
        .with_recovery_regex(r"^\s*(?:from\s+[\w.]+\s+)?import\s+([\w.]+)")
        .with_test_case("import os\n", true)
        .with_test_case("from collections import deque\n", true),
        PatternDef::ast_query(
            "py-docstring",
            "python",
            PatternCategory::Documentation,
            "(function_definition body: (block . (expression_statement (string) @docstring)))",
        )
        .with_extract(ExtractSpec::named("docstring").with_primary("docstring"))
        .with_test_case("def f():\n    \"\"\"doc\"\"\"\n    pass\n", true),
        PatternDef::ast_query(
            "py-try-except",
            "python",
            PatternCategory::ErrorHandling,
            "(try_statement) @try",
        )
        .with_recovery_regex(r"^\s*(try|except\b.*|finally)\s*:")
        .with_test_case("try:\n    pass\nexcept ValueError:\n    pass\n", true),
        PatternDef::ast_query(
            "py-decorated",
            "python",
            PatternCategory::Semantics,
            "(decorated_definition (decorator) @decorator) @decorated",
        )
        .with_extract(ExtractSpec::named("decorator"))
        .with_test_case("@cached\ndef f():\n    pass\n", true),
        PatternDef::ast_query(
            "py-dunder-main",
            "python",
            PatternCategory::CodePattern,
            "(if_statement condition: (comparison_operator) @cond) @if",
        )
        .with_extract(ExtractSpec::default().with_attr("idiom", "guard")),
        PatternDef::ast_query(
            "py-assignment",
            "python",
            PatternCategory::Structure,
            "(assignment left: (identifier) @name) @assignment",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_fallbacks(&["py-function"])
        .with_test_case("x = 1\n", true),
    ]
}
