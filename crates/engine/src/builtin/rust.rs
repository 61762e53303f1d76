// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rust patterns.

use quarry_core::{ExtractSpec, PatternCategory, PatternDef};

pub(super) fn patterns() -> Vec<PatternDef> {
    vec![
        PatternDef::ast_query(
            "rs-function",
            "rust",
            PatternCategory::Syntax,
            "(function_item name: (identifier) @name) @function",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_recovery_regex(r"^\s*(?:pub\s+)?(?:async\s+)?fn\s+(\w+)")
        .with_test_case("fn main() {}\n", true),
        PatternDef::ast_query(
            "rs-struct",
            "rust",
            PatternCategory::Syntax,
            "(struct_item name: (type_identifier) @name) @struct",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_recovery_regex(r"^\s*(?:pub\s+)?struct\s+(\w+)")
        .with_test_case("struct Point { x: f64 }\n", true),
        PatternDef::ast_query(
            "rs-enum",
            "rust",
            PatternCategory::Syntax,
            "(enum_item name: (type_identifier) @name) @enum",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_test_case("enum Kind { A, B }\n", true),
        PatternDef::ast_query(
            "rs-trait",
            "rust",
            PatternCategory::Structure,
            "(trait_item name: (type_identifier) @name) @trait",
        )
        .with_extract(ExtractSpec::named("name")),
        PatternDef::ast_query(
            "rs-impl",
            "rust",
            PatternCategory::Structure,
            "(impl_item) @impl",
        )
        .with_test_case("impl Point { fn new() {} }\n", true),
        PatternDef::ast_query(
            "rs-use",
            "rust",
            PatternCategory::Architecture,
            "(use_declaration) @import",
        )
        .with_recovery_regex(r"^\s*(?:pub\s+)?use\s+([\w:]+)")
        .with_test_case("use std::fmt;\n", true),
        PatternDef::regex(
            "rs-doc-comment",
            "rust",
            PatternCategory::Documentation,
            r"^\s*///\s?(.*)",
        ),
        PatternDef::regex(
            "rs-unwrap",
            "rust",
            PatternCategory::ErrorHandling,
            r"\.(unwrap|expect)\(",
        ),
        PatternDef::ast_query(
            "rs-match",
            "rust",
            PatternCategory::CodePattern,
            "(match_expression) @match",
        ),
    ]
}
