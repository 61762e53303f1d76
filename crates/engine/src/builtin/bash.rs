// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shell patterns.

use quarry_core::{ExtractSpec, PatternCategory, PatternDef};

pub(super) fn patterns() -> Vec<PatternDef> {
    vec![
        PatternDef::ast_query(
            "sh-function",
            "bash",
            PatternCategory::Syntax,
            "(function_definition name: (word) @name) @function",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_recovery_regex(r"^\s*(?:function\s+)?(\w+)\s*\(\)\s*\{")
        .with_test_case("greet() {\n  echo hi\n}\n", true),
        PatternDef::ast_query(
            "sh-assignment",
            "bash",
            PatternCategory::Structure,
            "(variable_assignment name: (variable_name) @name) @assignment",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_test_case("PORT=8080\n", true),
        PatternDef::regex(
            "sh-source",
            "bash",
            PatternCategory::Architecture,
            r"^\s*(?:source|\.)\s+(\S+)",
        ),
        PatternDef::regex(
            "sh-set-strict",
            "bash",
            PatternCategory::ErrorHandling,
            r"^\s*set\s+-[a-z]*e",
        ),
    ]
}
