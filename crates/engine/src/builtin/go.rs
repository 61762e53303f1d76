// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Go patterns.

use quarry_core::{ExtractSpec, PatternCategory, PatternDef};

pub(super) fn patterns() -> Vec<PatternDef> {
    vec![
        PatternDef::ast_query(
            "go-function",
            "go",
            PatternCategory::Syntax,
            "(function_declaration name: (identifier) @name) @function",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_recovery_regex(r"^\s*func\s+(\w+)")
        .with_test_case("func main() {}\n", true),
        PatternDef::ast_query(
            "go-method",
            "go",
            PatternCategory::Syntax,
            "(method_declaration name: (field_identifier) @name) @method",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_test_case("func (s Server) Start() {}\n", true),
        PatternDef::ast_query(
            "go-type",
            "go",
            PatternCategory::Structure,
            "(type_declaration (type_spec name: (type_identifier) @name)) @type",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_test_case("type Server struct {}\n", true),
        PatternDef::ast_query(
            "go-import",
            "go",
            PatternCategory::Architecture,
            "(import_declaration) @import",
        )
        .with_recovery_regex(r#"^\s*import\s+(?:\(\s*)?"([^"]+)""#)
        .with_test_case("import \"fmt\"\n", true),
        PatternDef::regex(
            "go-err-check",
            "go",
            PatternCategory::ErrorHandling,
            r"if\s+err\s*!=\s*nil",
        ),
        PatternDef::ast_query(
            "go-goroutine",
            "go",
            PatternCategory::CodePattern,
            "(go_statement) @go",
        ),
    ]
}
