// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! C and C++ patterns.

use quarry_core::{ExtractSpec, PatternCategory, PatternDef};

fn shared(language: &str, prefix: &str) -> Vec<PatternDef> {
    vec![
        PatternDef::ast_query(
            &format!("{prefix}-function"),
            language,
            PatternCategory::Syntax,
            "(function_definition declarator: (function_declarator declarator: (identifier) @name)) @function",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_recovery_regex(r"^\w[\w\s\*]*?\s+\**(\w+)\s*\([^;]*$")
        .with_test_case("int main(void) { return 0; }\n", true),
        PatternDef::ast_query(
            &format!("{prefix}-struct"),
            language,
            PatternCategory::Syntax,
            "(struct_specifier name: (type_identifier) @name) @struct",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_test_case("struct point { int x; };\n", true),
        PatternDef::ast_query(
            &format!("{prefix}-include"),
            language,
            PatternCategory::Architecture,
            "(preproc_include) @include",
        )
        .with_recovery_regex(r#"^\s*#\s*include\s*[<"]([^>"]+)[>"]"#)
        .with_test_case("#include <stdio.h>\n", true),
        PatternDef::ast_query(
            &format!("{prefix}-typedef"),
            language,
            PatternCategory::Semantics,
            "(type_definition declarator: (type_identifier) @name) @typedef",
        )
        .with_extract(ExtractSpec::named("name")),
    ]
}

pub(super) fn c_patterns() -> Vec<PatternDef> {
    shared("c", "c")
}

pub(super) fn cpp_patterns() -> Vec<PatternDef> {
    let mut defs = shared("cpp", "cpp");
    defs.push(
        PatternDef::ast_query(
            "cpp-class",
            "cpp",
            PatternCategory::Syntax,
            "(class_specifier name: (type_identifier) @name) @class",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_recovery_regex(r"^\s*class\s+(\w+)")
        .with_test_case("class Point { int x; };\n", true),
    );
    defs.push(
        PatternDef::ast_query(
            "cpp-namespace",
            "cpp",
            PatternCategory::Structure,
            "(namespace_definition name: (namespace_identifier) @name) @namespace",
        )
        .with_extract(ExtractSpec::named("name")),
    );
    defs
}
