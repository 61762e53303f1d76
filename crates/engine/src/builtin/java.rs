// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Java patterns.

use quarry_core::{ExtractSpec, PatternCategory, PatternDef};

pub(super) fn patterns() -> Vec<PatternDef> {
    vec![
        PatternDef::ast_query(
            "java-class",
            "java",
            PatternCategory::Syntax,
            "(class_declaration name: (identifier) @name) @class",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_recovery_regex(r"^\s*(?:public\s+|final\s+|abstract\s+)*class\s+(\w+)")
        .with_test_case("class Foo {}\n", true),
        PatternDef::ast_query(
            "java-method",
            "java",
            PatternCategory::Syntax,
            "(method_declaration name: (identifier) @name) @method",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_test_case("class A { void run() {} }\n", true),
        PatternDef::ast_query(
            "java-interface",
            "java",
            PatternCategory::Structure,
            "(interface_declaration name: (identifier) @name) @interface",
        )
        .with_extract(ExtractSpec::named("name")),
        PatternDef::ast_query(
            "java-import",
            "java",
            PatternCategory::Architecture,
            "(import_declaration) @import",
        )
        .with_recovery_regex(r"^\s*import\s+([\w.]+)")
        .with_test_case("import java.util.List;\n", true),
        PatternDef::ast_query(
            "java-try",
            "java",
            PatternCategory::ErrorHandling,
            "(try_statement) @try",
        ),
        PatternDef::ast_query(
            "java-annotation",
            "java",
            PatternCategory::Semantics,
            "(marker_annotation name: (identifier) @name) @annotation",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_test_case("class A { @Override void f() {} }\n", true),
    ]
}
