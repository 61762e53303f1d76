// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JavaScript and TypeScript patterns. The TypeScript grammar is a superset
//! of the JavaScript one, so the shared queries compile under both.

use quarry_core::{ExtractSpec, LanguageId, PatternCategory, PatternDef};

use super::short_prefix;

fn shared(language: &str, prefix: &str) -> Vec<PatternDef> {
    vec![
        PatternDef::ast_query(
            &format!("{prefix}-function"),
            language,
            PatternCategory::Syntax,
            "(function_declaration name: (identifier) @name) @function",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_recovery_regex(r"^\s*(?:async\s+)?function\s+(\w+)")
        .with_test_case("function foo() { return 1; }\n", true),
        PatternDef::ast_query(
            &format!("{prefix}-arrow"),
            language,
            PatternCategory::Syntax,
            "(variable_declarator name: (identifier) @name value: (arrow_function)) @arrow",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_test_case("const add = (a, b) => a + b;\n", true),
        PatternDef::ast_query(
            &format!("{prefix}-class"),
            language,
            PatternCategory::Syntax,
            "(class_declaration name: (identifier) @name) @class",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_recovery_regex(r"^\s*(?:export\s+)?class\s+(\w+)")
        .with_test_case("class Foo {}\n", true),
        PatternDef::ast_query(
            &format!("{prefix}-method"),
            language,
            PatternCategory::Structure,
            "(method_definition name: (property_identifier) @name) @method",
        )
        .with_extract(ExtractSpec::named("name")),
        PatternDef::ast_query(
            &format!("{prefix}-import"),
            language,
            PatternCategory::Architecture,
            "(import_statement) @import",
        )
        .with_recovery_regex(r#"^\s*import\s+.*from\s+['"]([^'"]+)['"]"#)
        .with_test_case("import fs from 'fs';\n", true),
        PatternDef::ast_query(
            &format!("{prefix}-try-catch"),
            language,
            PatternCategory::ErrorHandling,
            "(try_statement) @try",
        ),
        PatternDef::regex(
            &format!("{prefix}-console-log"),
            language,
            PatternCategory::CodePattern,
            r"console\.(log|warn|error)\(",
        ),
    ]
}

pub(super) fn javascript_patterns() -> Vec<PatternDef> {
    shared("javascript", "js")
}

pub(super) fn typescript_patterns(language: &LanguageId) -> Vec<PatternDef> {
    let prefix = short_prefix(language);
    let mut defs = shared(language.as_str(), prefix);
    defs.push(
        PatternDef::ast_query(
            &format!("{prefix}-interface"),
            language.as_str(),
            PatternCategory::Structure,
            "(interface_declaration name: (type_identifier) @name) @interface",
        )
        .with_extract(ExtractSpec::named("name"))
        .with_recovery_regex(r"^\s*(?:export\s+)?interface\s+(\w+)")
        .with_test_case("interface Shape { area(): number }\n", true),
    );
    defs.push(
        PatternDef::ast_query(
            &format!("{prefix}-type-alias"),
            language.as_str(),
            PatternCategory::Semantics,
            "(type_alias_declaration name: (type_identifier) @name) @type",
        )
        .with_extract(ExtractSpec::named("name")),
    );
    defs
}
