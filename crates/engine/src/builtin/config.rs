// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config- and data-format patterns; regex-kind for the same reason as the
//! documentation set.

use quarry_core::{ExtractSpec, LanguageId, PatternCategory, PatternDef};

pub(super) fn patterns(language: &LanguageId) -> Vec<PatternDef> {
    match language.as_str() {
        "json" => vec![
            PatternDef::regex(
                "json-key",
                "json",
                PatternCategory::Structure,
                r#""([^"]+)"\s*:"#,
            )
            .with_extract(ExtractSpec::named("name"))
            .with_test_case(r#"{"port": 8080}"#, true),
        ],
        "yaml" => vec![
            PatternDef::regex(
                "yaml-top-key",
                "yaml",
                PatternCategory::Structure,
                r"^([A-Za-z_][\w-]*):",
            )
            .with_extract(ExtractSpec::named("name"))
            .with_test_case("name: quarry\n", true),
            PatternDef::regex(
                "yaml-anchor",
                "yaml",
                PatternCategory::Semantics,
                r"&(\w+)",
            )
            .with_extract(ExtractSpec::named("name")),
        ],
        "toml" => vec![
            PatternDef::regex(
                "toml-table",
                "toml",
                PatternCategory::Structure,
                r"^\[\[?([\w.-]+)\]\]?",
            )
            .with_extract(ExtractSpec::named("name"))
            .with_test_case("[dependencies]\n", true),
            PatternDef::regex(
                "toml-key",
                "toml",
                PatternCategory::Structure,
                r#"^([A-Za-z0-9_-]+)\s*="#,
            )
            .with_extract(ExtractSpec::named("name")),
        ],
        "ini" | "editorconfig" => {
            let prefix = if language.as_str() == "ini" { "ini" } else { "ec" };
            vec![
                PatternDef::regex(
                    &format!("{prefix}-section"),
                    language.as_str(),
                    PatternCategory::Structure,
                    r"^\[([^\]]+)\]",
                )
                .with_extract(ExtractSpec::named("name")),
                PatternDef::regex(
                    &format!("{prefix}-property"),
                    language.as_str(),
                    PatternCategory::Structure,
                    r"^([\w.*{},-]+)\s*[=:]",
                )
                .with_extract(ExtractSpec::named("name")),
            ]
        }
        "env" => vec![
            PatternDef::regex(
                "env-variable",
                "env",
                PatternCategory::Structure,
                r"^(?:export\s+)?([A-Z][A-Z0-9_]*)=",
            )
            .with_extract(ExtractSpec::named("name"))
            .with_test_case("DATABASE_URL=postgres://x\n", true),
        ],
        "graphql" => vec![
            PatternDef::regex(
                "gql-definition",
                "graphql",
                PatternCategory::Structure,
                r"^(?:type|interface|enum|input|union|scalar)\s+(\w+)",
            )
            .with_extract(ExtractSpec::named("name"))
            .with_test_case("type User {\n  id: ID!\n}\n", true),
            PatternDef::regex(
                "gql-operation",
                "graphql",
                PatternCategory::Syntax,
                r"^(?:query|mutation|subscription)\s+(\w+)",
            )
            .with_extract(ExtractSpec::named("name")),
        ],
        "xml" => vec![
            PatternDef::regex(
                "xml-element",
                "xml",
                PatternCategory::Structure,
                r"<([A-Za-z][\w:-]*)[\s>/]",
            )
            .with_extract(ExtractSpec::named("name")),
        ],
        _ => Vec::new(),
    }
}
