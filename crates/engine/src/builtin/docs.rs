// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Documentation-format patterns. All regex-kind: these formats are served
//! by the custom backend, whose trees cannot run tree-sitter queries, and
//! regexes behave identically under either backend.

use quarry_core::{ExtractSpec, LanguageId, PatternCategory, PatternDef};

pub(super) fn patterns(language: &LanguageId) -> Vec<PatternDef> {
    match language.as_str() {
        "markdown" => vec![
            PatternDef::regex(
                "md-heading",
                "markdown",
                PatternCategory::Documentation,
                r"^#{1,6}\s+(.+)$",
            )
            .with_extract(ExtractSpec::named("name"))
            .with_test_case("# Title\n", true)
            .with_test_case("plain prose\n", false),
            PatternDef::regex(
                "md-code-fence",
                "markdown",
                PatternCategory::Structure,
                r"^```(\w*)$",
            )
            .with_extract(ExtractSpec::named("language")),
            PatternDef::regex(
                "md-link",
                "markdown",
                PatternCategory::Semantics,
                r"\[([^\]]+)\]\(([^)]+)\)",
            )
            .with_extract(ExtractSpec::named("name")),
        ],
        "restructuredtext" => vec![
            PatternDef::regex(
                "rst-directive",
                "restructuredtext",
                PatternCategory::Documentation,
                r"^\.\.\s+([\w-]+)::",
            )
            .with_extract(ExtractSpec::named("name"))
            .with_test_case(".. code-block:: python\n", true),
            PatternDef::regex(
                "rst-adornment",
                "restructuredtext",
                PatternCategory::Structure,
                r"^(={3,}|-{3,}|~{3,})\s*$",
            ),
        ],
        "asciidoc" => vec![
            PatternDef::regex(
                "adoc-heading",
                "asciidoc",
                PatternCategory::Documentation,
                r"^=+\s+(.+)$",
            )
            .with_extract(ExtractSpec::named("name"))
            .with_test_case("= Document Title\n", true),
            PatternDef::regex(
                "adoc-listing",
                "asciidoc",
                PatternCategory::Structure,
                r"^----\s*$",
            ),
        ],
        "plaintext" => vec![
            PatternDef::regex(
                "txt-url",
                "plaintext",
                PatternCategory::Semantics,
                r"https?://\S+",
            ),
        ],
        _ => Vec::new(),
    }
}
