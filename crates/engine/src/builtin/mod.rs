// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in pattern sets.
//!
//! One module per language family; `patterns_for` is the only entry point.
//! Hosts extend these through `PatternRegistry::register`, not by editing
//! the tables.

mod bash;
mod c;
mod config;
mod docs;
mod go;
mod java;
mod javascript;
mod python;
mod ruby;
mod rust;

use quarry_core::{LanguageId, PatternCategory, PatternDef};

/// Built-in definitions for a language; empty for unknown languages.
#[must_use]
pub fn patterns_for(language: &LanguageId) -> Vec<PatternDef> {
    let mut defs = match language.as_str() {
        "python" => python::patterns(),
        "rust" => rust::patterns(),
        "javascript" => javascript::javascript_patterns(),
        "typescript" | "tsx" => javascript::typescript_patterns(language),
        "go" => go::patterns(),
        "java" => java::patterns(),
        "ruby" => ruby::patterns(),
        "c" => c::c_patterns(),
        "cpp" => c::cpp_patterns(),
        "bash" => bash::patterns(),
        "markdown" | "restructuredtext" | "asciidoc" | "plaintext" => docs::patterns(language),
        "json" | "yaml" | "toml" | "ini" | "editorconfig" | "env" | "graphql" | "xml" => {
            config::patterns(language)
        }
        _ => Vec::new(),
    };
    if is_code_language(language) {
        defs.push(todo_comment(language));
    }
    defs
}

fn is_code_language(language: &LanguageId) -> bool {
    matches!(
        language.as_str(),
        "python"
            | "rust"
            | "javascript"
            | "typescript"
            | "tsx"
            | "go"
            | "java"
            | "ruby"
            | "c"
            | "cpp"
            | "bash"
    )
}

/// Actionable comment markers; shared across every code language.
fn todo_comment(language: &LanguageId) -> PatternDef {
    PatternDef::regex(
        &format!("{}-todo-comment", short_prefix(language)),
        language.as_str(),
        PatternCategory::Documentation,
        r"\b(TODO|FIXME|HACK|XXX)\b[:\s]*(.*)",
    )
    .with_extract(quarry_core::ExtractSpec::named("marker"))
}

pub(crate) fn short_prefix(language: &LanguageId) -> &'static str {
    match language.as_str() {
        "python" => "py",
        "rust" => "rs",
        "javascript" => "js",
        "typescript" => "ts",
        "tsx" => "tsx",
        "go" => "go",
        "java" => "java",
        "ruby" => "rb",
        "c" => "c",
        "cpp" => "cpp",
        "bash" => "sh",
        _ => "x",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_language_has_patterns() {
        for name in [
            "python", "rust", "javascript", "typescript", "go", "java", "ruby", "c", "cpp",
            "bash", "markdown", "json", "yaml", "toml", "ini", "env", "graphql",
        ] {
            let defs = patterns_for(&LanguageId::new(name));
            assert!(!defs.is_empty(), "no builtin patterns for {name}");
        }
    }

    #[test]
    fn pattern_ids_are_unique_per_language() {
        for name in ["python", "rust", "javascript", "go", "markdown"] {
            let defs = patterns_for(&LanguageId::new(name));
            let mut ids: Vec<_> = defs.iter().map(|d| d.id.clone()).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), defs.len(), "duplicate ids in {name}");
        }
    }

    #[test]
    fn unknown_language_is_empty() {
        assert!(patterns_for(&LanguageId::new("cobol")).is_empty());
    }
}
