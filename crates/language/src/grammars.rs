// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tree-sitter grammar registry.
//!
//! Grammar instances are cached in per-language `OnceLock` statics so
//! repeated lookups are free after the first touch. New grammars are added
//! by extending the match below, not by runtime discovery.

use std::sync::OnceLock;
use tree_sitter::Language;

use quarry_core::LanguageId;

static BASH: OnceLock<Language> = OnceLock::new();
static C: OnceLock<Language> = OnceLock::new();
static CPP: OnceLock<Language> = OnceLock::new();
static GO: OnceLock<Language> = OnceLock::new();
static JAVA: OnceLock<Language> = OnceLock::new();
static JAVASCRIPT: OnceLock<Language> = OnceLock::new();
static JSON: OnceLock<Language> = OnceLock::new();
static PYTHON: OnceLock<Language> = OnceLock::new();
static RUBY: OnceLock<Language> = OnceLock::new();
static RUST: OnceLock<Language> = OnceLock::new();
static TSX: OnceLock<Language> = OnceLock::new();
static TYPESCRIPT: OnceLock<Language> = OnceLock::new();
static YAML: OnceLock<Language> = OnceLock::new();

/// The grammar for a language, if one is compiled in.
#[must_use]
pub fn grammar(language: &LanguageId) -> Option<Language> {
    let language = match language.as_str() {
        "bash" => BASH.get_or_init(|| tree_sitter_bash::LANGUAGE.into()),
        "c" => C.get_or_init(|| tree_sitter_c::LANGUAGE.into()),
        "cpp" => CPP.get_or_init(|| tree_sitter_cpp::LANGUAGE.into()),
        "go" => GO.get_or_init(|| tree_sitter_go::LANGUAGE.into()),
        "java" => JAVA.get_or_init(|| tree_sitter_java::LANGUAGE.into()),
        "javascript" => JAVASCRIPT.get_or_init(|| tree_sitter_javascript::LANGUAGE.into()),
        "json" => JSON.get_or_init(|| tree_sitter_json::LANGUAGE.into()),
        "python" => PYTHON.get_or_init(|| tree_sitter_python::LANGUAGE.into()),
        "ruby" => RUBY.get_or_init(|| tree_sitter_ruby::LANGUAGE.into()),
        "rust" => RUST.get_or_init(|| tree_sitter_rust::LANGUAGE.into()),
        "tsx" => TSX.get_or_init(|| tree_sitter_typescript::LANGUAGE_TSX.into()),
        "typescript" => {
            TYPESCRIPT.get_or_init(|| tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
        }
        "yaml" => YAML.get_or_init(|| tree_sitter_yaml::LANGUAGE.into()),
        _ => return None,
    };
    Some(language.clone())
}

#[must_use]
pub fn has_grammar(language: &LanguageId) -> bool {
    crate::tables::AST_LANGUAGES.contains(&language.as_str())
}

/// ABI version of the linked tree-sitter runtime. Hosts persisting parse
/// results version their entries with this alongside the cache format
/// version.
#[must_use]
pub fn grammar_abi_version() -> usize {
    tree_sitter::LANGUAGE_VERSION
}
