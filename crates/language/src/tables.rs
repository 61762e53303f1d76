// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static classification tables.
//!
//! Every table is an ordered slice so ties resolve deterministically: the
//! first match in a table wins.

use quarry_core::{FileKind, LanguageId, ParserKind};

/// Languages served by the tree-sitter backend.
pub const AST_LANGUAGES: &[&str] = &[
    "bash",
    "c",
    "cpp",
    "go",
    "java",
    "javascript",
    "json",
    "python",
    "ruby",
    "rust",
    "tsx",
    "typescript",
    "yaml",
];

/// Formats served by a hand-written parser. JSON and YAML appear in both
/// sets; the resolver prefers the custom parser for them.
pub const CUSTOM_FORMATS: &[&str] = &[
    "asciidoc",
    "editorconfig",
    "env",
    "graphql",
    "ini",
    "json",
    "markdown",
    "plaintext",
    "restructuredtext",
    "toml",
    "xml",
    "yaml",
];

/// `(language, extensions...)` — the order of this table breaks extension
/// ties.
pub const EXTENSIONS: &[(&str, &[&str])] = &[
    ("rust", &["rs"]),
    ("python", &["py", "pyi"]),
    ("javascript", &["js", "mjs", "cjs", "jsx"]),
    ("typescript", &["ts", "mts", "cts"]),
    ("tsx", &["tsx"]),
    ("go", &["go"]),
    ("java", &["java"]),
    ("c", &["c", "h"]),
    ("cpp", &["cpp", "cc", "cxx", "hpp", "hh", "hxx"]),
    ("ruby", &["rb", "rake"]),
    ("bash", &["sh", "bash", "zsh"]),
    ("json", &["json"]),
    ("yaml", &["yaml", "yml"]),
    ("toml", &["toml"]),
    ("ini", &["ini", "cfg", "conf"]),
    ("markdown", &["md", "markdown"]),
    ("restructuredtext", &["rst"]),
    ("asciidoc", &["adoc", "asciidoc"]),
    ("xml", &["xml", "xsd", "svg"]),
    ("env", &["env"]),
    ("graphql", &["graphql", "gql"]),
    ("plaintext", &["txt", "text"]),
];

/// Exact filename table; checked before extensions.
pub const FILENAMES: &[(&str, &str)] = &[
    ("Dockerfile", "dockerfile"),
    ("Makefile", "make"),
    ("CMakeLists.txt", "cmake"),
    (".editorconfig", "editorconfig"),
    (".env", "env"),
    ("Cargo.toml", "toml"),
    ("Cargo.lock", "toml"),
    ("go.mod", "gomod"),
    ("package.json", "json"),
    ("Gemfile", "ruby"),
    ("Rakefile", "ruby"),
    ("BUILD", "plaintext"),
    ("WORKSPACE", "plaintext"),
];

/// Interpreter names recognized in a shebang line.
pub const SHEBANGS: &[(&str, &str)] = &[
    ("python3", "python"),
    ("python2", "python"),
    ("python", "python"),
    ("node", "javascript"),
    ("bash", "bash"),
    ("zsh", "bash"),
    ("sh", "bash"),
    ("ruby", "ruby"),
];

/// Extensions that are binary regardless of content.
pub const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "pdf", "zip", "tar", "gz", "bz2", "xz",
    "7z", "exe", "dll", "so", "dylib", "a", "o", "class", "jar", "war", "pyc", "wasm", "woff",
    "woff2", "ttf", "eot", "mp3", "mp4", "avi", "mov", "sqlite", "db", "bin",
];

/// `(magic prefix, description)` — any match classifies as binary.
pub const MAGIC_BINARY: &[&[u8]] = &[
    b"\x89PNG\r\n\x1a\n",
    b"\xff\xd8\xff",
    b"GIF87a",
    b"GIF89a",
    b"%PDF",
    b"PK\x03\x04",
    b"\x7fELF",
    b"\x1f\x8b",
];

/// Coarse file kind per language.
#[must_use]
pub fn file_kind_for(language: &LanguageId) -> FileKind {
    match language.as_str() {
        "markdown" | "restructuredtext" | "asciidoc" | "plaintext" => FileKind::Doc,
        "ini" | "toml" | "yaml" | "editorconfig" | "env" | "dockerfile" | "make" | "cmake"
        | "gomod" => FileKind::Config,
        "json" | "xml" | "graphql" => FileKind::Data,
        "binary" => FileKind::Binary,
        _ => FileKind::Code,
    }
}

/// Backend selection for a language: custom parsers win when registered,
/// then the AST backend, then nothing.
#[must_use]
pub fn parser_kind_for(language: &LanguageId) -> ParserKind {
    if has_custom_format(language) {
        ParserKind::Custom
    } else if AST_LANGUAGES.contains(&language.as_str()) {
        ParserKind::Ast
    } else {
        ParserKind::None
    }
}

#[must_use]
pub fn has_custom_format(language: &LanguageId) -> bool {
    CUSTOM_FORMATS.contains(&language.as_str())
}

/// Ordered fallback languages for a classification.
#[must_use]
pub fn default_fallbacks(language: &LanguageId) -> Vec<LanguageId> {
    match language.as_str() {
        "typescript" => vec![LanguageId::new("javascript")],
        "tsx" => vec![
            LanguageId::new("typescript"),
            LanguageId::new("javascript"),
        ],
        "markdown" | "restructuredtext" | "asciidoc" => vec![LanguageId::plaintext()],
        // Languages we can name but not parse degrade to plaintext.
        "dockerfile" | "make" | "cmake" | "gomod" => vec![LanguageId::plaintext()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ast_languages_are_sorted_for_bisect() {
        let mut sorted = AST_LANGUAGES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, AST_LANGUAGES);
    }

    #[test]
    fn json_and_yaml_prefer_custom() {
        assert_eq!(parser_kind_for(&LanguageId::new("json")), ParserKind::Custom);
        assert_eq!(parser_kind_for(&LanguageId::new("yaml")), ParserKind::Custom);
        assert_eq!(parser_kind_for(&LanguageId::new("python")), ParserKind::Ast);
        assert_eq!(parser_kind_for(&LanguageId::new("dockerfile")), ParserKind::None);
    }

    #[test]
    fn file_kinds_cover_the_custom_formats() {
        for format in CUSTOM_FORMATS {
            let kind = file_kind_for(&LanguageId::new(format));
            assert_ne!(kind, FileKind::Binary, "{format} must not be binary");
        }
    }

    #[test]
    fn doc_formats_fall_back_to_plaintext() {
        assert_eq!(
            default_fallbacks(&LanguageId::new("markdown")),
            vec![LanguageId::plaintext()]
        );
        assert!(default_fallbacks(&LanguageId::new("rust")).is_empty());
    }
}
