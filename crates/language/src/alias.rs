// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The closed language-alias table.

use quarry_core::LanguageId;

/// `(alias, canonical)` pairs. Lookup happens after lower-casing, so the
/// table only carries lower-case keys.
const ALIASES: &[(&str, &str)] = &[
    ("adoc", "asciidoc"),
    ("c++", "cpp"),
    ("cfg", "ini"),
    ("dotenv", "env"),
    ("golang", "go"),
    ("gql", "graphql"),
    ("htm", "html"),
    ("js", "javascript"),
    ("md", "markdown"),
    ("py", "python"),
    ("rb", "ruby"),
    ("rst", "restructuredtext"),
    ("sh", "bash"),
    ("text", "plaintext"),
    ("ts", "typescript"),
    ("txt", "plaintext"),
    ("yml", "yaml"),
];

/// Lower-case and resolve aliases through the closed table. Unknown names
/// pass through untouched; the classifier decides what to do with them.
#[must_use]
pub fn normalize(raw: &str) -> LanguageId {
    let lowered = raw.trim().to_ascii_lowercase();
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map_or(lowered.as_str(), |(_, canonical)| *canonical);
    LanguageId::new(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve() {
        assert_eq!(normalize("js"), LanguageId::new("javascript"));
        assert_eq!(normalize("YML"), LanguageId::new("yaml"));
        assert_eq!(normalize("C++"), LanguageId::new("cpp"));
    }

    #[test]
    fn unknown_names_pass_through() {
        assert_eq!(normalize("zig"), LanguageId::new("zig"));
    }
}
