// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source units, spans, and classification results.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use quarry_utils::ContentDigest;

/// Upper bound on the byte prefix the classifier may sniff.
pub const SNIFF_LIMIT: usize = 64 * 1024;

/// A normalized (lower-cased) language identifier.
///
/// Alias resolution (`js` → `javascript` and friends) happens in the
/// language crate; this type only guarantees casing and trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageId(String);

impl LanguageId {
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier every classification can fall back to.
    #[must_use]
    pub fn plaintext() -> Self {
        Self("plaintext".to_string())
    }
}

impl std::fmt::Display for LanguageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// A half-open byte range `[start_byte, end_byte)` into a source unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start_byte: usize, end_byte: usize) -> Self {
        Self {
            start_byte,
            end_byte,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end_byte.saturating_sub(self.start_byte)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end_byte <= self.start_byte
    }

    #[must_use]
    pub const fn contains(&self, other: &Span) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    /// The exact byte slice this span covers, clamped to the source length.
    #[must_use]
    pub fn slice<'s>(&self, source: &'s [u8]) -> &'s [u8] {
        let start = self.start_byte.min(source.len());
        let end = self.end_byte.min(source.len());
        &source[start..end]
    }
}

/// A zero-based row/column position.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// The input to a parse: path, bytes, and an optional caller-declared
/// language. Immutable for the lifetime of the parse.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    path: PathBuf,
    bytes: Vec<u8>,
    declared_language: Option<LanguageId>,
}

impl SourceUnit {
    pub fn new(path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
            declared_language: None,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: LanguageId) -> Self {
        self.declared_language = Some(language);
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn declared_language(&self) -> Option<&LanguageId> {
        self.declared_language.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The bounded prefix classification is allowed to look at.
    #[must_use]
    pub fn sniff_prefix(&self) -> &[u8] {
        &self.bytes[..self.bytes.len().min(SNIFF_LIMIT)]
    }

    /// Stable digest of the full content, used as a cache key component.
    #[must_use]
    pub fn content_digest(&self) -> ContentDigest {
        quarry_utils::content_digest(&self.bytes)
    }
}

/// Which backend family should parse a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    Ast,
    Custom,
    None,
}

/// Coarse file category derived during classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Code,
    Doc,
    Config,
    Data,
    Binary,
}

/// Result of classifying a source unit from its path and sniffed prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub language: LanguageId,
    pub parser_kind: ParserKind,
    pub file_kind: FileKind,
    pub confidence: f32,
    pub fallbacks: Vec<LanguageId>,
}

impl Classification {
    /// A binary file: no parser, no fallbacks.
    #[must_use]
    pub fn binary() -> Self {
        Self {
            language: LanguageId::new("binary"),
            parser_kind: ParserKind::None,
            file_kind: FileKind::Binary,
            confidence: 1.0,
            fallbacks: Vec::new(),
        }
    }

    /// The zero-confidence plaintext fallback.
    #[must_use]
    pub fn plaintext_fallback() -> Self {
        Self {
            language: LanguageId::plaintext(),
            parser_kind: ParserKind::Custom,
            file_kind: FileKind::Doc,
            confidence: 0.0,
            fallbacks: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_id_normalizes_case() {
        assert_eq!(LanguageId::new(" Python "), LanguageId::new("python"));
        assert_eq!(LanguageId::new("RUST").as_str(), "rust");
    }

    #[test]
    fn span_slice_clamps() {
        let src = b"hello";
        assert_eq!(Span::new(1, 4).slice(src), b"ell");
        assert_eq!(Span::new(3, 99).slice(src), b"lo");
        assert!(Span::new(4, 4).is_empty());
    }

    #[test]
    fn sniff_prefix_is_bounded() {
        let unit = SourceUnit::new("big.txt", vec![b'a'; SNIFF_LIMIT + 10]);
        assert_eq!(unit.sniff_prefix().len(), SNIFF_LIMIT);
    }

    #[test]
    fn digest_matches_util_digest() {
        let unit = SourceUnit::new("a.py", b"print(1)".to_vec());
        assert_eq!(
            unit.content_digest(),
            quarry_utils::content_digest(b"print(1)")
        );
    }
}
