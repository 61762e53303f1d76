// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pattern definitions.
//!
//! A [`PatternDef`] is the source-level description of something worth
//! extracting: an AST query, a regex, or a literal needle, plus the recovery
//! material used when the primary form comes up empty. Compilation against a
//! grammar happens in the engine crate; this type stays inert data.

use serde::{Deserialize, Serialize};

use crate::source::LanguageId;

/// Closed set classifying what a pattern expresses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    Syntax,
    Structure,
    Documentation,
    Semantics,
    CodePattern,
    Naming,
    ErrorHandling,
    Architecture,
}

impl PatternCategory {
    pub const ALL: [PatternCategory; 8] = [
        PatternCategory::Syntax,
        PatternCategory::Structure,
        PatternCategory::Documentation,
        PatternCategory::Semantics,
        PatternCategory::CodePattern,
        PatternCategory::Naming,
        PatternCategory::ErrorHandling,
        PatternCategory::Architecture,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternCategory::Syntax => "syntax",
            PatternCategory::Structure => "structure",
            PatternCategory::Documentation => "documentation",
            PatternCategory::Semantics => "semantics",
            PatternCategory::CodePattern => "code_pattern",
            PatternCategory::Naming => "naming",
            PatternCategory::ErrorHandling => "error_handling",
            PatternCategory::Architecture => "architecture",
        }
    }
}

/// How a pattern's `source` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// A tree-sitter query compiled against the language grammar.
    AstQuery,
    /// A regular expression applied to source lines.
    Regex,
    /// A literal needle.
    Literal,
}

/// Declarative instructions for turning raw captures into match metadata
/// and feature items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractSpec {
    /// Capture that names the extracted item (e.g. `name`).
    pub name_capture: Option<String>,
    /// Capture whose span becomes the match's primary span; defaults to the
    /// whole match.
    pub primary_capture: Option<String>,
    /// Category override for items produced by this pattern.
    pub category_override: Option<PatternCategory>,
    /// Static attributes stamped onto every produced item.
    pub attrs: Vec<(String, String)>,
}

impl ExtractSpec {
    #[must_use]
    pub fn named(capture: &str) -> Self {
        Self {
            name_capture: Some(capture.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_primary(mut self, capture: &str) -> Self {
        self.primary_capture = Some(capture.to_string());
        self
    }

    #[must_use]
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.push((key.to_string(), value.to_string()));
        self
    }
}

/// Per-pattern recovery knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    pub enabled: bool,
    /// Budget for a single recovery strategy, in milliseconds.
    pub strategy_budget_ms: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy_budget_ms: 50,
        }
    }
}

/// An embedded sample used by pattern validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternTestCase {
    pub source: String,
    pub should_match: bool,
}

/// A pattern definition, inert until compiled by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDef {
    pub id: String,
    pub language: LanguageId,
    pub category: PatternCategory,
    pub kind: PatternKind,
    pub source: String,
    #[serde(default)]
    pub extract: ExtractSpec,
    #[serde(default)]
    pub test_cases: Vec<PatternTestCase>,
    #[serde(default)]
    pub fallback_ids: Vec<String>,
    #[serde(default)]
    pub recovery_regex: Option<String>,
    #[serde(default)]
    pub recovery: RecoveryConfig,
}

impl PatternDef {
    pub fn ast_query(
        id: &str,
        language: impl Into<LanguageId>,
        category: PatternCategory,
        source: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            language: language.into(),
            category,
            kind: PatternKind::AstQuery,
            source: source.to_string(),
            extract: ExtractSpec::default(),
            test_cases: Vec::new(),
            fallback_ids: Vec::new(),
            recovery_regex: None,
            recovery: RecoveryConfig::default(),
        }
    }

    pub fn regex(
        id: &str,
        language: impl Into<LanguageId>,
        category: PatternCategory,
        source: &str,
    ) -> Self {
        Self {
            kind: PatternKind::Regex,
            ..Self::ast_query(id, language, category, source)
        }
    }

    pub fn literal(
        id: &str,
        language: impl Into<LanguageId>,
        category: PatternCategory,
        needle: &str,
    ) -> Self {
        Self {
            kind: PatternKind::Literal,
            ..Self::ast_query(id, language, category, needle)
        }
    }

    #[must_use]
    pub fn with_extract(mut self, extract: ExtractSpec) -> Self {
        self.extract = extract;
        self
    }

    #[must_use]
    pub fn with_fallbacks(mut self, ids: &[&str]) -> Self {
        self.fallback_ids = ids.iter().map(|s| (*s).to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_recovery_regex(mut self, regex: &str) -> Self {
        self.recovery_regex = Some(regex.to_string());
        self
    }

    #[must_use]
    pub fn with_test_case(mut self, source: &str, should_match: bool) -> Self {
        self.test_cases.push(PatternTestCase {
            source: source.to_string(),
            should_match,
        });
        self
    }

    /// A non-query pattern must carry a regex (its own source or a recovery
    /// regex); enforced by registry validation.
    #[must_use]
    pub fn has_textual_form(&self) -> bool {
        !matches!(self.kind, PatternKind::AstQuery) || self.recovery_regex.is_some()
    }
}

/// Outcome of validating a single pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternValidation {
    pub ok: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_defaults() {
        let def = PatternDef::ast_query(
            "py-function",
            "python",
            PatternCategory::Syntax,
            "(function_definition) @function",
        );
        assert_eq!(def.kind, PatternKind::AstQuery);
        assert!(def.recovery.enabled);
        assert_eq!(def.recovery.strategy_budget_ms, 50);
        assert!(!def.has_textual_form());
    }

    #[test]
    fn recovery_regex_counts_as_textual_form() {
        let def = PatternDef::ast_query("p", "python", PatternCategory::Syntax, "(x) @x")
            .with_recovery_regex(r"^\s*def\s+(\w+)");
        assert!(def.has_textual_form());
    }

    #[test]
    fn category_round_trips_through_serde() {
        for cat in PatternCategory::ALL {
            let json = serde_json::to_string(&cat).unwrap();
            let back: PatternCategory = serde_json::from_str(&json).unwrap();
            assert_eq!(cat, back);
        }
    }
}
