// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The single options record a caller may pass.

use serde::{Deserialize, Serialize};

use quarry_core::PatternCategory;

/// Per-call knobs. The default runs everything with a five second budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub extract_features: bool,
    pub extract_blocks: bool,
    /// Include the normalized tree in the result.
    pub include_ast: bool,
    /// Pattern categories to evaluate; empty means all.
    pub categories: Vec<PatternCategory>,
    /// Overall per-call budget, observed at every stage boundary.
    pub pattern_timeout_ms: u64,
    pub request_cache_enabled: bool,
    /// Blocks resolve to the construct's body child instead of the whole
    /// construct (the function body rather than signature plus body).
    pub blocks_prefer_body: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            extract_features: true,
            extract_blocks: true,
            include_ast: false,
            categories: Vec::new(),
            pattern_timeout_ms: 5_000,
            request_cache_enabled: true,
            blocks_prefer_body: false,
        }
    }
}

impl ParseOptions {
    /// Classification and parsing only; no pattern work.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            extract_features: false,
            extract_blocks: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.pattern_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn with_categories(mut self, categories: &[PatternCategory]) -> Self {
        self.categories = categories.to_vec();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_run_everything() {
        let options = ParseOptions::default();
        assert!(options.extract_features);
        assert!(options.extract_blocks);
        assert!(!options.include_ast);
        assert!(options.categories.is_empty());
        assert_eq!(options.pattern_timeout_ms, 5_000);
    }

    #[test]
    fn serde_round_trip_with_partial_input() {
        let options: ParseOptions = serde_json::from_str(r#"{"include_ast": true}"#).unwrap();
        assert!(options.include_ast);
        assert!(options.extract_features, "unspecified fields take defaults");
    }
}
