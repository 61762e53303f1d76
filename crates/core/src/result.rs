// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The value a parse returns.

use serde::{Deserialize, Serialize};

use crate::error::QuarryError;
use crate::matches::{ExtractedBlock, FeatureSet, PatternMatch};
use crate::source::Classification;
use crate::telemetry::PatternMetrics;
use crate::tree::ParseTree;

/// Pipeline stage an issue was observed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Classify,
    Resolve,
    Parse,
    Patterns,
    Recovery,
    Blocks,
    Features,
    Cache,
}

/// Coarse issue kind, mirroring the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Classification,
    Backend,
    Pattern,
    Recovery,
    Cache,
    Cancelled,
}

/// One observed failure, preserving its causal position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseIssue {
    pub stage: Stage,
    pub component: String,
    pub kind: IssueKind,
    pub pattern_id: Option<String>,
    pub message: String,
}

impl ParseIssue {
    #[must_use]
    pub fn new(stage: Stage, component: &str, error: &QuarryError) -> Self {
        let kind = match error {
            QuarryError::Classify(_) => IssueKind::Classification,
            QuarryError::Backend(_) => IssueKind::Backend,
            QuarryError::Pattern(_) => IssueKind::Pattern,
            QuarryError::Recovery(_) => IssueKind::Recovery,
            QuarryError::Cache(_) => IssueKind::Cache,
            QuarryError::Cancelled(_) => IssueKind::Cancelled,
        };
        Self {
            stage,
            component: component.to_string(),
            kind,
            pattern_id: None,
            message: error.to_string(),
        }
    }

    #[must_use]
    pub fn for_pattern(mut self, pattern_id: &str) -> Self {
        self.pattern_id = Some(pattern_id.to_string());
        self
    }

    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        self.kind == IssueKind::Cancelled
    }
}

/// Everything a parse produced. A value: once returned it observes no
/// further mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserResult {
    pub success: bool,
    pub classification: Classification,
    pub tree: Option<ParseTree>,
    pub matches: Vec<PatternMatch>,
    pub features: FeatureSet,
    pub blocks: Vec<ExtractedBlock>,
    pub errors: Vec<ParseIssue>,
    pub telemetry: PatternMetrics,
}

impl ParserResult {
    /// An empty but successful result (binary files, unparseable kinds).
    #[must_use]
    pub fn empty(classification: Classification) -> Self {
        Self {
            success: true,
            classification,
            tree: None,
            matches: Vec::new(),
            features: FeatureSet::new(),
            blocks: Vec::new(),
            errors: Vec::new(),
            telemetry: PatternMetrics::default(),
        }
    }

    /// A failed result carrying whatever was assembled before the failure.
    #[must_use]
    pub fn failed(classification: Classification, issue: ParseIssue) -> Self {
        let mut result = Self::empty(classification);
        result.success = false;
        result.errors.push(issue);
        result
    }

    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.errors.iter().any(ParseIssue::is_cancellation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Cancelled;

    #[test]
    fn issue_kind_tracks_error_kind() {
        let issue = ParseIssue::new(Stage::Patterns, "engine", &QuarryError::from(Cancelled));
        assert!(issue.is_cancellation());
        assert_eq!(issue.stage, Stage::Patterns);
    }

    #[test]
    fn empty_result_is_successful() {
        let result = ParserResult::empty(Classification::binary());
        assert!(result.success);
        assert!(result.matches.is_empty());
        assert!(result.blocks.is_empty());
        assert!(!result.was_cancelled());
    }
}
