// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core data model for quarry.
//!
//! Everything downstream of classification speaks the types in this crate:
//! the normalized [`ParseTree`] both backends produce, pattern definitions
//! and matches, feature sets, the error taxonomy, and the telemetry hub.
//! The crate has no parser dependencies; it is the vocabulary, not the
//! machinery.

pub mod deadline;
pub mod error;
pub mod pattern;
pub mod result;
pub mod source;
pub mod telemetry;
pub mod tree;

mod matches;

pub use deadline::Deadline;
pub use error::{
    BackendError, CacheError, Cancelled, ClassifyError, PatternError, QuarryError, RecoveryError,
    Result,
};
pub use matches::{Capture, ExtractedBlock, FeatureItem, FeatureSet, PatternMatch};
pub use pattern::{
    ExtractSpec, PatternCategory, PatternDef, PatternKind, PatternTestCase, PatternValidation,
    RecoveryConfig,
};
pub use result::{IssueKind, ParseIssue, ParserResult, Stage};
pub use source::{
    Classification, FileKind, LanguageId, ParserKind, Point, SNIFF_LIMIT, SourceUnit, Span,
};
pub use telemetry::{
    MetricRecord, MetricSink, PatternMetrics, PatternTiming, RecoveryStrategy, TelemetryHub,
    TelemetrySnapshot,
};
pub use tree::{NodeId, ParseTree, TreeBuilder, TreeNode};
