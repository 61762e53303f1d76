// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Matches, extracted blocks, and feature sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pattern::PatternCategory;
use crate::source::{Point, Span};

/// A named sub-region of a match. Capture order follows tree traversal
/// order, so repeated capture names keep their document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    pub name: String,
    pub span: Span,
}

/// One hit of a pattern over a parsed unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern_id: String,
    pub captures: Vec<Capture>,
    pub primary_span: Span,
    /// Kind of the node the match anchors to; synthesized matches use
    /// marker kinds such as `regex-recovery`.
    pub node_kind: String,
    pub confidence: f32,
}

impl PatternMatch {
    /// First capture with the given name, in traversal order.
    #[must_use]
    pub fn capture(&self, name: &str) -> Option<&Capture> {
        self.captures.iter().find(|c| c.name == name)
    }

    /// All spans captured under `name`.
    pub fn capture_spans<'m>(&'m self, name: &'m str) -> impl Iterator<Item = Span> + 'm {
        self.captures
            .iter()
            .filter(move |c| c.name == name)
            .map(|c| c.span)
    }

    /// UTF-8 text of the first capture with the given name.
    #[must_use]
    pub fn capture_text<'s>(&self, name: &str, source: &'s [u8]) -> Option<&'s str> {
        self.capture(name)
            .and_then(|c| std::str::from_utf8(c.span.slice(source)).ok())
    }

    /// Merge another match's captures into this one, keeping order and
    /// dropping exact duplicates. Used when de-duplicating matches.
    pub fn merge_captures(&mut self, other: &PatternMatch) {
        for cap in &other.captures {
            if !self.captures.contains(cap) {
                self.captures.push(cap.clone());
            }
        }
    }
}

/// A syntactically coherent source region materialized by the block
/// extractor. `content` is always the exact byte slice of the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedBlock {
    pub content: String,
    pub start_point: Point,
    pub end_point: Point,
    pub node_kind: String,
    pub parent_kind: Option<String>,
}

/// A single categorized item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureItem {
    pub name: String,
    pub span: Span,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
}

impl FeatureItem {
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            attrs: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }
}

/// Categorized features of one extraction pass. An item belongs to at most
/// one category within a pass (enforced by the feature extractor).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    items: BTreeMap<PatternCategory, Vec<FeatureItem>>,
}

impl FeatureSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, category: PatternCategory, item: FeatureItem) {
        self.items.entry(category).or_default().push(item);
    }

    #[must_use]
    pub fn get(&self, category: PatternCategory) -> &[FeatureItem] {
        self.items.get(&category).map_or(&[], Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatternCategory, &[FeatureItem])> {
        self.items.iter().map(|(c, v)| (*c, v.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.values().all(Vec::is_empty)
    }

    /// Whether `other`'s items are all present here, ignoring category tags.
    /// Used by backend-equivalence checks.
    #[must_use]
    pub fn contains_items_of(&self, other: &FeatureSet) -> bool {
        let ours: Vec<(&str, Span)> = self
            .items
            .values()
            .flatten()
            .map(|i| (i.name.as_str(), i.span))
            .collect();
        other
            .items
            .values()
            .flatten()
            .all(|i| ours.contains(&(i.name.as_str(), i.span)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_lookup_prefers_first() {
        let m = PatternMatch {
            pattern_id: "p".into(),
            captures: vec![
                Capture {
                    name: "name".into(),
                    span: Span::new(0, 3),
                },
                Capture {
                    name: "name".into(),
                    span: Span::new(5, 8),
                },
            ],
            primary_span: Span::new(0, 8),
            node_kind: "function_definition".into(),
            confidence: 1.0,
        };
        assert_eq!(m.capture("name").unwrap().span, Span::new(0, 3));
        assert_eq!(m.capture_spans("name").count(), 2);
        assert_eq!(m.capture_text("name", b"foo++bar!"), Some("foo"));
    }

    #[test]
    fn merge_captures_dedupes() {
        let mut a = PatternMatch {
            pattern_id: "p".into(),
            captures: vec![Capture {
                name: "x".into(),
                span: Span::new(0, 1),
            }],
            primary_span: Span::new(0, 1),
            node_kind: "n".into(),
            confidence: 1.0,
        };
        let b = a.clone();
        a.merge_captures(&b);
        assert_eq!(a.captures.len(), 1);
    }

    #[test]
    fn feature_set_groups_by_category() {
        let mut set = FeatureSet::new();
        set.add(
            PatternCategory::Syntax,
            FeatureItem::new("foo", Span::new(0, 3)),
        );
        set.add(
            PatternCategory::Naming,
            FeatureItem::new("snake_case", Span::new(0, 0)),
        );
        assert_eq!(set.get(PatternCategory::Syntax).len(), 1);
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }

    #[test]
    fn subset_check_ignores_categories() {
        let mut big = FeatureSet::new();
        big.add(
            PatternCategory::Syntax,
            FeatureItem::new("foo", Span::new(0, 3)),
        );
        big.add(
            PatternCategory::Structure,
            FeatureItem::new("bar", Span::new(4, 7)),
        );
        let mut small = FeatureSet::new();
        small.add(
            PatternCategory::Documentation,
            FeatureItem::new("foo", Span::new(0, 3)),
        );
        assert!(big.contains_items_of(&small));
        assert!(!small.contains_items_of(&big));
    }
}
