// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The feature extractor.
//!
//! Folds pattern matches into a categorized feature set. A pattern's
//! category is authoritative (its extract spec may override it); an item
//! claims exactly one category per pass, first writer wins. Naming
//! features are derived afterwards as pure functions over the extracted
//! names, with no re-parsing.

use quarry_core::{FeatureItem, FeatureSet, PatternCategory, PatternMatch, Span};
use quarry_utils::RapidSet;

use crate::registry::LanguagePatterns;

/// Longest feature name kept before truncation.
const MAX_NAME_LEN: usize = 64;

pub struct FeatureExtractor;

impl FeatureExtractor {
    #[must_use]
    pub fn extract(
        patterns: &LanguagePatterns,
        matches: &[PatternMatch],
        source: &[u8],
    ) -> FeatureSet {
        let mut features = FeatureSet::new();
        let mut claimed: RapidSet<(String, Span)> = RapidSet::default();

        for m in matches {
            let Some(pattern) = patterns.get(&m.pattern_id) else {
                continue;
            };
            let def = &pattern.def;
            let category = def.extract.category_override.unwrap_or(def.category);
            let name = item_name(m, def.extract.name_capture.as_deref(), source);
            if !claimed.insert((name.clone(), m.primary_span)) {
                continue;
            }

            let mut item = FeatureItem::new(name, m.primary_span)
                .with_attr("node_kind", m.node_kind.clone())
                .with_attr("confidence", format!("{:.2}", m.confidence));
            for (key, value) in &def.extract.attrs {
                item = item.with_attr(key, value.clone());
            }
            if m.node_kind == "regex-recovery" {
                item = item.with_attr("recovered", "regex");
            }
            features.add(category, item);
        }

        derive_naming(&mut features);
        features
    }
}

fn item_name(m: &PatternMatch, name_capture: Option<&str>, source: &[u8]) -> String {
    if let Some(text) = m.capture_text(name_capture.unwrap_or("name"), source) {
        return truncate(text);
    }
    let primary = m.primary_span.slice(source);
    match std::str::from_utf8(primary) {
        Ok(text) => {
            let first_line = text.lines().next().unwrap_or("").trim();
            if first_line.is_empty() {
                m.node_kind.clone()
            } else {
                truncate(first_line)
            }
        }
        Err(_) => m.node_kind.clone(),
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_NAME_LEN {
        return text.to_string();
    }
    let mut end = MAX_NAME_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

/// Identifier-casing statistics over Syntax and Structure names.
fn derive_naming(features: &mut FeatureSet) {
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    let names: Vec<String> = [PatternCategory::Syntax, PatternCategory::Structure]
        .iter()
        .flat_map(|cat| features.get(*cat))
        .map(|item| item.name.clone())
        .collect();

    for name in &names {
        let Some(convention) = casing_of(name) else {
            continue;
        };
        match counts.iter_mut().find(|(c, _)| *c == convention) {
            Some((_, n)) => *n += 1,
            None => counts.push((convention, 1)),
        }
    }
    if counts.is_empty() {
        return;
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    for (convention, count) in &counts {
        features.add(
            PatternCategory::Naming,
            FeatureItem::new(*convention, Span::new(0, 0))
                .with_attr("count", count.to_string()),
        );
    }
    features.add(
        PatternCategory::Naming,
        FeatureItem::new("dominant_convention", Span::new(0, 0))
            .with_attr("value", counts[0].0),
    );
}

fn casing_of(name: &str) -> Option<&'static str> {
    if name.is_empty() || !name.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let has_underscore = name.contains('_');
    let has_upper = name.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = name.chars().any(|c| c.is_ascii_lowercase());
    let first_upper = name.chars().next().is_some_and(|c| c.is_ascii_uppercase());

    if has_underscore && !has_upper {
        Some("snake_case")
    } else if has_underscore && !has_lower {
        Some("screaming_snake_case")
    } else if !has_underscore && first_upper && has_lower {
        Some("pascal_case")
    } else if !has_underscore && !first_upper && has_upper {
        Some("camel_case")
    } else if !has_upper {
        // single lower-case word reads as snake_case with one segment
        Some("snake_case")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::LanguageId;
    use quarry_parse::AstBackend;
    use std::sync::Arc;

    use crate::engine::{EngineContext, PatternEngine};
    use crate::registry::PatternRegistry;

    fn extract_for(source: &[u8]) -> FeatureSet {
        let language = LanguageId::new("python");
        let registry = Arc::new(PatternRegistry::new());
        let engine = PatternEngine::new(
            registry.clone(),
            Arc::new(quarry_core::TelemetryHub::new()),
        );
        let unit = AstBackend::parse(&language, source).unwrap();
        let ctx = EngineContext::bare(source);
        let (matches, _, _) = engine.process_all(&unit, &ctx, &[]);
        FeatureExtractor::extract(&registry.patterns_for(&language), &matches, source)
    }

    #[test]
    fn function_names_become_syntax_features() {
        let features = extract_for(b"def foo(a, b):\n    return a + b\n");
        let syntax = features.get(PatternCategory::Syntax);
        assert_eq!(syntax.len(), 1);
        assert_eq!(syntax[0].name, "foo");
        assert_eq!(
            syntax[0].attrs.get("node_kind").map(String::as_str),
            Some("function_definition")
        );
    }

    #[test]
    fn one_item_one_category() {
        let features = extract_for(b"def foo():\n    pass\n\nclass Foo:\n    pass\n");
        let mut seen: Vec<(String, Span)> = Vec::new();
        for (_, items) in features.iter() {
            for item in items {
                let key = (item.name.clone(), item.span);
                assert!(!seen.contains(&key), "item claimed twice: {key:?}");
                seen.push(key);
            }
        }
    }

    #[test]
    fn naming_statistics_are_derived() {
        let features =
            extract_for(b"def snake_one():\n    pass\n\ndef snake_two():\n    pass\n\nclass PascalThing:\n    pass\n");
        let naming = features.get(PatternCategory::Naming);
        assert!(!naming.is_empty());
        let dominant = naming
            .iter()
            .find(|item| item.name == "dominant_convention")
            .unwrap();
        assert_eq!(dominant.attrs.get("value").map(String::as_str), Some("snake_case"));
    }

    #[test]
    fn casing_classifier() {
        assert_eq!(casing_of("snake_name"), Some("snake_case"));
        assert_eq!(casing_of("SCREAMING_NAME"), Some("screaming_snake_case"));
        assert_eq!(casing_of("PascalName"), Some("pascal_case"));
        assert_eq!(casing_of("camelName"), Some("camel_case"));
        assert_eq!(casing_of("word"), Some("snake_case"));
        assert_eq!(casing_of("_private"), None);
        assert_eq!(casing_of(""), None);
    }
}
