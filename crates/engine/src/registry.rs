// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The pattern registry.
//!
//! Pattern sets compile lazily per language, at most once per process
//! (losers of a compilation race block on the winner's `OnceLock` slot and
//! observe its result). A failed AST-query compilation demotes the pattern
//! to its recovery regex when one exists; otherwise the pattern is marked
//! unusable and sits out every run until the next clear.

use dashmap::DashMap;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock};
use tree_sitter::Query;

use quarry_core::{LanguageId, PatternCategory, PatternDef, PatternKind, PatternValidation};
use quarry_parse::AstBackend;
use quarry_utils::RapidMap;

use crate::builtin;

/// Executable form of a compiled pattern.
pub enum CompiledForm {
    Query(Arc<Query>),
    Regex(Arc<Regex>),
    Literal(String),
    /// Compilation failed and no recovery regex exists.
    Unusable,
}

/// A pattern definition bound to its executable form.
pub struct CompiledPattern {
    pub def: Arc<PatternDef>,
    pub form: CompiledForm,
    /// Pre-compiled recovery regex, used by the regex-fallback strategy.
    pub recovery_regex: Option<Arc<Regex>>,
}

impl CompiledPattern {
    /// The kind the pattern effectively runs as; demotion changes this
    /// without touching the definition.
    #[must_use]
    pub fn effective_kind(&self) -> Option<PatternKind> {
        match self.form {
            CompiledForm::Query(_) => Some(PatternKind::AstQuery),
            CompiledForm::Regex(_) => Some(PatternKind::Regex),
            CompiledForm::Literal(_) => Some(PatternKind::Literal),
            CompiledForm::Unusable => None,
        }
    }

    #[must_use]
    pub fn is_usable(&self) -> bool {
        !matches!(self.form, CompiledForm::Unusable)
    }
}

/// All compiled patterns of one language.
pub struct LanguagePatterns {
    by_category: BTreeMap<PatternCategory, Vec<Arc<CompiledPattern>>>,
    by_id: RapidMap<String, Arc<CompiledPattern>>,
    /// `(pattern id, reason)` for every compilation failure, demoted or not.
    pub compile_errors: Vec<(String, String)>,
}

impl LanguagePatterns {
    #[must_use]
    pub fn category(&self, category: PatternCategory) -> &[Arc<CompiledPattern>] {
        self.by_category
            .get(&category)
            .map_or(&[], Vec::as_slice)
    }

    /// Usable patterns across the requested categories, or all categories
    /// when `categories` is empty.
    pub fn selected<'p>(
        &'p self,
        categories: &'p [PatternCategory],
    ) -> impl Iterator<Item = &'p Arc<CompiledPattern>> {
        self.by_category
            .iter()
            .filter(move |(cat, _)| categories.is_empty() || categories.contains(cat))
            .flat_map(|(_, patterns)| patterns.iter())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<CompiledPattern>> {
        self.by_id.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Process-wide registry of per-language pattern sets.
#[derive(Default)]
pub struct PatternRegistry {
    slots: DashMap<LanguageId, Arc<OnceLock<Arc<LanguagePatterns>>>>,
    extra: Mutex<Vec<PatternDef>>,
}

impl PatternRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an additional definition. The language's compiled set is
    /// dropped so the next request picks the new pattern up.
    pub fn register(&self, def: PatternDef) {
        let language = def.language.clone();
        if let Ok(mut extra) = self.extra.lock() {
            extra.push(def);
        }
        self.clear_language(&language);
    }

    /// The compiled pattern set for a language, compiling on first use.
    pub fn patterns_for(&self, language: &LanguageId) -> Arc<LanguagePatterns> {
        let slot = self
            .slots
            .entry(language.clone())
            .or_insert_with(|| Arc::new(OnceLock::new()))
            .clone();
        slot.get_or_init(|| Arc::new(self.compile_language(language)))
            .clone()
    }

    pub fn get(&self, language: &LanguageId, id: &str) -> Option<Arc<CompiledPattern>> {
        self.patterns_for(language).get(id).cloned()
    }

    pub fn clear(&self) {
        self.slots.clear();
    }

    pub fn clear_language(&self, language: &LanguageId) {
        self.slots.remove(language);
    }

    /// Pre-compile languages in descending weight order. Weights are opaque
    /// scores supplied by telemetry consumers.
    pub fn warm(&self, weighted: &[(LanguageId, f64)]) {
        let mut ordered: Vec<_> = weighted.to_vec();
        ordered.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (language, _) in ordered {
            let _ = self.patterns_for(&language);
        }
    }

    /// Syntactic validation plus embedded test-case evaluation.
    #[must_use]
    pub fn validate(&self, def: &PatternDef) -> PatternValidation {
        let mut validation = PatternValidation::default();

        if def.id.is_empty() {
            validation.errors.push("pattern id is empty".to_string());
        }
        if def.source.is_empty() {
            validation.errors.push("pattern source is empty".to_string());
        }
        match def.kind {
            PatternKind::AstQuery => {
                if let Err(reason) = AstBackend::compile_query(&def.language, &def.source) {
                    if def.recovery_regex.is_some() {
                        validation
                            .warnings
                            .push(format!("query does not compile, will demote to regex: {reason}"));
                    } else {
                        validation.errors.push(format!("query error: {reason}"));
                    }
                }
            }
            PatternKind::Regex => {
                if let Err(e) = Regex::new(&def.source) {
                    validation.errors.push(format!("regex error: {e}"));
                }
            }
            PatternKind::Literal => {}
        }
        if let Some(recovery) = &def.recovery_regex {
            if let Err(e) = Regex::new(recovery) {
                validation
                    .errors
                    .push(format!("recovery regex error: {e}"));
            }
        }

        if validation.errors.is_empty() {
            for (index, case) in def.test_cases.iter().enumerate() {
                match crate::engine::evaluate_sample(def, case.source.as_bytes()) {
                    Ok(matched) if matched != case.should_match => {
                        validation.errors.push(format!(
                            "test case {index} expected should_match={}, got {}",
                            case.should_match, matched
                        ));
                    }
                    Ok(_) => {}
                    Err(reason) => validation
                        .warnings
                        .push(format!("test case {index} could not run: {reason}")),
                }
            }
        }

        validation.ok = validation.errors.is_empty();
        validation
    }

    fn compile_language(&self, language: &LanguageId) -> LanguagePatterns {
        let mut defs = builtin::patterns_for(language);
        if let Ok(extra) = self.extra.lock() {
            defs.extend(extra.iter().filter(|d| &d.language == language).cloned());
        }

        let mut by_category: BTreeMap<PatternCategory, Vec<Arc<CompiledPattern>>> =
            BTreeMap::new();
        let mut by_id = RapidMap::default();
        let mut compile_errors = Vec::new();

        for def in defs {
            let compiled = Arc::new(compile_def(def, &mut compile_errors));
            by_id.insert(compiled.def.id.clone(), compiled.clone());
            if compiled.is_usable() {
                by_category
                    .entry(compiled.def.category)
                    .or_default()
                    .push(compiled);
            }
        }
        tracing::debug!(
            language = %language,
            patterns = by_id.len(),
            failures = compile_errors.len(),
            "compiled pattern set"
        );
        LanguagePatterns {
            by_category,
            by_id,
            compile_errors,
        }
    }
}

/// Compile a standalone definition for validation runs.
pub(crate) fn compile_for_validation(
    def: PatternDef,
    errors: &mut Vec<(String, String)>,
) -> CompiledPattern {
    compile_def(def, errors)
}

fn compile_def(def: PatternDef, errors: &mut Vec<(String, String)>) -> CompiledPattern {
    let recovery_regex = def.recovery_regex.as_deref().and_then(|source| {
        Regex::new(source)
            .map(Arc::new)
            .map_err(|e| errors.push((def.id.clone(), format!("recovery regex: {e}"))))
            .ok()
    });

    let form = match def.kind {
        PatternKind::AstQuery => match AstBackend::compile_query(&def.language, &def.source) {
            Ok(query) => CompiledForm::Query(Arc::new(query)),
            Err(reason) => {
                errors.push((def.id.clone(), reason));
                match &recovery_regex {
                    // demotion: the recovery regex becomes the primary form
                    Some(regex) => CompiledForm::Regex(regex.clone()),
                    None => CompiledForm::Unusable,
                }
            }
        },
        PatternKind::Regex => match Regex::new(&def.source) {
            Ok(regex) => CompiledForm::Regex(Arc::new(regex)),
            Err(e) => {
                errors.push((def.id.clone(), e.to_string()));
                CompiledForm::Unusable
            }
        },
        PatternKind::Literal => CompiledForm::Literal(def.source.clone()),
    };

    CompiledPattern {
        def: Arc::new(def),
        form,
        recovery_regex,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python() -> LanguageId {
        LanguageId::new("python")
    }

    #[test]
    fn builtin_python_patterns_compile() {
        let registry = PatternRegistry::new();
        let patterns = registry.patterns_for(&python());
        assert!(!patterns.is_empty());
        assert!(patterns.get("py-function").is_some());
        assert!(
            patterns.compile_errors.is_empty(),
            "builtin patterns must compile: {:?}",
            patterns.compile_errors
        );
    }

    #[test]
    fn compiled_sets_are_shared() {
        let registry = PatternRegistry::new();
        let a = registry.patterns_for(&python());
        let b = registry.patterns_for(&python());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn clear_language_forces_recompilation() {
        let registry = PatternRegistry::new();
        let a = registry.patterns_for(&python());
        registry.clear_language(&python());
        let b = registry.patterns_for(&python());
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn broken_query_demotes_to_recovery_regex() {
        let registry = PatternRegistry::new();
        registry.register(
            PatternDef::ast_query(
                "py-broken",
                "python",
                PatternCategory::Syntax,
                "(definitely_not_a_node_kind) @x",
            )
            .with_recovery_regex(r"^\s*def\s+(\w+)"),
        );
        let compiled = registry.get(&python(), "py-broken").unwrap();
        assert_eq!(compiled.effective_kind(), Some(PatternKind::Regex));
        let patterns = registry.patterns_for(&python());
        assert!(!patterns.compile_errors.is_empty());
    }

    #[test]
    fn broken_query_without_recovery_is_unusable() {
        let registry = PatternRegistry::new();
        registry.register(PatternDef::ast_query(
            "py-dead",
            "python",
            PatternCategory::Syntax,
            "(definitely_not_a_node_kind) @x",
        ));
        let compiled = registry.get(&python(), "py-dead").unwrap();
        assert!(!compiled.is_usable());
        // excluded from category runs
        let patterns = registry.patterns_for(&python());
        assert!(
            patterns
                .selected(&[])
                .all(|p| p.def.id != "py-dead")
        );
    }

    #[test]
    fn validation_reports_query_errors() {
        let registry = PatternRegistry::new();
        let bad = PatternDef::ast_query("x", "python", PatternCategory::Syntax, "(((");
        let validation = registry.validate(&bad);
        assert!(!validation.ok);
        assert!(!validation.errors.is_empty());
    }

    #[test]
    fn validation_runs_embedded_test_cases() {
        let registry = PatternRegistry::new();
        let def = PatternDef::ast_query(
            "py-fn",
            "python",
            PatternCategory::Syntax,
            "(function_definition name: (identifier) @name) @function",
        )
        .with_test_case("def foo(): pass", true)
        .with_test_case("x = 1", false);
        let validation = registry.validate(&def);
        assert!(validation.ok, "{:?}", validation.errors);
    }

    #[test]
    fn warm_compiles_in_weight_order() {
        let registry = PatternRegistry::new();
        registry.warm(&[
            (LanguageId::new("rust"), 0.2),
            (python(), 0.9),
        ]);
        // both are compiled; no panics, slots populated
        assert!(registry.get(&python(), "py-function").is_some());
        assert!(registry.get(&LanguageId::new("rust"), "rs-function").is_some());
    }
}
