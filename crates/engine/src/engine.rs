// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pattern evaluation and recovery orchestration.
//!
//! A pattern invocation walks a small state machine: run the primary form;
//! on an empty result where the unit plausibly should have matched, try the
//! recovery strategies in order (fallback patterns, recovery regex,
//! partial-match) under a per-strategy budget. Terminal results memoize in
//! the persistent pattern cache; recovered results only in the
//! request-scoped cache, so a transient recovery never outlives its call.

use std::sync::Arc;
use std::time::Instant;

use quarry_cache::{CacheWeight, MemoryCache, RequestCache};
use quarry_core::{
    Cancelled, Capture, Deadline, LanguageId, MetricRecord, ParseIssue, PatternCategory,
    PatternDef, PatternKind, PatternMatch, PatternMetrics, PatternTiming, QuarryError,
    RecoveryError, RecoveryStrategy, Stage, Span, TelemetryHub,
};
use quarry_parse::{AstBackend, CustomBackend, ParsedUnit, QueryHit};

use crate::registry::{CompiledForm, CompiledPattern, PatternRegistry};

/// Confidence assigned by each evaluation path.
const CONFIDENCE_QUERY: f32 = 1.0;
const CONFIDENCE_REGEX: f32 = 0.8;
const CONFIDENCE_LITERAL: f32 = 0.7;
const CONFIDENCE_ERROR_CAP: f32 = 0.5;
const CONFIDENCE_REGEX_RECOVERY: f32 = 0.4;
const CONFIDENCE_PARTIAL: f32 = 0.5;

/// How often the line loop polls the strategy budget.
const BUDGET_POLL_LINES: usize = 256;

/// A match list stored in the persistent pattern cache.
pub struct MatchList(pub Vec<PatternMatch>);

impl CacheWeight for MatchList {
    fn size_bytes(&self) -> usize {
        self.0
            .iter()
            .map(|m| {
                96 + m.pattern_id.len()
                    + m.node_kind.len()
                    + m.captures.iter().map(|c| 48 + c.name.len()).sum::<usize>()
            })
            .sum::<usize>()
            .max(16)
    }
}

/// Request-tier memoization value: matches plus how they were obtained.
struct CachedOutcome {
    matches: Vec<PatternMatch>,
    recovery: Option<RecoveryStrategy>,
}

/// Everything one pattern invocation produced.
pub struct PatternOutcome {
    pub matches: Vec<PatternMatch>,
    pub recovery: Option<RecoveryStrategy>,
    pub issues: Vec<ParseIssue>,
    pub timing: PatternTiming,
}

/// Per-call context threaded through pattern evaluation.
pub struct EngineContext<'c> {
    pub source: &'c [u8],
    /// Content digest of the source unit, part of every memoization key.
    pub digest: String,
    pub deadline: Deadline,
    pub request: Option<&'c RequestCache>,
    pub pattern_cache: Option<&'c MemoryCache<MatchList>>,
}

impl<'c> EngineContext<'c> {
    /// A bare context: no caches, no deadline. Used by validation runs.
    #[must_use]
    pub fn bare(source: &'c [u8]) -> Self {
        Self {
            source,
            digest: quarry_utils::content_digest(source).to_string(),
            deadline: Deadline::none(),
            request: None,
            pattern_cache: None,
        }
    }
}

/// Applies compiled patterns over parsed units.
pub struct PatternEngine {
    registry: Arc<PatternRegistry>,
    telemetry: Arc<TelemetryHub>,
}

impl PatternEngine {
    #[must_use]
    pub fn new(registry: Arc<PatternRegistry>, telemetry: Arc<TelemetryHub>) -> Self {
        Self {
            registry,
            telemetry,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<PatternRegistry> {
        &self.registry
    }

    /// Run every usable pattern of the requested categories over the unit.
    /// Matches come back totally ordered and de-duplicated; a cancellation
    /// surfaces as an issue on a partial result.
    pub fn process_all(
        &self,
        unit: &ParsedUnit,
        ctx: &EngineContext<'_>,
        categories: &[PatternCategory],
    ) -> (Vec<PatternMatch>, PatternMetrics, Vec<ParseIssue>) {
        let started = Instant::now();
        let set = self.registry.patterns_for(&unit.language);
        let mut issues: Vec<ParseIssue> = set
            .compile_errors
            .iter()
            .map(|(id, reason)| {
                ParseIssue::new(
                    Stage::Patterns,
                    "registry",
                    &QuarryError::Pattern(quarry_core::PatternError::CompilationFailed {
                        id: id.clone(),
                        reason: reason.clone(),
                    }),
                )
                .for_pattern(id)
            })
            .collect();

        let patterns: Vec<Arc<CompiledPattern>> = set.selected(categories).cloned().collect();
        let outcomes: Vec<Result<PatternOutcome, Cancelled>> = if patterns.len() > 1 {
            crate::workers::worker_pool().install(|| {
                use rayon::prelude::*;
                patterns
                    .par_iter()
                    .map(|pattern| self.process(unit, pattern, ctx))
                    .collect()
            })
        } else {
            patterns
                .iter()
                .map(|pattern| self.process(unit, pattern, ctx))
                .collect()
        };

        let mut matches = Vec::new();
        let mut metrics = PatternMetrics::default();
        let mut cancelled = false;
        for outcome in outcomes {
            match outcome {
                Ok(outcome) => {
                    matches.extend(outcome.matches);
                    issues.extend(outcome.issues);
                    metrics.record(outcome.timing);
                }
                Err(Cancelled) => cancelled = true,
            }
        }
        if cancelled {
            issues.push(ParseIssue::new(
                Stage::Patterns,
                "engine",
                &QuarryError::from(Cancelled),
            ));
        }
        order_matches(&mut matches);
        metrics.duration_us = started.elapsed().as_micros() as u64;
        (matches, metrics, issues)
    }

    /// Evaluate a single pattern, with memoization and recovery.
    pub fn process(
        &self,
        unit: &ParsedUnit,
        pattern: &Arc<CompiledPattern>,
        ctx: &EngineContext<'_>,
    ) -> Result<PatternOutcome, Cancelled> {
        ctx.deadline.check()?;
        let started = Instant::now();
        let key = memo_key(&unit.language, &pattern.def.id, &ctx.digest);

        if let Some(cached) = ctx
            .request
            .and_then(|request| request.get::<CachedOutcome>(&key))
        {
            return Ok(self.outcome_from_cache(
                pattern,
                cached.matches.clone(),
                cached.recovery,
                started,
            ));
        }
        if let Some(list) = ctx.pattern_cache.and_then(|cache| cache.get(&key)) {
            return Ok(self.outcome_from_cache(pattern, list.0.clone(), None, started));
        }

        let mut matches = evaluate_primary(unit, pattern, ctx.source);
        let mut recovery = None;
        let mut issues = Vec::new();

        if matches.is_empty() && should_attempt_recovery(pattern, ctx.source) {
            let (recovered, strategy, recovery_issues) = self.recover(unit, pattern, ctx)?;
            matches = recovered;
            recovery = strategy;
            issues = recovery_issues;
        }
        order_matches(&mut matches);

        let duration_us = started.elapsed().as_micros() as u64;
        self.telemetry.emit(MetricRecord::PatternRun {
            language: unit.language.clone(),
            pattern_id: pattern.def.id.clone(),
            duration_us,
            matches: matches.len(),
        });

        // Terminal results persist; recovered ones stay request-scoped so a
        // degraded answer never outlives its call.
        if !ctx.deadline.expired() {
            if recovery.is_none() {
                if let Some(cache) = ctx.pattern_cache {
                    if let Err(e) = cache.set(&key, MatchList(matches.clone()), None, &[]) {
                        tracing::debug!(key = %key, error = %e, "pattern memoization rejected");
                    }
                }
            }
            if let Some(request) = ctx.request {
                request.set(
                    &key,
                    Arc::new(CachedOutcome {
                        matches: matches.clone(),
                        recovery,
                    }),
                );
            }
        }

        Ok(PatternOutcome {
            timing: PatternTiming {
                pattern_id: pattern.def.id.clone(),
                duration_us,
                matches: matches.len(),
                recovery,
            },
            matches,
            recovery,
            issues,
        })
    }

    fn outcome_from_cache(
        &self,
        pattern: &CompiledPattern,
        matches: Vec<PatternMatch>,
        recovery: Option<RecoveryStrategy>,
        started: Instant,
    ) -> PatternOutcome {
        PatternOutcome {
            timing: PatternTiming {
                pattern_id: pattern.def.id.clone(),
                duration_us: started.elapsed().as_micros() as u64,
                matches: matches.len(),
                recovery,
            },
            matches,
            recovery,
            issues: Vec::new(),
        }
    }

    /// The three recovery strategies, in order; first success wins.
    fn recover(
        &self,
        unit: &ParsedUnit,
        pattern: &Arc<CompiledPattern>,
        ctx: &EngineContext<'_>,
    ) -> Result<(Vec<PatternMatch>, Option<RecoveryStrategy>, Vec<ParseIssue>), Cancelled> {
        let mut issues = Vec::new();
        let budget_ms = pattern.def.recovery.strategy_budget_ms;

        for strategy in [
            RecoveryStrategy::FallbackPatterns,
            RecoveryStrategy::RegexFallback,
            RecoveryStrategy::PartialMatch,
        ] {
            ctx.deadline.check()?;
            let budget = ctx
                .deadline
                .tightened(std::time::Duration::from_millis(budget_ms));
            let started = Instant::now();
            let result = match strategy {
                RecoveryStrategy::FallbackPatterns => {
                    self.try_fallback_patterns(unit, pattern, ctx, budget)
                }
                RecoveryStrategy::RegexFallback => {
                    try_regex_fallback(pattern, ctx.source, budget)
                }
                RecoveryStrategy::PartialMatch => try_partial_match(unit, pattern, ctx, budget),
            };
            let duration_us = started.elapsed().as_micros() as u64;

            let (matches, timed_out) = match result {
                StrategyResult::Matches(matches) => (matches, false),
                StrategyResult::Empty => (Vec::new(), false),
                StrategyResult::TimedOut => (Vec::new(), true),
            };
            let succeeded = !matches.is_empty();
            self.telemetry.emit(MetricRecord::RecoveryAttempt {
                language: unit.language.clone(),
                pattern_id: pattern.def.id.clone(),
                strategy,
                succeeded,
                duration_us,
            });
            if timed_out {
                issues.push(
                    ParseIssue::new(
                        Stage::Recovery,
                        "engine",
                        &QuarryError::Recovery(RecoveryError::Timeout {
                            strategy: strategy.as_str(),
                            budget_ms,
                        }),
                    )
                    .for_pattern(&pattern.def.id),
                );
            }
            if succeeded {
                return Ok((matches, Some(strategy), issues));
            }
        }

        issues.push(
            ParseIssue::new(
                Stage::Recovery,
                "engine",
                &QuarryError::Recovery(RecoveryError::AllStrategiesFailed(
                    pattern.def.id.clone(),
                )),
            )
            .for_pattern(&pattern.def.id),
        );
        Ok((Vec::new(), None, issues))
    }

    fn try_fallback_patterns(
        &self,
        unit: &ParsedUnit,
        pattern: &CompiledPattern,
        ctx: &EngineContext<'_>,
        budget: Deadline,
    ) -> StrategyResult {
        for fallback_id in &pattern.def.fallback_ids {
            if budget.expired() {
                return StrategyResult::TimedOut;
            }
            let Some(fallback) = self.registry.get(&unit.language, fallback_id) else {
                continue;
            };
            let matches = evaluate_primary(unit, &fallback, ctx.source);
            if !matches.is_empty() {
                return StrategyResult::Matches(matches);
            }
        }
        StrategyResult::Empty
    }
}

enum StrategyResult {
    Matches(Vec<PatternMatch>),
    Empty,
    TimedOut,
}

/// Engine heuristic for whether an empty result is suspicious enough to
/// recover: the unit has real bytes and the pattern describes structure the
/// source plausibly contains.
fn should_attempt_recovery(pattern: &CompiledPattern, source: &[u8]) -> bool {
    pattern.def.recovery.enabled
        && !source.is_empty()
        && matches!(
            pattern.def.category,
            PatternCategory::Syntax | PatternCategory::Structure
        )
}

/// Run a pattern's primary form, no recovery.
pub(crate) fn evaluate_primary(
    unit: &ParsedUnit,
    pattern: &CompiledPattern,
    source: &[u8],
) -> Vec<PatternMatch> {
    match &pattern.form {
        CompiledForm::Query(query) => {
            if unit.ts_tree().is_none() {
                return Vec::new();
            }
            AstBackend::run_query(unit, query, source)
                .into_iter()
                .map(|hit| match_from_hit(&pattern.def, &hit))
                .collect()
        }
        CompiledForm::Regex(regex) => regex_matches(
            regex,
            &pattern.def,
            source,
            CONFIDENCE_REGEX,
            "regex-match",
            Deadline::none(),
        )
        .unwrap_or_default(),
        CompiledForm::Literal(needle) => literal_matches(needle, &pattern.def, source),
        CompiledForm::Unusable => Vec::new(),
    }
}

/// Evaluate one definition against a standalone sample; used by pattern
/// validation. Picks whichever backend the sample's language supports.
pub(crate) fn evaluate_sample(def: &PatternDef, sample: &[u8]) -> Result<bool, String> {
    let mut errors = Vec::new();
    let compiled = crate::registry::compile_for_validation(def.clone(), &mut errors);
    if let Some((_, reason)) = errors.first() {
        if !matches!(def.kind, PatternKind::AstQuery) || def.recovery_regex.is_none() {
            return Err(reason.clone());
        }
    }
    let unit = if quarry_language::has_grammar(&def.language) {
        AstBackend::parse(&def.language, sample).map_err(|e| e.to_string())?
    } else {
        CustomBackend::with_default_parsers()
            .parse(&def.language, sample)
            .map_err(|e| e.to_string())?
    };
    Ok(!evaluate_primary(&unit, &compiled, sample).is_empty())
}

fn match_from_hit(def: &PatternDef, hit: &QueryHit) -> PatternMatch {
    let captures: Vec<Capture> = hit
        .captures
        .iter()
        .map(|c| Capture {
            name: c.name.clone(),
            span: c.span,
        })
        .collect();

    // the extract spec may re-anchor the match to a named capture
    let (primary_span, node_kind, has_error) = def
        .extract
        .primary_capture
        .as_deref()
        .and_then(|name| hit.captures.iter().find(|c| c.name == name))
        .map_or(
            (hit.span, hit.node_kind.clone(), hit.has_error),
            |c| (c.span, c.node_kind.clone(), c.has_error),
        );

    let confidence = if has_error {
        CONFIDENCE_QUERY.min(CONFIDENCE_ERROR_CAP)
    } else {
        CONFIDENCE_QUERY
    };
    PatternMatch {
        pattern_id: def.id.clone(),
        captures,
        primary_span,
        node_kind,
        confidence,
    }
}

/// Apply a regex line-by-line, polling the budget every few hundred lines.
/// `None` return means the budget expired.
fn regex_matches(
    regex: &regex::Regex,
    def: &PatternDef,
    source: &[u8],
    confidence: f32,
    node_kind: &str,
    budget: Deadline,
) -> Option<Vec<PatternMatch>> {
    let text = match std::str::from_utf8(source) {
        Ok(text) => text,
        Err(e) => std::str::from_utf8(&source[..e.valid_up_to()]).ok()?,
    };
    let default_name = def.extract.name_capture.as_deref().unwrap_or("name");
    let group_names: Vec<Option<&str>> = regex.capture_names().collect();

    let mut matches = Vec::new();
    let mut offset = 0;
    for (index, line) in text.split('\n').enumerate() {
        if index % BUDGET_POLL_LINES == 0 && budget.expired() {
            return None;
        }
        for caps in regex.captures_iter(line) {
            let whole = caps.get(0).expect("group 0 always participates");
            let mut captures = Vec::new();
            for (group, name) in group_names.iter().enumerate().skip(1) {
                let Some(m) = caps.get(group) else { continue };
                let capture_name = name.map_or_else(
                    || {
                        if group == 1 {
                            default_name.to_string()
                        } else {
                            format!("group{group}")
                        }
                    },
                    str::to_string,
                );
                captures.push(Capture {
                    name: capture_name,
                    span: Span::new(offset + m.start(), offset + m.end()),
                });
            }
            matches.push(PatternMatch {
                pattern_id: def.id.clone(),
                captures,
                primary_span: Span::new(offset + whole.start(), offset + whole.end()),
                node_kind: node_kind.to_string(),
                confidence,
            });
        }
        offset += line.len() + 1;
    }
    Some(matches)
}

fn literal_matches(needle: &str, def: &PatternDef, source: &[u8]) -> Vec<PatternMatch> {
    if needle.is_empty() {
        return Vec::new();
    }
    let mut matches = Vec::new();
    let mut start = 0;
    while let Some(pos) = find_sub(&source[start..], needle.as_bytes()) {
        let begin = start + pos;
        matches.push(PatternMatch {
            pattern_id: def.id.clone(),
            captures: Vec::new(),
            primary_span: Span::new(begin, begin + needle.len()),
            node_kind: "literal-match".to_string(),
            confidence: CONFIDENCE_LITERAL,
        });
        start = begin + needle.len();
    }
    matches
}

fn find_sub(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    memchr::memmem::find(haystack, needle)
}

fn try_regex_fallback(
    pattern: &CompiledPattern,
    source: &[u8],
    budget: Deadline,
) -> StrategyResult {
    let Some(regex) = &pattern.recovery_regex else {
        return StrategyResult::Empty;
    };
    match regex_matches(
        regex,
        &pattern.def,
        source,
        CONFIDENCE_REGEX_RECOVERY,
        "regex-recovery",
        budget,
    ) {
        Some(matches) if !matches.is_empty() => StrategyResult::Matches(matches),
        Some(_) => StrategyResult::Empty,
        None => StrategyResult::TimedOut,
    }
}

/// Run the query against each top-level child separately and union the
/// results at reduced confidence.
fn try_partial_match(
    unit: &ParsedUnit,
    pattern: &CompiledPattern,
    ctx: &EngineContext<'_>,
    budget: Deadline,
) -> StrategyResult {
    let CompiledForm::Query(query) = &pattern.form else {
        return StrategyResult::Empty;
    };
    let Some(tree) = unit.ts_tree() else {
        return StrategyResult::Empty;
    };
    let mut matches = Vec::new();
    for node in AstBackend::top_level_nodes(tree) {
        if budget.expired() {
            return StrategyResult::TimedOut;
        }
        for hit in AstBackend::run_query_on(node, query, ctx.source) {
            let mut m = match_from_hit(&pattern.def, &hit);
            m.confidence = CONFIDENCE_PARTIAL;
            matches.push(m);
        }
    }
    if matches.is_empty() {
        StrategyResult::Empty
    } else {
        StrategyResult::Matches(matches)
    }
}

fn memo_key(language: &LanguageId, pattern_id: &str, digest: &str) -> String {
    format!("{language}:{pattern_id}:{digest}")
}

/// Total order `(start_byte, -length, pattern_id)`, then collapse
/// duplicates by `(pattern_id, primary_span)`, merging capture sets.
pub(crate) fn order_matches(matches: &mut Vec<PatternMatch>) {
    matches.sort_by(|a, b| {
        a.primary_span
            .start_byte
            .cmp(&b.primary_span.start_byte)
            .then(b.primary_span.len().cmp(&a.primary_span.len()))
            .then(a.pattern_id.cmp(&b.pattern_id))
    });
    matches.dedup_by(|next, kept| {
        if kept.pattern_id == next.pattern_id && kept.primary_span == next.primary_span {
            let next = next.clone();
            kept.merge_captures(&next);
            kept.confidence = kept.confidence.max(next.confidence);
            true
        } else {
            false
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_cache::CachePolicy;

    fn engine() -> PatternEngine {
        PatternEngine::new(
            Arc::new(PatternRegistry::new()),
            Arc::new(TelemetryHub::new()),
        )
    }

    fn python_unit(source: &[u8]) -> ParsedUnit {
        AstBackend::parse(&LanguageId::new("python"), source).unwrap()
    }

    #[test]
    fn function_pattern_matches_with_name_capture() {
        let engine = engine();
        let source = b"def foo(a, b):\n    return a + b\n";
        let unit = python_unit(source);
        let pattern = engine.registry.get(&unit.language, "py-function").unwrap();
        let ctx = EngineContext::bare(source);
        let outcome = engine.process(&unit, &pattern, &ctx).unwrap();

        assert_eq!(outcome.matches.len(), 1);
        assert!(outcome.recovery.is_none());
        let m = &outcome.matches[0];
        assert_eq!(m.capture_text("name", source), Some("foo"));
        assert_eq!(m.node_kind, "function_definition");
        assert_eq!(m.confidence, 1.0);
    }

    #[test]
    fn malformed_source_recovers_through_regex() {
        let engine = engine();
        let source = b"def foo(:\n    pass";
        let unit = python_unit(source);
        let pattern = engine.registry.get(&unit.language, "py-function").unwrap();
        let ctx = EngineContext::bare(source);
        let outcome = engine.process(&unit, &pattern, &ctx).unwrap();

        assert_eq!(outcome.matches.len(), 1);
        let m = &outcome.matches[0];
        assert_eq!(m.node_kind, "regex-recovery");
        assert_eq!(m.confidence, CONFIDENCE_REGEX_RECOVERY);
        assert_eq!(m.capture_text("name", source), Some("foo"));
        assert!(matches!(
            outcome.recovery,
            Some(RecoveryStrategy::RegexFallback) | Some(RecoveryStrategy::FallbackPatterns)
        ));
    }

    #[test]
    fn recovery_monotonicity() {
        // enabling recovery never yields fewer matches
        let engine = engine();
        let source = b"def foo(:\n    pass";
        let unit = python_unit(source);
        let pattern = engine.registry.get(&unit.language, "py-function").unwrap();
        let ctx = EngineContext::bare(source);

        let with_recovery = engine.process(&unit, &pattern, &ctx).unwrap();
        let without = evaluate_primary(&unit, &pattern, source);
        assert!(with_recovery.matches.len() >= without.len());
    }

    #[test]
    fn process_all_orders_and_dedupes() {
        let engine = engine();
        let source = b"import os\n\ndef foo():\n    pass\n\nclass Bar:\n    pass\n";
        let unit = python_unit(source);
        let ctx = EngineContext::bare(source);
        let (matches, metrics, _) = engine.process_all(&unit, &ctx, &[]);

        assert!(metrics.patterns_run > 0);
        assert!(!matches.is_empty());
        for pair in matches.windows(2) {
            let a = (
                pair[0].primary_span.start_byte,
                std::cmp::Reverse(pair[0].primary_span.len()),
                pair[0].pattern_id.clone(),
            );
            let b = (
                pair[1].primary_span.start_byte,
                std::cmp::Reverse(pair[1].primary_span.len()),
                pair[1].pattern_id.clone(),
            );
            assert!(a <= b, "matches out of order");
        }
        // no duplicates by (pattern_id, primary_span)
        let mut keys: Vec<_> = matches
            .iter()
            .map(|m| (m.pattern_id.clone(), m.primary_span))
            .collect();
        let before = keys.len();
        keys.dedup();
        assert_eq!(keys.len(), before);
    }

    #[test]
    fn terminal_results_memoize_in_pattern_cache() {
        let engine = engine();
        let source = b"def foo():\n    pass\n";
        let unit = python_unit(source);
        let pattern = engine.registry.get(&unit.language, "py-function").unwrap();
        let cache = MemoryCache::new("pattern", CachePolicy::with_budget(1 << 20));
        let mut ctx = EngineContext::bare(source);
        ctx.pattern_cache = Some(&cache);

        let first = engine.process(&unit, &pattern, &ctx).unwrap();
        assert_eq!(cache.len(), 1);
        let second = engine.process(&unit, &pattern, &ctx).unwrap();
        assert_eq!(first.matches, second.matches);
    }

    #[test]
    fn recovered_results_stay_out_of_the_persistent_cache() {
        let engine = engine();
        let source = b"def foo(:\n    pass";
        let unit = python_unit(source);
        let pattern = engine.registry.get(&unit.language, "py-function").unwrap();
        let cache = MemoryCache::new("pattern", CachePolicy::with_budget(1 << 20));
        let request = RequestCache::new();
        let mut ctx = EngineContext::bare(source);
        ctx.pattern_cache = Some(&cache);
        ctx.request = Some(&request);

        let outcome = engine.process(&unit, &pattern, &ctx).unwrap();
        assert!(outcome.recovery.is_some());
        assert_eq!(cache.len(), 0, "recovered result must not persist");
        assert_eq!(request.len(), 1, "recovered result memoizes per-request");
    }

    #[test]
    fn expired_deadline_cancels() {
        let engine = engine();
        let source = b"def foo():\n    pass\n";
        let unit = python_unit(source);
        let pattern = engine.registry.get(&unit.language, "py-function").unwrap();
        let mut ctx = EngineContext::bare(source);
        ctx.deadline = Deadline::after_ms(0);

        assert!(engine.process(&unit, &pattern, &ctx).is_err());
    }

    #[test]
    fn error_nodes_cap_confidence() {
        let engine = engine();
        // parsable overall, with a broken second function: the partial
        // tree still yields a match for the first, error-tainted region
        let source = b"def good():\n    pass\n\ndef bad(:\n    pass\n";
        let unit = python_unit(source);
        let pattern = engine.registry.get(&unit.language, "py-function").unwrap();
        let ctx = EngineContext::bare(source);
        let outcome = engine.process(&unit, &pattern, &ctx).unwrap();
        for m in &outcome.matches {
            if m.node_kind == "function_definition" && m.confidence < 1.0 {
                assert!(m.confidence <= CONFIDENCE_ERROR_CAP);
            }
        }
    }

    #[test]
    fn regex_patterns_work_on_custom_trees() {
        let engine = engine();
        let language = LanguageId::new("markdown");
        let source = b"# Title\n\nbody\n";
        let unit = CustomBackend::with_default_parsers()
            .parse(&language, source)
            .unwrap();
        let pattern = engine.registry.get(&language, "md-heading").unwrap();
        let ctx = EngineContext::bare(source);
        let outcome = engine.process(&unit, &pattern, &ctx).unwrap();
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(
            outcome.matches[0].capture_text("name", source),
            Some("Title")
        );
    }
}
