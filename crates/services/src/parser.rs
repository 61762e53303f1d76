// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The facade itself.
//!
//! `parse` runs the whole pipeline and never propagates an error: whatever
//! goes wrong is folded into `ParserResult.errors` with its stage and
//! component, and the call keeps going best-effort unless the deadline
//! fires. The request-scoped cache lives exactly as long as one call.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use quarry_cache::{
    CacheCoordinator, CachePolicy, MemoryCache, RequestCache, AST_CACHE, CLASSIFICATION_CACHE,
    PATTERN_CACHE,
};
use quarry_core::{
    BackendError, Cancelled, Classification, ClassifyError, Deadline, FileKind, LanguageId,
    MetricRecord, ParseIssue, ParserResult, PatternCategory, QuarryError, SourceUnit, Stage,
    TelemetryHub,
};
use quarry_engine::{
    BlockExtractor, EngineContext, FeatureExtractor, MatchList, PatternEngine, PatternRegistry,
};
use quarry_parse::{AstBackend, CustomBackend, ParsedUnit};
use quarry_utils::RapidSet;

enum ResolvedBackend {
    Custom(LanguageId),
    Ast(LanguageId),
}

/// Wires the facade together. Hosts that share a registry or coordinator
/// across parsers inject them here; everything has a working default.
pub struct UnifiedParserBuilder {
    registry: Option<Arc<PatternRegistry>>,
    telemetry: Option<Arc<TelemetryHub>>,
    coordinator: Option<Arc<CacheCoordinator>>,
    custom: Option<CustomBackend>,
    ast_budget: usize,
    pattern_budget: usize,
    classification_budget: usize,
}

impl Default for UnifiedParserBuilder {
    fn default() -> Self {
        Self {
            registry: None,
            telemetry: None,
            coordinator: None,
            custom: None,
            ast_budget: 64 * 1024 * 1024,
            pattern_budget: 16 * 1024 * 1024,
            classification_budget: 1024 * 1024,
        }
    }
}

impl UnifiedParserBuilder {
    #[must_use]
    pub fn registry(mut self, registry: Arc<PatternRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn telemetry(mut self, telemetry: Arc<TelemetryHub>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    #[must_use]
    pub fn coordinator(mut self, coordinator: Arc<CacheCoordinator>) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    #[must_use]
    pub fn custom_backend(mut self, custom: CustomBackend) -> Self {
        self.custom = Some(custom);
        self
    }

    #[must_use]
    pub fn ast_cache_budget(mut self, bytes: usize) -> Self {
        self.ast_budget = bytes;
        self
    }

    #[must_use]
    pub fn pattern_cache_budget(mut self, bytes: usize) -> Self {
        self.pattern_budget = bytes;
        self
    }

    #[must_use]
    pub fn build(self) -> UnifiedParser {
        let registry = self.registry.unwrap_or_default();
        let telemetry = self.telemetry.unwrap_or_default();
        let coordinator = self.coordinator.unwrap_or_default();

        let ast_cache = Arc::new(MemoryCache::new(
            AST_CACHE,
            CachePolicy::with_budget(self.ast_budget),
        ));
        let pattern_cache = Arc::new(MemoryCache::new(
            PATTERN_CACHE,
            CachePolicy::with_budget(self.pattern_budget).adaptive(),
        ));
        let classification_cache = Arc::new(MemoryCache::new(
            CLASSIFICATION_CACHE,
            CachePolicy::with_budget(self.classification_budget),
        ));
        coordinator.register(ast_cache.clone());
        coordinator.register(pattern_cache.clone());
        coordinator.register(classification_cache.clone());

        UnifiedParser {
            engine: PatternEngine::new(registry.clone(), telemetry.clone()),
            registry,
            telemetry,
            coordinator,
            custom: self.custom.unwrap_or_default(),
            ast_cache,
            pattern_cache,
            classification_cache,
        }
    }
}

/// The facade: classify, pick a backend, parse, match, extract, report.
pub struct UnifiedParser {
    registry: Arc<PatternRegistry>,
    engine: PatternEngine,
    telemetry: Arc<TelemetryHub>,
    coordinator: Arc<CacheCoordinator>,
    custom: CustomBackend,
    ast_cache: Arc<MemoryCache<Arc<ParsedUnit>>>,
    pattern_cache: Arc<MemoryCache<MatchList>>,
    classification_cache: Arc<MemoryCache<Classification>>,
}

impl Default for UnifiedParser {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl UnifiedParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> UnifiedParserBuilder {
        UnifiedParserBuilder::default()
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<PatternRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn telemetry(&self) -> &Arc<TelemetryHub> {
        &self.telemetry
    }

    #[must_use]
    pub fn coordinator(&self) -> &Arc<CacheCoordinator> {
        &self.coordinator
    }

    /// Classify from path plus sniffed prefix, with persistent caching.
    pub fn classify(&self, path: &Path, prefix: &[u8]) -> Result<Classification, ClassifyError> {
        let bounded = &prefix[..prefix.len().min(quarry_core::SNIFF_LIMIT)];
        let key = format!(
            "{}:{}",
            path.display(),
            quarry_utils::content_digest(bounded)
        );
        if let Some(cached) = self.classification_cache.get(&key) {
            return Ok((*cached).clone());
        }
        let classification = quarry_language::classify(path, bounded)?;
        if let Err(e) = self
            .classification_cache
            .set(&key, classification.clone(), None, &[])
        {
            tracing::debug!(error = %e, "classification cache insert rejected");
        }
        Ok(classification)
    }

    /// Parse a single file's bytes.
    #[must_use]
    pub fn parse(
        &self,
        path: impl Into<std::path::PathBuf>,
        bytes: impl Into<Vec<u8>>,
        options: &crate::ParseOptions,
    ) -> ParserResult {
        self.parse_unit(SourceUnit::new(path, bytes), options)
    }

    /// Parse many units across the bounded worker pool.
    #[must_use]
    pub fn parse_many(
        &self,
        units: Vec<SourceUnit>,
        options: &crate::ParseOptions,
    ) -> Vec<ParserResult> {
        use rayon::prelude::*;
        quarry_engine::worker_pool()
            .install(|| units.into_par_iter().map(|u| self.parse_unit(u, options)).collect())
    }

    /// The full pipeline over one source unit.
    #[must_use]
    pub fn parse_unit(&self, unit: SourceUnit, options: &crate::ParseOptions) -> ParserResult {
        let started = Instant::now();
        let deadline = Deadline::after_ms(options.pattern_timeout_ms);

        // (1) classify; a failure here is terminal but still yields a result
        let classification = match quarry_language::classify_unit(&unit) {
            Ok(classification) => classification,
            Err(e) => {
                let error = QuarryError::from(e);
                self.emit_stage_error(Stage::Classify, "classifier", &error);
                return ParserResult::failed(
                    Classification::plaintext_fallback(),
                    ParseIssue::new(Stage::Classify, "classifier", &error),
                );
            }
        };

        // (2) binary files are an empty success; everything else goes to
        // backend resolution, which walks the classification fallbacks —
        // a named-but-unparseable language (Dockerfile, Makefile) still
        // degrades to its plaintext fallback rather than short-circuiting
        if classification.file_kind == FileKind::Binary {
            return ParserResult::empty(classification);
        }

        let mut result = ParserResult::empty(classification.clone());
        let digest = unit.content_digest().to_string();

        // (3) resolve a backend, walking classification fallbacks
        let Some(resolved) = self.resolve(&classification) else {
            let error = QuarryError::Backend(BackendError::Unavailable(
                classification.language.clone(),
            ));
            self.emit_stage_error(Stage::Resolve, "facade", &error);
            result.success = false;
            result
                .errors
                .push(ParseIssue::new(Stage::Resolve, "facade", &error));
            return result;
        };

        if deadline.expired() {
            return self.cancelled(result, Stage::Parse, started);
        }

        // (4)(5) parse, consulting the persistent tree cache by digest
        let (language, parsed) = match self.parse_backend(&unit, resolved, deadline) {
            Ok(Some(pair)) => pair,
            Ok(None) => return self.cancelled(result, Stage::Parse, started),
            Err(error) => {
                self.emit_stage_error(Stage::Parse, "backend", &error);
                result.success = false;
                result
                    .errors
                    .push(ParseIssue::new(Stage::Parse, "backend", &error));
                return result;
            }
        };

        // (6)(7) patterns, under the request-scoped cache
        let request = if options.request_cache_enabled {
            RequestCache::new()
        } else {
            RequestCache::disabled()
        };
        let ctx = EngineContext {
            source: unit.bytes(),
            digest,
            deadline,
            request: Some(&request),
            pattern_cache: Some(self.pattern_cache.as_ref()),
        };
        let (matches, metrics, issues) = self.engine.process_all(&parsed, &ctx, &options.categories);
        result.telemetry = metrics;
        result.errors.extend(issues);

        let patterns = self.registry.patterns_for(&language);

        // (8) blocks for the structural subset of matches
        if options.extract_blocks && !deadline.expired() {
            let mut seen = RapidSet::default();
            for m in &matches {
                let structural = patterns.get(&m.pattern_id).is_some_and(|p| {
                    matches!(
                        p.def.category,
                        PatternCategory::Syntax | PatternCategory::Structure
                    )
                });
                if !structural {
                    continue;
                }
                if let Some(block) =
                    BlockExtractor::from_match(&parsed, unit.bytes(), m, options.blocks_prefer_body)
                {
                    if seen.insert((block.start_point, block.end_point, block.node_kind.clone())) {
                        result.blocks.push(block);
                    }
                }
            }
        }

        // (9) features
        if options.extract_features && !deadline.expired() {
            result.features = FeatureExtractor::extract(&patterns, &matches, unit.bytes());
        }

        if options.include_ast {
            result.tree = Some(parsed.tree.clone());
        }
        result.matches = matches;

        // cancellation anywhere flips the call to failed
        if result.errors.iter().any(ParseIssue::is_cancellation) {
            result.success = false;
        }

        // (10) telemetry
        self.telemetry.emit(MetricRecord::ParseCompleted {
            language,
            duration_us: started.elapsed().as_micros() as u64,
            matches: result.matches.len(),
            success: result.success,
        });
        result
    }

    fn resolve(&self, classification: &Classification) -> Option<ResolvedBackend> {
        let candidates =
            std::iter::once(&classification.language).chain(classification.fallbacks.iter());
        for language in candidates {
            if self.custom.supports(language) {
                return Some(ResolvedBackend::Custom(language.clone()));
            }
            if quarry_language::has_grammar(language) {
                return Some(ResolvedBackend::Ast(language.clone()));
            }
        }
        None
    }

    /// Parse through the resolved backend; `Ok(None)` means the deadline
    /// fired mid-parse and nothing was cached.
    fn parse_backend(
        &self,
        unit: &SourceUnit,
        resolved: ResolvedBackend,
        deadline: Deadline,
    ) -> Result<Option<(LanguageId, Arc<ParsedUnit>)>, QuarryError> {
        let (language, cache_key) = match &resolved {
            ResolvedBackend::Custom(language) | ResolvedBackend::Ast(language) => (
                language.clone(),
                format!("{language}:{}", unit.content_digest()),
            ),
        };
        if let Some(cached) = self.ast_cache.get(&cache_key) {
            return Ok(Some((language, (*cached).clone())));
        }

        let parsed = match resolved {
            ResolvedBackend::Ast(language) => {
                match AstBackend::parse_with_deadline(&language, unit.bytes(), deadline) {
                    Ok(Some(parsed)) => Arc::new(parsed),
                    Ok(None) => return Ok(None),
                    Err(e) => return Err(QuarryError::Backend(e)),
                }
            }
            ResolvedBackend::Custom(language) => Arc::new(
                self.custom
                    .parse(&language, unit.bytes())
                    .map_err(QuarryError::Backend)?,
            ),
        };

        if !deadline.expired() {
            if let Err(e) = self.ast_cache.set(&cache_key, parsed.clone(), None, &[]) {
                tracing::debug!(key = %cache_key, error = %e, "tree cache insert rejected");
            }
        }
        Ok(Some((language, parsed)))
    }

    fn cancelled(&self, mut result: ParserResult, stage: Stage, started: Instant) -> ParserResult {
        let error = QuarryError::from(Cancelled);
        self.emit_stage_error(stage, "facade", &error);
        result.success = false;
        result
            .errors
            .push(ParseIssue::new(stage, "facade", &error));
        self.telemetry.emit(MetricRecord::ParseCompleted {
            language: result.classification.language.clone(),
            duration_us: started.elapsed().as_micros() as u64,
            matches: 0,
            success: false,
        });
        result
    }

    fn emit_stage_error(&self, stage: Stage, component: &str, error: &QuarryError) {
        self.telemetry.emit(MetricRecord::StageError {
            stage,
            component: component.to_string(),
            message: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{FileKind, ParserKind};

    #[test]
    fn resolve_prefers_custom_over_ast() {
        let parser = UnifiedParser::new();
        // json is served by both backends; custom wins
        let classification = quarry_language::classify(Path::new("x.json"), b"{}").unwrap();
        match parser.resolve(&classification) {
            Some(ResolvedBackend::Custom(lang)) => assert_eq!(lang.as_str(), "json"),
            _ => panic!("expected custom backend for json"),
        }
    }

    #[test]
    fn resolve_walks_fallbacks() {
        let parser = UnifiedParser::new();
        // a language with no backend of its own degrades via fallbacks
        let classification =
            quarry_language::classify(Path::new("Dockerfile"), b"FROM alpine\n").unwrap();
        assert_eq!(classification.parser_kind, ParserKind::None);
        match parser.resolve(&classification) {
            Some(ResolvedBackend::Custom(lang)) => assert_eq!(lang.as_str(), "plaintext"),
            _ => panic!("expected plaintext fallback"),
        }
    }

    #[test]
    fn named_but_unparseable_languages_parse_as_plaintext() {
        let parser = UnifiedParser::new();
        let options = crate::ParseOptions {
            include_ast: true,
            ..crate::ParseOptions::default()
        };
        let cases: [(&str, &[u8], &str); 4] = [
            ("Dockerfile", b"FROM alpine\nRUN echo hi\n", "dockerfile"),
            ("Makefile", b"all:\n\techo hi\n", "make"),
            ("CMakeLists.txt", b"project(demo)\n", "cmake"),
            ("go.mod", b"module demo\n\ngo 1.22\n", "gomod"),
        ];
        for (path, content, language) in cases {
            let result = parser.parse(path, content.to_vec(), &options);
            assert!(result.success, "{path}: {:?}", result.errors);
            assert_eq!(result.classification.language, LanguageId::new(language));
            assert_eq!(result.classification.parser_kind, ParserKind::None);
            // the plaintext fallback actually parsed the bytes
            let tree = result.tree.as_ref().expect("tree requested");
            assert_eq!(tree.root().kind, "document");
            assert!(tree.len() > 1, "{path}: parse must produce paragraphs");
            assert!(result.telemetry.patterns_run > 0, "{path}: patterns must run");
        }
    }

    #[test]
    fn classify_is_cached() {
        let parser = UnifiedParser::new();
        let a = parser.classify(Path::new("x.py"), b"def f(): pass\n").unwrap();
        let b = parser.classify(Path::new("x.py"), b"def f(): pass\n").unwrap();
        assert_eq!(a, b);
        assert!(parser.classification_cache.metrics().hits >= 1);
    }

    #[test]
    fn binary_units_short_circuit() {
        let parser = UnifiedParser::new();
        let result = parser.parse(
            "img.png",
            b"\x89PNG\r\n\x1a\nrest".to_vec(),
            &crate::ParseOptions::default(),
        );
        assert!(result.success);
        assert_eq!(result.classification.file_kind, FileKind::Binary);
        assert!(result.matches.is_empty());
        assert!(result.blocks.is_empty());
    }
}
