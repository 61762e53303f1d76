// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telemetry: per-pattern metrics, error audit, recovery statistics.
//!
//! Two layers. [`PatternMetrics`] travels inside each `ParserResult` and
//! describes that one call. The process-wide [`TelemetryHub`] aggregates
//! counters across calls and fans every [`MetricRecord`] out to subscribed
//! sinks (the external health monitor consumes these as opaque records).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::result::Stage;
use crate::source::LanguageId;

/// Recovery strategies, in the order the engine applies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy {
    FallbackPatterns,
    RegexFallback,
    PartialMatch,
}

impl RecoveryStrategy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStrategy::FallbackPatterns => "fallback_patterns",
            RecoveryStrategy::RegexFallback => "regex_fallback",
            RecoveryStrategy::PartialMatch => "partial_match",
        }
    }
}

/// Timing for one pattern invocation within a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternTiming {
    pub pattern_id: String,
    pub duration_us: u64,
    pub matches: usize,
    /// Which strategy produced the matches, when the primary run came up
    /// empty and recovery kicked in.
    pub recovery: Option<RecoveryStrategy>,
}

/// Per-call metrics embedded in the `ParserResult`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternMetrics {
    pub patterns_run: usize,
    pub matches_found: usize,
    pub recovered_patterns: usize,
    pub duration_us: u64,
    pub per_pattern: Vec<PatternTiming>,
}

impl PatternMetrics {
    pub fn record(&mut self, timing: PatternTiming) {
        self.patterns_run += 1;
        self.matches_found += timing.matches;
        if timing.recovery.is_some() {
            self.recovered_patterns += 1;
        }
        self.duration_us += timing.duration_us;
        self.per_pattern.push(timing);
    }
}

/// An opaque record delivered to subscribed sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricRecord {
    PatternRun {
        language: LanguageId,
        pattern_id: String,
        duration_us: u64,
        matches: usize,
    },
    RecoveryAttempt {
        language: LanguageId,
        pattern_id: String,
        strategy: RecoveryStrategy,
        succeeded: bool,
        duration_us: u64,
    },
    StageError {
        stage: Stage,
        component: String,
        message: String,
    },
    ParseCompleted {
        language: LanguageId,
        duration_us: u64,
        matches: usize,
        success: bool,
    },
}

/// Consumer of metric records. Implementations must be cheap; they are
/// invoked on the parse path.
pub trait MetricSink: Send + Sync {
    fn record(&self, record: &MetricRecord);
}

/// Aggregated counters since hub creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub parses: u64,
    pub pattern_runs: u64,
    pub recoveries_attempted: u64,
    pub recoveries_succeeded: u64,
    pub stage_errors: u64,
}

/// An entry in the bounded error audit ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub stage: Stage,
    pub component: String,
    pub message: String,
}

const AUDIT_CAPACITY: usize = 256;

/// Process-wide telemetry hub.
pub struct TelemetryHub {
    sinks: RwLock<Vec<Arc<dyn MetricSink>>>,
    audit: Mutex<VecDeque<AuditEntry>>,
    parses: AtomicU64,
    pattern_runs: AtomicU64,
    recoveries_attempted: AtomicU64,
    recoveries_succeeded: AtomicU64,
    stage_errors: AtomicU64,
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryHub {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sinks: RwLock::new(Vec::new()),
            audit: Mutex::new(VecDeque::with_capacity(AUDIT_CAPACITY)),
            parses: AtomicU64::new(0),
            pattern_runs: AtomicU64::new(0),
            recoveries_attempted: AtomicU64::new(0),
            recoveries_succeeded: AtomicU64::new(0),
            stage_errors: AtomicU64::new(0),
        }
    }

    /// Register a sink; it receives every record emitted from now on.
    pub fn subscribe(&self, sink: Arc<dyn MetricSink>) {
        if let Ok(mut sinks) = self.sinks.write() {
            sinks.push(sink);
        }
    }

    pub fn emit(&self, record: MetricRecord) {
        match &record {
            MetricRecord::PatternRun { .. } => {
                self.pattern_runs.fetch_add(1, Ordering::AcqRel);
            }
            MetricRecord::RecoveryAttempt { succeeded, .. } => {
                self.recoveries_attempted.fetch_add(1, Ordering::AcqRel);
                if *succeeded {
                    self.recoveries_succeeded.fetch_add(1, Ordering::AcqRel);
                }
            }
            MetricRecord::StageError {
                stage,
                component,
                message,
            } => {
                self.stage_errors.fetch_add(1, Ordering::AcqRel);
                if let Ok(mut audit) = self.audit.lock() {
                    if audit.len() == AUDIT_CAPACITY {
                        audit.pop_front();
                    }
                    audit.push_back(AuditEntry {
                        stage: *stage,
                        component: component.clone(),
                        message: message.clone(),
                    });
                }
            }
            MetricRecord::ParseCompleted { .. } => {
                self.parses.fetch_add(1, Ordering::AcqRel);
            }
        }
        if let Ok(sinks) = self.sinks.read() {
            for sink in sinks.iter() {
                sink.record(&record);
            }
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            parses: self.parses.load(Ordering::Acquire),
            pattern_runs: self.pattern_runs.load(Ordering::Acquire),
            recoveries_attempted: self.recoveries_attempted.load(Ordering::Acquire),
            recoveries_succeeded: self.recoveries_succeeded.load(Ordering::Acquire),
            stage_errors: self.stage_errors.load(Ordering::Acquire),
        }
    }

    /// Most recent stage errors, oldest first.
    #[must_use]
    pub fn recent_errors(&self) -> Vec<AuditEntry> {
        self.audit
            .lock()
            .map(|audit| audit.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collecting(Mutex<Vec<MetricRecord>>);

    impl MetricSink for Collecting {
        fn record(&self, record: &MetricRecord) {
            self.0.lock().unwrap().push(record.clone());
        }
    }

    #[test]
    fn counters_follow_records() {
        let hub = TelemetryHub::new();
        hub.emit(MetricRecord::PatternRun {
            language: LanguageId::new("python"),
            pattern_id: "py-function".into(),
            duration_us: 40,
            matches: 2,
        });
        hub.emit(MetricRecord::RecoveryAttempt {
            language: LanguageId::new("python"),
            pattern_id: "py-function".into(),
            strategy: RecoveryStrategy::RegexFallback,
            succeeded: true,
            duration_us: 15,
        });
        let snap = hub.snapshot();
        assert_eq!(snap.pattern_runs, 1);
        assert_eq!(snap.recoveries_attempted, 1);
        assert_eq!(snap.recoveries_succeeded, 1);
    }

    #[test]
    fn sinks_receive_every_record() {
        let hub = TelemetryHub::new();
        let sink = Arc::new(Collecting(Mutex::new(Vec::new())));
        hub.subscribe(sink.clone());
        hub.emit(MetricRecord::StageError {
            stage: Stage::Parse,
            component: "ast-backend".into(),
            message: "no grammar".into(),
        });
        assert_eq!(sink.0.lock().unwrap().len(), 1);
        assert_eq!(hub.recent_errors().len(), 1);
    }

    #[test]
    fn audit_ring_is_bounded() {
        let hub = TelemetryHub::new();
        for i in 0..AUDIT_CAPACITY + 10 {
            hub.emit(MetricRecord::StageError {
                stage: Stage::Cache,
                component: "coordinator".into(),
                message: format!("err {i}"),
            });
        }
        let errors = hub.recent_errors();
        assert_eq!(errors.len(), AUDIT_CAPACITY);
        assert_eq!(errors.last().unwrap().message, format!("err {}", AUDIT_CAPACITY + 9));
    }

    #[test]
    fn pattern_metrics_accumulate() {
        let mut metrics = PatternMetrics::default();
        metrics.record(PatternTiming {
            pattern_id: "a".into(),
            duration_us: 10,
            matches: 3,
            recovery: None,
        });
        metrics.record(PatternTiming {
            pattern_id: "b".into(),
            duration_us: 5,
            matches: 1,
            recovery: Some(RecoveryStrategy::PartialMatch),
        });
        assert_eq!(metrics.patterns_run, 2);
        assert_eq!(metrics.matches_found, 4);
        assert_eq!(metrics.recovered_patterns, 1);
        assert_eq!(metrics.duration_us, 15);
    }
}
