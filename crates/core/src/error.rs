// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy.
//!
//! Errors are data here: subcomponents signal failure by returning one of
//! these kinds, never by unwinding through the facade. The facade folds
//! whatever it observes into `ParserResult.errors` and keeps going
//! best-effort, except for cancellation which is always terminal.

use thiserror::Error;

use crate::source::LanguageId;

/// Classification could not determine basic properties of the input.
#[derive(Debug, Clone, Error)]
pub enum ClassifyError {
    #[error("unreadable input prefix: {0}")]
    Unreadable(String),
}

/// A parser backend could not serve the request.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("no grammar loaded for language `{0}`")]
    Unavailable(LanguageId),

    #[error("grammar for `{language}` has ABI version {actual}, expected {expected}")]
    GrammarVersionMismatch {
        language: LanguageId,
        expected: usize,
        actual: usize,
    },
}

/// A pattern could not be compiled or is malformed.
#[derive(Debug, Clone, Error)]
pub enum PatternError {
    #[error("pattern `{id}` failed to compile: {reason}")]
    CompilationFailed { id: String, reason: String },

    #[error("pattern `{id}` has an invalid spec: {reason}")]
    InvalidSpec { id: String, reason: String },
}

/// Recovery ran and produced nothing usable. Non-fatal.
#[derive(Debug, Clone, Error)]
pub enum RecoveryError {
    #[error("all recovery strategies failed for pattern `{0}`")]
    AllStrategiesFailed(String),

    #[error("recovery strategy `{strategy}` exceeded its {budget_ms}ms budget")]
    Timeout {
        strategy: &'static str,
        budget_ms: u64,
    },
}

/// Cache-level failures; callers treat these as a miss.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("entry of {size} bytes exceeds the cache budget of {budget} bytes")]
    Oversize { size: usize, budget: usize },

    #[error("corrupt cache entry for key `{0}`")]
    CorruptEntry(String),
}

/// The per-call deadline elapsed. Always terminal, always caller-visible.
#[derive(Debug, Clone, Copy, Error)]
#[error("operation cancelled: deadline elapsed")]
pub struct Cancelled;

/// Umbrella error composing the taxonomy.
#[derive(Debug, Clone, Error)]
pub enum QuarryError {
    #[error("classification: {0}")]
    Classify(#[from] ClassifyError),

    #[error("backend: {0}")]
    Backend(#[from] BackendError),

    #[error("pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("recovery: {0}")]
    Recovery(#[from] RecoveryError),

    #[error("cache: {0}")]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

pub type Result<T> = std::result::Result<T, QuarryError>;

impl QuarryError {
    /// Whether this error terminates the call rather than degrading it.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuarryError::Cancelled(_) | QuarryError::Classify(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = QuarryError::from(BackendError::Unavailable(LanguageId::new("zig")));
        assert_eq!(err.to_string(), "backend: no grammar loaded for language `zig`");
    }

    #[test]
    fn terminality_split() {
        assert!(QuarryError::from(Cancelled).is_terminal());
        assert!(
            !QuarryError::from(CacheError::Oversize {
                size: 10,
                budget: 1
            })
            .is_terminal()
        );
    }
}
