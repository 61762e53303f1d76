// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cooperative cancellation.
//!
//! A [`Deadline`] is copied into every stage of a call; stages poll it at
//! their boundaries and before each pattern invocation. There is no
//! interruption, only observation, so no partial state can escape into
//! shared caches on cancellation.

use std::time::{Duration, Instant};

use crate::error::Cancelled;

/// Per-call deadline token. `Default` is unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A deadline that never expires.
    #[must_use]
    pub const fn none() -> Self {
        Self { at: None }
    }

    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Some(Instant::now() + timeout),
        }
    }

    #[must_use]
    pub fn after_ms(ms: u64) -> Self {
        Self::after(Duration::from_millis(ms))
    }

    #[must_use]
    pub fn expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Poll the deadline; `Err(Cancelled)` once elapsed.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.expired() { Err(Cancelled) } else { Ok(()) }
    }

    /// Remaining time, if bounded. Zero once expired.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// The tighter of this deadline and `timeout` from now. Used to fold a
    /// per-strategy budget into the call deadline.
    #[must_use]
    pub fn tightened(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        Self {
            at: Some(self.at.map_or(candidate, |at| at.min(candidate))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_never_expires() {
        let d = Deadline::none();
        assert!(!d.expired());
        assert!(d.check().is_ok());
        assert!(d.remaining().is_none());
    }

    #[test]
    fn zero_timeout_expires_immediately() {
        let d = Deadline::after(Duration::from_millis(0));
        assert!(d.expired());
        assert!(d.check().is_err());
    }

    #[test]
    fn tightened_takes_the_minimum() {
        let loose = Deadline::after(Duration::from_secs(60));
        let tight = loose.tightened(Duration::from_millis(0));
        assert!(tight.expired());
        assert!(!loose.expired());
    }
}
