// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request-scoped memoization.
//!
//! Created by the unified parser at the start of each top-level call and
//! dropped on return. No TTL, no eviction, no sharing between concurrent
//! calls; the internal mutex only serializes the fan-out of pattern
//! evaluations inside one call.

use std::any::Any;
use std::sync::{Arc, Mutex};

use quarry_utils::RapidMap;

type Slot = Arc<dyn Any + Send + Sync>;

/// Per-call cache with type-erased slots.
#[derive(Default)]
pub struct RequestCache {
    enabled: bool,
    slots: Mutex<RapidMap<String, Slot>>,
}

impl RequestCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            slots: Mutex::new(RapidMap::default()),
        }
    }

    /// A cache that silently drops everything; used when the caller turned
    /// request caching off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            slots: Mutex::new(RapidMap::default()),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        if !self.enabled {
            return None;
        }
        let slots = self.slots.lock().ok()?;
        slots.get(key).and_then(|slot| slot.clone().downcast::<T>().ok())
    }

    pub fn set<T: Send + Sync + 'static>(&self, key: &str, value: Arc<T>) {
        if !self.enabled {
            return;
        }
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_string(), value);
        }
    }

    pub fn delete(&self, key: &str) -> bool {
        self.slots
            .lock()
            .is_ok_and(|mut slots| slots.remove(key).is_some())
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.enabled
            && self
                .slots
                .lock()
                .is_ok_and(|slots| slots.contains_key(key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().map_or(0, |slots| slots.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
