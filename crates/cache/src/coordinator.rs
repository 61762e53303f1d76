// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The process-wide cache registry.
//!
//! The coordinator is the one piece of state quarry allows at process scope.
//! It holds the named caches behind a narrow object-safe trait, serves bulk
//! invalidation (the file-watcher's purge path), and aggregates metrics for
//! monitors. Each bulk invalidation bumps an epoch; a `get` can never
//! observe a pre-invalidation value within the same epoch.

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::memory::{CacheMetrics, CacheWeight, MemoryCache};

/// Narrow capability surface the coordinator needs from a cache.
pub trait CoordinatedCache: Send + Sync {
    fn name(&self) -> &'static str;
    fn invalidate_key(&self, key: &str) -> usize;
    fn invalidate_matching(&self, prefix: &str) -> usize;
    fn clear(&self);
    fn metrics(&self) -> CacheMetrics;
}

impl<V: CacheWeight + Send + Sync> CoordinatedCache for MemoryCache<V> {
    fn name(&self) -> &'static str {
        MemoryCache::name(self)
    }

    fn invalidate_key(&self, key: &str) -> usize {
        self.invalidate(key)
    }

    fn invalidate_matching(&self, prefix: &str) -> usize {
        MemoryCache::invalidate_matching(self, prefix)
    }

    fn clear(&self) {
        MemoryCache::clear(self);
    }

    fn metrics(&self) -> CacheMetrics {
        MemoryCache::metrics(self)
    }
}

/// Aggregated view across all registered caches.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CoordinatorMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub resident_bytes: u64,
    pub per_cache: Vec<(String, CacheMetrics)>,
}

/// Registry of named caches with bulk invalidation and an epoch counter.
#[derive(Default)]
pub struct CacheCoordinator {
    caches: DashMap<&'static str, Arc<dyn CoordinatedCache>>,
    epoch: AtomicU64,
}

impl CacheCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cache under its own name. Re-registering a name replaces
    /// the previous cache.
    pub fn register(&self, cache: Arc<dyn CoordinatedCache>) {
        self.caches.insert(cache.name(), cache);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn CoordinatedCache>> {
        self.caches.get(name).map(|entry| entry.value().clone())
    }

    /// Invalidate every key starting with `prefix` in every cache. Returns
    /// the number of entries removed across all caches.
    pub fn invalidate(&self, prefix: &str) -> usize {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        let mut removed = 0;
        for entry in self.caches.iter() {
            removed += entry.value().invalidate_matching(prefix);
        }
        tracing::debug!(prefix, removed, "coordinator invalidation");
        removed
    }

    /// Invalidate one exact key across all caches.
    pub fn invalidate_key(&self, key: &str) -> usize {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.caches
            .iter()
            .map(|entry| entry.value().invalidate_key(key))
            .sum()
    }

    pub fn clear_all(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        for entry in self.caches.iter() {
            entry.value().clear();
        }
    }

    /// Monotonic counter bumped on every bulk operation.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn metrics(&self) -> CoordinatorMetrics {
        let mut aggregate = CoordinatorMetrics::default();
        for entry in self.caches.iter() {
            let metrics = entry.value().metrics();
            aggregate.hits += metrics.hits;
            aggregate.misses += metrics.misses;
            aggregate.evictions += metrics.evictions;
            aggregate.resident_bytes += metrics.resident_bytes;
            aggregate
                .per_cache
                .push(((*entry.key()).to_string(), metrics));
        }
        aggregate.per_cache.sort_by(|a, b| a.0.cmp(&b.0));
        aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::CachePolicy;

    fn string_cache(name: &'static str) -> Arc<MemoryCache<String>> {
        Arc::new(MemoryCache::new(name, CachePolicy::with_budget(4096)))
    }

    #[test]
    fn bulk_invalidation_spans_caches() {
        let coordinator = CacheCoordinator::new();
        let ast = string_cache("ast");
        let pattern = string_cache("pattern");
        coordinator.register(ast.clone());
        coordinator.register(pattern.clone());

        ast.set("src/main.rs:tree", "t".into(), None, &[]).unwrap();
        pattern
            .set("src/main.rs:py-function", "m".into(), None, &[])
            .unwrap();
        pattern.set("other.rs:py-function", "m".into(), None, &[]).unwrap();

        let before = coordinator.epoch();
        let removed = coordinator.invalidate("src/main.rs:");
        assert_eq!(removed, 2);
        assert_eq!(coordinator.epoch(), before + 1);
        assert!(pattern.has("other.rs:py-function"));
    }

    #[test]
    fn metrics_aggregate_across_caches() {
        let coordinator = CacheCoordinator::new();
        let ast = string_cache("ast");
        coordinator.register(ast.clone());
        ast.set("k", "v".into(), None, &[]).unwrap();
        let _ = ast.get("k");
        let _ = ast.get("missing");

        let metrics = coordinator.metrics();
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.per_cache.len(), 1);
    }

    #[test]
    fn reregistering_replaces() {
        let coordinator = CacheCoordinator::new();
        coordinator.register(string_cache("ast"));
        coordinator.register(string_cache("ast"));
        assert!(coordinator.get("ast").is_some());
        assert_eq!(coordinator.metrics().per_cache.len(), 1);
    }
}
