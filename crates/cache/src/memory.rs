// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A memory-bounded LRU cache with per-entry TTL and dependency tracking.
//!
//! The byte budget is enforced at insertion: an entry larger than the whole
//! budget is rejected outright ([`CacheError::Oversize`], which callers
//! treat as a miss), otherwise least-recently-used entries are evicted until
//! the cache holds at most `budget + size_of_inserted_entry` bytes. Expiry
//! is lazy: an entry past its TTL is dropped on the `get` that finds it.
//!
//! Dependencies form a reverse index: invalidating a key transitively
//! invalidates everything that declared it as a dependency, with traversal
//! depth bounded so that accidental cycles cannot spin.

use lru::LruCache;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use quarry_core::CacheError;
use quarry_utils::{RapidMap, RapidSet};

/// Maximum depth of transitive dependency traversal.
const DEP_TRAVERSAL_LIMIT: usize = 64;

/// Values stored in a [`MemoryCache`] report their own weight.
pub trait CacheWeight {
    fn size_bytes(&self) -> usize;
}

impl CacheWeight for String {
    fn size_bytes(&self) -> usize {
        self.len()
    }
}

impl CacheWeight for Vec<u8> {
    fn size_bytes(&self) -> usize {
        self.len()
    }
}

impl<T: CacheWeight> CacheWeight for std::sync::Arc<T> {
    fn size_bytes(&self) -> usize {
        self.as_ref().size_bytes()
    }
}

impl CacheWeight for quarry_core::Classification {
    fn size_bytes(&self) -> usize {
        64 + self.language.as_str().len()
            + self
                .fallbacks
                .iter()
                .map(|f| f.as_str().len() + 8)
                .sum::<usize>()
    }
}

/// Budget and TTL policy for one named cache.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub budget_bytes: usize,
    pub default_ttl: Option<Duration>,
    /// When set, the effective TTL of an entry is its base TTL times a
    /// factor in `[0.5, 4.0]` derived from the entry's access frequency.
    pub adaptive_ttl: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            budget_bytes: 32 * 1024 * 1024,
            default_ttl: Some(Duration::from_secs(300)),
            adaptive_ttl: false,
        }
    }
}

impl CachePolicy {
    #[must_use]
    pub fn with_budget(budget_bytes: usize) -> Self {
        Self {
            budget_bytes,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn no_ttl(mut self) -> Self {
        self.default_ttl = None;
        self
    }

    #[must_use]
    pub fn adaptive(mut self) -> Self {
        self.adaptive_ttl = true;
        self
    }
}

struct Entry<V> {
    value: std::sync::Arc<V>,
    size_bytes: usize,
    inserted_at: Instant,
    last_access: Instant,
    access_count: u64,
    ttl: Option<Duration>,
    deps: Vec<String>,
}

impl<V> Entry<V> {
    /// Adaptive factor: entries touched often live longer, cold entries
    /// decay faster. Clamped to `[0.5, 4.0]`.
    fn ttl_factor(&self, now: Instant) -> f64 {
        let age_secs = now.duration_since(self.inserted_at).as_secs_f64().max(1.0);
        let per_minute = self.access_count as f64 * 60.0 / age_secs;
        (per_minute / 4.0).clamp(0.5, 4.0)
    }

    fn is_expired(&self, now: Instant, adaptive: bool) -> bool {
        let Some(ttl) = self.ttl else { return false };
        let effective = if adaptive {
            ttl.mul_f64(self.ttl_factor(now))
        } else {
            ttl
        };
        now.duration_since(self.last_access) > effective
    }
}

struct CacheState<V> {
    entries: LruCache<String, Entry<V>>,
    resident_bytes: usize,
    /// dep key -> keys that depend on it
    dependents: RapidMap<String, RapidSet<String>>,
}

/// Counter snapshot for one cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub resident_bytes: u64,
    pub entries: u64,
}

/// A named, byte-budgeted LRU cache. All operations are serialized under a
/// cache-local lock; the value type decides its own weight.
pub struct MemoryCache<V> {
    name: &'static str,
    policy: CachePolicy,
    state: Mutex<CacheState<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl<V: CacheWeight> MemoryCache<V> {
    #[must_use]
    pub fn new(name: &'static str, policy: CachePolicy) -> Self {
        Self {
            name,
            policy,
            state: Mutex::new(CacheState {
                entries: LruCache::unbounded(),
                resident_bytes: 0,
                dependents: RapidMap::default(),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fetch a value, refreshing its recency and access statistics.
    pub fn get(&self, key: &str) -> Option<std::sync::Arc<V>> {
        let now = Instant::now();
        let mut state = self.state.lock().ok()?;
        let expired = match state.entries.get(key) {
            None => {
                self.misses.fetch_add(1, Ordering::AcqRel);
                return None;
            }
            Some(entry) => entry.is_expired(now, self.policy.adaptive_ttl),
        };
        if expired {
            Self::remove_entry(&mut state, key);
            self.expirations.fetch_add(1, Ordering::AcqRel);
            self.misses.fetch_add(1, Ordering::AcqRel);
            return None;
        }
        let entry = state.entries.get_mut(key)?;
        entry.last_access = now;
        entry.access_count += 1;
        self.hits.fetch_add(1, Ordering::AcqRel);
        Some(entry.value.clone())
    }

    /// Insert a value. Evicts least-recently-used entries so that resident
    /// bytes stay within `budget + size` of this entry; rejects entries
    /// larger than the whole budget.
    pub fn set(
        &self,
        key: &str,
        value: V,
        ttl: Option<Duration>,
        deps: &[String],
    ) -> Result<(), CacheError> {
        let size = value.size_bytes();
        if size > self.policy.budget_bytes {
            tracing::debug!(cache = self.name, key, size, "rejecting oversize entry");
            return Err(CacheError::Oversize {
                size,
                budget: self.policy.budget_bytes,
            });
        }
        let now = Instant::now();
        let Ok(mut state) = self.state.lock() else {
            return Err(CacheError::CorruptEntry(key.to_string()));
        };
        if state.entries.contains(key) {
            Self::remove_entry(&mut state, key);
        }
        for dep in deps {
            state
                .dependents
                .entry(dep.clone())
                .or_default()
                .insert(key.to_string());
        }
        state.entries.push(
            key.to_string(),
            Entry {
                value: std::sync::Arc::new(value),
                size_bytes: size,
                inserted_at: now,
                last_access: now,
                access_count: 0,
                ttl: ttl.or(self.policy.default_ttl),
                deps: deps.to_vec(),
            },
        );
        state.resident_bytes += size;

        // The freshly pushed key is most-recent, so pop_lru cannot hit it
        // while anything else remains.
        while state.resident_bytes > self.policy.budget_bytes + size && state.entries.len() > 1 {
            if let Some((evicted_key, evicted)) = state.entries.pop_lru() {
                state.resident_bytes -= evicted.size_bytes;
                Self::unlink_deps(&mut state.dependents, &evicted_key, &evicted.deps);
                self.evictions.fetch_add(1, Ordering::AcqRel);
            } else {
                break;
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.state
            .lock()
            .is_ok_and(|state| state.entries.contains(key))
    }

    /// Invalidate `key` and, transitively, everything depending on it.
    /// Returns the number of entries removed.
    pub fn invalidate(&self, key: &str) -> usize {
        let Ok(mut state) = self.state.lock() else {
            return 0;
        };
        Self::invalidate_closure(&mut state, std::iter::once(key.to_string()))
    }

    /// Invalidate all keys starting with `prefix` (and their dependents).
    pub fn invalidate_matching(&self, prefix: &str) -> usize {
        let Ok(mut state) = self.state.lock() else {
            return 0;
        };
        let seeds: Vec<String> = state
            .entries
            .iter()
            .map(|(k, _)| k.clone())
            .filter(|k| k.starts_with(prefix))
            .collect();
        Self::invalidate_closure(&mut state, seeds.into_iter())
    }

    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.entries.clear();
            state.dependents.clear();
            state.resident_bytes = 0;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().map_or(0, |state| state.entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn resident_bytes(&self) -> usize {
        self.state.lock().map_or(0, |state| state.resident_bytes)
    }

    #[must_use]
    pub fn metrics(&self) -> CacheMetrics {
        let (resident, entries) = self
            .state
            .lock()
            .map_or((0, 0), |s| (s.resident_bytes as u64, s.entries.len() as u64));
        CacheMetrics {
            hits: self.hits.load(Ordering::Acquire),
            misses: self.misses.load(Ordering::Acquire),
            evictions: self.evictions.load(Ordering::Acquire),
            expirations: self.expirations.load(Ordering::Acquire),
            resident_bytes: resident,
            entries,
        }
    }

    /// Breadth-first closure over the reverse dependency index, bounded to
    /// [`DEP_TRAVERSAL_LIMIT`] levels so cycles terminate.
    fn invalidate_closure(
        state: &mut CacheState<V>,
        seeds: impl Iterator<Item = String>,
    ) -> usize {
        let mut frontier: Vec<String> = seeds.collect();
        let mut visited: RapidSet<String> = RapidSet::default();
        let mut removed = 0;
        let mut depth = 0;
        while !frontier.is_empty() && depth < DEP_TRAVERSAL_LIMIT {
            let mut next = Vec::new();
            for key in frontier.drain(..) {
                if !visited.insert(key.clone()) {
                    continue;
                }
                if Self::remove_entry(state, &key) {
                    removed += 1;
                }
                if let Some(dependents) = state.dependents.remove(&key) {
                    next.extend(dependents);
                }
            }
            frontier = next;
            depth += 1;
        }
        removed
    }

    fn remove_entry(state: &mut CacheState<V>, key: &str) -> bool {
        if let Some(entry) = state.entries.pop(key) {
            state.resident_bytes -= entry.size_bytes;
            Self::unlink_deps(&mut state.dependents, key, &entry.deps);
            true
        } else {
            false
        }
    }

    fn unlink_deps(
        dependents: &mut RapidMap<String, RapidSet<String>>,
        key: &str,
        deps: &[String],
    ) {
        for dep in deps {
            if let Some(set) = dependents.get_mut(dep) {
                set.remove(key);
                if set.is_empty() {
                    dependents.remove(dep);
                }
            }
        }
    }
}
