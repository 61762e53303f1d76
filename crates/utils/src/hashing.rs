// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hash map, set, and content-digest utilities.
//!
//! Quarry uses [`rapidhash::RapidHashMap`] and [`rapidhash::RapidHashSet`] as
//! stand-ins for `std::collections::HashMap`/`HashSet` (they ARE the std
//! collections, just with the [`rapidhash::fast::RandomState`] hash builder).
//! For quarry's workloads the hasher is very fast and sufficiently collision
//! resistant; nothing here is cryptographic and nothing needs to be.
//!
//! Content digests are a different animal: they key persistent caches, so
//! they must be stable across runs and seeds. [`content_digest`] therefore
//! uses the unseeded rapidhash v3 of the bytes plus the byte length, rendered
//! as fixed-width hex.

use rapidhash::fast::RandomState;

/// A type alias for [`rapidhash::RapidHashMap`].
pub type RapidMap<K, V> = rapidhash::RapidHashMap<K, V>;
/// A type alias for [`rapidhash::RapidHashSet`].
pub type RapidSet<T> = rapidhash::RapidHashSet<T>;

/// Creates a new `RapidMap` with the specified capacity.
#[inline(always)]
#[must_use]
pub fn map_with_capacity<K, V>(capacity: usize) -> RapidMap<K, V>
where
    K: std::hash::Hash + Eq,
{
    RapidMap::with_capacity_and_hasher(capacity, RandomState::default())
}

/// Creates a new `RapidSet` with the specified capacity.
#[inline(always)]
#[must_use]
pub fn set_with_capacity<T>(capacity: usize) -> RapidSet<T>
where
    T: std::hash::Hash + Eq,
{
    RapidSet::with_capacity_and_hasher(capacity, RandomState::default())
}

/// Computes an unseeded hash for a byte slice using `rapidhash`.
#[inline(always)]
#[must_use]
pub const fn hash_bytes(bytes: &[u8]) -> u64 {
    rapidhash::v3::rapidhash_v3(bytes)
}

/// Computes a hash for a byte slice using `rapidhash` with a specified seed.
#[inline(always)]
#[must_use]
pub const fn hash_bytes_with_seed(bytes: &[u8], seed: u64) -> u64 {
    let secrets = rapidhash::v3::RapidSecrets::seed(seed);
    rapidhash::v3::rapidhash_v3_seeded(bytes, &secrets)
}

/// A stable digest of source bytes, suitable as a persistent cache key
/// component. Stable across runs, processes, and threads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest(String);

impl ContentDigest {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest source bytes for cache keying. Length is mixed in so that a
/// truncated prefix never collides with the full content.
#[must_use]
pub fn content_digest(bytes: &[u8]) -> ContentDigest {
    let h = hash_bytes(bytes);
    ContentDigest(format!("{h:016x}-{:x}", bytes.len()))
}
