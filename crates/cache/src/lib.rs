// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-tier caching for the parse pipeline.
//!
//! The persistent tier is a set of named, memory-bounded LRU caches
//! (`ast`, `pattern`, `classification`) registered with a process-wide
//! [`CacheCoordinator`]. The request tier is a [`RequestCache`] created per
//! top-level parse and discarded on return; it has no TTL, no eviction, and
//! no visibility across concurrent calls.

mod coordinator;
mod memory;
mod request;

pub use coordinator::{CacheCoordinator, CoordinatedCache, CoordinatorMetrics};
pub use memory::{CacheMetrics, CachePolicy, CacheWeight, MemoryCache};
pub use request::RequestCache;

/// Conventional names for the persistent caches.
pub const AST_CACHE: &str = "ast";
pub const PATTERN_CACHE: &str = "pattern";
pub const CLASSIFICATION_CACHE: &str = "classification";

/// Version stamp for hosts that wire an on-disk store behind the named
/// caches. Entries written under a different version are ignored on load;
/// pair this with the grammar ABI version from the language crate.
pub const CACHE_FORMAT_VERSION: u32 = 1;
