// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The bounded worker pool for fan-out inside a single call.

use std::sync::LazyLock;

static POOL: LazyLock<rayon::ThreadPool> = LazyLock::new(|| {
    let threads = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
        .min(4);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("quarry-worker-{i}"))
        .build()
        .expect("worker pool construction cannot fail with a static configuration")
});

/// Process-wide pool, bounded at `min(4, hardware_concurrency)`. Pattern
/// evaluations for one tree fan out here; everything else stays on the
/// caller's thread.
pub fn worker_pool() -> &'static rayon::ThreadPool {
    &POOL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_is_bounded() {
        assert!(worker_pool().current_num_threads() <= 4);
        assert!(worker_pool().current_num_threads() >= 1);
    }
}
