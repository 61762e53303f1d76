// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod hashing;

pub use hashing::{
    ContentDigest, RapidMap, RapidSet, content_digest, hash_bytes, hash_bytes_with_seed,
    map_with_capacity, set_with_capacity,
};

mod scan;
pub use scan::{find_nul, printable_ratio};
