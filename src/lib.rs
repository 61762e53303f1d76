// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quarry - a language-agnostic parsing and pattern extraction engine.
//!
//! This is the main library crate that re-exports functionality from the
//! component crates in the workspace.

// Re-export core data model
pub use quarry_core as core;

// Re-export other major components
pub use quarry_cache as cache;
pub use quarry_engine as engine;
pub use quarry_language as language;
pub use quarry_parse as parse;
pub use quarry_services as services;
pub use quarry_utils as utils;

// The facade most hosts need
pub use quarry_services::{ParseOptions, UnifiedParser};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn facade_is_reachable_from_the_root() {
        let parser = crate::UnifiedParser::new();
        let result = parser.parse(
            "hello.py",
            b"def hello(): pass\n".to_vec(),
            &crate::ParseOptions::default(),
        );
        assert!(result.success);
    }
}
