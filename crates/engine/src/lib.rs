// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The pattern engine.
//!
//! [`PatternRegistry`] lazily compiles per-language pattern sets behind a
//! singleflight slot; [`PatternEngine`] evaluates compiled patterns over a
//! parsed unit and orchestrates the three recovery strategies;
//! [`BlockExtractor`] materializes coherent source regions;
//! [`FeatureExtractor`] folds matches into categorized feature sets.

pub mod blocks;
pub mod builtin;
pub mod engine;
pub mod features;
pub mod registry;

mod workers;

pub use blocks::BlockExtractor;
pub use engine::{EngineContext, MatchList, PatternEngine, PatternOutcome};
pub use features::FeatureExtractor;
pub use registry::{CompiledForm, CompiledPattern, LanguagePatterns, PatternRegistry};
pub use workers::worker_pool;
