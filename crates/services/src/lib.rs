// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The unified parser facade.
//!
//! One entry point, one options record: classify, select a backend, parse,
//! run patterns, resolve blocks, categorize features, emit telemetry, and
//! return a [`quarry_core::ParserResult`] — always. No error escapes the
//! facade; failures degrade the result instead.

mod options;
mod parser;

pub use options::ParseOptions;
pub use parser::{UnifiedParser, UnifiedParserBuilder};
