// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language identification for quarry.
//!
//! Four classification stages, earlier stages dominating later ones:
//! exact filename, extension, shebang/magic bytes, content heuristics.
//! Binary detection short-circuits everything. The crate also owns the
//! closed alias table and the tree-sitter grammar registry the AST backend
//! resolves against.

mod alias;
mod classifier;
mod grammars;
mod matcher;
mod tables;

pub use alias::normalize;
pub use classifier::{classify, classify_unit};
pub use grammars::{grammar, grammar_abi_version, has_grammar};
pub use matcher::match_extension;
pub use tables::{default_fallbacks, file_kind_for, has_custom_format, parser_kind_for};
