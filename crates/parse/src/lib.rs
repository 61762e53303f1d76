// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parser backends.
//!
//! Two backends, one contract: both produce the normalized
//! [`quarry_core::ParseTree`] so everything downstream (pattern engine,
//! block extractor, feature extractor) is backend-agnostic. The AST backend
//! additionally keeps the concrete tree-sitter tree alive so compiled
//! queries can run against it.

pub mod ast;
pub mod custom;

mod convert;

pub use ast::{AstBackend, QueryCapture, QueryHit};
pub use custom::{CustomBackend, CustomParser};

use quarry_cache::CacheWeight;
use quarry_core::{LanguageId, ParseTree};

/// Which backend produced a parsed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Ast,
    Custom,
}

/// A parsed source unit: the normalized tree plus, for the AST backend, the
/// concrete tree queries run against. The source bytes are not retained;
/// spans index into the caller's `SourceUnit`.
pub struct ParsedUnit {
    pub language: LanguageId,
    pub backend: BackendKind,
    pub tree: ParseTree,
    ts_tree: Option<tree_sitter::Tree>,
}

impl ParsedUnit {
    #[must_use]
    pub fn custom(language: LanguageId, tree: ParseTree) -> Self {
        Self {
            language,
            backend: BackendKind::Custom,
            tree,
            ts_tree: None,
        }
    }

    #[must_use]
    pub fn ast(language: LanguageId, tree: ParseTree, ts_tree: tree_sitter::Tree) -> Self {
        Self {
            language,
            backend: BackendKind::Ast,
            tree,
            ts_tree: Some(ts_tree),
        }
    }

    /// The concrete tree, present only for AST-backend units.
    #[must_use]
    pub fn ts_tree(&self) -> Option<&tree_sitter::Tree> {
        self.ts_tree.as_ref()
    }
}

impl std::fmt::Debug for ParsedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedUnit")
            .field("language", &self.language)
            .field("backend", &self.backend)
            .field("nodes", &self.tree.len())
            .finish_non_exhaustive()
    }
}

impl CacheWeight for ParsedUnit {
    fn size_bytes(&self) -> usize {
        // The concrete tree's footprint is not observable; approximate with
        // a per-node constant that tracks tree-sitter's node size.
        let arena = self.tree.len() * std::mem::size_of::<quarry_core::TreeNode>();
        let concrete = if self.ts_tree.is_some() {
            self.tree.len() * 32
        } else {
            0
        };
        arena + concrete
    }
}
