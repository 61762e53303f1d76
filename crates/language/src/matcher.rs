// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extension matching over the classification tables.
//!
//! Two stages, combined by [`match_extension`]:
//!
//! 1. Character-based bucketing: the first character of the candidate
//!    extension selects a small bucket of `(extension, language)` pairs,
//!    giving O(1) first-level filtering for the common case.
//! 2. An Aho-Corasick automaton over every known extension, lower-cased,
//!    with `LeftmostLongest` so `tsx` beats `ts`. Matches must span the
//!    entire candidate; substring hits are ignored.
//!
//! Both stages walk the tables in declaration order, so ambiguous
//! extensions resolve to the first table entry, deterministically.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use std::sync::LazyLock;

use quarry_core::LanguageId;
use quarry_utils::RapidMap;

use crate::tables::EXTENSIONS;

/// First character of an extension → `(extension, language)` candidates.
static CHAR_BUCKETS: LazyLock<RapidMap<char, Vec<(&'static str, &'static str)>>> =
    LazyLock::new(|| {
        let mut buckets: RapidMap<char, Vec<(&'static str, &'static str)>> = RapidMap::default();
        for (language, extensions) in EXTENSIONS {
            for ext in *extensions {
                if let Some(first) = ext.chars().next() {
                    buckets
                        .entry(first.to_ascii_lowercase())
                        .or_default()
                        .push((ext, language));
                }
            }
        }
        buckets
    });

static AUTOMATON: LazyLock<(AhoCorasick, Vec<&'static str>)> = LazyLock::new(|| {
    let mut patterns = Vec::new();
    let mut languages = Vec::new();
    for (language, extensions) in EXTENSIONS {
        for ext in *extensions {
            patterns.push(ext.to_ascii_lowercase());
            languages.push(*language);
        }
    }
    let automaton = AhoCorasickBuilder::new()
        .match_kind(MatchKind::LeftmostLongest)
        .build(&patterns)
        .expect("extension automaton construction cannot fail on a static table");
    (automaton, languages)
});

/// First-level filter: candidates sharing the extension's first character.
fn match_by_char_bucket(ext: &str) -> Option<LanguageId> {
    let first = ext.chars().next()?.to_ascii_lowercase();
    let candidates = CHAR_BUCKETS.get(&first)?;
    candidates
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
        .map(|(_, language)| LanguageId::new(language))
}

/// Automaton pass over every known extension simultaneously.
fn match_by_aho_corasick(ext: &str) -> Option<LanguageId> {
    let (automaton, languages) = &*AUTOMATON;
    let lowered = ext.to_ascii_lowercase();
    automaton
        .find_iter(&lowered)
        .find(|m| m.start() == 0 && m.end() == lowered.len())
        .map(|m| LanguageId::new(languages[m.pattern().as_usize()]))
}

/// Resolve a file extension (without the dot) to a language: the char
/// bucket handles the common case, the automaton catches the rest.
#[must_use]
pub fn match_extension(ext: &str) -> Option<LanguageId> {
    if ext.is_empty() {
        return None;
    }
    match_by_char_bucket(ext).or_else(|| match_by_aho_corasick(ext))
}
