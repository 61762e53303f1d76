// SPDX-FileCopyrightText: 2025 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The file classifier.
//!
//! Stage order, earlier stages dominating later ones:
//!
//! 1. binary detection (extension table, magic bytes, NUL byte, histogram)
//! 2. exact filename table (confidence 1.0)
//! 3. extension table (0.9)
//! 4. shebang (0.85)
//! 5. content heuristics (0.6)
//! 6. plaintext fallback (0.0)
//!
//! Classification is pure over `(path, prefix)`: same inputs, same result,
//! across runs and threads.

use std::path::Path;

use quarry_core::{Classification, ClassifyError, FileKind, LanguageId, ParserKind, SourceUnit};
use quarry_utils::{find_nul, printable_ratio};

use crate::alias::normalize;
use crate::matcher::match_extension;
use crate::tables::{
    BINARY_EXTENSIONS, FILENAMES, MAGIC_BINARY, SHEBANGS, default_fallbacks, file_kind_for,
    parser_kind_for,
};

/// Prefix fraction of printable bytes below which content is binary.
const MIN_PRINTABLE_RATIO: f64 = 0.70;

/// Classify a source unit, honoring a caller-declared language when present.
pub fn classify_unit(unit: &SourceUnit) -> Result<Classification, ClassifyError> {
    let sniffed = classify(unit.path(), unit.sniff_prefix())?;
    let Some(declared) = unit.declared_language() else {
        return Ok(sniffed);
    };
    if sniffed.file_kind == FileKind::Binary {
        return Ok(sniffed);
    }
    let language = normalize(declared.as_str());
    if language == sniffed.language {
        return Ok(Classification {
            confidence: 1.0,
            ..sniffed
        });
    }
    // The declaration wins; the sniffed result becomes the first fallback.
    let mut fallbacks = vec![sniffed.language.clone()];
    fallbacks.extend(default_fallbacks(&language));
    fallbacks.dedup();
    Ok(Classification {
        parser_kind: parser_kind_for(&language),
        file_kind: file_kind_for(&language),
        language,
        confidence: 1.0,
        fallbacks,
    })
}

/// Classify from path plus a sniffed prefix (at most 64 KiB is examined).
pub fn classify(path: &Path, prefix: &[u8]) -> Result<Classification, ClassifyError> {
    let prefix = &prefix[..prefix.len().min(quarry_core::SNIFF_LIMIT)];

    if is_binary(path, prefix) {
        return Ok(Classification::binary());
    }

    if let Some((language, confidence)) = sniff_language(path, prefix) {
        return Ok(build(language, confidence));
    }

    Ok(Classification::plaintext_fallback())
}

fn sniff_language(path: &Path, prefix: &[u8]) -> Option<(LanguageId, f32)> {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        if let Some((_, language)) = FILENAMES.iter().find(|(filename, _)| *filename == name) {
            return Some((normalize(language), 1.0));
        }
    }

    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if let Some(language) = match_extension(ext) {
            return Some((normalize(language.as_str()), 0.9));
        }
    }

    if let Some(language) = sniff_shebang(prefix) {
        return Some((language, 0.85));
    }

    if let Some(language) = sniff_content(prefix) {
        return Some((language, 0.6));
    }

    None
}

fn build(language: LanguageId, confidence: f32) -> Classification {
    Classification {
        parser_kind: parser_kind_for(&language),
        file_kind: file_kind_for(&language),
        fallbacks: default_fallbacks(&language),
        language,
        confidence,
    }
}

fn is_binary(path: &Path, prefix: &[u8]) -> bool {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let lowered = ext.to_ascii_lowercase();
        if BINARY_EXTENSIONS.contains(&lowered.as_str()) {
            return true;
        }
    }
    if MAGIC_BINARY.iter().any(|magic| prefix.starts_with(magic)) {
        return true;
    }
    if find_nul(prefix).is_some() {
        return true;
    }
    !prefix.is_empty() && printable_ratio(prefix) < MIN_PRINTABLE_RATIO
}

fn sniff_shebang(prefix: &[u8]) -> Option<LanguageId> {
    let text = first_line(prefix)?;
    let rest = text.strip_prefix("#!")?;
    let mut tokens = rest.split_whitespace();
    let mut interpreter = Path::new(tokens.next()?)
        .file_name()?
        .to_str()?;
    if interpreter == "env" {
        interpreter = tokens.next()?;
    }
    SHEBANGS
        .iter()
        .find(|(name, _)| interpreter.starts_with(name))
        .map(|(_, language)| normalize(language))
}

fn sniff_content(prefix: &[u8]) -> Option<LanguageId> {
    let window = &prefix[..prefix.len().min(4096)];
    let text = match std::str::from_utf8(window) {
        Ok(text) => text,
        // a multi-byte sequence may straddle the window edge
        Err(e) => std::str::from_utf8(&window[..e.valid_up_to()]).ok()?,
    };
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();

    if trimmed.starts_with("<?xml") || trimmed.starts_with("<!DOCTYPE") {
        return Some(normalize("xml"));
    }
    if trimmed.starts_with('{') {
        return Some(normalize("json"));
    }
    let first = trimmed.lines().next().unwrap_or("").trim_end();
    // A bare "[section]" header is INI/TOML territory, handled below.
    if trimmed.starts_with('[') && !looks_like_section_header(first) {
        return Some(normalize("json"));
    }
    let lines: Vec<&str> = text.lines().take(64).collect();
    let has_table_header = lines.iter().any(|l| looks_like_section_header(l.trim()));
    let has_assignment = lines
        .iter()
        .any(|l| l.contains(" = ") && !l.trim_start().starts_with('#'));
    if has_table_header && has_assignment {
        return Some(normalize("toml"));
    }
    if has_table_header {
        return Some(normalize("ini"));
    }
    if lines
        .first()
        .is_some_and(|l| l.starts_with("# ") || l.starts_with("## "))
    {
        return Some(normalize("markdown"));
    }
    if lines.first().is_some_and(|l| l.trim_end() == "---")
        || lines
            .iter()
            .take(8)
            .any(|l| looks_like_yaml_mapping(l))
    {
        return Some(normalize("yaml"));
    }
    None
}

fn looks_like_section_header(line: &str) -> bool {
    line.len() > 2
        && line.starts_with('[')
        && line.ends_with(']')
        && !line[1..line.len() - 1].is_empty()
        && line[1..line.len() - 1]
            .chars()
            .all(|c| c.is_alphanumeric() || ".:_- \"".contains(c))
}

fn looks_like_yaml_mapping(line: &str) -> bool {
    let Some((key, rest)) = line.split_once(':') else {
        return false;
    };
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        && (rest.is_empty() || rest.starts_with(' '))
}

fn first_line(prefix: &[u8]) -> Option<&str> {
    let end = memchr::memchr(b'\n', prefix).unwrap_or(prefix.len());
    std::str::from_utf8(&prefix[..end]).ok()
}
