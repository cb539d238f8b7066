//! Post-processing layer for tag lists coming from the text generator.
//!
//! The generator is untrusted: it may wrap tags in quotes or bullets, repeat
//! itself, or ignore length rules. Everything it returns goes through
//! [`clean_raw_tags`] before it can reach a response.
use std::collections::HashSet;

use serde::Deserialize;

use super::MAX_TAG_CHARS;
use crate::normalize::{collapse_whitespace, tag_key};

/// Raw tag input: either one delimited string or an already-split list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawTags {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for RawTags {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<String>> for RawTags {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Cleans a raw tag pool into an ordered, deduplicated list.
///
/// # Cleaning rules
///
/// - Splits text input on commas and newlines
/// - Strips list decorations (bullets, numbering, quotes, leading `#`)
/// - Collapses whitespace and drops blank entries
/// - Drops entries longer than 60 characters
/// - Deduplicates by tag key, keeping the first occurrence
///
/// # Examples
///
/// ```
/// use matchtags::tags::clean_raw_tags;
///
/// let cleaned = clean_raw_tags(&"River vs Boca, \"river VS boca\", 1. superclásico,, ".into());
/// assert_eq!(cleaned, vec!["River vs Boca", "superclásico"]);
/// ```
#[must_use]
pub fn clean_raw_tags(raw: &RawTags) -> Vec<String> {
    let pieces: Vec<&str> = match raw {
        RawTags::Text(text) => text.split([',', '\n']).collect(),
        RawTags::List(items) => items.iter().map(String::as_str).collect(),
    };

    let mut seen = HashSet::new();
    pieces
        .into_iter()
        .map(strip_decorations)
        .filter(|tag| !tag.is_empty() && tag.chars().count() <= MAX_TAG_CHARS)
        .filter(|tag| {
            let key = tag_key(tag);
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

/// Removes the list markup models like to add around each item.
fn strip_decorations(piece: &str) -> String {
    let trimmed = piece.trim();
    let trimmed = strip_numbering(trimmed);
    let trimmed = trimmed
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '*' | '•' | '#' | '·'))
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ';'))
        .trim_matches(|c: char| c.is_whitespace() || is_quote(c));
    collapse_whitespace(trimmed)
}

fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '`' | '“' | '”' | '‘' | '’' | '«' | '»')
}

/// Strips a leading `1.` or `2)` list number.
fn strip_numbering(s: &str) -> &str {
    let digits = s.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return s;
    }
    let rest = &s[digits..];
    match rest.strip_prefix(['.', ')']) {
        Some(after) if after.starts_with(' ') => after,
        _ => s,
    }
}
