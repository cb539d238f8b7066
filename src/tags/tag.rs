use std::fmt;

use serde::Serialize;

use super::vocabulary::{is_action_phrase, is_action_word, split_scorer_prefix};
use crate::normalize::{collapse_whitespace, normalize, tag_key, title_case};

/// Category of a tag, decided once when the tag is created.
///
/// The category carries the parts needed to render the tag, so casing never
/// has to re-derive structure from the final string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    /// `"A vs B"`, optionally followed by a category word or a score.
    Cross {
        left: String,
        right: String,
        suffix: Option<String>,
    },
    /// Fixed category phrase such as `highlights` or `resumen`.
    Action,
    /// `"gol de X"`: lowercase prefix plus a scorer name.
    Scorer { prefix: String, name: String },
    /// Platform or brand name from the configured allow-list.
    Brand,
    /// Anything else.
    Generic,
}

impl TagKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Cross { .. } => "cross",
            Self::Action => "action",
            Self::Scorer { .. } => "scorer",
            Self::Brand => "brand",
            Self::Generic => "generic",
        }
    }
}

/// A display-ready tag with its category and deduplication key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    text: String,
    kind: TagKind,
    key: String,
}

impl Tag {
    fn from_parts(text: String, kind: TagKind) -> Self {
        let key = tag_key(&text);
        Self { text, kind, key }
    }

    /// `"Left vs Right"` with each side title-cased and an optional lowercase suffix.
    pub fn cross(left: &str, right: &str, suffix: Option<&str>) -> Self {
        let suffix = suffix
            .map(|s| collapse_whitespace(s).to_lowercase())
            .filter(|s| !s.is_empty());
        let mut text = format!("{} vs {}", title_case(left), title_case(right));
        if let Some(suffix) = &suffix {
            text.push(' ');
            text.push_str(suffix);
        }
        Self::from_parts(
            text,
            TagKind::Cross {
                left: left.to_string(),
                right: right.to_string(),
                suffix,
            },
        )
    }

    /// A category phrase, always lowercase.
    pub fn action(phrase: &str) -> Self {
        Self::from_parts(collapse_whitespace(phrase).to_lowercase(), TagKind::Action)
    }

    /// `"<prefix> <Name>"` with a lowercase prefix and a title-cased name.
    pub fn scorer(prefix: &str, name: &str) -> Self {
        let prefix = collapse_whitespace(prefix).to_lowercase();
        let text = format!("{prefix} {}", title_case(name));
        Self::from_parts(
            text,
            TagKind::Scorer {
                prefix,
                name: name.to_string(),
            },
        )
    }

    /// A brand exactly as configured.
    pub fn brand(name: &str) -> Self {
        Self::from_parts(name.trim().to_string(), TagKind::Brand)
    }

    /// A free-form tag, title-cased.
    pub fn generic(text: &str) -> Self {
        Self::from_parts(title_case(text), TagKind::Generic)
    }

    /// Classifies free text (notes, model output) into a category and renders it.
    ///
    /// Checked in order: brand allow-list, fixed category phrase, scorer
    /// prefix, `" vs "` pairing, then generic. A generic tag ending in a
    /// category word keeps that word lowercase.
    ///
    /// # Examples
    ///
    /// ```
    /// use matchtags::tags::{Tag, TagKind};
    ///
    /// let brands = vec!["ESPN".to_string()];
    ///
    /// assert_eq!(Tag::classify("espn", &brands).text(), "ESPN");
    /// assert_eq!(Tag::classify("HIGHLIGHTS", &brands).text(), "highlights");
    /// assert_eq!(Tag::classify("GOL DE cavani", &brands).text(), "gol de Cavani");
    /// assert_eq!(Tag::classify("river plate VS boca", &brands).text(), "River Plate vs Boca");
    /// assert_eq!(*Tag::classify("superclásico", &brands).kind(), TagKind::Generic);
    /// assert_eq!(Tag::classify("superclásico HIGHLIGHTS", &brands).text(), "Superclásico highlights");
    /// ```
    pub fn classify(raw: &str, brands: &[String]) -> Self {
        let raw = collapse_whitespace(raw);
        let key = tag_key(&raw);

        if let Some(brand) = brands.iter().find(|b| tag_key(b) == key) {
            return Self::brand(brand);
        }
        if is_action_phrase(&raw) {
            return Self::action(&raw);
        }
        if let Some((prefix, name)) = split_scorer_prefix(&raw) {
            return Self::scorer(prefix, name);
        }
        if let Some((left, right)) = split_versus(&raw) {
            let (right, suffix) = split_cross_suffix(right);
            return Self::cross(left, right, suffix);
        }
        if let Some((head, last)) = raw.rsplit_once(' ') {
            if is_action_word(&tag_key(last)) {
                let text = format!("{} {}", title_case(head), last.to_lowercase());
                return Self::from_parts(text, TagKind::Generic);
            }
        }
        Self::generic(&raw)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> &TagKind {
        &self.kind
    }

    /// Deduplication key; see [`tag_key`].
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Length in characters, the unit used by every length limit.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl Serialize for Tag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Applies the category casing rules to a single free-text tag.
pub fn case_tag(raw: &str, brands: &[String]) -> String {
    Tag::classify(raw, brands).into_text()
}

/// Splits `"A vs B"` (also `vs.` and `v`) on the first separator word.
fn split_versus(raw: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for word in raw.split(' ') {
        let normalized = normalize(word);
        if offset > 0 && matches!(normalized.as_str(), "vs" | "vs." | "v" | "v.") {
            let left = raw[..offset].trim();
            let right = raw[offset + word.len()..].trim();
            if !left.is_empty() && !right.is_empty() {
                return Some((left, right));
            }
        }
        offset += word.len() + 1;
    }
    None
}

/// Peels a trailing category word or score off the right side of a pairing.
fn split_cross_suffix(right: &str) -> (&str, Option<&str>) {
    let Some((name, last)) = right.rsplit_once(' ') else {
        return (right, None);
    };
    if is_action_phrase(last) || is_score(last) {
        (name.trim(), Some(last))
    } else {
        (right, None)
    }
}

fn is_score(s: &str) -> bool {
    let mut parts = s.split('-');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(a), Some(b), None)
            if !a.is_empty() && !b.is_empty()
                && a.chars().all(|c| c.is_ascii_digit())
                && b.chars().all(|c| c.is_ascii_digit())
    )
}
