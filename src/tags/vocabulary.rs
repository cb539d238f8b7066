use std::fmt;

use crate::normalize::tag_key;

/// Words that mark a tag as an action/category tag when they appear as a
/// whole word. Compared against [`tag_key`] tokens, so accents and case don't
/// matter.
const ACTION_WORDS: &[&str] = &[
    "highlights",
    "highlight",
    "goals",
    "goal",
    "goles",
    "gol",
    "golazo",
    "golazos",
    "resumen",
    "summary",
    "recap",
    "result",
    "resultado",
];

/// Whole-tag phrases always rendered lowercase.
const ACTION_PHRASES: &[&str] = &[
    "highlights",
    "goals",
    "goles",
    "resumen",
    "summary",
    "recap",
    "result",
    "resultado",
    "golazos",
    "extended highlights",
    "match highlights",
    "all goals",
    "todos los goles",
    "resumen del partido",
    "resumen extendido",
    "mejores jugadas",
    "full match",
    "partido completo",
];

/// Scorer-tag prefixes recognised in free text, in tag-key form.
///
/// Plural forms (`goles de`, `goals by`) are left out: they usually name a
/// team rather than a player.
const SCORER_PREFIXES: &[&str] = &["gol de", "goal by"];

/// Language of the non-English category words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    /// Parses a language code. `en`, `en-US`, … are English; anything else,
    /// including unknown codes, falls back to Spanish.
    pub fn parse(code: &str) -> Self {
        let code = code.trim().to_ascii_lowercase();
        if code == "en" || code.starts_with("en-") || code.starts_with("en_") {
            Self::En
        } else {
            Self::Es
        }
    }

    pub fn vocabulary(self) -> Vocabulary {
        match self {
            Self::Es => Vocabulary {
                summary: "resumen",
                goals: "goles",
                result: "resultado",
                goal_by: "gol de",
            },
            Self::En => Vocabulary {
                summary: "summary",
                goals: "goals",
                result: "result",
                goal_by: "goal by",
            },
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Es => write!(f, "es"),
            Self::En => write!(f, "en"),
        }
    }
}

/// Category words for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vocabulary {
    pub summary: &'static str,
    pub goals: &'static str,
    pub result: &'static str,
    pub goal_by: &'static str,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Language::default().vocabulary()
    }
}

/// The English word every highlight upload carries.
pub const HIGHLIGHTS: &str = "highlights";

/// Whether a single token (already in tag-key form) is an action word.
pub fn is_action_word(token: &str) -> bool {
    ACTION_WORDS.contains(&token)
}

/// Whether the tag contains an action word as a whole word.
pub fn contains_action_word(tag: &str) -> bool {
    tag_key(tag).split(' ').any(is_action_word)
}

/// Whether the whole tag is a fixed lowercase category phrase.
pub fn is_action_phrase(tag: &str) -> bool {
    ACTION_PHRASES.contains(&tag_key(tag).as_str())
}

/// Splits a free-text scorer tag into its prefix and the scorer name.
///
/// Returns `None` when the tag does not start with a known prefix followed by
/// a name.
pub fn split_scorer_prefix(tag: &str) -> Option<(&'static str, &str)> {
    let words: Vec<&str> = tag.split_whitespace().collect();
    SCORER_PREFIXES.iter().find_map(|prefix| {
        let prefix_len = prefix.split(' ').count();
        if words.len() <= prefix_len {
            return None;
        }
        let head = words[..prefix_len].join(" ");
        if tag_key(&head) != *prefix {
            return None;
        }
        let name_start = nth_word_offset(tag, prefix_len)?;
        Some((*prefix, tag[name_start..].trim()))
    })
}

/// Byte offset of the `n`th whitespace-separated word.
fn nth_word_offset(s: &str, n: usize) -> Option<usize> {
    let mut count = 0;
    let mut in_word = false;
    for (i, c) in s.char_indices() {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            if count == n {
                return Some(i);
            }
            count += 1;
            in_word = true;
        }
    }
    None
}
