//! Text normalization primitives shared by every lookup, comparison and
//! deduplication step.
//!
//! Nothing in the crate compares raw strings for business decisions; it always
//! goes through [`normalize`] or [`tag_key`].

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Words kept lowercase by [`title_case`] unless they open the phrase.
const MINOR_WORDS: &[&str] = &[
    "de", "del", "la", "las", "el", "los", "y", "e", "da", "do", "di", "of", "the", "and",
    "van", "von",
];

/// Reduces a string to its comparison form.
///
/// Decomposes accents (NFD), drops combining marks, lowercases, collapses
/// whitespace runs to a single space and trims.
///
/// # Examples
///
/// ```
/// use matchtags::normalize::normalize;
///
/// assert_eq!(normalize("  Atlético   Madrid "), "atletico madrid");
/// assert_eq!(normalize("JULIÁN ÁLVAREZ"), "julian alvarez");
/// assert_eq!(normalize(""), "");
/// ```
#[must_use]
pub fn normalize(s: &str) -> String {
    let stripped: String = s.nfd().filter(|c| !is_combining_mark(*c)).collect();
    collapse_whitespace(&stripped.to_lowercase())
}

/// Deduplication key for tags.
///
/// Same as [`normalize`], then removes everything that is not `[a-z0-9]` or a
/// space. Two tags are the same tag iff their keys are equal.
///
/// ```
/// use matchtags::normalize::tag_key;
///
/// assert_eq!(tag_key("River Plate vs. Boca!"), "river plate vs boca");
/// assert_eq!(tag_key("gol de Álvarez"), tag_key("GOL DE ALVAREZ"));
/// ```
#[must_use]
pub fn tag_key(s: &str) -> String {
    let filtered: String = normalize(s)
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
        .collect();
    collapse_whitespace(&filtered)
}

/// Levenshtein distance over Unicode scalar values, unit costs.
///
/// Runs in `O(len(a) * len(b))`. Fuzzy team lookup calls this once per
/// directory key and alias, so it only stays cheap while directories are small.
#[must_use]
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Collapses whitespace runs into single spaces and trims both ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title-cases a display name.
///
/// Every word gets an uppercase first letter and lowercase remainder, except:
///
/// - minor words (articles, prepositions) after the first word stay lowercase;
/// - all-caps words of up to three letters (`PSG`, `FC`) are kept as written;
/// - longer all-caps words (`UEFA`) are kept too, unless the whole input is
///   uppercase, which reads as shouting rather than an acronym.
///
/// Letters after a hyphen are capitalized too.
///
/// ```
/// use matchtags::normalize::title_case;
///
/// assert_eq!(title_case("river plate"), "River Plate");
/// assert_eq!(title_case("rayo DE la montaña"), "Rayo de la Montaña");
/// assert_eq!(title_case("PSG"), "PSG");
/// assert_eq!(title_case("UEFA champions league"), "UEFA Champions League");
/// assert_eq!(title_case("saint-étienne"), "Saint-Étienne");
/// ```
#[must_use]
pub fn title_case(s: &str) -> String {
    let shouting = !s.chars().any(char::is_lowercase);
    collapse_whitespace(s)
        .split(' ')
        .enumerate()
        .map(|(i, word)| title_case_word(word, i == 0, shouting))
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str, first: bool, shouting: bool) -> String {
    let lower = word.to_lowercase();
    if !first && MINOR_WORDS.contains(&normalize(&lower).as_str()) {
        return lower;
    }
    if is_acronym(word, shouting) {
        return word.to_string();
    }

    lower
        .split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("-")
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_acronym(word: &str, shouting: bool) -> bool {
    let letters = word.chars().filter(|c| c.is_alphabetic()).count();
    let all_caps = word.chars().all(|c| c.is_uppercase() || !c.is_alphabetic());
    all_caps && letters >= 2 && (letters <= 3 || !shouting)
}
