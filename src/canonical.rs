//! Team-name canonicalization against the nickname directory.
//!
//! Resolution order, first hit wins:
//!
//! 1. exact normalized key
//! 2. alias (an entry's own key counts as one of its aliases)
//! 3. fuzzy: closest key or alias within [`MAX_FUZZY_DISTANCE`] edits
//! 4. fallback: title-cased input
//!
//! Fuzzy lookup is a linear scan computing an edit distance per key and alias.
//! That is fine for a few hundred teams; a much larger directory would need a
//! prefix index instead.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::directory::{NicknameDirectory, TeamRecord};
use crate::normalize::{edit_distance, normalize, title_case};

/// Largest edit distance accepted by the fuzzy step.
pub const MAX_FUZZY_DISTANCE: usize = 2;

/// Display names for one side of the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamResolution {
    pub canonical: String,
    pub short: String,
}

impl TeamResolution {
    fn from_record(record: &TeamRecord) -> Self {
        Self {
            canonical: record.canonical().to_string(),
            short: record.short().to_string(),
        }
    }

    fn fallback(raw: &str) -> Self {
        let name = title_case(raw);
        Self {
            canonical: name.clone(),
            short: name,
        }
    }

    /// Whether the short form differs from the canonical one under normalization.
    pub fn has_distinct_short(&self) -> bool {
        let short = normalize(&self.short);
        !short.is_empty() && short != normalize(&self.canonical)
    }
}

/// How a resolution was reached. Logged, and handy in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    Alias,
    Fuzzy { distance: usize },
    Fallback,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Alias => write!(f, "alias"),
            Self::Fuzzy { distance } => write!(f, "fuzzy (distance {distance})"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Resolves a free-text team name. Never fails; see the module docs for order.
///
/// # Examples
///
/// ```
/// use matchtags::canonical::resolve;
/// use matchtags::directory::{NicknameDirectory, TeamRecord};
///
/// let directory = NicknameDirectory::from_entries([(
///     "Bayern Munich",
///     TeamRecord::new("Bayern Munich", "Bayern", ["FC Bayern", "Bayern München"]),
/// )]);
///
/// assert_eq!(resolve("bayer munich", &directory).canonical, "Bayern Munich");
/// assert_eq!(resolve("deportivo cali", &directory).canonical, "Deportivo Cali");
/// ```
pub fn resolve(raw: &str, directory: &NicknameDirectory) -> TeamResolution {
    resolve_with_mode(raw, directory).0
}

/// Same as [`resolve`], also reporting which step matched.
pub fn resolve_with_mode(raw: &str, directory: &NicknameDirectory) -> (TeamResolution, MatchMode) {
    let key = normalize(raw);

    let (resolution, mode) = if key.is_empty() {
        (TeamResolution::fallback(raw), MatchMode::Fallback)
    } else if let Some(record) = directory.get(&key) {
        (TeamResolution::from_record(record), MatchMode::Exact)
    } else if let Some(record) = find_alias(&key, directory) {
        (TeamResolution::from_record(record), MatchMode::Alias)
    } else if let Some((record, distance)) = find_fuzzy(&key, directory) {
        (TeamResolution::from_record(record), MatchMode::Fuzzy { distance })
    } else {
        (TeamResolution::fallback(raw), MatchMode::Fallback)
    };

    debug!(input = raw, canonical = %resolution.canonical, mode = %mode, "Resolved team name");
    (resolution, mode)
}

fn find_alias<'a>(key: &str, directory: &'a NicknameDirectory) -> Option<&'a TeamRecord> {
    directory
        .iter()
        .find(|entry| entry.record().aliases().iter().any(|alias| normalize(alias) == key))
        .map(|entry| entry.record())
}

fn find_fuzzy<'a>(key: &str, directory: &'a NicknameDirectory) -> Option<(&'a TeamRecord, usize)> {
    let mut best: Option<(&TeamRecord, usize)> = None;

    for entry in directory.iter() {
        let names = std::iter::once(entry.key().to_string())
            .chain(entry.record().aliases().iter().map(|alias| normalize(alias)));

        let Some(distance) = names.map(|name| edit_distance(key, &name)).min() else {
            continue;
        };

        // Strict comparison keeps the earliest entry on ties.
        if distance <= MAX_FUZZY_DISTANCE && best.is_none_or(|(_, d)| distance < d) {
            best = Some((entry.record(), distance));
        }
    }

    best
}
