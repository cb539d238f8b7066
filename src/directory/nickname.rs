use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::DirectoryError;
use crate::normalize::normalize;

/// One team entry of the nickname directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    canonical: String,
    short: String,
    aliases: Vec<String>,
}

impl TeamRecord {
    /// Creates a record. An empty `short` falls back to `canonical`.
    pub fn new(
        canonical: impl Into<String>,
        short: impl Into<String>,
        aliases: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let canonical = canonical.into();
        let short = short.into();
        let short = if short.trim().is_empty() {
            canonical.clone()
        } else {
            short
        };
        Self {
            canonical,
            short,
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the preferred display name.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Returns the abbreviated display name.
    pub fn short(&self) -> &str {
        &self.short
    }

    /// Returns the alias list in document order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

/// Shape of a record inside the JSON document. `short` and `aliases` are optional.
#[derive(Debug, Deserialize)]
struct RawRecord {
    canonical: String,
    #[serde(default)]
    short: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
}

/// Normalized team key paired with its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    key: String,
    record: TeamRecord,
}

impl DirectoryEntry {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn record(&self) -> &TeamRecord {
        &self.record
    }
}

/// Lookup table from normalized team keys to [`TeamRecord`]s.
///
/// Entries keep the order of the source document; fuzzy tie-breaking relies on
/// it. Keys are normalized on insertion and the first spelling of a key wins.
///
/// # Examples
///
/// ```
/// use matchtags::directory::NicknameDirectory;
///
/// let directory = NicknameDirectory::from_json(
///     r#"{"River Plate": {"canonical": "River Plate", "short": "River", "aliases": ["CARP"]}}"#,
/// )
/// .unwrap();
///
/// assert_eq!(directory.len(), 1);
/// assert_eq!(directory.get("river plate").unwrap().short(), "River");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NicknameDirectory {
    entries: Vec<DirectoryEntry>,
    index: HashMap<String, usize>,
}

impl NicknameDirectory {
    /// Returns the directory used when the source is unavailable.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a directory from `(key, record)` pairs, normalizing each key.
    pub fn from_entries<K: AsRef<str>>(entries: impl IntoIterator<Item = (K, TeamRecord)>) -> Self {
        let mut directory = Self::default();
        for (key, record) in entries {
            directory.insert(key.as_ref(), record);
        }
        directory
    }

    /// Parses the JSON document form: an object mapping team keys to
    /// `{ "canonical", "short"?, "aliases"? }`.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::Parse` if the document is not an object of records.
    pub fn from_json(json: &str) -> Result<Self, DirectoryError> {
        let document: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(json).map_err(DirectoryError::Parse)?;

        let mut directory = Self::default();
        for (key, value) in document {
            let raw: RawRecord = serde_json::from_value(value).map_err(DirectoryError::Parse)?;
            let record = TeamRecord::new(raw.canonical, raw.short.unwrap_or_default(), raw.aliases);
            directory.insert(&key, record);
        }
        Ok(directory)
    }

    fn insert(&mut self, key: &str, record: TeamRecord) {
        let key = normalize(key);
        if key.is_empty() || self.index.contains_key(&key) {
            return;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(DirectoryEntry { key, record });
    }

    /// Looks up a record by an already-normalized key.
    pub fn get(&self, key: &str) -> Option<&TeamRecord> {
        self.index.get(key).map(|&i| &self.entries[i].record)
    }

    /// Iterates entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for NicknameDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} teams", self.entries.len())
    }
}
