/// Nickname directory: the team lookup table, where it is loaded from, and the
/// process-wide cache that holds it.
mod cache;
mod nickname;
mod source;

use thiserror::Error;

pub use cache::DirectoryCache;
pub use nickname::{DirectoryEntry, NicknameDirectory, TeamRecord};
pub use source::{DirectorySource, FileSource, HttpSource, StaticSource, source_for_location};

/// Errors raised while fetching or parsing the directory document.
///
/// These never reach a caller of the endpoint: the cache logs them and falls
/// back to an empty directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Reading a local directory file failed
    #[error("Failed to read directory file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Non-success HTTP status from a remote directory
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Document is not a JSON object of team records
    #[error("Invalid directory document: {0}")]
    Parse(#[source] serde_json::Error),

    /// The configured location cannot be used
    #[error("Invalid directory location: {0}")]
    InvalidLocation(String),
}
