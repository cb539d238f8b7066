use std::path::PathBuf;
use std::time::Duration;

use super::{DirectoryError, NicknameDirectory};

/// Where the nickname directory document comes from.
///
/// Implementations do the raw fetch and parse; caching and the fallback to an
/// empty directory live in [`super::DirectoryCache`].
pub trait DirectorySource: Send + Sync {
    /// Fetches and parses the directory.
    fn load(&self) -> Result<NicknameDirectory, DirectoryError>;

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}

/// Reads the directory from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DirectorySource for FileSource {
    fn load(&self) -> Result<NicknameDirectory, DirectoryError> {
        let json = std::fs::read_to_string(&self.path).map_err(|source| DirectoryError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        NicknameDirectory::from_json(&json)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fetches the directory over HTTP(S) with a blocking GET.
pub struct HttpSource {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    /// Creates an HTTP source with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::InvalidLocation` if the URL does not parse.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DirectoryError> {
        let url = url.into();
        reqwest::Url::parse(&url)
            .map_err(|e| DirectoryError::InvalidLocation(format!("{url}: {e}")))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(DirectoryError::Network)?;

        Ok(Self { url, client })
    }
}

impl DirectorySource for HttpSource {
    fn load(&self) -> Result<NicknameDirectory, DirectoryError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(DirectoryError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(DirectoryError::Network)?;
        NicknameDirectory::from_json(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// A directory that is already in memory. Used by tests and embedders.
#[derive(Debug, Clone)]
pub struct StaticSource {
    directory: NicknameDirectory,
}

impl StaticSource {
    pub fn new(directory: NicknameDirectory) -> Self {
        Self { directory }
    }
}

impl DirectorySource for StaticSource {
    fn load(&self) -> Result<NicknameDirectory, DirectoryError> {
        Ok(self.directory.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory ({})", self.directory)
    }
}

/// Picks a source for a configured location: `http://` and `https://` URLs
/// are fetched, anything else is treated as a file path.
///
/// # Errors
///
/// Returns `DirectoryError::InvalidLocation` for malformed URLs.
pub fn source_for_location(
    location: &str,
    timeout: Duration,
) -> Result<Box<dyn DirectorySource>, DirectoryError> {
    let location = location.trim();
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpSource::new(location, timeout)?))
    } else {
        Ok(Box::new(FileSource::new(location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_source_reads_json_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"Racing Club": {{"canonical": "Racing Club", "short": "Racing", "aliases": ["La Academia"]}}}}"#
        )
        .unwrap();

        let directory = FileSource::new(file.path()).load().unwrap();
        assert_eq!(directory.get("racing club").unwrap().short(), "Racing");
    }

    #[test]
    fn file_source_reports_missing_file_as_io_error() {
        let result = FileSource::new("/definitely/not/here/nicknames.json").load();

        match result {
            Err(DirectoryError::Io { path, .. }) => assert!(path.contains("nicknames.json")),
            other => panic!("Expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn location_with_http_scheme_builds_http_source() {
        let source = source_for_location("https://example.com/nicknames.json", Duration::from_secs(1))
            .unwrap();
        assert_eq!(source.describe(), "https://example.com/nicknames.json");
    }

    #[test]
    fn plain_location_builds_file_source() {
        let source = source_for_location("data/nicknames.json", Duration::from_secs(1)).unwrap();
        assert_eq!(source.describe(), "data/nicknames.json");
    }

    #[test]
    fn malformed_url_is_rejected() {
        let result = source_for_location("http://", Duration::from_secs(1));
        assert!(matches!(result, Err(DirectoryError::InvalidLocation(_))));
    }

    #[test]
    fn static_source_returns_its_directory() {
        let source = StaticSource::new(NicknameDirectory::empty());
        assert!(source.load().unwrap().is_empty());
        assert_eq!(source.describe(), "in-memory (0 teams)");
    }
}
