use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use super::{DirectorySource, NicknameDirectory, StaticSource};

/// Process-wide holder for the nickname directory.
///
/// # Lifecycle
///
/// - Nothing is fetched until the first [`DirectoryCache::get`].
/// - The first caller runs the source's `load`; callers arriving while that
///   load is in flight block on it instead of fetching again.
/// - A failed load is logged and replaced by an empty directory, which is then
///   cached like a successful one.
/// - The result is immutable for the life of the cache. Reloading means
///   building a new cache, in practice restarting the process.
pub struct DirectoryCache {
    source: Box<dyn DirectorySource>,
    directory: OnceLock<Arc<NicknameDirectory>>,
}

impl DirectoryCache {
    pub fn new(source: impl DirectorySource + 'static) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub fn from_boxed(source: Box<dyn DirectorySource>) -> Self {
        Self {
            source,
            directory: OnceLock::new(),
        }
    }

    /// Wraps an in-memory directory.
    pub fn preloaded(directory: NicknameDirectory) -> Self {
        Self::new(StaticSource::new(directory))
    }

    /// Returns the directory, loading it on first use.
    pub fn get(&self) -> Arc<NicknameDirectory> {
        Arc::clone(self.directory.get_or_init(|| Arc::new(self.load_or_empty())))
    }

    /// Whether the first load has completed.
    pub fn is_loaded(&self) -> bool {
        self.directory.get().is_some()
    }

    fn load_or_empty(&self) -> NicknameDirectory {
        let location = self.source.describe();
        match self.source.load() {
            Ok(directory) => {
                info!(source = %location, teams = directory.len(), "Nickname directory loaded");
                directory
            }
            Err(e) => {
                warn!(source = %location, error = %e, "Nickname directory unavailable, using empty directory");
                NicknameDirectory::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectoryError, TeamRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    struct CountingSource {
        loads: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl DirectorySource for CountingSource {
        fn load(&self) -> Result<NicknameDirectory, DirectoryError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            Ok(NicknameDirectory::from_entries([(
                "Boca Juniors",
                TeamRecord::new("Boca Juniors", "Boca", ["Xeneizes"]),
            )]))
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    struct FailingSource;

    impl DirectorySource for FailingSource {
        fn load(&self) -> Result<NicknameDirectory, DirectoryError> {
            Err(DirectoryError::Http { status: 503 })
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    #[test]
    fn load_is_lazy() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = DirectoryCache::new(CountingSource {
            loads: loads.clone(),
            delay: Duration::ZERO,
        });

        assert!(!cache.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 0);

        assert_eq!(cache.get().len(), 1);
        assert!(cache.is_loaded());
    }

    #[test]
    fn repeated_gets_load_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = DirectoryCache::new(CountingSource {
            loads: loads.clone(),
            delay: Duration::ZERO,
        });

        for _ in 0..5 {
            cache.get();
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_requests_share_one_load() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(DirectoryCache::new(CountingSource {
            loads: loads.clone(),
            delay: Duration::from_millis(50),
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get().len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_load_degrades_to_empty_directory() {
        let cache = DirectoryCache::new(FailingSource);

        assert!(cache.get().is_empty());
        assert!(cache.is_loaded());
    }

    #[test]
    fn preloaded_cache_serves_given_directory() {
        let directory = NicknameDirectory::from_entries([(
            "River Plate",
            TeamRecord::new("River Plate", "River", Vec::<String>::new()),
        )]);
        let cache = DirectoryCache::preloaded(directory.clone());

        assert_eq!(*cache.get(), directory);
    }
}
