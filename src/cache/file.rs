//! Cache store persisting entries to disk
//!
//! Provides a `FileCache` that stores serializable data to JSON files with
//! expiry timestamps and tags, so the weather lookup stays warm across runs.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{expiry_after, is_live, CacheError, CacheStore, Clock, SystemClock};

/// Suffix for temporary files so concurrent writers never collide
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Wrapper struct for cached data stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// The cached data
    data: T,
    /// When the data was cached
    cached_at: DateTime<Utc>,
    /// When the cache entry expires
    expires_at: DateTime<Utc>,
    /// Group labels for bulk invalidation
    #[serde(default)]
    tags: Vec<String>,
}

/// Cache store keeping one JSON file per key
///
/// Files live in an XDG-compliant cache directory (`~/.cache/ecogarden/` on
/// Linux) unless another directory is given. Expired files are deleted the
/// next time they are read. Unreadable or corrupt files count as misses.
#[derive(Debug, Clone)]
pub struct FileCache {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileCache {
    /// Creates a FileCache in the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        Self::default_dir().map(Self::with_dir)
    }

    /// The directory `new` would use
    pub fn default_dir() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "ecogarden")?;
        Some(project_dirs.cache_dir().to_path_buf())
    }

    /// Creates a FileCache with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source used to stamp and expire entries
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to a cache file for the given key
    ///
    /// Keys double as file names, so only alphanumerics, `_` and `-` are allowed.
    fn cache_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.cache_dir.join(format!("{}.json", key)))
    }

    fn read_entry<T: DeserializeOwned>(path: &Path) -> Option<CacheEntry<T>> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }
}

impl CacheStore for FileCache {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.cache_path(key).ok()?;
        let entry: CacheEntry<T> = Self::read_entry(&path)?;

        if !is_live(self.clock.now(), entry.expires_at) {
            // A writer may rename a fresh entry onto this path before the
            // removal; that entry is lost and the next lookup fetches again.
            if let Err(e) = fs::remove_file(&path) {
                tracing::debug!("Failed to remove expired cache file {}: {}", path.display(), e);
            }
            return None;
        }
        Some(entry.data)
    }

    fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
        tags: &[&str],
    ) -> Result<(), CacheError> {
        let path = self.cache_path(key)?;
        fs::create_dir_all(&self.cache_dir)?;

        let now = self.clock.now();
        let entry = CacheEntry {
            data: value,
            cached_at: now,
            expires_at: expiry_after(now, ttl_secs)?,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        };
        let json = serde_json::to_string_pretty(&entry)?;

        // Write then rename so readers never see a half-written file
        let tmp = self.cache_dir.join(format!(
            ".{}.{}.{}.tmp",
            key,
            std::process::id(),
            WRITE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn invalidate_tag(&self, tag: &str) -> Result<usize, CacheError> {
        let dir = match fs::read_dir(&self.cache_dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for dir_entry in dir {
            let path = dir_entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(entry) = Self::read_entry::<serde_json::Value>(&path) else {
                continue;
            };
            if entry.tags.iter().any(|t| t == tag) {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    // Someone else got there first
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use chrono::Duration;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn create_test_cache() -> (FileCache, ManualClock, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let clock = ManualClock::default();
        let cache =
            FileCache::with_dir(temp_dir.path().to_path_buf()).with_clock(Arc::new(clock.clone()));
        (cache, clock, temp_dir)
    }

    #[test]
    fn test_set_creates_file_in_cache_directory() {
        let (cache, _clock, temp_dir) = create_test_cache();
        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        cache
            .set("test_key", &data, 600, &["weatherCache"])
            .expect("Write should succeed");

        let expected_path = temp_dir.path().join("test_key.json");
        assert!(expected_path.exists(), "Cache file should exist");

        let content = fs::read_to_string(&expected_path).expect("Should read file");
        assert!(content.contains("\"name\""));
        assert!(content.contains("\"weatherCache\""));
        assert!(content.contains("\"expires_at\""));
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (cache, _clock, _temp_dir) = create_test_cache();
        let result: Option<TestData> = cache.get("nonexistent_key");
        assert!(result.is_none(), "Should return None for missing key");
    }

    #[test]
    fn test_get_returns_fresh_data() {
        let (cache, _clock, _temp_dir) = create_test_cache();
        let data = TestData {
            name: "fresh".to_string(),
            value: 100,
        };

        cache.set("fresh_key", &data, 600, &[]).expect("Write should succeed");

        let result: TestData = cache.get("fresh_key").expect("Should read fresh cache");
        assert_eq!(result, data);
    }

    #[test]
    fn test_expired_entry_is_a_miss_and_file_is_removed() {
        let (cache, clock, temp_dir) = create_test_cache();
        let data = TestData {
            name: "expired".to_string(),
            value: 0,
        };

        cache.set("expired_key", &data, 600, &[]).expect("Write should succeed");
        clock.advance(Duration::seconds(600));

        let result: Option<TestData> = cache.get("expired_key");

        assert!(result.is_none(), "Expired entry should not be returned");
        assert!(!temp_dir.path().join("expired_key.json").exists());
    }

    #[test]
    fn test_write_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache").join("dir");
        let cache = FileCache::with_dir(nested_path.clone());

        cache.set("nested_key", &1_u8, 600, &[]).expect("Write should succeed");

        assert!(nested_path.join("nested_key.json").exists(), "Cache file should exist");
    }

    #[test]
    fn test_rejects_keys_that_are_not_file_names() {
        let (cache, _clock, _temp_dir) = create_test_cache();

        let result = cache.set("../escape", &1_u8, 600, &[]);

        assert!(matches!(result, Err(CacheError::InvalidKey(_))));
        assert!(cache.get::<u8>("../escape").is_none());
    }

    #[test]
    fn test_accepts_accented_keys() {
        let (cache, _clock, _temp_dir) = create_test_cache();
        cache.set("weather_saint_étienne", &3_u8, 600, &[]).unwrap();
        assert_eq!(cache.get::<u8>("weather_saint_étienne"), Some(3));
    }

    #[test]
    fn test_invalidate_tag_removes_tagged_files() {
        let (cache, _clock, temp_dir) = create_test_cache();
        cache.set("weather_paris", &1_u8, 600, &["weatherCache"]).unwrap();
        cache.set("weather_lyon", &2_u8, 600, &["weatherCache"]).unwrap();
        cache.set("other", &3_u8, 600, &["misc"]).unwrap();
        fs::write(temp_dir.path().join("corrupt.json"), "not json").unwrap();

        let removed = cache.invalidate_tag("weatherCache").unwrap();

        assert_eq!(removed, 2);
        assert!(cache.get::<u8>("weather_paris").is_none());
        assert!(cache.get::<u8>("weather_lyon").is_none());
        assert_eq!(cache.get::<u8>("other"), Some(3));
    }

    #[test]
    fn test_invalidate_tag_on_missing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = FileCache::with_dir(temp_dir.path().join("never_created"));
        assert_eq!(cache.invalidate_tag("weatherCache").unwrap(), 0);
    }

    #[test]
    fn test_overwrite_existing_cache() {
        let (cache, _clock, _temp_dir) = create_test_cache();
        cache.set("overwrite_key", &"first", 600, &[]).unwrap();
        cache.set("overwrite_key", &"second", 600, &[]).unwrap();

        let result: String = cache.get("overwrite_key").expect("Should read cache");
        assert_eq!(result, "second", "Cache should contain latest data");
    }

    #[test]
    fn test_default_dir_is_xdg_compliant() {
        if let Some(dir) = FileCache::default_dir() {
            assert!(
                dir.to_string_lossy().contains("ecogarden"),
                "Cache path should contain project name"
            );
        }
        // Passes if no home directory is available (e.g., in CI)
    }
}
