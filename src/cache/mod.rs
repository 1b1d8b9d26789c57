//! Cache stores for fetched data
//!
//! A `CacheStore` keeps serializable values under string keys with an absolute
//! expiry and a set of tags. Expired entries are never returned. Entries sharing
//! a tag can be evicted together with `invalidate_tag`, regardless of key.
//!
//! Two stores are provided: `MemoryCache` for a single process, and `FileCache`
//! which persists entries as JSON files so they survive between runs.

mod clock;
mod file;
mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use file::FileCache;
pub use memory::MemoryCache;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Errors that can occur when writing to or invalidating a cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the backing storage failed
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The value could not be encoded as JSON
    #[error("Failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The key contains characters the store cannot hold
    #[error("Invalid cache key: '{0}'")]
    InvalidKey(String),

    /// The TTL does not fit in a timestamp
    #[error("TTL of {0} seconds is out of range")]
    InvalidTtl(u64),
}

/// Key/value storage with per-entry TTL and tag-based invalidation
pub trait CacheStore: Send + Sync {
    /// Returns the value stored under `key` if it exists and has not expired.
    ///
    /// Entries that cannot be decoded as `T` are treated as missing.
    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T>;

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// The entry expires `ttl_secs` seconds from now and is tagged with `tags`.
    fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
        tags: &[&str],
    ) -> Result<(), CacheError>;

    /// Removes every entry carrying `tag` and returns how many were removed.
    fn invalidate_tag(&self, tag: &str) -> Result<usize, CacheError>;
}

/// Computes the absolute expiry of an entry written at `now`
fn expiry_after(now: DateTime<Utc>, ttl_secs: u64) -> Result<DateTime<Utc>, CacheError> {
    i64::try_from(ttl_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or(CacheError::InvalidTtl(ttl_secs))
}

/// An entry is live strictly before its expiry instant
fn is_live(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> bool {
    now < expires_at
}
