//! In-process cache store

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};

use super::{expiry_after, is_live, CacheError, CacheStore, Clock, SystemClock};

#[derive(Debug)]
struct Entry {
    value: serde_json::Value,
    expires_at: DateTime<Utc>,
    tags: BTreeSet<String>,
}

/// Cache store backed by a shared map
///
/// Clones share the same entries. Expired entries are dropped when they are
/// looked up, and all of them are swept on every write or invalidation.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .read()
            .values()
            .filter(|entry| is_live(now, entry.expires_at))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = self.clock.now();
        {
            let entries = self.entries.read();
            let entry = entries.get(key)?;
            if is_live(now, entry.expires_at) {
                return serde_json::from_value(entry.value.clone()).ok();
            }
        }

        // Re-check under the write lock: another caller may have refreshed it.
        let mut entries = self.entries.write();
        if entries
            .get(key)
            .is_some_and(|entry| !is_live(now, entry.expires_at))
        {
            entries.remove(key);
        }
        None
    }

    fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
        tags: &[&str],
    ) -> Result<(), CacheError> {
        let entry = Entry {
            value: serde_json::to_value(value)?,
            expires_at: expiry_after(self.clock.now(), ttl_secs)?,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        };
        let mut entries = self.entries.write();
        prune_expired(&mut entries, self.clock.now());
        entries.insert(key.to_string(), entry);
        Ok(())
    }

    /// Only live entries count as evicted
    fn invalidate_tag(&self, tag: &str) -> Result<usize, CacheError> {
        let mut entries = self.entries.write();
        prune_expired(&mut entries, self.clock.now());
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.contains(tag));
        Ok(before - entries.len())
    }
}

fn prune_expired(entries: &mut HashMap<String, Entry>, now: DateTime<Utc>) {
    entries.retain(|_, entry| is_live(now, entry.expires_at));
}
