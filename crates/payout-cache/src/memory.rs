//! In-memory cache implementation.

use async_trait::async_trait;
use chrono::Utc;
use payout_core::{ContentCache, Result};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Default number of entries kept by [`InMemoryCache::new`].
pub const DEFAULT_CAPACITY: usize = 512;

/// Cache entry with timestamp for TTL-based invalidation.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    cached_at: chrono::DateTime<Utc>,
    ttl: Duration,
    last_access: u64,
}

impl CacheEntry {
    fn is_stale(&self) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(self.ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<String, CacheEntry>,
    clock: u64,
}

impl Entries {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .map
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            debug!(key = %key, "Evicting least recently used entry");
            self.map.remove(&key);
        }
    }
}

/// Bounded in-memory LRU cache for ephemeral deployments and tests.
///
/// Entries are stored in a `Mutex`-protected `HashMap` and are lost when the
/// cache is dropped. Once `capacity` entries are held, inserting a new key
/// evicts the least recently read or written entry. Expired entries are
/// dropped lazily on read, or eagerly via [`ContentCache::invalidate_stale`].
#[derive(Debug)]
pub struct InMemoryCache {
    entries: Mutex<Entries>,
    capacity: usize,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCache {
    /// Create a new empty cache holding at most [`DEFAULT_CAPACITY`] entries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new empty cache holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity: capacity.max(1),
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.map.len()
    }

    /// Returns true if the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.map.is_empty()
    }
}

#[async_trait]
impl ContentCache for InMemoryCache {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        let now = entries.tick();

        let stale = match entries.map.get_mut(key) {
            Some(entry) if !entry.is_stale() => {
                entry.last_access = now;
                debug!("Cache hit");
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };

        if stale {
            debug!("Cache entry expired");
            entries.map.remove(key);
        } else {
            debug!("Cache miss");
        }
        Ok(None)
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let now = entries.tick();

        if !entries.map.contains_key(key) && entries.map.len() >= self.capacity {
            entries.evict_lru();
        }

        entries.map.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                cached_at: Utc::now(),
                ttl,
                last_access: now,
            },
        );
        debug!("Cached entry");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().await.map.remove(key);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self) -> Result<usize> {
        let mut entries = self.entries.lock().await;
        let before = entries.map.len();
        entries.map.retain(|_, entry| !entry.is_stale());
        let removed = before - entries.map.len();

        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.entries.lock().await.map.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }
}
