//! Cache trait for storing fetched source content.
//!
//! This module defines the [`ContentCache`] trait that every cache backend
//! implements, and [`cache_key`], which turns a request URL into the hashed key
//! backends are addressed by.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::fmt::Debug;
use std::time::Duration;

use crate::error::Result;

/// Prefix shared by every content cache key.
pub const CACHE_KEY_PREFIX: &str = "edgar:";

/// Trait for caching fetched documents keyed by hashed request URL.
///
/// Implementations can store content in various backends (SQLite, in-memory,
/// etc.) to avoid re-downloading unchanged documents. Every entry carries its
/// own time-to-live; expired entries must never be returned.
#[async_trait]
pub trait ContentCache: Send + Sync + Debug {
    /// Retrieves a cached value.
    ///
    /// Returns `Ok(Some(value))` if a fresh entry exists, `Ok(None)` otherwise.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Removes a single entry.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Removes every expired entry.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;
}

/// Derives the cache key for a request URL.
///
/// Keys are fixed width regardless of URL length.
#[must_use]
pub fn cache_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    format!("{CACHE_KEY_PREFIX}{}", hex::encode(digest))
}

/// Derives the cache key for a read bounded to `max_bytes`.
///
/// Bounded reads may be truncated, so they never share a key with the full
/// document.
#[must_use]
pub fn bounded_cache_key(url: &str, max_bytes: usize) -> String {
    cache_key(&format!("{url}#max_bytes={max_bytes}"))
}
