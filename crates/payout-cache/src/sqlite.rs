//! SQLite-based cache implementation.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use payout_core::{ContentCache, PayoutError, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument};

/// SQLite-based content cache for long-lived processes.
///
/// This cache stores documents in a SQLite database file, providing persistence
/// across application restarts. Each row records its own expiry time, so
/// entries written with different TTLs coexist in one table.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Create a new SQLite cache at the given path.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| PayoutError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory SQLite cache.
    ///
    /// Useful for testing; data is lost when the cache is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| PayoutError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| PayoutError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS content_cache (
                key TEXT PRIMARY KEY NOT NULL,
                body TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| PayoutError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_content_cache_expires_at
             ON content_cache(expires_at)",
            [],
        )
        .map_err(|e| PayoutError::Cache(e.to_string()))?;

        debug!("SQLite cache schema initialized");
        Ok(())
    }

    fn expiry(ttl: Duration) -> Result<DateTime<Utc>> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| PayoutError::Cache(format!("Invalid TTL duration: {}", e)))?;
        Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| PayoutError::Cache("TTL overflows the calendar".to_string()))
    }
}

/// Fixed-width timestamps so that text comparison in SQL matches time order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl ContentCache for SqliteCache {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = timestamp(Utc::now());

        let conn = self
            .conn
            .lock()
            .map_err(|e| PayoutError::Cache(e.to_string()))?;

        let row = conn
            .query_row(
                "SELECT body, expires_at FROM content_cache WHERE key = ?1",
                params![key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(|e| PayoutError::Cache(e.to_string()))?;

        match row {
            Some((body, expires_at)) if expires_at > now => {
                debug!("Found cached entry");
                Ok(Some(body))
            }
            Some(_) => {
                conn.execute("DELETE FROM content_cache WHERE key = ?1", params![key])
                    .map_err(|e| PayoutError::Cache(e.to_string()))?;
                debug!("Cached entry expired");
                Ok(None)
            }
            None => {
                debug!("No cached entry found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let cached_at = timestamp(Utc::now());
        let expires_at = timestamp(Self::expiry(ttl)?);

        let conn = self
            .conn
            .lock()
            .map_err(|e| PayoutError::Cache(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO content_cache
             (key, body, cached_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, value, cached_at, expires_at],
        )
        .map_err(|e| PayoutError::Cache(e.to_string()))?;

        debug!("Cached entry");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| PayoutError::Cache(e.to_string()))?;

        conn.execute("DELETE FROM content_cache WHERE key = ?1", params![key])
            .map_err(|e| PayoutError::Cache(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self) -> Result<usize> {
        let now = timestamp(Utc::now());

        let conn = self
            .conn
            .lock()
            .map_err(|e| PayoutError::Cache(e.to_string()))?;

        let deleted = conn
            .execute(
                "DELETE FROM content_cache WHERE expires_at <= ?1",
                params![now],
            )
            .map_err(|e| PayoutError::Cache(e.to_string()))?;

        if deleted > 0 {
            debug!("Invalidated {} stale cache entries", deleted);
        }

        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| PayoutError::Cache(e.to_string()))?;

        conn.execute("DELETE FROM content_cache", [])
            .map_err(|e| PayoutError::Cache(e.to_string()))?;

        debug!("Cleared all cache entries");
        Ok(())
    }
}
