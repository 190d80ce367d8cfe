//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Duration, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A single cached entry, decoded from storage.
#[derive(Debug, Clone)]
pub struct CachedEntry<T> {
  /// The cached value
  pub value: T,
  /// When the value was stored
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Look up an unexpired entry by key. An expired entry behaves like a miss.
  fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedEntry<T>>>;

  /// Store a value under a key, valid for `ttl` from now.
  fn store<T: Serialize>(&self, key: &str, description: &str, value: &T, ttl: Duration)
    -> Result<()>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn fetch<T: DeserializeOwned>(&self, _key: &str) -> Result<Option<CachedEntry<T>>> {
    Ok(None) // Always miss
  }

  fn store<T: Serialize>(
    &self,
    _key: &str,
    _description: &str,
    _value: &T,
    _ttl: Duration,
  ) -> Result<()> {
    Ok(()) // Discard
  }
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the cache database, creating it if needed.
  ///
  /// With no explicit path the database lives under the platform data
  /// directory.
  pub fn open(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// Open an in-memory cache database. Entries vanish with the process.
  #[allow(dead_code)]
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;

    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("placeholderd").join("cache.db"))
  }

  /// Run database migrations for the cache table.
  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }
}

/// Schema for the cache table.
const CACHE_SCHEMA: &str = r#"
-- Upstream responses, serialized as JSON, keyed by query hash
CREATE TABLE IF NOT EXISTS response_cache (
    query_hash TEXT PRIMARY KEY,
    query_description TEXT NOT NULL,
    payload BLOB NOT NULL,
    cached_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_response_cache_expires
    ON response_cache(expires_at);
"#;

impl CacheStorage for SqliteStorage {
  fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedEntry<T>>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT payload, cached_at, expires_at FROM response_cache WHERE query_hash = ?")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let row: Option<(Vec<u8>, String, String)> = stmt
      .query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
      .ok();

    let (payload, cached_at_str, expires_at_str) = match row {
      Some(row) => row,
      None => return Ok(None),
    };

    // Natural expiry: a stale row is a miss, and gets dropped on observation
    let expires_at = parse_datetime(&expires_at_str)?;
    if expires_at <= Utc::now() {
      conn
        .execute(
          "DELETE FROM response_cache WHERE query_hash = ?",
          params![key],
        )
        .map_err(|e| eyre!("Failed to delete expired entry: {}", e))?;
      return Ok(None);
    }

    let value: T = serde_json::from_slice(&payload)
      .map_err(|e| eyre!("Failed to deserialize cached payload: {}", e))?;
    let cached_at = parse_datetime(&cached_at_str)?;

    Ok(Some(CachedEntry { value, cached_at }))
  }

  fn store<T: Serialize>(
    &self,
    key: &str,
    description: &str,
    value: &T,
    ttl: Duration,
  ) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let payload =
      serde_json::to_vec(value).map_err(|e| eyre!("Failed to serialize payload: {}", e))?;
    let now = Utc::now();
    let expires_at = now + ttl;

    conn
      .execute(
        "INSERT OR REPLACE INTO response_cache (query_hash, query_description, payload, cached_at, expires_at)
         VALUES (?, ?, ?, ?, ?)",
        params![
          key,
          description,
          payload,
          format_datetime(now),
          format_datetime(expires_at)
        ],
      )
      .map_err(|e| eyre!("Failed to store cache entry: {}", e))?;

    Ok(())
  }
}

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

fn format_datetime(dt: DateTime<Utc>) -> String {
  dt.format(DATETIME_FORMAT).to_string()
}

/// Parse a datetime string in the storage format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  chrono::NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
