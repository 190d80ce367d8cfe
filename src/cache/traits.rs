//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};

/// Identity of a cacheable upstream query.
///
/// Implementors enumerate every distinct (resource kind, resource id) pair the
/// application can ask for, so cache keys stay stable across runs and builds.
pub trait QueryKey {
  /// Stable, fixed-length storage key for this query.
  fn cache_hash(&self) -> String;

  /// Human-readable description, used in logs and stored alongside entries.
  fn description(&self) -> String;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from a fresh live fetch.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where fetched data came from.
///
/// Informational only: nothing downstream branches on this. It feeds the
/// debug logs and the cache tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from the live upstream call
  Network,
  /// Data served from the cache store
  Cache,
}
