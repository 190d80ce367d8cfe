//! Cache layer that orchestrates caching logic with live fetching.

use chrono::Duration;
use color_eyre::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::storage::CacheStorage;
use super::traits::{CacheResult, QueryKey};

/// Cache layer that manages caching logic and live fetching.
///
/// This layer sits between the application and the upstream client,
/// providing transparent caching with a fixed expiry per entry.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  /// How long stored entries stay valid
  ttl: Duration,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
      ttl: Duration::minutes(5),
    }
  }

  /// Set the expiry applied to newly stored entries.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// The configured expiry for stored entries.
  #[allow(dead_code)]
  pub fn expiry(&self) -> Duration {
    self.ttl
  }

  /// Fetch a value with cache-first strategy.
  ///
  /// 1. Look the key up in storage - an unexpired hit is returned as-is
  /// 2. On a miss, run the live fetcher
  /// 3. Store fresh data under the key with the configured expiry
  /// 4. A live fetch failure collapses to `None` - absence is the only
  ///    error signal callers see
  ///
  /// Storage faults still propagate as `Err`: they are internal problems,
  /// not upstream conditions.
  pub async fn fetch_cached<T, K, F, Fut>(
    &self,
    key: &K,
    fetcher: F,
  ) -> Result<Option<CacheResult<T>>>
  where
    T: Serialize + DeserializeOwned,
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let hash = key.cache_hash();

    if let Some(entry) = self.storage.fetch::<T>(&hash)? {
      debug!(query = %key.description(), cached_at = %entry.cached_at, "cache hit");
      return Ok(Some(CacheResult::from_cache(entry.value, entry.cached_at)));
    }

    debug!(query = %key.description(), "cache miss, fetching live");
    match fetcher().await {
      Ok(data) => {
        self.storage.store(&hash, &key.description(), &data, self.ttl)?;
        Ok(Some(CacheResult::from_network(data)))
      }
      Err(e) => {
        warn!(query = %key.description(), "live fetch failed, treating as no data: {:#}", e);
        Ok(None)
      }
    }
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      ttl: self.ttl,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::storage::{NoopStorage, SqliteStorage};
  use crate::cache::traits::CacheSource;
  use color_eyre::eyre::eyre;
  use std::sync::atomic::{AtomicUsize, Ordering};

  struct TestKey(&'static str);

  impl QueryKey for TestKey {
    fn cache_hash(&self) -> String {
      self.0.to_string()
    }

    fn description(&self) -> String {
      self.0.to_string()
    }
  }

  #[tokio::test]
  async fn test_second_fetch_is_served_from_cache() {
    let layer = CacheLayer::new(SqliteStorage::open_in_memory().unwrap());
    let calls = Arc::new(AtomicUsize::new(0));

    for expected_source in [CacheSource::Network, CacheSource::Cache] {
      let calls = Arc::clone(&calls);
      let result = layer
        .fetch_cached(&TestKey("users"), move || async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(vec![1u32, 2, 3])
        })
        .await
        .unwrap()
        .unwrap();

      assert_eq!(result.data, vec![1, 2, 3]);
      assert_eq!(result.source, expected_source);
    }

    // The live transport ran exactly once
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_expired_entry_fetches_live_again() {
    let layer =
      CacheLayer::new(SqliteStorage::open_in_memory().unwrap()).with_ttl(Duration::zero());
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
      let calls = Arc::clone(&calls);
      let result = layer
        .fetch_cached(&TestKey("users"), move || async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(7u32)
        })
        .await
        .unwrap()
        .unwrap();

      assert_eq!(result.source, CacheSource::Network);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_failed_live_fetch_yields_absence() {
    let layer = CacheLayer::new(SqliteStorage::open_in_memory().unwrap());

    let result = layer
      .fetch_cached::<u32, _, _, _>(&TestKey("users"), || async {
        Err(eyre!("connection refused"))
      })
      .await
      .unwrap();

    assert!(result.is_none());

    // The failure was not cached; a later successful fetch goes through
    let result = layer
      .fetch_cached(&TestKey("users"), || async { Ok(7u32) })
      .await
      .unwrap()
      .unwrap();
    assert_eq!(result.data, 7);
  }

  #[tokio::test]
  async fn test_noop_storage_always_fetches_live() {
    let layer = CacheLayer::new(NoopStorage);
    let calls = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
      let calls = Arc::clone(&calls);
      let result = layer
        .fetch_cached(&TestKey("users"), move || async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(7u32)
        })
        .await
        .unwrap()
        .unwrap();

      assert_eq!(result.source, CacheSource::Network);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn test_with_ttl_sets_expiry() {
    let layer = CacheLayer::new(NoopStorage).with_ttl(Duration::seconds(60));
    assert_eq!(layer.expiry(), Duration::seconds(60));
  }
}
