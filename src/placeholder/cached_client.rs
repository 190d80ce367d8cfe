//! Cached upstream client that wraps PlaceholderClient with transparent caching.

use color_eyre::{eyre::eyre, Result};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::cache::{CacheLayer, CacheStorage};
use crate::config::Config;

use super::cache::PlaceholderQueryKey;
use super::client::PlaceholderClient;
use super::types::{Album, Post, Todo, User, UserDetails};

/// Upstream client with transparent caching support.
///
/// This wraps the underlying PlaceholderClient and provides the same
/// resources, but serves repeated queries from the cache store until their
/// entries expire. A query the cache cannot answer and the upstream fails to
/// answer comes back as absent data, never as an error.
pub struct CachedPlaceholderClient<S: CacheStorage> {
  inner: PlaceholderClient,
  cache: CacheLayer<S>,
  /// Full user listing, reused for the lifetime of this instance
  users: Arc<Mutex<Vec<User>>>,
}

impl<S: CacheStorage> Clone for CachedPlaceholderClient<S> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
      cache: self.cache.clone(),
      users: Arc::clone(&self.users),
    }
  }
}

impl<S: CacheStorage> CachedPlaceholderClient<S> {
  /// Create a new cached client over the given storage backend.
  pub fn new(config: &Config, storage: S) -> Result<Self> {
    let inner = PlaceholderClient::new(config)?;
    let cache = CacheLayer::new(storage).with_ttl(config.cache_ttl());

    Ok(Self {
      inner,
      cache,
      users: Arc::new(Mutex::new(Vec::new())),
    })
  }

  /// The full user collection.
  ///
  /// The first call populates the in-memory collection via a fetch-all;
  /// later calls reuse it. A failed fetch-all leaves the collection empty,
  /// so the next call tries again.
  pub async fn users(&self) -> Result<Vec<User>> {
    {
      let users = self.lock_users()?;
      if !users.is_empty() {
        return Ok(users.clone());
      }
    }

    let fetched = self.fetch_all().await?;
    let mut users = self.lock_users()?;
    if users.is_empty() {
      *users = fetched;
    }

    Ok(users.clone())
  }

  async fn fetch_all(&self) -> Result<Vec<User>> {
    let result = self
      .cache
      .fetch_cached(&PlaceholderQueryKey::Users, || {
        let inner = self.inner.clone();
        async move { inner.get_users().await }
      })
      .await?;

    Ok(result.map(|r| r.data).unwrap_or_default())
  }

  /// A single user by id, or `None` when neither the cache nor the upstream
  /// has one.
  pub async fn user(&self, id: u64) -> Result<Option<User>> {
    let result = self
      .cache
      .fetch_cached(&PlaceholderQueryKey::User { id }, || {
        let inner = self.inner.clone();
        async move { inner.get_user(id).await }
      })
      .await?;

    Ok(result.map(|r| r.data))
  }

  /// Albums owned by the given user.
  pub async fn albums(&self, user: &User) -> Result<Vec<Album>> {
    let user_id = user.id;
    let result = self
      .cache
      .fetch_cached(&PlaceholderQueryKey::UserAlbums { user_id }, || {
        let inner = self.inner.clone();
        async move { inner.get_user_albums(user_id).await }
      })
      .await?;

    Ok(result.map(|r| r.data).unwrap_or_default())
  }

  /// Posts written by the given user.
  pub async fn posts(&self, user: &User) -> Result<Vec<Post>> {
    let user_id = user.id;
    let result = self
      .cache
      .fetch_cached(&PlaceholderQueryKey::UserPosts { user_id }, || {
        let inner = self.inner.clone();
        async move { inner.get_user_posts(user_id).await }
      })
      .await?;

    Ok(result.map(|r| r.data).unwrap_or_default())
  }

  /// Todos on the given user's list.
  pub async fn todos(&self, user: &User) -> Result<Vec<Todo>> {
    let user_id = user.id;
    let result = self
      .cache
      .fetch_cached(&PlaceholderQueryKey::UserTodos { user_id }, || {
        let inner = self.inner.clone();
        async move { inner.get_user_todos(user_id).await }
      })
      .await?;

    Ok(result.map(|r| r.data).unwrap_or_default())
  }

  /// Todos, posts and albums for a user, bundled.
  ///
  /// Three independent cache-or-live calls, made sequentially.
  pub async fn user_details(&self, user: &User) -> Result<UserDetails> {
    let todos = self.todos(user).await?;
    let posts = self.posts(user).await?;
    let albums = self.albums(user).await?;

    Ok(UserDetails {
      todos,
      posts,
      albums,
    })
  }

  fn lock_users(&self) -> Result<MutexGuard<'_, Vec<User>>> {
    self.users.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}
