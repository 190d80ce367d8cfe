//! Cache keys for upstream queries.

use sha2::{Digest, Sha256};

use crate::cache::QueryKey;

/// Query key types for the upstream API.
///
/// One variant per (resource kind, resource id) pair the fetcher can ask
/// for, so every cacheable call has an explicit, stable identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaceholderQueryKey {
  /// The full user listing
  Users,
  /// A single user by id
  User { id: u64 },
  /// Albums owned by a user
  UserAlbums { user_id: u64 },
  /// Posts written by a user
  UserPosts { user_id: u64 },
  /// Todos on a user's list
  UserTodos { user_id: u64 },
}

impl QueryKey for PlaceholderQueryKey {
  fn cache_hash(&self) -> String {
    let input = match self {
      Self::Users => "users".to_string(),
      Self::User { id } => format!("user:{}", id),
      Self::UserAlbums { user_id } => format!("user_albums:{}", user_id),
      Self::UserPosts { user_id } => format!("user_posts:{}", user_id),
      Self::UserTodos { user_id } => format!("user_todos:{}", user_id),
    };

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
  }

  fn description(&self) -> String {
    match self {
      Self::Users => "all users".to_string(),
      Self::User { id } => format!("user {}", id),
      Self::UserAlbums { user_id } => format!("albums for user {}", user_id),
      Self::UserPosts { user_id } => format!("posts for user {}", user_id),
      Self::UserTodos { user_id } => format!("todos for user {}", user_id),
    }
  }
}
