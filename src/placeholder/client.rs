//! Plain HTTP transport for the upstream API.

use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;

use super::types::{Album, Post, Todo, User};

/// Upstream API client wrapper.
#[derive(Clone)]
pub struct PlaceholderClient {
  http: reqwest::Client,
  endpoint: Url,
}

impl PlaceholderClient {
  pub fn new(config: &Config) -> Result<Self> {
    let mut endpoint = Url::parse(&config.upstream.endpoint).map_err(|e| {
      eyre!("Invalid upstream endpoint {}: {}", config.upstream.endpoint, e)
    })?;

    // Url::join treats the last segment as a file, so the base must end in /
    if !endpoint.path().ends_with('/') {
      endpoint.set_path(&format!("{}/", endpoint.path()));
    }

    Ok(Self {
      http: reqwest::Client::new(),
      endpoint,
    })
  }

  /// GET a path below the endpoint and decode the JSON body.
  /// Non-2xx statuses are errors.
  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let url = self
      .endpoint
      .join(path)
      .map_err(|e| eyre!("Invalid request path {}: {}", path, e))?;

    let response = self
      .http
      .get(url.clone())
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?
      .error_for_status()
      .map_err(|e| eyre!("Request to {} failed: {}", url, e))?;

    response
      .json()
      .await
      .map_err(|e| eyre!("Failed to decode response from {}: {}", url, e))
  }

  /// Fetch the full user listing.
  pub async fn get_users(&self) -> Result<Vec<User>> {
    self.get_json("users").await
  }

  /// Fetch a single user by id.
  pub async fn get_user(&self, id: u64) -> Result<User> {
    self.get_json(&format!("users/{}", id)).await
  }

  /// Fetch the albums owned by a user.
  pub async fn get_user_albums(&self, user_id: u64) -> Result<Vec<Album>> {
    self.get_json(&format!("users/{}/albums", user_id)).await
  }

  /// Fetch the posts written by a user.
  pub async fn get_user_posts(&self, user_id: u64) -> Result<Vec<Post>> {
    self.get_json(&format!("users/{}/posts", user_id)).await
  }

  /// Fetch the todos on a user's list.
  pub async fn get_user_todos(&self, user_id: u64) -> Result<Vec<Todo>> {
    self.get_json(&format!("users/{}/todos", user_id)).await
  }
}
