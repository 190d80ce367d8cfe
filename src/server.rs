//! Read-only HTTP API over the cached fetcher.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use crate::cache::CacheStorage;
use crate::config::ServerConfig;
use crate::placeholder::types::{User, UserDetails};
use crate::placeholder::CachedPlaceholderClient;

/// Shared state handed to every request handler.
pub struct AppState<S: CacheStorage> {
  fetcher: Arc<CachedPlaceholderClient<S>>,
}

impl<S: CacheStorage> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      fetcher: Arc::clone(&self.fetcher),
    }
  }
}

impl<S: CacheStorage> AppState<S> {
  pub fn new(fetcher: CachedPlaceholderClient<S>) -> Self {
    Self {
      fetcher: Arc::new(fetcher),
    }
  }
}

/// Response body for the single-user endpoint.
#[derive(Debug, Serialize)]
struct UserResponse {
  user: User,
  details: UserDetails,
}

/// Build the router, nesting the read-only routes under the configured
/// namespace. Requests are unconditionally permitted; there are no write
/// operations.
pub fn router<S: CacheStorage + 'static>(config: &ServerConfig, state: AppState<S>) -> Router {
  let routes = Router::new()
    .route("/users", get(list_users::<S>))
    .route("/users/:id", get(get_user::<S>))
    .with_state(state);

  let namespace = config.namespace.trim_matches('/');
  if namespace.is_empty() {
    routes
  } else {
    Router::new().nest(&format!("/{}", namespace), routes)
  }
}

/// `GET /<ns>/users` - the full user collection.
async fn list_users<S: CacheStorage>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<User>>, ApiError> {
  let users = state.fetcher.users().await?;

  Ok(Json(users))
}

/// `GET /<ns>/users/{id}` - a single user with their details bundle, or an
/// empty-body 404 when the user is unknown.
async fn get_user<S: CacheStorage>(
  State(state): State<AppState<S>>,
  Path(id): Path<u64>,
) -> Result<Response, ApiError> {
  let user = match state.fetcher.user(id).await? {
    Some(user) => user,
    None => return Ok(StatusCode::NOT_FOUND.into_response()),
  };

  let details = state.fetcher.user_details(&user).await?;

  Ok(Json(UserResponse { user, details }).into_response())
}

/// Internal fault surfaced as a 500. Upstream absence never lands here,
/// only storage and serialization problems do.
struct ApiError(color_eyre::Report);

impl From<color_eyre::Report> for ApiError {
  fn from(report: color_eyre::Report) -> Self {
    Self(report)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    error!("request failed: {:#}", self.0);

    StatusCode::INTERNAL_SERVER_ERROR.into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::SqliteStorage;
  use crate::config::{Config, UpstreamConfig};
  use crate::placeholder::testing;
  use axum::body::Body;
  use axum::http::Request;
  use http_body_util::BodyExt;
  use tower::ServiceExt;

  async fn test_router() -> (Router, testing::UpstreamSpy) {
    let (endpoint, spy) = testing::spawn_upstream().await;
    let config = Config {
      upstream: UpstreamConfig { endpoint },
      ..Config::default()
    };
    let storage = SqliteStorage::open_in_memory().unwrap();
    let fetcher = CachedPlaceholderClient::new(&config, storage).unwrap();

    (router(&config.server, AppState::new(fetcher)), spy)
  }

  async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn test_list_users_returns_the_collection() {
    let (app, _spy) = test_router().await;

    let response = app
      .oneshot(Request::builder().uri("/api/v1/users").body(Body::empty()).unwrap())
      .await
      .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["id"], 1);
    assert_eq!(body[0]["name"], "Leanne Graham");
  }

  #[tokio::test]
  async fn test_get_user_bundles_details() {
    let (app, _spy) = test_router().await;

    let response = app
      .oneshot(Request::builder().uri("/api/v1/users/1").body(Body::empty()).unwrap())
      .await
      .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["name"], "Leanne Graham");

    for collection in ["todos", "posts", "albums"] {
      let entries = body["details"][collection].as_array().unwrap();
      assert!(!entries.is_empty(), "{} should not be empty", collection);
      assert!(entries.iter().all(|e| e["userId"] == 1));
    }
  }

  #[tokio::test]
  async fn test_unknown_user_is_an_empty_404() {
    let (app, _spy) = test_router().await;

    let response = app
      .oneshot(Request::builder().uri("/api/v1/users/9999").body(Body::empty()).unwrap())
      .await
      .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
  }

  #[tokio::test]
  async fn test_repeated_request_is_served_from_cache() {
    let (app, spy) = test_router().await;

    for _ in 0..2 {
      let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/v1/users/1").body(Body::empty()).unwrap())
        .await
        .unwrap();
      assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(spy.hits("/users/1"), 1);
    assert_eq!(spy.hits("/users/1/todos"), 1);
    assert_eq!(spy.hits("/users/1/posts"), 1);
    assert_eq!(spy.hits("/users/1/albums"), 1);
  }

  #[tokio::test]
  async fn test_routes_follow_the_configured_namespace() {
    let (endpoint, _spy) = testing::spawn_upstream().await;
    let mut config = Config {
      upstream: UpstreamConfig { endpoint },
      ..Config::default()
    };
    config.server.namespace = "placeholder/v2".to_string();

    let storage = SqliteStorage::open_in_memory().unwrap();
    let fetcher = CachedPlaceholderClient::new(&config, storage).unwrap();
    let app = router(&config.server, AppState::new(fetcher));

    let response = app
      .clone()
      .oneshot(Request::builder().uri("/placeholder/v2/users").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
      .oneshot(Request::builder().uri("/api/v1/users").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
  }
}
