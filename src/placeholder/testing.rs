//! Stub upstream server and fixtures shared by the cache and handler tests.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Counts requests per path so tests can assert how often the live
/// transport was actually hit.
#[derive(Clone, Default)]
pub struct UpstreamSpy {
  hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl UpstreamSpy {
  pub fn hits(&self, path: &str) -> usize {
    self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
  }

  fn record(&self, path: String) {
    *self.hits.lock().unwrap().entry(path).or_insert(0) += 1;
  }
}

/// Spawn a stub JSONPlaceholder-shaped upstream on an ephemeral port.
///
/// Serves user 1 ("Leanne Graham") plus her albums, posts and todos; any
/// other user id is a 404 with empty owned collections.
pub async fn spawn_upstream() -> (String, UpstreamSpy) {
  let spy = UpstreamSpy::default();

  let router = Router::new()
    .route("/users", get(users))
    .route("/users/:id", get(user))
    .route("/users/:id/albums", get(albums))
    .route("/users/:id/posts", get(posts))
    .route("/users/:id/todos", get(todos))
    .with_state(spy.clone());

  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, router.into_make_service()).await.unwrap();
  });

  (format!("http://{}", addr), spy)
}

/// The canonical first JSONPlaceholder user.
pub fn leanne() -> Value {
  json!({
    "id": 1,
    "name": "Leanne Graham",
    "username": "Bret",
    "email": "Sincere@april.biz",
    "address": {
      "street": "Kulas Light",
      "suite": "Apt. 556",
      "city": "Gwenborough",
      "zipcode": "92998-3874",
      "geo": {"lat": "-37.3159", "lng": "81.1496"}
    },
    "phone": "1-770-736-8031 x56442",
    "website": "hildegard.org",
    "company": {
      "name": "Romaguera-Crona",
      "catchPhrase": "Multi-layered client-server neural-net",
      "bs": "harness real-time e-markets"
    }
  })
}

async fn users(State(spy): State<UpstreamSpy>) -> Json<Value> {
  spy.record("/users".to_string());
  Json(json!([leanne()]))
}

async fn user(
  State(spy): State<UpstreamSpy>,
  Path(id): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
  spy.record(format!("/users/{}", id));

  if id == 1 {
    Ok(Json(leanne()))
  } else {
    Err(StatusCode::NOT_FOUND)
  }
}

async fn albums(State(spy): State<UpstreamSpy>, Path(id): Path<u64>) -> Json<Value> {
  spy.record(format!("/users/{}/albums", id));

  if id == 1 {
    Json(json!([
      {"userId": 1, "id": 1, "title": "quidem molestiae enim"},
      {"userId": 1, "id": 2, "title": "sunt qui excepturi placeat culpa"}
    ]))
  } else {
    Json(json!([]))
  }
}

async fn posts(State(spy): State<UpstreamSpy>, Path(id): Path<u64>) -> Json<Value> {
  spy.record(format!("/users/{}/posts", id));

  if id == 1 {
    Json(json!([
      {
        "userId": 1,
        "id": 1,
        "title": "sunt aut facere repellat provident",
        "body": "quia et suscipit\nsuscipit recusandae"
      }
    ]))
  } else {
    Json(json!([]))
  }
}

async fn todos(State(spy): State<UpstreamSpy>, Path(id): Path<u64>) -> Json<Value> {
  spy.record(format!("/users/{}/todos", id));

  if id == 1 {
    Json(json!([
      {"userId": 1, "id": 1, "title": "delectus aut autem", "completed": false},
      {"userId": 1, "id": 2, "title": "quis ut nam facilis", "completed": true}
    ]))
  } else {
    Json(json!([]))
  }
}
