//! Domain records for the upstream resources.
//!
//! Field names map 1:1 onto the upstream JSON, so the same types serve for
//! decoding upstream bodies and for serializing our own responses. Records
//! are never mutated after decoding.

use serde::{Deserialize, Serialize};

/// A user profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id: u64,
  pub name: String,
  pub username: String,
  pub email: String,
  pub address: Address,
  pub phone: String,
  pub website: String,
  pub company: Company,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
  pub street: String,
  pub suite: String,
  pub city: String,
  pub zipcode: String,
  pub geo: Geo,
}

/// Coordinates, kept as the strings the upstream serves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geo {
  pub lat: String,
  pub lng: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
  pub name: String,
  #[serde(rename = "catchPhrase")]
  pub catch_phrase: String,
  pub bs: String,
}

/// An album owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
  #[serde(rename = "userId")]
  pub user_id: u64,
  pub id: u64,
  pub title: String,
}

/// A post written by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
  #[serde(rename = "userId")]
  pub user_id: u64,
  pub id: u64,
  pub title: String,
  pub body: String,
}

/// An entry on a user's todo list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
  #[serde(rename = "userId")]
  pub user_id: u64,
  pub id: u64,
  pub title: String,
  pub completed: bool,
}

/// The per-user resource bundle served alongside a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetails {
  pub todos: Vec<Todo>,
  pub posts: Vec<Post>,
  pub albums: Vec<Album>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_user_decodes_from_upstream_json() {
    let user: User = serde_json::from_value(super::super::testing::leanne()).unwrap();

    assert_eq!(user.id, 1);
    assert_eq!(user.name, "Leanne Graham");
    assert_eq!(user.username, "Bret");
    assert_eq!(user.address.city, "Gwenborough");
    assert_eq!(user.address.geo.lat, "-37.3159");
    assert_eq!(user.company.catch_phrase, "Multi-layered client-server neural-net");
  }

  #[test]
  fn test_owned_resources_use_camel_case_on_the_wire() {
    let todo = Todo {
      user_id: 1,
      id: 5,
      title: "delectus aut autem".to_string(),
      completed: false,
    };

    let value = serde_json::to_value(&todo).unwrap();
    assert_eq!(value["userId"], 1);
    assert!(value.get("user_id").is_none());
  }
}
