//! Generic caching layer for upstream responses.
//!
//! This module provides a resource-agnostic caching mechanism that:
//! - Keys entries by an explicit, enumerated query identity
//! - Serves unexpired entries without touching the network
//! - Collapses live-fetch failures into absent data
//! - Expires entries naturally; there is no other invalidation

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{CacheStorage, NoopStorage, SqliteStorage};
pub use traits::QueryKey;
