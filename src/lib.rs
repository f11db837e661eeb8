//! URL Cache - URL shortening backend with an in-process expiring cache
//!
//! Provides a read-through/write-through cache with TTL expiration and
//! background sweeping in front of a persistent URL store.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
mod tasks;

pub use api::AppState;
pub use cache::ExpiringCache;
pub use config::Config;
pub use service::UrlService;
pub use store::{MemoryStore, Store};
