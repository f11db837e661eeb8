//! Store Module
//!
//! Persistence capability behind the cache. The service only needs point
//! reads and writes, so a store is a plain string key-value interface.

mod memory;

use std::future::Future;

use crate::error::StoreError;

pub use memory::MemoryStore;

/// Prefix of the reverse keyspace mapping a long URL to its short code.
pub const URL_KEY_PREFIX: &str = "url:";

/// Builds the reverse lookup key for a long URL.
pub fn url_key(url: &str) -> String {
    format!("{URL_KEY_PREFIX}{url}")
}

// == Store Trait ==
/// Persistent string key-value storage.
///
/// Implementations are shared across request handlers and must allow
/// concurrent access through `&self`.
pub trait Store: Send + Sync + 'static {
    /// Looks up `key`, returning `None` when it is absent.
    fn get(&self, key: &str) -> impl Future<Output = Option<String>> + Send;

    /// Persists `value` under `key`.
    ///
    /// # Errors
    /// Returns [`StoreError::Conflict`] if `key` is already bound to a
    /// different value, or [`StoreError::Unavailable`] on backend failure.
    fn put(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}
