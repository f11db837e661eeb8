//! In-memory store backed by a HashMap.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use super::Store;
use crate::error::StoreError;

/// Store that keeps every record in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.records.read().await.get(key).cloned()
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;

        match records.get(key) {
            Some(existing) if existing == value => Ok(()),
            Some(_) => Err(StoreError::Conflict(key.to_string())),
            None => {
                records.insert(key.to_string(), value.to_string());
                debug!(key, "Stored record");
                Ok(())
            }
        }
    }
}
