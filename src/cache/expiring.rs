//! Expiring Cache Module
//!
//! String-keyed cache with per-entry TTL, lazy expiration on read and a
//! background sweeper that evicts expired entries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheEntry, CacheStats};
use crate::error::CacheError;
use crate::tasks::SweeperHandle;

type EntryMap = HashMap<String, CacheEntry>;

// == Shared State ==
/// State shared between the cache handle and its sweeper.
///
/// The sweeper only holds a `Weak` reference, so dropping the cache ends it.
#[derive(Debug, Default)]
pub(crate) struct CacheShared {
    entries: RwLock<EntryMap>,
    stats: StatsRecorder,
}

impl CacheShared {
    // Critical sections never leave the map half-written, so a poisoned
    // lock still guards a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, EntryMap> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, EntryMap> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    // == Expired Keys ==
    /// Collects keys whose finite expiration has passed, under the shared lock.
    pub(crate) fn expired_keys(&self) -> Vec<String> {
        let now = Utc::now();
        self.read()
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Clear Values ==
    /// Removes the given keys under the exclusive lock.
    ///
    /// Each key is re-checked before removal: an entry overwritten by `set`
    /// after the scan is left alone.
    pub(crate) fn clear_values(&self, keys: Vec<String>) -> usize {
        let removed = {
            let mut entries = self.write();
            let now = Utc::now();
            let mut removed = 0;
            for key in keys {
                if entries.get(&key).is_some_and(|entry| entry.is_expired_at(now)) {
                    entries.remove(&key);
                    removed += 1;
                }
            }
            removed
        };

        self.stats.record_swept(removed);
        removed
    }

    // == Sweep ==
    /// Runs one scan-then-delete pass and returns the number of evicted entries.
    pub(crate) fn sweep(&self) -> usize {
        let keys = self.expired_keys();
        if keys.is_empty() {
            return 0;
        }
        self.clear_values(keys)
    }
}

// == Expiring Cache ==
/// In-memory string cache with time-based expiration.
///
/// Reads take the lock in shared mode and never mutate the map: an expired
/// entry is reported as missing but stays stored until the sweeper or
/// [`delete`](Self::delete) removes it.
#[derive(Debug)]
pub struct ExpiringCache {
    shared: Arc<CacheShared>,
    /// TTL applied when `set` is called with a zero TTL
    default_ttl: Duration,
    /// Period of the background sweeper, zero disables it
    sweep_interval: Duration,
    sweeper: Mutex<Option<SweeperHandle>>,
}

impl ExpiringCache {
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// When `sweep_interval` is non-zero a background sweeper is started and
    /// runs until [`close`](Self::close) is called or the cache is dropped.
    /// Inside a Tokio runtime the sweeper is a task, otherwise a dedicated thread.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL used by `set` when called with `Duration::ZERO`;
    ///   zero means entries never expire by default
    /// * `sweep_interval` - Period between sweeps, `Duration::ZERO` disables sweeping
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        let shared = Arc::new(CacheShared::default());

        let sweeper = if sweep_interval.is_zero() {
            None
        } else {
            Some(SweeperHandle::spawn(Arc::downgrade(&shared), sweep_interval))
        };

        Self {
            shared,
            default_ttl,
            sweep_interval,
            sweeper: Mutex::new(sweeper),
        }
    }

    // == Set ==
    /// Stores a value, overwriting any previous entry for the key.
    ///
    /// A zero `ttl` falls back to the default TTL. If the effective TTL is
    /// still zero the entry never expires.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>, ttl: Duration) {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        let ttl = (!ttl.is_zero()).then_some(ttl);

        let entry = CacheEntry::new(value.into(), ttl);
        self.shared.write().insert(key.into(), entry);
    }

    // == Get ==
    /// Returns the value for `key` if present and not expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.shared.read();

        match entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.shared.stats.record_hit();
                Some(entry.value.clone())
            }
            _ => {
                self.shared.stats.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes an entry by key, expired or not.
    ///
    /// # Errors
    /// Returns [`CacheError::KeyNotFound`] if nothing is stored under `key`.
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self.shared.write().remove(key) {
            Some(_) => Ok(()),
            None => Err(CacheError::KeyNotFound(key.to_string())),
        }
    }

    // == Sweep Now ==
    /// Runs one eviction pass immediately, independent of the background sweeper.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_now(&self) -> usize {
        self.shared.sweep()
    }

    // == Close ==
    /// Stops the background sweeper. Safe to call more than once.
    pub fn close(&self) {
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            debug!("Closing cache sweeper");
            handle.stop();
        }
    }

    /// Returns true while the background sweeper is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.shared.stats.snapshot(self.len())
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.shared.read().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.shared.read().is_empty()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> &CacheShared {
        &self.shared
    }
}

impl Drop for ExpiringCache {
    fn drop(&mut self) {
        self.close();
    }
}
