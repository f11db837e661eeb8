//! Cache Module
//!
//! Provides an in-memory string cache with TTL expiration and background sweeping.

mod entry;
mod expiring;
mod stats;


// Re-export public types
pub use entry::CacheEntry;
pub use expiring::ExpiringCache;
pub use stats::CacheStats;

pub(crate) use expiring::CacheShared;
