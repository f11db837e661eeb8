//! Response DTOs for the URL service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for POST /shorten
#[derive(Debug, Clone, Serialize)]
pub struct ShortenResponse {
    /// Allocated or existing short code
    pub code: String,
    /// Public short URL
    pub short_url: String,
    /// The long URL
    pub url: String,
    /// False when the URL had already been shortened
    pub created: bool,
}

/// Response body for GET /resolve/:code
#[derive(Debug, Clone, Serialize)]
pub struct ResolveResponse {
    pub code: String,
    pub url: String,
}

impl ResolveResponse {
    pub fn new(code: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            url: url.into(),
        }
    }
}

/// Response body for DELETE /cache/:code
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Success message
    pub message: String,
    /// The code whose cached mapping was dropped
    pub code: String,
}

impl InvalidateResponse {
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            message: format!("Cached mapping for '{}' invalidated", code),
            code,
        }
    }
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of entries removed by the sweeper
    pub swept: u64,
    /// Entries currently held by the cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Whether the background sweeper is running
    pub sweeping: bool,
}

impl StatsResponse {
    pub fn new(stats: CacheStats, sweeping: bool) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            swept: stats.swept,
            total_entries: stats.total_entries,
            sweeping,
        }
    }
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
