//! Request DTOs for the URL service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for POST /shorten
#[derive(Debug, Clone, Deserialize)]
pub struct ShortenRequest {
    /// The long URL to shorten
    pub url: String,
}
