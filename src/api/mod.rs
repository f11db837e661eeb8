//! API Module
//!
//! HTTP handlers and routing for the URL service REST API.
//!
//! # Endpoints
//! - `POST /shorten` - Shorten a URL
//! - `GET /:code` - Redirect to the long URL
//! - `GET /resolve/:code` - Look up the long URL
//! - `DELETE /cache/:code` - Drop a cached mapping
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
