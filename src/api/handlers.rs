//! API Handlers
//!
//! HTTP request handlers for each URL service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderValue,
    response::Redirect,
    Json,
};

use crate::cache::ExpiringCache;
use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::models::{
    HealthResponse, InvalidateResponse, ResolveResponse, ShortenRequest, ShortenResponse,
    StatsResponse,
};
use crate::service::UrlService;
use crate::store::MemoryStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// URL service owning the cache and the store
    pub service: Arc<UrlService<MemoryStore>>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates a new AppState around an existing service.
    pub fn new(service: UrlService<MemoryStore>, config: Config) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Starts the cache sweeper, so this must run inside a Tokio runtime when
    /// `cleanup_interval` is non-zero.
    pub fn from_config(config: &Config) -> Self {
        let cache = ExpiringCache::new(config.default_ttl(), config.cleanup_interval());
        let service = UrlService::new(MemoryStore::new(), cache);
        Self::new(service, config.clone())
    }
}

/// Handler for POST /shorten
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(req): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>> {
    let link = state.service.shorten(&req.url).await?;

    Ok(Json(ShortenResponse {
        short_url: state.config.short_url(&link.code),
        code: link.code,
        url: link.url,
        created: link.created,
    }))
}

/// Handler for GET /:code
///
/// Redirects to the long URL with 307 Temporary Redirect.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Redirect> {
    let url = state.service.resolve(&code).await?;

    // Records written by other clients of the store skip URL validation
    if HeaderValue::from_str(&url).is_err() {
        return Err(ServiceError::Internal(format!(
            "Stored URL for '{code}' is not a valid Location header"
        )));
    }
    Ok(Redirect::temporary(&url))
}

/// Handler for GET /resolve/:code
pub async fn resolve_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ResolveResponse>> {
    let url = state.service.resolve(&code).await?;
    Ok(Json(ResolveResponse::new(code, url)))
}

/// Handler for DELETE /cache/:code
///
/// Drops the cached mapping so the next lookup reads through to the store.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    state.service.invalidate(&code).await?;
    Ok(Json(InvalidateResponse::new(code)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.service.cache();
    Json(StatsResponse::new(cache.stats(), cache.is_sweeping()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
