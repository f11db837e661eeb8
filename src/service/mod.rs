//! URL Service Module
//!
//! Read-through/write-through layer that puts the expiring cache in front of
//! a persistent [`Store`].

mod codec;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::http::HeaderValue;
use tracing::{debug, info, warn};

use crate::cache::ExpiringCache;
use crate::error::{Result, ServiceError, StoreError};
use crate::store::{url_key, Store};

pub use codec::{encode_base62, is_valid_code, MAX_CODE_LENGTH};

// == Public Constants ==
/// Maximum accepted length of a long URL in bytes
pub const MAX_URL_LENGTH: usize = 2048;

/// Codes tried before giving up on allocating a fresh one
const MAX_CODE_ATTEMPTS: usize = 16;

/// Result of a shorten request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortLink {
    pub code: String,
    pub url: String,
    /// False when the URL had already been shortened
    pub created: bool,
}

// == Url Service ==
/// Shortens and resolves URLs, caching both directions of the mapping.
#[derive(Debug)]
pub struct UrlService<S> {
    store: S,
    cache: ExpiringCache,
    next_id: AtomicU64,
}

impl<S: Store> UrlService<S> {
    /// Creates a service allocating codes from sequence number 1.
    pub fn new(store: S, cache: ExpiringCache) -> Self {
        Self::with_first_id(store, cache, 1)
    }

    /// Creates a service allocating codes starting at `first_id`.
    pub fn with_first_id(store: S, cache: ExpiringCache, first_id: u64) -> Self {
        Self {
            store,
            cache,
            next_id: AtomicU64::new(first_id),
        }
    }

    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // == Shorten ==
    /// Returns the short code for `url`, allocating one if needed.
    ///
    /// # Errors
    /// - [`ServiceError::InvalidRequest`] if the URL is empty, too long or not http(s)
    /// - [`ServiceError::Store`] if persisting the mapping fails
    pub async fn shorten(&self, url: &str) -> Result<ShortLink> {
        validate_url(url)?;

        let reverse_key = url_key(url);
        if let Some(code) = self.lookup(&reverse_key).await {
            debug!(code = %code, url = %url, "URL already shortened");
            return Ok(ShortLink {
                code,
                url: url.to_string(),
                created: false,
            });
        }

        let code = self.allocate_code(url).await?;

        match self.store.put(&reverse_key, &code).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                // A concurrent request shortened the same URL first
                if let Some(existing) = self.store.get(&reverse_key).await {
                    warn!(
                        code = %code,
                        existing = %existing,
                        url = %url,
                        "Lost shorten race, reusing existing code"
                    );
                    self.cache.set(reverse_key, existing.clone(), Duration::ZERO);
                    return Ok(ShortLink {
                        code: existing,
                        url: url.to_string(),
                        created: false,
                    });
                }
                return Err(ServiceError::Internal(format!(
                    "Reverse mapping for {url} conflicted but cannot be read"
                )));
            }
            Err(err) => return Err(err.into()),
        }

        self.cache.set(code.clone(), url, Duration::ZERO);
        self.cache.set(reverse_key, code.clone(), Duration::ZERO);

        info!(code = %code, url = %url, "Shortened URL");
        Ok(ShortLink {
            code,
            url: url.to_string(),
            created: true,
        })
    }

    // == Resolve ==
    /// Returns the long URL for `code`, reading through the cache.
    ///
    /// # Errors
    /// - [`ServiceError::InvalidRequest`] if `code` is malformed
    /// - [`ServiceError::NotFound`] if no URL is stored for `code`
    pub async fn resolve(&self, code: &str) -> Result<String> {
        check_code(code)?;

        self.lookup(code)
            .await
            .ok_or_else(|| ServiceError::NotFound(code.to_string()))
    }

    // == Invalidate ==
    /// Drops the cached mapping for `code`. The stored mapping is untouched.
    ///
    /// # Errors
    /// - [`ServiceError::InvalidRequest`] if `code` is malformed
    /// - [`ServiceError::NotFound`] if `code` is not cached
    pub async fn invalidate(&self, code: &str) -> Result<()> {
        check_code(code)?;
        self.cache.delete(code)?;
        debug!(code = %code, "Invalidated cached mapping");
        Ok(())
    }

    /// Stops the cache sweeper.
    pub fn close(&self) {
        self.cache.close();
    }

    async fn lookup(&self, key: &str) -> Option<String> {
        if let Some(value) = self.cache.get(key) {
            return Some(value);
        }

        let value = self.store.get(key).await?;
        self.cache.set(key, value.clone(), Duration::ZERO);
        Some(value)
    }

    async fn allocate_code(&self, url: &str) -> Result<String> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = encode_base62(self.next_id.fetch_add(1, Ordering::Relaxed));

            if self.store.get(&code).await.is_some() {
                continue;
            }

            match self.store.put(&code, url).await {
                Ok(()) => return Ok(code),
                Err(StoreError::Conflict(_)) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        Err(ServiceError::Internal(
            "Could not allocate a free short code".to_string(),
        ))
    }
}

/// Rejects codes outside the short-code alphabet, which also keeps callers
/// away from the `url:` reverse keyspace.
fn check_code(code: &str) -> Result<()> {
    if is_valid_code(code) {
        Ok(())
    } else {
        Err(ServiceError::InvalidRequest(format!(
            "Invalid short code: {code}"
        )))
    }
}

/// Checks that `url` is a non-empty http(s) URL within the length limit that
/// can be sent back as a `Location` header.
fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(ServiceError::InvalidRequest("URL cannot be empty".to_string()));
    }
    if url.len() > MAX_URL_LENGTH {
        return Err(ServiceError::InvalidRequest(format!(
            "URL exceeds maximum length of {MAX_URL_LENGTH} bytes"
        )));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ServiceError::InvalidRequest(
            "URL must start with http:// or https://".to_string(),
        ));
    }
    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ServiceError::InvalidRequest(
            "URL cannot contain whitespace or control characters".to_string(),
        ));
    }
    if HeaderValue::from_str(url).is_err() {
        return Err(ServiceError::InvalidRequest(
            "URL is not a valid header value".to_string(),
        ));
    }
    Ok(())
}
