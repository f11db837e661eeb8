//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;
use url_cache::{api::create_router, AppState, Config, ExpiringCache, MemoryStore, UrlService};

// == Helper Functions ==

fn create_test_app() -> Router {
    let cache = ExpiringCache::new(Duration::from_secs(300), Duration::ZERO);
    let state = AppState::new(UrlService::new(MemoryStore::new(), cache), Config::default());
    create_router(state)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn shorten_request(url: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/shorten")
        .header("content-type", "application/json")
        .body(Body::from(format!(r#"{{"url":"{url}"}}"#)))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn shorten(app: &Router, url: &str) -> String {
    let response = app.clone().oneshot(shorten_request(url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    json["code"].as_str().unwrap().to_string()
}

// == SHORTEN Endpoint Tests ==

#[tokio::test]
async fn test_shorten_endpoint_success() {
    let app = create_test_app();

    let response = app
        .oneshot(shorten_request("https://example.com/page"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    let code = json["code"].as_str().unwrap();
    assert_eq!(json["url"], "https://example.com/page");
    assert_eq!(json["created"], true);
    assert_eq!(json["short_url"], format!("http://localhost:3000/{code}"));
}

#[tokio::test]
async fn test_shorten_endpoint_is_idempotent() {
    let app = create_test_app();

    let first = shorten(&app, "https://example.com/page").await;

    let response = app
        .oneshot(shorten_request("https://example.com/page"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;

    assert_eq!(json["code"].as_str().unwrap(), first);
    assert_eq!(json["created"], false);
}

#[tokio::test]
async fn test_shorten_endpoint_invalid_url() {
    let app = create_test_app();

    let response = app
        .oneshot(shorten_request("ftp://example.com"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("http"));
}

#[tokio::test]
async fn test_shorten_endpoint_rejects_control_characters() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/shorten")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"url":"https://example.com/a\u0001b"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was stored, so the first code stays unallocated
    let response = app.oneshot(get_request("/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalidate_endpoint_rejects_reverse_keys() {
    let app = create_test_app();
    shorten(&app, "https://example.com/target").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache/url:https%3A%2F%2Fexample.com%2Ftarget")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_shorten_endpoint_malformed_json() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/shorten")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"link":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// == REDIRECT / RESOLVE Endpoint Tests ==

#[tokio::test]
async fn test_redirect_endpoint() {
    let app = create_test_app();
    let code = shorten(&app, "https://example.com/target").await;

    let response = app.oneshot(get_request(&format!("/{code}"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "https://example.com/target"
    );
}

#[tokio::test]
async fn test_resolve_endpoint() {
    let app = create_test_app();
    let code = shorten(&app, "https://example.com/target").await;

    let response = app
        .oneshot(get_request(&format!("/resolve/{code}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["code"].as_str().unwrap(), code);
    assert_eq!(json["url"], "https://example.com/target");
}

#[tokio::test]
async fn test_resolve_endpoint_not_found() {
    let app = create_test_app();

    let response = app.oneshot(get_request("/resolve/missing")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

// == CACHE INVALIDATION Endpoint Tests ==

#[tokio::test]
async fn test_invalidate_then_resolve_reads_through() {
    let app = create_test_app();
    let code = shorten(&app, "https://example.com/target").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/cache/{code}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The mapping survives in the store
    let response = app
        .oneshot(get_request(&format!("/resolve/{code}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalidate_endpoint_not_cached() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache/abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == STATS Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app();
    let code = shorten(&app, "https://example.com/target").await;

    // Hit
    let _ = app
        .clone()
        .oneshot(get_request(&format!("/resolve/{code}")))
        .await
        .unwrap();

    let response = app.oneshot(get_request("/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    // Shorten misses the reverse key once, resolve hits the code
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 2);
    assert_eq!(json["sweeping"], false);
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_from_config_starts_sweeper() {
    let state = AppState::from_config(&Config::default());
    assert!(state.service.cache().is_sweeping());

    let response = create_router(state.clone())
        .oneshot(get_request("/stats"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["sweeping"], true);

    state.service.close();
    assert!(!state.service.cache().is_sweeping());
}
