//! Domain gate integration tests.
//!
//! Tests verify:
//! - A blocked target header short-circuits any route with 403
//! - Allowed and absent headers pass through
//! - Malformed headers fail open
//! - The header name is configurable

use axum::body::Body;
use axum::http::{HeaderName, Request, StatusCode};
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

use analysis_relay::{RouterConfig, ACCESS_DENIED_MESSAGE};

use super::test_utils::{
    body_text, router_with, staged_files, test_router, upload_request, RecordingUpstream,
};

fn hello_with_target(target: &str) -> Request<Body> {
    Request::builder()
        .uri("/hello")
        .header("x-request-url", target)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_hello_without_header() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::replying(json!({}));
    let router = test_router(&upstream, tmp.path());

    let request = Request::builder().uri("/hello").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Hello, World!");
}

#[tokio::test]
async fn test_blocked_header_on_hello_is_forbidden() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::replying(json!({}));
    let router = test_router(&upstream, tmp.path());

    let response = router
        .oneshot(hello_with_target("https://malicious.com/anything"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, ACCESS_DENIED_MESSAGE);
}

#[tokio::test]
async fn test_allowed_header_passes() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::replying(json!({}));
    let router = test_router(&upstream, tmp.path());

    let response = router
        .oneshot(hello_with_target("https://example.com/"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Hello, World!");
}

#[tokio::test]
async fn test_subdomain_of_blocked_domain_passes() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::replying(json!({}));
    let router = test_router(&upstream, tmp.path());

    let response = router
        .oneshot(hello_with_target("https://www.malicious.com/"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

/// Known permissive-failure path: an unparsable header is let through.
#[tokio::test]
async fn test_malformed_header_fails_open() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::replying(json!({}));
    let router = test_router(&upstream, tmp.path());

    let response = router
        .oneshot(hello_with_target("malicious.com"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Hello, World!");
}

#[tokio::test]
async fn test_empty_header_treated_as_absent() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::replying(json!({}));
    let router = test_router(&upstream, tmp.path());

    let response = router.oneshot(hello_with_target("")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Hello, World!");
}

#[tokio::test]
async fn test_blocked_header_skips_message_handler() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::replying(json!({"label": "ok"}));
    let router = test_router(&upstream, tmp.path());

    let mut request = super::test_utils::json_request(
        "/api/receive-message",
        json!({"message": "hi"}),
    );
    request.headers_mut().insert(
        "x-request-url",
        "http://phishing.com/login".parse().unwrap(),
    );

    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(upstream.call_count().await, 0);
}

#[tokio::test]
async fn test_blocked_header_skips_upload_staging() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::replying(json!({"result": 1}));
    let router = test_router(&upstream, tmp.path());

    let mut request = upload_request("cat.png", b"pixels");
    request.headers_mut().insert(
        "x-request-url",
        "https://malicious.com/".parse().unwrap(),
    );

    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(upstream.call_count().await, 0);
    assert_eq!(staged_files(tmp.path()), 0);
}

#[tokio::test]
async fn test_blocked_header_on_check_url() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::replying(json!({}));
    let router = test_router(&upstream, tmp.path());

    let mut request =
        super::test_utils::json_request("/check-url", json!({"url": "https://example.com"}));
    request.headers_mut().insert(
        "x-request-url",
        "https://malicious.com/".parse().unwrap(),
    );

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_custom_target_header() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::replying(json!({}));
    let config =
        RouterConfig::default().with_target_header(HeaderName::from_static("x-target-url"));
    let router = router_with(upstream, tmp.path(), config);

    let request = Request::builder()
        .uri("/hello")
        .header("x-target-url", "https://malicious.com/")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The default header no longer matters
    let response = router
        .oneshot(hello_with_target("https://malicious.com/"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
