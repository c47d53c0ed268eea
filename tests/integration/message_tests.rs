//! Message relay integration tests.
//!
//! Tests verify:
//! - Missing or empty messages are rejected without an upstream call
//! - Present messages are forwarded as `{text}` and the response relayed
//! - Upstream failures and panics become generic 500s

use axum::http::StatusCode;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

use analysis_relay::error::UpstreamError;

use super::test_utils::{
    body_json, json_request, raw_json_request, test_router, FakeReply, RecordedCall,
    RecordingUpstream,
};

#[tokio::test]
async fn test_missing_message_is_bad_request() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::replying(json!({"label": "ok"}));
    let router = test_router(&upstream, tmp.path());

    let response = router
        .oneshot(json_request("/api/receive-message", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "메시지가 제공되지 않았습니다."})
    );
    assert_eq!(upstream.call_count().await, 0);
}

#[tokio::test]
async fn test_empty_messages_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::replying(json!({"label": "ok"}));
    let router = test_router(&upstream, tmp.path());

    for body in [
        json!({"message": ""}),
        json!({"message": null}),
        json!({"message": false}),
        json!({"message": 0}),
    ] {
        let response = router
            .clone()
            .oneshot(json_request("/api/receive-message", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
    assert_eq!(upstream.call_count().await, 0);
}

#[tokio::test]
async fn test_undecodable_body_is_bad_request() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::replying(json!({"label": "ok"}));
    let router = test_router(&upstream, tmp.path());

    let response = router
        .oneshot(raw_json_request("/api/receive-message", "message=hi"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(upstream.call_count().await, 0);
}

#[tokio::test]
async fn test_message_relayed() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::replying(json!({"label": "ok"}));
    let router = test_router(&upstream, tmp.path());

    let response = router
        .oneshot(json_request("/api/receive-message", json!({"message": "hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"label": "ok"}));

    let calls = upstream.calls().await;
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        RecordedCall::Json { path, body } => {
            assert_eq!(path, "predict");
            assert_eq!(body, &json!({"text": "hi"}));
        }
        other => panic!("unexpected call: {:?}", other),
    }
}

#[tokio::test]
async fn test_upstream_payload_passed_through_unchanged() {
    let tmp = TempDir::new().unwrap();
    let payload = json!({
        "label": "spam",
        "scores": [0.1, 0.9],
        "meta": {"model": "v2", "nested": {"ok": true}}
    });
    let upstream = RecordingUpstream::replying(payload.clone());
    let router = test_router(&upstream, tmp.path());

    let response = router
        .oneshot(json_request(
            "/api/receive-message",
            json!({"message": "당첨되셨습니다! 링크를 클릭하세요"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, payload);
}

#[tokio::test]
async fn test_upstream_failure_is_internal_error() {
    let tmp = TempDir::new().unwrap();
    let upstream =
        RecordingUpstream::failing(UpstreamError::Network("connection refused".to_string()));
    let router = test_router(&upstream, tmp.path());

    let response = router
        .oneshot(json_request("/api/receive-message", json!({"message": "hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body, json!({"error": "Flask 서버로 메시지 전달 중 오류 발생"}));
    // Upstream detail is not leaked
    assert!(!body.to_string().contains("connection refused"));
    assert_eq!(upstream.call_count().await, 1);
}

#[tokio::test]
async fn test_upstream_panic_is_caught() {
    let tmp = TempDir::new().unwrap();
    let upstream = RecordingUpstream::new(FakeReply::Panic);
    let router = test_router(&upstream, tmp.path());

    let response = router
        .clone()
        .oneshot(json_request("/api/receive-message", json!({"message": "hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({"error": "내부 서버 오류"}));

    // The router keeps serving
    let response = router
        .oneshot(
            axum::http::Request::builder()
                .uri("/hello")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
