//! Integration tests for the relay endpoint.
//!
//! The router is driven in-process with a mock provider; no network access
//! or API key is needed. Run with: cargo test -p relay-service --test relay_test

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use relay_service::services::providers::mock::MockTextProvider;
use relay_service::services::{GenerationParams, KeySource};
use relay_service::startup::{relay_function, relay_listener};
use relay_service::AppState;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

const ROUTE: &str = "/api/krave-gemini-api";

fn state_with(provider: Arc<MockTextProvider>, key_source: KeySource) -> AppState {
    AppState::new(
        provider,
        key_source,
        "gemini-2.0-flash-lite",
        GenerationParams::default(),
    )
}

fn fixed_key() -> KeySource {
    KeySource::Fixed(Secret::new("test-api-key".to_string()))
}

fn listener_app(provider: Arc<MockTextProvider>) -> Router {
    relay_listener(state_with(provider, fixed_key()), ROUTE)
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).expect("response body is JSON");
    (status, body)
}

#[tokio::test]
async fn non_post_methods_get_405_without_calling_provider() {
    let provider = Arc::new(MockTextProvider::replying("Hello"));

    for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
        let request = Request::builder()
            .method(method.clone())
            .uri(ROUTE)
            .body(Body::from(r#"{"prompt":"hi"}"#))
            .unwrap();
        let (status, body) = send(listener_app(provider.clone()), request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "method {}", method);
        assert_eq!(body, json!({ "error": "Method Not Allowed. Use POST." }));
    }

    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn empty_body_is_400() {
    let provider = Arc::new(MockTextProvider::replying("Hello"));
    let (status, body) = send(listener_app(provider.clone()), post(ROUTE, Body::empty())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Empty request body" }));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let provider = Arc::new(MockTextProvider::replying("Hello"));
    let (status, body) = send(listener_app(provider.clone()), post(ROUTE, "{\"prompt\": ")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid JSON format" }));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn blank_or_missing_prompt_is_400() {
    let provider = Arc::new(MockTextProvider::replying("Hello"));

    for payload in [r#"{"prompt": "   "}"#, r#"{}"#, r#"{"prompt": ["a"]}"#] {
        let (status, body) = send(listener_app(provider.clone()), post(ROUTE, payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert_eq!(
            body,
            json!({ "error": "Missing or invalid \"prompt\" in request body." })
        );
    }

    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn missing_api_key_is_500() {
    let provider = Arc::new(MockTextProvider::replying("Hello"));
    let app = relay_listener(
        state_with(
            provider.clone(),
            KeySource::Environment("RELAY_IT_API_KEY_NEVER_SET_91C2".to_string()),
        ),
        ROUTE,
    );

    let (status, body) = send(app, post(ROUTE, r#"{"prompt":"hi"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "error": "Google Generative AI API key is missing in environment variables." })
    );
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn successful_generation_is_trimmed_and_relayed() {
    let provider = Arc::new(MockTextProvider::replying("\n  Hello  \n"));
    let (status, body) = send(
        listener_app(provider.clone()),
        post(ROUTE, r#"{"prompt":"Say hello"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "response": "Hello" }));
    assert_eq!(provider.calls(), 1);
    assert_eq!(provider.last_prompt().as_deref(), Some("Say hello"));
}

#[tokio::test]
async fn provider_failure_is_500_with_message() {
    let provider = Arc::new(MockTextProvider::failing("upstream exploded"));
    let (status, body) = send(
        listener_app(provider.clone()),
        post(ROUTE, r#"{"prompt":"Say hello"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("upstream exploded"));
    assert!(body.get("details").is_none());
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn listener_answers_other_paths_with_json_404() {
    let provider = Arc::new(MockTextProvider::replying("Hello"));
    let (status, body) = send(
        listener_app(provider.clone()),
        post("/api/other", r#"{"prompt":"hi"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not Found" }));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn function_mode_handles_any_path() {
    let provider = Arc::new(MockTextProvider::replying("Hello"));
    let app = relay_function(state_with(provider.clone(), fixed_key()));

    let (status, body) = send(app, post("/whatever/the/host/routed", r#"{"prompt":"hi"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "response": "Hello" }));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn responses_carry_request_id_and_hardening_headers() {
    let provider = Arc::new(MockTextProvider::replying("Hello"));
    let request = Request::builder()
        .method(Method::POST)
        .uri(ROUTE)
        .header("x-request-id", "trace-me")
        .body(Body::from(r#"{"prompt":"hi"}"#))
        .unwrap();

    let response = listener_app(provider).oneshot(request).await.unwrap();

    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-me");
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
}

fn large_prompt_body(prompt_bytes: usize) -> String {
    json!({ "prompt": "a".repeat(prompt_bytes) }).to_string()
}

#[tokio::test]
async fn prompt_larger_than_axum_default_limit_is_relayed() {
    let provider = Arc::new(MockTextProvider::replying("Hello"));
    let body = large_prompt_body(3 * 1024 * 1024);

    let (status, body) = send(listener_app(provider.clone()), post(ROUTE, body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "response": "Hello" }));
    assert_eq!(provider.calls(), 1);
    assert_eq!(
        provider.last_prompt().map(|p| p.len()),
        Some(3 * 1024 * 1024)
    );
}

#[tokio::test]
async fn non_post_with_large_body_is_still_405() {
    let provider = Arc::new(MockTextProvider::replying("Hello"));
    let request = Request::builder()
        .method(Method::GET)
        .uri(ROUTE)
        .body(Body::from(large_prompt_body(3 * 1024 * 1024)))
        .unwrap();

    let (status, body) = send(listener_app(provider.clone()), request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Method Not Allowed. Use POST." }));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn body_over_configured_limit_is_json_400() {
    let provider = Arc::new(MockTextProvider::replying("Hello"));
    let app = relay_listener(
        state_with(provider.clone(), fixed_key()).with_body_limit(64),
        ROUTE,
    );

    let (status, body) = send(app, post(ROUTE, large_prompt_body(1024))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Request body too large" }));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn listener_route_ignores_query_string() {
    let provider = Arc::new(MockTextProvider::replying("Hello"));
    let (status, body) = send(
        listener_app(provider.clone()),
        post(&format!("{}?source=widget", ROUTE), r#"{"prompt":"hi"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Hello");
    assert_eq!(provider.calls(), 1);
}
