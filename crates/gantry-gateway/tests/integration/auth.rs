use axum::http::StatusCode;
use serde_json::json;

use crate::fixtures::{body_json, send, TestFixture};

#[tokio::test]
async fn test_login_issues_token() {
    let fixture = TestFixture::new();
    fixture.insert_user("alice", false);

    let response = send(
        fixture.router(),
        "POST",
        "/auth",
        None,
        Some(json!({"username": "alice", "password": "fixture-password"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["token"].as_str().unwrap().contains('.'));
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let fixture = TestFixture::new();
    fixture.insert_user("alice", false);

    let response = send(
        fixture.router(),
        "POST",
        "/auth",
        None,
        Some(json!({"username": "alice", "password": "wrong"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_unknown_user() {
    let fixture = TestFixture::new();

    let response = send(
        fixture.router(),
        "POST",
        "/auth",
        None,
        Some(json!({"username": "ghost", "password": "whatever"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_maps_bus_timeout_to_gateway_timeout() {
    let fixture = TestFixture::new();
    fixture.bus.delay_subject("user.get");

    let response = send(
        fixture.router(),
        "POST",
        "/auth",
        None,
        Some(json!({"username": "alice", "password": "fixture-password"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_session_returns_principal() {
    let fixture = TestFixture::new();
    let alice = fixture.insert_user("alice", false);

    let response = send(
        fixture.router(),
        "GET",
        "/api/session",
        Some(&fixture.token_for(&alice)),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["admin"], false);
}

#[tokio::test]
async fn test_api_rejects_missing_token() {
    let fixture = TestFixture::new();

    let response = send(fixture.router(), "GET", "/api/session", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_api_rejects_forged_token() {
    let fixture = TestFixture::new();

    let response = send(
        fixture.router(),
        "GET",
        "/api/session",
        Some("forged.token.value"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_probes_are_public() {
    let fixture = TestFixture::new();

    let response = send(fixture.router(), "GET", "/healthz", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(fixture.router(), "GET", "/readyz", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(fixture.router(), "GET", "/metrics", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
