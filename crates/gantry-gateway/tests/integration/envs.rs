use axum::http::StatusCode;
use serde_json::json;

use crate::fixtures::{body_json, send, TestFixture};

#[tokio::test]
async fn test_missing_environment_reports_not_found_before_authorization() {
    let fixture = TestFixture::new();
    let alice = fixture.insert_user("alice", false);

    // Alice holds no grants at all, yet a missing environment is a 404 on
    // this flow
    let response = send(
        fixture.router(),
        "GET",
        "/api/projects/acme/envs/ghost",
        Some(&fixture.token_for(&alice)),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Specified environment name does not exist");
}

#[tokio::test]
async fn test_existing_environment_without_grant_is_denied() {
    let fixture = TestFixture::new();
    let alice = fixture.insert_user("alice", false);
    let project_id = fixture.insert_project("acme");
    fixture.insert_env(project_id, "acme/prod");

    let response = send(
        fixture.router(),
        "GET",
        "/api/projects/acme/envs/prod",
        Some(&fixture.token_for(&alice)),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_granted_environment_is_returned_with_annotations() {
    let fixture = TestFixture::new();
    let alice = fixture.insert_user("alice", false);
    let project_id = fixture.insert_project("acme");
    fixture.insert_env(project_id, "acme/prod");
    fixture.insert_role("alice", "environment", "acme/prod", "reader");
    fixture.insert_role("owner", "environment", "acme/prod", "owner");

    let response = send(
        fixture.router(),
        "GET",
        "/api/projects/acme/envs/prod",
        Some(&fixture.token_for(&alice)),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "acme/prod");
    assert_eq!(body["project"], "acme");
    assert_eq!(body["provider"], "aws");

    let roles: Vec<String> = body["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_str().unwrap().to_string())
        .collect();
    assert!(roles.contains(&"alice (reader)".to_string()));
    assert!(roles.contains(&"owner (owner)".to_string()));
}

#[tokio::test]
async fn test_create_environment_requires_project_ownership() {
    let fixture = TestFixture::new();
    let alice = fixture.insert_user("alice", false);
    fixture.insert_project("acme");

    let response = send(
        fixture.router(),
        "POST",
        "/api/projects/acme/envs",
        Some(&fixture.token_for(&alice)),
        Some(json!({"name": "staging", "type": "aws"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // With the owner grant the same request succeeds and grants ownership
    // of the new environment
    fixture.insert_role("alice", "project", "acme", "owner");
    let response = send(
        fixture.router(),
        "POST",
        "/api/projects/acme/envs",
        Some(&fixture.token_for(&alice)),
        Some(json!({"name": "staging", "type": "aws"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["name"], "acme/staging");

    let grants = fixture.bus.records("authorization");
    assert!(grants.iter().any(|g| g["resource_id"] == "acme/staging"
        && g["resource_type"] == "environment"
        && g["role"] == "owner"));
}

#[tokio::test]
async fn test_environment_listing_is_scoped_to_grants() {
    let fixture = TestFixture::new();
    let alice = fixture.insert_user("alice", false);
    let project_id = fixture.insert_project("acme");
    fixture.insert_env(project_id, "acme/prod");
    fixture.insert_env(project_id, "acme/staging");
    fixture.insert_role("alice", "environment", "acme/staging", "reader");

    let response = send(
        fixture.router(),
        "GET",
        "/api/envs",
        Some(&fixture.token_for(&alice)),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["acme/staging"]);
}

#[tokio::test]
async fn test_update_environment_authorizes_before_lookup() {
    let fixture = TestFixture::new();
    let alice = fixture.insert_user("alice", false);

    // The environment does not exist; this flow still reports the denial
    // first
    let response = send(
        fixture.router(),
        "PUT",
        "/api/projects/acme/envs/ghost",
        Some(&fixture.token_for(&alice)),
        Some(json!({"name": "ghost"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_diff_renders_change_lines() {
    let fixture = TestFixture::new();
    let alice = fixture.insert_user("alice", false);
    let project_id = fixture.insert_project("acme");
    fixture.insert_env(project_id, "acme/prod");
    fixture.insert_role("alice", "environment", "acme/prod", "reader");

    fixture.bus.set_diff_reply(json!({
        "changes": [
            {"_component": "security_group", "name": "web", "_action": "create"},
            {"_component": "instance", "name": "app-1", "_action": "delete"},
        ]
    }));

    let response = send(
        fixture.router(),
        "POST",
        "/api/projects/acme/envs/prod/diff",
        Some(&fixture.token_for(&alice)),
        Some(json!({"from_id": "build-1", "to_id": "build-2"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body,
        json!([
            "Create a security group named web",
            "Delete a instance named app-1",
        ])
    );
}
