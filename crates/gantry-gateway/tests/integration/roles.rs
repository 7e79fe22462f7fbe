use axum::http::StatusCode;
use serde_json::json;

use crate::fixtures::{body_json, send, TestFixture};

#[tokio::test]
async fn test_admin_creates_role_grant() {
    let fixture = TestFixture::new();
    let admin = fixture.insert_user("root", true);
    fixture.insert_user("alice", false);
    fixture.insert_project("acme");
    let token = fixture.token_for(&admin);

    let response = send(
        fixture.router(),
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({
            "user_id": "alice",
            "resource_id": "acme",
            "resource_type": "project",
            "role": "reader",
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user_id"], "alice");
    assert_eq!(body["resource_id"], "acme");
    assert_eq!(fixture.bus.records("authorization").len(), 1);
}

#[tokio::test]
async fn test_duplicate_grant_reuses_identity() {
    let fixture = TestFixture::new();
    let admin = fixture.insert_user("root", true);
    fixture.insert_user("alice", false);
    fixture.insert_project("acme");
    let token = fixture.token_for(&admin);

    let grant = json!({
        "user_id": "alice",
        "resource_id": "acme",
        "resource_type": "project",
        "role": "reader",
    });

    let first = send(
        fixture.router(),
        "POST",
        "/api/roles",
        Some(&token),
        Some(grant.clone()),
    )
    .await;
    let first = body_json(first).await;
    let first_id = first["id"].as_i64().unwrap();

    // Same triple, different role label: must update in place
    let mut upgraded = grant.clone();
    upgraded["role"] = json!("owner");
    let second = send(
        fixture.router(),
        "POST",
        "/api/roles",
        Some(&token),
        Some(upgraded),
    )
    .await;
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_json(second).await;

    assert_eq!(second["id"].as_i64().unwrap(), first_id);

    let records = fixture.bus.records("authorization");
    assert_eq!(records.len(), 1, "the triple must hold exactly one grant");
    assert_eq!(records[0]["role"], "owner");
}

#[tokio::test]
async fn test_unknown_resource_type_fails_validation() {
    let fixture = TestFixture::new();
    let admin = fixture.insert_user("root", true);
    let token = fixture.token_for(&admin);

    let response = send(
        fixture.router(),
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({
            "user_id": "alice",
            "resource_id": "acme",
            "resource_type": "datacenter",
            "role": "reader",
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Resource type accepted values are ['project', 'environment', 'policy']"
    );
}

#[tokio::test]
async fn test_grant_on_missing_resource_is_not_found() {
    let fixture = TestFixture::new();
    let admin = fixture.insert_user("root", true);
    fixture.insert_user("alice", false);
    let token = fixture.token_for(&admin);

    let response = send(
        fixture.router(),
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({
            "user_id": "alice",
            "resource_id": "ghost",
            "resource_type": "project",
            "role": "reader",
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Specified resource not found");
}

#[tokio::test]
async fn test_grant_for_missing_user_is_not_found() {
    let fixture = TestFixture::new();
    let admin = fixture.insert_user("root", true);
    fixture.insert_project("acme");
    let token = fixture.token_for(&admin);

    let response = send(
        fixture.router(),
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({
            "user_id": "ghost",
            "resource_id": "acme",
            "resource_type": "project",
            "role": "reader",
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Specified user not found");
}

#[tokio::test]
async fn test_non_owner_cannot_create_grants() {
    let fixture = TestFixture::new();
    let mallory = fixture.insert_user("mallory", false);
    fixture.insert_user("alice", false);
    fixture.insert_project("acme");
    let token = fixture.token_for(&mallory);

    let response = send(
        fixture.router(),
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({
            "user_id": "alice",
            "resource_id": "acme",
            "resource_type": "project",
            "role": "reader",
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "You're not authorized to perform this action");
    assert!(fixture.bus.records("authorization").is_empty());
}

#[tokio::test]
async fn test_resource_owner_can_share_access() {
    let fixture = TestFixture::new();
    let owner = fixture.insert_user("owner", false);
    fixture.insert_user("alice", false);
    fixture.insert_project("acme");
    fixture.insert_role("owner", "project", "acme", "owner");
    let token = fixture.token_for(&owner);

    let response = send(
        fixture.router(),
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({
            "user_id": "alice",
            "resource_id": "acme",
            "resource_type": "project",
            "role": "reader",
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(fixture.bus.records("authorization").len(), 2);
}

#[tokio::test]
async fn test_list_roles_scopes_to_caller() {
    let fixture = TestFixture::new();
    let admin = fixture.insert_user("root", true);
    let alice = fixture.insert_user("alice", false);
    fixture.insert_role("alice", "project", "acme", "reader");
    fixture.insert_role("bob", "project", "acme", "owner");

    let response = send(
        fixture.router(),
        "GET",
        "/api/roles",
        Some(&fixture.token_for(&alice)),
        None,
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["user_id"], "alice");

    let response = send(
        fixture.router(),
        "GET",
        "/api/roles",
        Some(&fixture.token_for(&admin)),
        None,
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_role_by_id() {
    let fixture = TestFixture::new();
    let admin = fixture.insert_user("root", true);
    fixture.insert_role("alice", "project", "acme", "reader");
    let id = fixture.bus.records("authorization")[0]["id"]
        .as_i64()
        .unwrap();

    let response = send(
        fixture.router(),
        "DELETE",
        &format!("/api/roles/{}", id),
        Some(&fixture.token_for(&admin)),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(fixture.bus.records("authorization").is_empty());
}
