use axum::http::StatusCode;

use crate::fixtures::TestFixture;
use gantry_gateway::authz::{authorize, is_owner, Action, Principal, DENIAL_MESSAGE};

fn admin() -> Principal {
    Principal {
        id: 1,
        username: "root".to_string(),
        group_id: 1,
        admin: true,
    }
}

fn user(name: &str) -> Principal {
    Principal {
        id: 2,
        username: name.to_string(),
        group_id: 1,
        admin: false,
    }
}

#[tokio::test]
async fn test_admin_bypasses_all_checks() {
    let fixture = TestFixture::new();
    // No grants exist at all; the store is never even consulted
    fixture.bus.break_subject("authorization.find");

    for action in [Action::GetEnv, Action::DeleteEnv, Action::UpdateProject] {
        let result = authorize(&fixture.store, &admin(), action, "environment", "acme/prod").await;
        assert!(result.is_ok(), "{:?} should be allowed for admins", action);
    }
}

#[tokio::test]
async fn test_missing_grant_is_denied_with_fixed_message() {
    let fixture = TestFixture::new();

    let result = authorize(
        &fixture.store,
        &user("alice"),
        Action::GetEnv,
        "environment",
        "acme/prod",
    )
    .await;

    let (status, body) = result.unwrap_err();
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.0["error"], DENIAL_MESSAGE);
}

#[tokio::test]
async fn test_any_grant_satisfies_read_actions() {
    let fixture = TestFixture::new();
    fixture.insert_role("alice", "environment", "acme/prod", "reader");

    let result = authorize(
        &fixture.store,
        &user("alice"),
        Action::GetEnv,
        "environment",
        "acme/prod",
    )
    .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_reader_grant_is_insufficient_for_mutations() {
    let fixture = TestFixture::new();
    fixture.insert_role("alice", "environment", "acme/prod", "reader");

    let result = authorize(
        &fixture.store,
        &user("alice"),
        Action::UpdateEnv,
        "environment",
        "acme/prod",
    )
    .await;

    let (status, body) = result.unwrap_err();
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.0["error"], DENIAL_MESSAGE);
}

#[tokio::test]
async fn test_owner_grant_satisfies_mutations() {
    let fixture = TestFixture::new();
    fixture.insert_role("alice", "environment", "acme/prod", "owner");

    let result = authorize(
        &fixture.store,
        &user("alice"),
        Action::DeleteEnv,
        "environment",
        "acme/prod",
    )
    .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_malformed_resource_id_rejected_before_store_access() {
    let fixture = TestFixture::new();
    // Any store access would fail loudly
    fixture.bus.break_subject("authorization.find");

    let result = authorize(
        &fixture.store,
        &user("alice"),
        Action::GetEnv,
        "environment",
        "not a valid id!",
    )
    .await;

    let (status, _) = result.unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_failure_surfaces_as_internal_error() {
    let fixture = TestFixture::new();
    fixture.bus.break_subject("authorization.find");

    let result = authorize(
        &fixture.store,
        &user("alice"),
        Action::GetEnv,
        "environment",
        "acme/prod",
    )
    .await;

    let (status, _) = result.unwrap_err();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_is_owner_reflects_grant_role() {
    let fixture = TestFixture::new();
    fixture.insert_role("alice", "project", "acme", "owner");
    fixture.insert_role("bob", "project", "acme", "reader");

    assert!(is_owner(&fixture.store, &user("alice"), "project", "acme")
        .await
        .unwrap());
    assert!(!is_owner(&fixture.store, &user("bob"), "project", "acme")
        .await
        .unwrap());
    assert!(!is_owner(&fixture.store, &user("carol"), "project", "acme")
        .await
        .unwrap());
    assert!(is_owner(&fixture.store, &admin(), "project", "acme")
        .await
        .unwrap());
}
