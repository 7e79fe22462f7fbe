use axum::http::StatusCode;
use serde_json::json;

use crate::fixtures::{body_json, send, TestFixture};

fn sample_mapping() -> serde_json::Value {
    json!({
        "components": [
            {"_component": "vpc", "name": "main", "vpc_aws_id": "vpc-1", "subnet": "10.0.0.0/16"},
            {"_component": "public_ip", "id": "ip1", "ip_address": "52.0.0.1"},
            {
                "_component": "lb",
                "name": "front",
                "id": "lb1",
                "frontend_ip_configurations": [{"public_ip_address_id": "ip1"}]
            },
            {
                "_component": "network_interface",
                "name": "eth0",
                "ip_configuration": [
                    {"public_ip_address_id": "ip1", "private_ip_address": "10.0.0.4"}
                ]
            },
            {
                "_component": "virtual_machine",
                "name": "vm-0",
                "id": "vm0",
                "network_interfaces": ["eth0"]
            },
        ]
    })
}

#[tokio::test]
async fn test_get_build_renders_component_graph() {
    let fixture = TestFixture::new();
    let alice = fixture.insert_user("alice", false);
    let project_id = fixture.insert_project("acme");
    let env_id = fixture.insert_env(project_id, "acme/prod");
    fixture.insert_role("alice", "environment", "acme/prod", "reader");
    fixture.insert_build(env_id, "build-9", sample_mapping());

    let response = send(
        fixture.router(),
        "GET",
        "/api/projects/acme/envs/prod/builds/build-9",
        Some(&fixture.token_for(&alice)),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["id"], "build-9");
    assert_eq!(body["project"], "acme");
    assert_eq!(body["vpcs"][0]["vpc_id"], "vpc-1");
    assert_eq!(body["load_balancers"][0]["public_ip"], "52.0.0.1");
    assert_eq!(body["virtual_machines"][0]["public_ip"], "52.0.0.1");
    assert_eq!(body["virtual_machines"][0]["private_ip"], "10.0.0.4");
    // Empty categories are omitted entirely
    assert!(body.get("nats").is_none());
}

#[tokio::test]
async fn test_get_build_for_wrong_environment_is_not_found() {
    let fixture = TestFixture::new();
    let alice = fixture.insert_user("alice", false);
    let project_id = fixture.insert_project("acme");
    let prod_id = fixture.insert_env(project_id, "acme/prod");
    fixture.insert_env(project_id, "acme/staging");
    fixture.insert_role("alice", "environment", "acme/prod", "reader");
    fixture.insert_role("alice", "environment", "acme/staging", "reader");
    fixture.insert_build(prod_id, "build-9", sample_mapping());

    // The build exists but belongs to prod, not staging
    let response = send(
        fixture.router(),
        "GET",
        "/api/projects/acme/envs/staging/builds/build-9",
        Some(&fixture.token_for(&alice)),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_build_maps_definition_and_stores_result() {
    let fixture = TestFixture::new();
    let alice = fixture.insert_user("alice", false);
    let project_id = fixture.insert_project("acme");
    fixture.insert_env(project_id, "acme/prod");
    fixture.insert_role("alice", "environment", "acme/prod", "owner");

    let response = send(
        fixture.router(),
        "POST",
        "/api/projects/acme/envs/prod/builds",
        Some(&fixture.token_for(&alice)),
        Some(json!({"definition": "name: acme/prod\ninstances: 2"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "in_progress");

    let builds = fixture.bus.records("build");
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0]["type"], "apply");
    assert_eq!(builds[0]["username"], "alice");
}

#[tokio::test]
async fn test_create_build_requires_ownership() {
    let fixture = TestFixture::new();
    let alice = fixture.insert_user("alice", false);
    let project_id = fixture.insert_project("acme");
    fixture.insert_env(project_id, "acme/prod");
    fixture.insert_role("alice", "environment", "acme/prod", "reader");

    let response = send(
        fixture.router(),
        "POST",
        "/api/projects/acme/envs/prod/builds",
        Some(&fixture.token_for(&alice)),
        Some(json!({"definition": "name: acme/prod"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(fixture.bus.records("build").is_empty());
}

#[tokio::test]
async fn test_raw_mapping_is_admin_only() {
    let fixture = TestFixture::new();
    let admin = fixture.insert_user("root", true);
    let alice = fixture.insert_user("alice", false);
    let project_id = fixture.insert_project("acme");
    let env_id = fixture.insert_env(project_id, "acme/prod");
    fixture.insert_role("alice", "environment", "acme/prod", "owner");
    fixture.insert_build(env_id, "build-9", sample_mapping());

    let response = send(
        fixture.router(),
        "GET",
        "/api/projects/acme/envs/prod/builds/build-9/mapping",
        Some(&fixture.token_for(&alice)),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        fixture.router(),
        "GET",
        "/api/projects/acme/envs/prod/builds/build-9/mapping",
        Some(&fixture.token_for(&admin)),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["components"].is_array());
}

#[tokio::test]
async fn test_list_builds_returns_metadata() {
    let fixture = TestFixture::new();
    let alice = fixture.insert_user("alice", false);
    let project_id = fixture.insert_project("acme");
    let env_id = fixture.insert_env(project_id, "acme/prod");
    fixture.insert_role("alice", "environment", "acme/prod", "reader");
    fixture.insert_build(env_id, "build-1", json!({}));
    fixture.insert_build(env_id, "build-2", json!({}));

    let response = send(
        fixture.router(),
        "GET",
        "/api/projects/acme/envs/prod/builds",
        Some(&fixture.token_for(&alice)),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["project"], "acme");
}
