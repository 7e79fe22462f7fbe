//! Environment endpoints, nested under their project, plus the flat
//! listing and search routes.
//!
//! Reads resolve the environment before authorizing; updates authorize
//! before resolving.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::api::AppState;
use crate::authz::{authorize, is_owner, Action, Principal, DENIAL_MESSAGE};
use crate::store::StoreError;
use crate::views::render_changes;
use gantry_models::models::builds::Build;
use gantry_models::models::environments::Environment;
use gantry_models::models::graph::ComponentGraph;
use gantry_models::models::roles::{Role, OWNER};
use gantry_utils::logging::prelude::*;

pub fn routes() -> Router<AppState> {
    info!("Setting up environment routes");
    Router::new()
        .route(
            "/projects/:project/envs",
            get(list_envs).post(create_env),
        )
        .route(
            "/projects/:project/envs/:env",
            get(get_env).put(update_env).delete(delete_env),
        )
        .route("/projects/:project/envs/:env/actions", post(env_action))
        .route("/projects/:project/envs/:env/diff", post(diff_env))
        .route("/envs", get(list_all_envs))
        .route("/envs/search", get(search_envs))
}

type Error = (StatusCode, Json<Value>);

fn internal_error() -> Error {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error"})),
    )
}

fn env_not_found() -> Error {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "Specified environment name does not exist"})),
    )
}

/// Attaches grant annotations and project metadata to an environment before
/// returning it.
async fn improve(state: &AppState, env: &mut Environment) -> Result<(), Error> {
    if let Ok(roles) = state
        .store
        .roles()
        .find_by_resource(&env.name, "environment")
        .await
    {
        for role in roles {
            env.roles.push(format!("{} ({})", role.user_id, role.role));
        }
    }

    let project = state
        .store
        .projects()
        .get_by_id(env.project_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Project not found"})),
            ),
            e => {
                error!("Failed to fetch project {}: {:?}", env.project_id, e);
                internal_error()
            }
        })?;

    env.project = Some(project.name);
    env.provider = Some(project.project_type);
    Ok(())
}

/// Restricts a listing to the environments the caller holds grants on.
async fn visible_envs(
    state: &AppState,
    principal: &Principal,
    envs: Vec<Environment>,
) -> Result<Vec<Environment>, Error> {
    if principal.is_admin() {
        return Ok(envs);
    }

    let granted = state
        .store
        .roles()
        .resource_ids_for(&principal.username, "environment")
        .await
        .map_err(|e| {
            error!("Failed to fetch environment grants: {:?}", e);
            internal_error()
        })?;

    let project_grants = state
        .store
        .roles()
        .resource_ids_for(&principal.username, "project")
        .await
        .map_err(|e| {
            error!("Failed to fetch project grants: {:?}", e);
            internal_error()
        })?;

    Ok(envs
        .into_iter()
        .filter(|e| {
            let project = e.name.split('/').next().unwrap_or("");
            granted.contains(&e.name) || project_grants.contains(&project.to_string())
        })
        .collect())
}

async fn list_envs(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(project): Path<String>,
) -> Result<Json<Vec<Environment>>, Error> {
    info!("Handling request to list environments of {}", project);

    let project = match state.store.projects().get_by_name(&project).await {
        Ok(p) => p,
        Err(StoreError::NotFound) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Project not found"})),
            ))
        }
        Err(e) => {
            error!("Failed to fetch project: {:?}", e);
            return Err(internal_error());
        }
    };

    let envs = state
        .store
        .environments()
        .find_by_project_id(project.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch environments: {:?}", e);
            internal_error()
        })?;

    let mut envs = visible_envs(&state, &principal, envs).await?;
    for env in envs.iter_mut() {
        env.redact();
    }

    Ok(Json(envs))
}

async fn list_all_envs(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Environment>>, Error> {
    info!("Handling request to list environments");

    let envs = state.store.environments().find_all().await.map_err(|e| {
        error!("Failed to fetch environments: {:?}", e);
        internal_error()
    })?;

    let mut envs = visible_envs(&state, &principal, envs).await?;
    for env in envs.iter_mut() {
        env.redact();
    }

    Ok(Json(envs))
}

async fn search_envs(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Environment>>, Error> {
    info!("Handling request to search environments");

    let mut filter = Map::new();
    for (key, value) in params {
        filter.insert(key, Value::String(value));
    }

    let envs = state.store.environments().find(filter).await.map_err(|e| {
        error!("Failed to search environments: {:?}", e);
        internal_error()
    })?;

    let mut envs = visible_envs(&state, &principal, envs).await?;
    for env in envs.iter_mut() {
        env.redact();
    }

    Ok(Json(envs))
}

async fn get_env(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project, env)): Path<(String, String)>,
) -> Result<Json<Environment>, Error> {
    let name = Environment::full_name(&project, &env);
    info!("Handling request to get environment {}", name);

    // Existence is resolved before authorization on this flow
    let mut environment = match state.store.environments().get_by_name(&name).await {
        Ok(env) => env,
        Err(StoreError::NotFound) => return Err(env_not_found()),
        Err(e) => {
            error!("Failed to fetch environment {}: {:?}", name, e);
            return Err(internal_error());
        }
    };

    authorize(&state.store, &principal, Action::GetEnv, "environment", &name).await?;

    improve(&state, &mut environment).await?;
    environment.redact();
    Ok(Json(environment))
}

async fn create_env(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(project): Path<String>,
    Json(mut env): Json<Environment>,
) -> Result<Json<Environment>, Error> {
    info!("Handling request to create an environment in {}", project);

    let parent = match state.store.projects().get_by_name(&project).await {
        Ok(p) => p,
        Err(StoreError::NotFound) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Project not found"})),
            ))
        }
        Err(e) => {
            error!("Failed to fetch project {}: {:?}", project, e);
            return Err(internal_error());
        }
    };

    // Creating an environment requires ownership of the parent project
    if !principal.is_admin() {
        let owns = is_owner(&state.store, &principal, "project", &project)
            .await
            .map_err(|e| {
                error!("Ownership lookup failed: {:?}", e);
                internal_error()
            })?;
        if !owns {
            warn!(
                "User {} attempted to create an environment in {} without owning it",
                principal.username, project
            );
            return Err((StatusCode::FORBIDDEN, Json(json!({"error": DENIAL_MESSAGE}))));
        }
    }

    if let Err(e) = env.validate() {
        warn!("Invalid environment input: {}", e);
        return Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.0}))));
    }

    let name = Environment::full_name(&project, &env.name);
    match state.store.environments().get_by_name(&name).await {
        Ok(_) => {
            return Err((
                StatusCode::CONFLICT,
                Json(json!({"error": "Specified environment already exists"})),
            ))
        }
        Err(StoreError::NotFound) => {}
        Err(e) => {
            error!("Failed to check environment existence: {:?}", e);
            return Err(internal_error());
        }
    }

    env.name = name;
    env.project_id = parent.id;

    let mut created = state.store.environments().save(&env).await.map_err(|e| {
        error!("Failed to create environment {}: {:?}", env.name, e);
        internal_error()
    })?;

    // The creator becomes the environment's owner
    let grant = Role {
        user_id: principal.username.clone(),
        resource_id: created.name.clone(),
        resource_type: "environment".to_string(),
        role: OWNER.to_string(),
        ..Default::default()
    };
    state.store.roles().save(&grant).await.map_err(|e| {
        error!("Failed to grant ownership of {}: {:?}", created.name, e);
        internal_error()
    })?;

    info!("Successfully created environment {}", created.name);
    created.redact();
    Ok(Json(created))
}

async fn update_env(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project, env)): Path<(String, String)>,
    Json(input): Json<Environment>,
) -> Result<Json<Environment>, Error> {
    let name = Environment::full_name(&project, &env);
    info!("Handling request to update environment {}", name);

    // This flow authorizes before resolving the environment
    authorize(
        &state.store,
        &principal,
        Action::UpdateEnv,
        "environment",
        &name,
    )
    .await?;

    let mut existing = match state.store.environments().get_by_name(&name).await {
        Ok(env) => env,
        Err(StoreError::NotFound) => return Err(env_not_found()),
        Err(e) => {
            error!("Failed to fetch environment {}: {:?}", name, e);
            return Err(internal_error());
        }
    };

    // Only options and credentials are mutable
    existing.options = input.options;
    existing.credentials = input.credentials;

    let mut updated = state.store.environments().save(&existing).await.map_err(|e| {
        error!("Failed to update environment {}: {:?}", name, e);
        internal_error()
    })?;

    info!("Successfully updated environment {}", name);
    updated.redact();
    Ok(Json(updated))
}

async fn delete_env(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project, env)): Path<(String, String)>,
) -> Result<Json<Value>, Error> {
    let name = Environment::full_name(&project, &env);
    info!("Handling request to delete environment {}", name);

    authorize(
        &state.store,
        &principal,
        Action::DeleteEnv,
        "environment",
        &name,
    )
    .await?;

    let existing = match state.store.environments().get_by_name(&name).await {
        Ok(env) => env,
        Err(StoreError::NotFound) => return Err(env_not_found()),
        Err(e) => {
            error!("Failed to fetch environment {}: {:?}", name, e);
            return Err(internal_error());
        }
    };

    let mapping = state
        .store
        .mappings()
        .delete(&name, &principal)
        .await
        .map_err(|e| {
            error!("Failed to map the deletion of {}: {:?}", name, e);
            internal_error()
        })?;

    let build = Build {
        id: mapping
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        environment_id: existing.id,
        build_type: "destroy".to_string(),
        status: "in_progress".to_string(),
        user_id: principal.id,
        username: principal.username.clone(),
        mapping: Some(mapping),
        ..Default::default()
    };

    let stored = state.store.builds().save(&build).await.map_err(|e| {
        error!("Failed to submit deletion build for {}: {:?}", name, e);
        internal_error()
    })?;

    info!("Successfully submitted deletion of environment {}", name);
    Ok(Json(json!({"id": stored.id, "status": stored.status})))
}

/// Action request against an environment: sync, resolve or approval.
#[derive(Debug, Deserialize)]
struct ActionRequest {
    /// One of "sync", "resolve" or "approval"
    #[serde(rename = "type")]
    action_type: String,
    /// Resolution value for resolve/approval actions
    #[serde(default)]
    resolution: Option<String>,
}

async fn env_action(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project, env)): Path<(String, String)>,
    Json(action): Json<ActionRequest>,
) -> Result<Json<Value>, Error> {
    let name = Environment::full_name(&project, &env);
    info!(
        "Handling {} action on environment {}",
        action.action_type, name
    );

    let required = match action.action_type.as_str() {
        "sync" => Action::SyncEnv,
        "resolve" | "approval" => Action::ResolveEnv,
        other => {
            warn!("Unknown environment action {:?}", other);
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Unknown action type"})),
            ));
        }
    };

    authorize(&state.store, &principal, required, "environment", &name).await?;

    if let Err(e) = state.store.environments().get_by_name(&name).await {
        return match e {
            StoreError::NotFound => Err(env_not_found()),
            e => {
                error!("Failed to fetch environment {}: {:?}", name, e);
                Err(internal_error())
            }
        };
    }

    let result = match action.action_type.as_str() {
        "sync" => state.store.environments().sync(&name, &principal).await,
        "resolve" => {
            let resolution = action.resolution.as_deref().unwrap_or("");
            state
                .store
                .environments()
                .resolve(&name, &principal, resolution)
                .await
        }
        _ => {
            let resolution = action.resolution.as_deref().unwrap_or("");
            state
                .store
                .environments()
                .approve(&name, &principal, resolution)
                .await
        }
    };

    match result {
        Ok(id) => Ok(Json(json!({
            "id": id,
            "status": "in_progress",
        }))),
        Err(e) => {
            error!(
                "Failed to run {} on environment {}: {:?}",
                action.action_type, name, e
            );
            Err(internal_error())
        }
    }
}

/// Diff request between two builds of an environment.
#[derive(Debug, Deserialize)]
struct DiffRequest {
    from_id: String,
    to_id: String,
}

async fn diff_env(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project, env)): Path<(String, String)>,
    Json(diff): Json<DiffRequest>,
) -> Result<Json<Vec<String>>, Error> {
    let name = Environment::full_name(&project, &env);
    info!(
        "Handling request to diff builds {} and {} of {}",
        diff.from_id, diff.to_id, name
    );

    authorize(&state.store, &principal, Action::GetEnv, "environment", &name).await?;

    let mapping = state
        .store
        .mappings()
        .diff(&name, &diff.from_id, &diff.to_id)
        .await
        .map_err(|e| {
            error!("Failed to diff environment {}: {:?}", name, e);
            internal_error()
        })?;

    let graph = ComponentGraph::new(mapping);
    Ok(Json(render_changes(&graph)))
}
