//! Build endpoints.
//!
//! Reads walk the component graph stored with the build through the view
//! renderer; creation maps the submitted definition through the mapping
//! service and stores the result as a new build.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::authz::{authorize, Action, Principal};
use crate::store::StoreError;
use crate::views::BuildView;
use gantry_models::models::builds::Build;
use gantry_models::models::environments::Environment;
use gantry_models::models::graph::ComponentGraph;
use gantry_utils::logging::prelude::*;

pub fn routes() -> Router<AppState> {
    info!("Setting up build routes");
    Router::new()
        .route(
            "/projects/:project/envs/:env/builds",
            get(list_builds).post(create_build),
        )
        .route("/projects/:project/envs/:env/builds/:build", get(get_build))
        .route(
            "/projects/:project/envs/:env/builds/:build/mapping",
            get(get_build_mapping),
        )
        .route(
            "/projects/:project/envs/:env/builds/:build/definition",
            get(get_build_definition),
        )
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

fn build_not_found() -> Error {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "Specified build not found"})),
    )
}

/// Resolves the environment for a build route, attaching project metadata.
async fn resolve_env(state: &AppState, project: &str, env: &str) -> Result<Environment, Error> {
    let name = Environment::full_name(project, env);

    let mut environment = match state.store.environments().get_by_name(&name).await {
        Ok(env) => env,
        Err(StoreError::NotFound) => return Err(env_not_found()),
        Err(e) => {
            error!("Failed to fetch environment {}: {:?}", name, e);
            return Err(internal_error());
        }
    };

    if let Ok(parent) = state.store.projects().get_by_id(environment.project_id).await {
        environment.project = Some(parent.name);
        environment.provider = Some(parent.project_type);
    }

    Ok(environment)
}

/// Fetches a build and checks it belongs to the environment on the path.
async fn resolve_build(state: &AppState, env: &Environment, id: &str) -> Result<Build, Error> {
    let build = match state.store.builds().get_by_id(id).await {
        Ok(build) => build,
        Err(StoreError::NotFound) => return Err(build_not_found()),
        Err(e) => {
            error!("Failed to fetch build {}: {:?}", id, e);
            return Err(internal_error());
        }
    };

    if build.environment_id != env.id {
        return Err(build_not_found());
    }

    Ok(build)
}

async fn list_builds(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project, env)): Path<(String, String)>,
) -> Result<Json<Vec<BuildView>>, Error> {
    info!("Handling request to list builds of {}/{}", project, env);

    let environment = resolve_env(&state, &project, &env).await?;

    authorize(
        &state.store,
        &principal,
        Action::GetBuild,
        "environment",
        &environment.name,
    )
    .await?;

    let builds = state
        .store
        .builds()
        .find_by_environment(environment.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch builds of {}: {:?}", environment.name, e);
            internal_error()
        })?;

    let views = builds
        .iter()
        .map(|b| BuildView::from_metadata(b, &environment))
        .collect();

    Ok(Json(views))
}

/// Renders one build, component arrays included.
#[utoipa::path(
    get,
    path = "/api/projects/{project}/envs/{env}/builds/{build}",
    tag = "builds",
    params(
        ("project" = String, Path, description = "Project name"),
        ("env" = String, Path, description = "Environment name"),
        ("build" = String, Path, description = "Build identifier"),
    ),
    responses(
        (status = 200, description = "The rendered build"),
        (status = 403, description = "No grant on the environment"),
        (status = 404, description = "Unknown environment or build"),
    ),
    security(("bearer" = []))
)]
pub(crate) async fn get_build(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project, env, build)): Path<(String, String, String)>,
) -> Result<Json<BuildView>, Error> {
    info!(
        "Handling request to get build {} of {}/{}",
        build, project, env
    );

    let environment = resolve_env(&state, &project, &env).await?;

    authorize(
        &state.store,
        &principal,
        Action::GetBuild,
        "environment",
        &environment.name,
    )
    .await?;

    let build = resolve_build(&state, &environment, &build).await?;

    let mapping = state.store.builds().mapping(&build.id).await.map_err(|e| {
        error!("Failed to fetch mapping of build {}: {:?}", build.id, e);
        internal_error()
    })?;

    let graph = ComponentGraph::new(mapping);
    Ok(Json(BuildView::render(&build, &environment, &graph)))
}

/// Build submission: a definition document to map and store.
#[derive(Debug, Deserialize)]
struct BuildRequest {
    definition: String,
}

async fn create_build(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project, env)): Path<(String, String)>,
    Json(request): Json<BuildRequest>,
) -> Result<Json<Value>, Error> {
    info!(
        "Handling request to create a build of {}/{}",
        project, env
    );

    let environment = resolve_env(&state, &project, &env).await?;

    authorize(
        &state.store,
        &principal,
        Action::CreateBuild,
        "environment",
        &environment.name,
    )
    .await?;

    if request.definition.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Definition is empty"})),
        ));
    }

    let mapping = state
        .store
        .mappings()
        .apply(&environment.name, &request.definition, &principal)
        .await
        .map_err(|e| {
            error!("Failed to map the build: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Couldn't map the build"})),
            )
        })?;

    let build = Build {
        id: mapping
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        environment_id: environment.id,
        build_type: "apply".to_string(),
        status: "in_progress".to_string(),
        user_id: principal.id,
        username: principal.username.clone(),
        definition: Some(request.definition),
        mapping: Some(mapping),
        ..Default::default()
    };

    let stored = state.store.builds().save(&build).await.map_err(|e| {
        error!("Failed to store the build: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Couldn't create the build"})),
        )
    })?;

    info!(
        "Successfully submitted build {} for {}",
        stored.id, environment.name
    );
    Ok(Json(json!({"id": stored.id, "status": stored.status})))
}

async fn get_build_mapping(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project, env, build)): Path<(String, String, String)>,
) -> Result<Json<Value>, Error> {
    info!(
        "Handling request to get the mapping of build {} of {}/{}",
        build, project, env
    );

    // Raw mappings embed provider detail; only admins may read them
    if !principal.is_admin() {
        warn!(
            "Non-admin {} attempted to read a raw mapping",
            principal.username
        );
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({"error": "You should provide admin credentials to perform this action"})),
        ));
    }

    let environment = resolve_env(&state, &project, &env).await?;
    let build = resolve_build(&state, &environment, &build).await?;

    let mapping = state.store.builds().mapping(&build.id).await.map_err(|e| {
        error!("Failed to fetch mapping of build {}: {:?}", build.id, e);
        internal_error()
    })?;

    Ok(Json(mapping))
}

async fn get_build_definition(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((project, env, build)): Path<(String, String, String)>,
) -> Result<String, Error> {
    info!(
        "Handling request to get the definition of build {} of {}/{}",
        build, project, env
    );

    let environment = resolve_env(&state, &project, &env).await?;

    authorize(
        &state.store,
        &principal,
        Action::GetBuild,
        "environment",
        &environment.name,
    )
    .await?;

    let build = resolve_build(&state, &environment, &build).await?;

    match build.definition {
        Some(definition) => Ok(definition),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Build has no stored definition"})),
        )),
    }
}
