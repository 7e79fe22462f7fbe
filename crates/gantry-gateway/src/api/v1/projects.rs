//! Project endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use crate::api::AppState;
use crate::authz::{authorize, Action, Principal};
use crate::store::StoreError;
use gantry_models::models::projects::Project;
use gantry_models::models::roles::{Role, OWNER};
use gantry_utils::logging::prelude::*;

pub fn routes() -> Router<AppState> {
    info!("Setting up project routes");
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:project",
            get(get_project).put(update_project).delete(delete_project),
        )
}

type Error = (StatusCode, Json<Value>);

fn internal_error() -> Error {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error"})),
    )
}

fn not_found() -> Error {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "Project not found"})),
    )
}

async fn list_projects(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Project>>, Error> {
    info!("Handling request to list projects");

    let mut projects = if principal.is_admin() {
        state.store.projects().find_all().await.map_err(|e| {
            error!("Failed to fetch projects: {:?}", e);
            internal_error()
        })?
    } else {
        let ids = state
            .store
            .roles()
            .resource_ids_for(&principal.username, "project")
            .await
            .map_err(|e| {
                error!("Failed to fetch project grants: {:?}", e);
                internal_error()
            })?;

        let mut granted = Vec::new();
        for id in ids {
            match state.store.projects().get_by_name(&id).await {
                Ok(project) => granted.push(project),
                // A grant may outlive its project; skip the leftovers
                Err(StoreError::NotFound) => continue,
                Err(e) => {
                    error!("Failed to fetch project {}: {:?}", id, e);
                    return Err(internal_error());
                }
            }
        }
        granted
    };

    for project in projects.iter_mut() {
        project.redact();
    }

    Ok(Json(projects))
}

async fn get_project(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
) -> Result<Json<Project>, Error> {
    info!("Handling request to get project {}", name);

    authorize(&state.store, &principal, Action::GetProject, "project", &name).await?;

    let mut project = match state.store.projects().get_by_name(&name).await {
        Ok(project) => project,
        Err(StoreError::NotFound) => return Err(not_found()),
        Err(e) => {
            error!("Failed to fetch project {}: {:?}", name, e);
            return Err(internal_error());
        }
    };

    project.redact();
    Ok(Json(project))
}

async fn create_project(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(project): Json<Project>,
) -> Result<Json<Project>, Error> {
    info!("Handling request to create project {}", project.name);

    if let Err(e) = project.validate() {
        warn!("Invalid project input: {}", e);
        return Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.0}))));
    }

    match state.store.projects().get_by_name(&project.name).await {
        Ok(_) => {
            return Err((
                StatusCode::CONFLICT,
                Json(json!({"error": "Specified project already exists"})),
            ))
        }
        Err(StoreError::NotFound) => {}
        Err(e) => {
            error!("Failed to check project existence: {:?}", e);
            return Err(internal_error());
        }
    }

    let mut created = state.store.projects().save(&project).await.map_err(|e| {
        error!("Failed to create project {}: {:?}", project.name, e);
        internal_error()
    })?;

    // The creator becomes the project's owner
    let grant = Role {
        user_id: principal.username.clone(),
        resource_id: created.name.clone(),
        resource_type: "project".to_string(),
        role: OWNER.to_string(),
        ..Default::default()
    };
    state.store.roles().save(&grant).await.map_err(|e| {
        error!("Failed to grant ownership of {}: {:?}", created.name, e);
        internal_error()
    })?;

    info!("Successfully created project {}", created.name);
    created.redact();
    Ok(Json(created))
}

async fn update_project(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
    Json(input): Json<Project>,
) -> Result<Json<Project>, Error> {
    info!("Handling request to update project {}", name);

    authorize(
        &state.store,
        &principal,
        Action::UpdateProject,
        "project",
        &name,
    )
    .await?;

    let mut existing = match state.store.projects().get_by_name(&name).await {
        Ok(project) => project,
        Err(StoreError::NotFound) => return Err(not_found()),
        Err(e) => {
            error!("Failed to fetch project {}: {:?}", name, e);
            return Err(internal_error());
        }
    };

    // Only provider credentials and options are mutable
    existing.credentials = input.credentials;
    existing.options = input.options;

    let mut updated = state.store.projects().save(&existing).await.map_err(|e| {
        error!("Failed to update project {}: {:?}", name, e);
        internal_error()
    })?;

    info!("Successfully updated project {}", name);
    updated.redact();
    Ok(Json(updated))
}

async fn delete_project(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
) -> Result<Json<Value>, Error> {
    info!("Handling request to delete project {}", name);

    let existing = match state.store.projects().get_by_name(&name).await {
        Ok(project) => project,
        Err(StoreError::NotFound) => return Err(not_found()),
        Err(e) => {
            error!("Failed to fetch project {}: {:?}", name, e);
            return Err(internal_error());
        }
    };

    authorize(
        &state.store,
        &principal,
        Action::DeleteProject,
        "project",
        &name,
    )
    .await?;

    let environments = state
        .store
        .environments()
        .find_by_project_id(existing.id)
        .await
        .map_err(|e| {
            error!("Failed to list environments of {}: {:?}", name, e);
            internal_error()
        })?;

    if !environments.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Existing environments are referring to this project."})),
        ));
    }

    state
        .store
        .projects()
        .delete(existing.id)
        .await
        .map_err(|e| {
            error!("Failed to delete project {}: {:?}", name, e);
            internal_error()
        })?;

    info!("Successfully deleted project {}", name);
    Ok(Json(json!({"status": "Project successfully deleted"})))
}
