//! Role grant endpoints.
//!
//! Grant creation follows a strict precedence: input validation, then
//! referenced-resource and referenced-user existence, then the caller's own
//! ownership of the target resource, and finally an upsert keyed on the
//! (user, resource, type) composite so a triple never accumulates duplicate
//! grants.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use crate::api::AppState;
use crate::authz::{is_owner, Principal, DENIAL_MESSAGE};
use crate::store::StoreError;
use gantry_models::models::roles::Role;
use gantry_utils::logging::prelude::*;

pub fn routes() -> Router<AppState> {
    info!("Setting up role routes");
    Router::new()
        .route("/roles", get(list_roles).post(create_role).delete(delete_role))
        .route("/roles/:id", get(get_role).delete(delete_role_by_id))
}

type Error = (StatusCode, Json<Value>);

fn internal_error() -> Error {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error"})),
    )
}

fn denied() -> Error {
    (StatusCode::FORBIDDEN, Json(json!({"error": DENIAL_MESSAGE})))
}

/// Whether the referenced resource actually exists in its service.
async fn resource_exists(state: &AppState, role: &Role) -> Result<bool, StoreError> {
    let result = match role.resource_type.as_str() {
        "project" => state
            .store
            .projects()
            .get_by_name(&role.resource_id)
            .await
            .map(|_| ()),
        "environment" => state
            .store
            .environments()
            .get_by_name(&role.resource_id)
            .await
            .map(|_| ()),
        "policy" => state
            .store
            .policies()
            .get_by_name(&role.resource_id)
            .await
            .map(|_| ()),
        _ => return Ok(false),
    };

    match result {
        Ok(()) => Ok(true),
        Err(StoreError::NotFound) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Lists the grants visible to the caller: every grant for admins, the
/// caller's own grants otherwise.
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "roles",
    responses(
        (status = 200, description = "Grants visible to the caller", body = [Role]),
        (status = 401, description = "Missing or invalid session token"),
    ),
    security(("bearer" = []))
)]
pub(crate) async fn list_roles(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Role>>, Error> {
    info!("Handling request to list roles");

    let roles = if principal.is_admin() {
        state.store.roles().find_all().await
    } else {
        state.store.roles().find_by_user(&principal.username).await
    };

    match roles {
        Ok(roles) => Ok(Json(roles)),
        Err(e) => {
            error!("Failed to fetch roles: {:?}", e);
            Err(internal_error())
        }
    }
}

/// Retrieves one grant by id. Non-admins only see their own grants.
#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    tag = "roles",
    params(("id" = i64, Path, description = "Grant identifier")),
    responses(
        (status = 200, description = "The grant", body = Role),
        (status = 403, description = "Grant belongs to another user"),
        (status = 404, description = "No such grant"),
    ),
    security(("bearer" = []))
)]
pub(crate) async fn get_role(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<Json<Role>, Error> {
    info!("Handling request to get role {}", id);

    let role = match state.store.roles().get_by_id(id).await {
        Ok(role) => role,
        Err(StoreError::NotFound) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Specified role not found"})),
            ))
        }
        Err(e) => {
            error!("Failed to fetch role {}: {:?}", id, e);
            return Err(internal_error());
        }
    };

    if !principal.is_admin() && role.user_id != principal.username {
        warn!(
            "User {} attempted to read grant {} of {}",
            principal.username, id, role.user_id
        );
        return Err(denied());
    }

    Ok(Json(role))
}

/// Creates (or refreshes) a grant.
///
/// If a grant already exists for the exact (user, resource, type) triple its
/// identity is reused, so the operation updates the existing record instead
/// of inserting a duplicate.
#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "roles",
    request_body = Role,
    responses(
        (status = 200, description = "The stored grant", body = Role),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Caller does not own the target resource"),
        (status = 404, description = "Referenced resource or user does not exist"),
    ),
    security(("bearer" = []))
)]
pub(crate) async fn create_role(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(mut role): Json<Role>,
) -> Result<Json<Role>, Error> {
    info!(
        "Handling request to grant '{}' on {} {} to {}",
        role.role, role.resource_type, role.resource_id, role.user_id
    );

    if let Err(e) = role.validate() {
        warn!("Invalid role input: {}", e);
        return Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.0}))));
    }

    match resource_exists(&state, &role).await {
        Ok(true) => {}
        Ok(false) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Specified resource not found"})),
            ))
        }
        Err(e) => {
            error!("Failed to check resource existence: {:?}", e);
            return Err(internal_error());
        }
    }

    match state.store.users().exists(&role.user_id).await {
        Ok(true) => {}
        Ok(false) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Specified user not found"})),
            ))
        }
        Err(e) => {
            error!("Failed to check user existence: {:?}", e);
            return Err(internal_error());
        }
    }

    if !principal.is_admin() {
        let owns = is_owner(&state.store, &principal, &role.resource_type, &role.resource_id)
            .await
            .map_err(|e| {
                error!("Ownership lookup failed: {:?}", e);
                internal_error()
            })?;
        if !owns {
            warn!(
                "User {} attempted to grant on {} {} without owning it",
                principal.username, role.resource_type, role.resource_id
            );
            return Err(denied());
        }
    }

    // Upsert on the composite key: reuse the identity of any existing grant
    // for this triple
    let existing = state
        .store
        .roles()
        .get(&role.user_id, &role.resource_id, &role.resource_type)
        .await
        .map_err(|e| {
            error!("Failed to resolve existing grant: {:?}", e);
            internal_error()
        })?;

    if let Some(existing) = existing {
        role.id = existing.id;
    }

    let stored = state.store.roles().save(&role).await.map_err(|e| {
        error!("Failed to save grant: {:?}", e);
        internal_error()
    })?;

    info!(
        "Successfully granted '{}' on {} {} to {}",
        stored.role, stored.resource_type, stored.resource_id, stored.user_id
    );
    Ok(Json(stored))
}

/// Deletes a grant identified by its composite key in the request body.
async fn delete_role(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(role): Json<Role>,
) -> Result<Json<Value>, Error> {
    info!(
        "Handling request to revoke grant on {} {} from {}",
        role.resource_type, role.resource_id, role.user_id
    );

    let existing = state
        .store
        .roles()
        .get(&role.user_id, &role.resource_id, &role.resource_type)
        .await
        .map_err(|e| {
            error!("Failed to resolve grant: {:?}", e);
            internal_error()
        })?;

    let existing = match existing {
        Some(existing) => existing,
        None => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Specified role not found"})),
            ))
        }
    };

    remove_grant(&state, &principal, existing).await
}

/// Deletes a grant by id.
async fn delete_role_by_id(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, Error> {
    info!("Handling request to revoke grant {}", id);

    let existing = match state.store.roles().get_by_id(id).await {
        Ok(role) => role,
        Err(StoreError::NotFound) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Specified role not found"})),
            ))
        }
        Err(e) => {
            error!("Failed to fetch role {}: {:?}", id, e);
            return Err(internal_error());
        }
    };

    remove_grant(&state, &principal, existing).await
}

async fn remove_grant(
    state: &AppState,
    principal: &Principal,
    grant: Role,
) -> Result<Json<Value>, Error> {
    if !principal.is_admin() {
        let owns = is_owner(
            &state.store,
            principal,
            &grant.resource_type,
            &grant.resource_id,
        )
        .await
        .map_err(|e| {
            error!("Ownership lookup failed: {:?}", e);
            internal_error()
        })?;
        if !owns {
            warn!(
                "User {} attempted to revoke a grant on {} {} without owning it",
                principal.username, grant.resource_type, grant.resource_id
            );
            return Err(denied());
        }
    }

    state.store.roles().delete(&grant).await.map_err(|e| {
        error!("Failed to delete grant {}: {:?}", grant.id, e);
        internal_error()
    })?;

    info!(
        "Successfully revoked grant on {} {} from {}",
        grant.resource_type, grant.resource_id, grant.user_id
    );
    Ok(Json(json!({"status": "Role successfully deleted"})))
}
