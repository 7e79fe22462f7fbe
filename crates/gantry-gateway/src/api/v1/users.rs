//! User account endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use crate::api::v1::auth::hash_password;
use crate::api::AppState;
use crate::authz::Principal;
use crate::store::StoreError;
use gantry_models::models::users::User;
use gantry_utils::logging::prelude::*;

pub fn routes() -> Router<AppState> {
    info!("Setting up user routes");
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:user",
            get(get_user).put(update_user).delete(delete_user),
        )
}

type Error = (StatusCode, Json<Value>);

fn internal_error() -> Error {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error"})),
    )
}

fn admin_required() -> Error {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"error": "You should provide admin credentials to perform this action"})),
    )
}

fn not_found() -> Error {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "Specified user not found"})),
    )
}

/// Resolves a path segment into a user, trying the login name first and
/// falling back to the numeric id.
async fn resolve_user(state: &AppState, reference: &str) -> Result<User, StoreError> {
    match state.store.users().get_by_username(reference).await {
        Ok(user) => Ok(user),
        Err(StoreError::NotFound) => match reference.parse::<i64>() {
            Ok(id) => state.store.users().get_by_id(id).await,
            Err(_) => Err(StoreError::NotFound),
        },
        Err(e) => Err(e),
    }
}

async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<User>>, Error> {
    info!("Handling request to list users");

    let mut users = if principal.is_admin() {
        state.store.users().find_all().await.map_err(|e| {
            error!("Failed to fetch users: {:?}", e);
            internal_error()
        })?
    } else {
        let user = state
            .store
            .users()
            .get_by_username(&principal.username)
            .await
            .map_err(|e| {
                error!("Failed to fetch user {}: {:?}", principal.username, e);
                internal_error()
            })?;
        vec![user]
    };

    for user in users.iter_mut() {
        user.redact();
    }

    Ok(Json(users))
}

async fn get_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(reference): Path<String>,
) -> Result<Json<User>, Error> {
    info!("Handling request to get user {}", reference);

    if !principal.is_admin() && principal.username != reference {
        warn!(
            "User {} attempted to read user {}",
            principal.username, reference
        );
        return Err(admin_required());
    }

    let mut user = match resolve_user(&state, &reference).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(not_found()),
        Err(e) => {
            error!("Failed to fetch user {}: {:?}", reference, e);
            return Err(internal_error());
        }
    };

    user.redact();
    Ok(Json(user))
}

async fn create_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(mut user): Json<User>,
) -> Result<Json<User>, Error> {
    info!("Handling request to create a user");

    if !principal.is_admin() {
        warn!(
            "Non-admin {} attempted to create a user",
            principal.username
        );
        return Err(admin_required());
    }

    let password = match user.password.as_deref() {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Password cannot be empty"})),
            ))
        }
    };

    if let Err(e) = user.validate() {
        warn!("Invalid user input: {}", e);
        return Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.0}))));
    }

    match state.store.users().exists(&user.username).await {
        Ok(true) => {
            return Err((
                StatusCode::CONFLICT,
                Json(json!({"error": "Specified user already exists"})),
            ))
        }
        Ok(false) => {}
        Err(e) => {
            error!("Failed to check user existence: {:?}", e);
            return Err(internal_error());
        }
    }

    user.password_hash = Some(hash_password(&password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        internal_error()
    })?);
    user.password = None;

    let mut created = state.store.users().save(&user).await.map_err(|e| {
        error!("Failed to create user: {:?}", e);
        internal_error()
    })?;

    info!("Successfully created user {}", created.username);
    created.redact();
    Ok(Json(created))
}

async fn update_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(reference): Path<String>,
    Json(input): Json<User>,
) -> Result<Json<User>, Error> {
    info!("Handling request to update user {}", reference);

    let mut existing = match resolve_user(&state, &reference).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(not_found()),
        Err(e) => {
            error!("Failed to fetch user {}: {:?}", reference, e);
            return Err(internal_error());
        }
    };

    if !principal.is_admin() && existing.username != principal.username {
        warn!(
            "User {} attempted to update user {}",
            principal.username, existing.username
        );
        return Err(admin_required());
    }

    // Only admins may toggle the admin flag
    if !principal.is_admin() && input.admin != existing.admin {
        warn!(
            "User {} attempted to change the admin flag on {}",
            principal.username, existing.username
        );
        return Err(admin_required());
    }

    if let Some(password) = input.password.as_deref() {
        let candidate = User {
            username: existing.username.clone(),
            password: Some(password.to_string()),
            ..Default::default()
        };
        if let Err(e) = candidate.validate() {
            return Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.0}))));
        }

        // Non-admins must prove they know the current password
        if !principal.is_admin() {
            let old = input.old_password.as_deref().unwrap_or("");
            let hash = existing.password_hash.as_deref().unwrap_or("");
            if !crate::api::v1::auth::verify_for_update(hash, old) {
                warn!(
                    "Wrong old password on update for user {}",
                    existing.username
                );
                return Err(admin_required());
            }
        }

        existing.password_hash = Some(hash_password(password).map_err(|e| {
            error!("Failed to hash password: {}", e);
            internal_error()
        })?);
    }

    if principal.is_admin() {
        existing.admin = input.admin;
        existing.group_id = input.group_id;
    }

    let mut updated = state.store.users().save(&existing).await.map_err(|e| {
        error!("Failed to update user {}: {:?}", existing.username, e);
        internal_error()
    })?;

    info!("Successfully updated user {}", updated.username);
    updated.redact();
    Ok(Json(updated))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(reference): Path<String>,
) -> Result<Json<Value>, Error> {
    info!("Handling request to delete user {}", reference);

    if !principal.is_admin() {
        warn!(
            "Non-admin {} attempted to delete user {}",
            principal.username, reference
        );
        return Err(admin_required());
    }

    let existing = match resolve_user(&state, &reference).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(not_found()),
        Err(e) => {
            error!("Failed to fetch user {}: {:?}", reference, e);
            return Err(internal_error());
        }
    };

    state
        .store
        .users()
        .delete(existing.id)
        .await
        .map_err(|e| {
            error!("Failed to delete user {}: {:?}", existing.username, e);
            internal_error()
        })?;

    info!("Successfully deleted user {}", existing.username);
    Ok(Json(json!({"status": "User successfully deleted"})))
}
