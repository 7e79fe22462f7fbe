//! Policy endpoints.
//!
//! Reads of a single policy are open to any authenticated caller; the
//! listing is restricted to granted policies, and mutations require
//! ownership.

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
use gantry_models::models::is_alphanumeric;
use gantry_models::models::policies::Policy;
use gantry_models::models::roles::{Role, OWNER};
use gantry_utils::logging::prelude::*;

pub fn routes() -> Router<AppState> {
    info!("Setting up policy routes");
    Router::new()
        .route("/policies", get(list_policies).post(create_policy))
        .route(
            "/policies/:policy",
            get(get_policy).put(update_policy).delete(delete_policy),
        )
}

type Error = (StatusCode, Json<Value>);

fn internal_error() -> Error {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error"})),
    )
}

async fn list_policies(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Policy>>, Error> {
    info!("Handling request to list policies");

    let policies = if principal.is_admin() {
        state.store.policies().find_all().await.map_err(|e| {
            error!("Failed to fetch policies: {:?}", e);
            internal_error()
        })?
    } else {
        let ids = state
            .store
            .roles()
            .resource_ids_for(&principal.username, "policy")
            .await
            .map_err(|e| {
                error!("Failed to fetch policy grants: {:?}", e);
                internal_error()
            })?;

        let mut granted = Vec::new();
        for id in ids {
            match state.store.policies().get_by_name(&id).await {
                Ok(policy) => granted.push(policy),
                Err(StoreError::NotFound) => continue,
                Err(e) => {
                    error!("Failed to fetch policy {}: {:?}", id, e);
                    return Err(internal_error());
                }
            }
        }
        granted
    };

    Ok(Json(policies))
}

async fn get_policy(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Policy>, Error> {
    info!("Handling request to get policy {}", name);

    if !is_alphanumeric(&name) {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Policy name contains invalid characters"})),
        ));
    }

    match state.store.policies().get_by_name(&name).await {
        Ok(policy) => Ok(Json(policy)),
        Err(StoreError::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "policy not found"})),
        )),
        Err(e) => {
            error!("Failed to fetch policy {}: {:?}", name, e);
            Err(internal_error())
        }
    }
}

async fn create_policy(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(policy): Json<Policy>,
) -> Result<Json<Policy>, Error> {
    info!("Handling request to create policy {}", policy.name);

    if !principal.is_admin() {
        warn!(
            "Non-admin {} attempted to create a policy",
            principal.username
        );
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({"error": "You should provide admin credentials to perform this action"})),
        ));
    }

    if let Err(e) = policy.validate() {
        warn!("Invalid policy input: {}", e);
        return Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.0}))));
    }

    match state.store.policies().get_by_name(&policy.name).await {
        Ok(_) => {
            return Err((
                StatusCode::CONFLICT,
                Json(json!({"error": "Specified policy already exists"})),
            ))
        }
        Err(StoreError::NotFound) => {}
        Err(e) => {
            error!("Failed to check policy existence: {:?}", e);
            return Err(internal_error());
        }
    }

    let created = state.store.policies().save(&policy).await.map_err(|e| {
        error!("Failed to create policy {}: {:?}", policy.name, e);
        internal_error()
    })?;

    // The creator becomes the policy's owner
    let grant = Role {
        user_id: principal.username.clone(),
        resource_id: created.name.clone(),
        resource_type: "policy".to_string(),
        role: OWNER.to_string(),
        ..Default::default()
    };
    state.store.roles().save(&grant).await.map_err(|e| {
        error!("Failed to grant ownership of {}: {:?}", created.name, e);
        internal_error()
    })?;

    info!("Successfully created policy {}", created.name);
    Ok(Json(created))
}

async fn update_policy(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
    Json(input): Json<Policy>,
) -> Result<Json<Policy>, Error> {
    info!("Handling request to update policy {}", name);

    authorize(&state.store, &principal, Action::UpdatePolicy, "policy", &name).await?;

    let mut existing = match state.store.policies().get_by_name(&name).await {
        Ok(policy) => policy,
        Err(StoreError::NotFound) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(json!({"error": "policy not found"})),
            ))
        }
        Err(e) => {
            error!("Failed to fetch policy {}: {:?}", name, e);
            return Err(internal_error());
        }
    };

    if input.definition.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Policy definition is empty"})),
        ));
    }

    existing.definition = input.definition;

    let updated = state.store.policies().save(&existing).await.map_err(|e| {
        error!("Failed to update policy {}: {:?}", name, e);
        internal_error()
    })?;

    info!("Successfully updated policy {}", name);
    Ok(Json(updated))
}

async fn delete_policy(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
) -> Result<Json<Value>, Error> {
    info!("Handling request to delete policy {}", name);

    authorize(&state.store, &principal, Action::DeletePolicy, "policy", &name).await?;

    let existing = match state.store.policies().get_by_name(&name).await {
        Ok(policy) => policy,
        Err(StoreError::NotFound) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(json!({"error": "policy not found"})),
            ))
        }
        Err(e) => {
            error!("Failed to fetch policy {}: {:?}", name, e);
            return Err(internal_error());
        }
    };

    state
        .store
        .policies()
        .delete(existing.id)
        .await
        .map_err(|e| {
            error!("Failed to delete policy {}: {:?}", name, e);
            internal_error()
        })?;

    info!("Successfully deleted policy {}", name);
    Ok(Json(json!({"status": "Policy successfully deleted"})))
}
