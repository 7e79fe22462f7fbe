//! Notification channel endpoints. Admin only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use crate::api::AppState;
use crate::authz::Principal;
use crate::store::StoreError;
use gantry_models::models::notifications::Notification;
use gantry_utils::logging::prelude::*;

pub fn routes() -> Router<AppState> {
    info!("Setting up notification routes");
    Router::new()
        .route(
            "/notifications",
            get(list_notifications).post(create_notification),
        )
        .route(
            "/notifications/:notification",
            axum::routing::put(update_notification).delete(delete_notification),
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
        Json(json!({"error": "Specified notification not found"})),
    )
}

async fn list_notifications(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Notification>>, Error> {
    info!("Handling request to list notifications");

    if !principal.is_admin() {
        warn!(
            "Non-admin {} attempted to list notifications",
            principal.username
        );
        return Err(admin_required());
    }

    match state.store.notifications().find_all().await {
        Ok(notifications) => Ok(Json(notifications)),
        Err(e) => {
            error!("Failed to fetch notifications: {:?}", e);
            Err(internal_error())
        }
    }
}

async fn create_notification(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(notification): Json<Notification>,
) -> Result<Json<Notification>, Error> {
    info!(
        "Handling request to create notification {}",
        notification.name
    );

    if !principal.is_admin() {
        warn!(
            "Non-admin {} attempted to create a notification",
            principal.username
        );
        return Err(admin_required());
    }

    if let Err(e) = notification.validate() {
        warn!("Invalid notification input: {}", e);
        return Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.0}))));
    }

    match state
        .store
        .notifications()
        .get_by_name(&notification.name)
        .await
    {
        Ok(_) => {
            return Err((
                StatusCode::CONFLICT,
                Json(json!({"error": "Specified notification already exists"})),
            ))
        }
        Err(StoreError::NotFound) => {}
        Err(e) => {
            error!("Failed to check notification existence: {:?}", e);
            return Err(internal_error());
        }
    }

    match state.store.notifications().save(&notification).await {
        Ok(created) => {
            info!("Successfully created notification {}", created.name);
            Ok(Json(created))
        }
        Err(e) => {
            error!("Failed to create notification: {:?}", e);
            Err(internal_error())
        }
    }
}

async fn update_notification(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
    Json(input): Json<Notification>,
) -> Result<Json<Notification>, Error> {
    info!("Handling request to update notification {}", name);

    if !principal.is_admin() {
        warn!(
            "Non-admin {} attempted to update a notification",
            principal.username
        );
        return Err(admin_required());
    }

    let mut existing = match state.store.notifications().get_by_name(&name).await {
        Ok(notification) => notification,
        Err(StoreError::NotFound) => return Err(not_found()),
        Err(e) => {
            error!("Failed to fetch notification {}: {:?}", name, e);
            return Err(internal_error());
        }
    };

    // Only the channel configuration is mutable
    existing.config = input.config;

    match state.store.notifications().save(&existing).await {
        Ok(updated) => {
            info!("Successfully updated notification {}", name);
            Ok(Json(updated))
        }
        Err(e) => {
            error!("Failed to update notification {}: {:?}", name, e);
            Err(internal_error())
        }
    }
}

async fn delete_notification(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
) -> Result<Json<Value>, Error> {
    info!("Handling request to delete notification {}", name);

    if !principal.is_admin() {
        warn!(
            "Non-admin {} attempted to delete a notification",
            principal.username
        );
        return Err(admin_required());
    }

    let existing = match state.store.notifications().get_by_name(&name).await {
        Ok(notification) => notification,
        Err(StoreError::NotFound) => return Err(not_found()),
        Err(e) => {
            error!("Failed to fetch notification {}: {:?}", name, e);
            return Err(internal_error());
        }
    };

    state
        .store
        .notifications()
        .delete(existing.id)
        .await
        .map_err(|e| {
            error!("Failed to delete notification {}: {:?}", name, e);
            internal_error()
        })?;

    info!("Successfully deleted notification {}", name);
    Ok(Json(json!({"status": "Notification successfully deleted"})))
}
