//! Logger target endpoints. Admin only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde_json::{json, Value};

use crate::api::AppState;
use crate::authz::Principal;
use gantry_models::models::loggers::{Logger, BASIC};
use gantry_utils::logging::prelude::*;

pub fn routes() -> Router<AppState> {
    info!("Setting up logger routes");
    Router::new()
        .route("/loggers", get(list_loggers).post(create_logger))
        .route("/loggers/:logger", axum::routing::delete(delete_logger))
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

async fn list_loggers(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Logger>>, Error> {
    info!("Handling request to list loggers");

    if !principal.is_admin() {
        warn!("Non-admin {} attempted to list loggers", principal.username);
        return Err(admin_required());
    }

    match state.store.loggers().find_all().await {
        Ok(loggers) => Ok(Json(loggers)),
        Err(e) => {
            error!("Failed to fetch loggers: {:?}", e);
            Err(internal_error())
        }
    }
}

async fn create_logger(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(logger): Json<Logger>,
) -> Result<Json<Logger>, Error> {
    info!("Handling request to create a {} logger", logger.logger_type);

    if !principal.is_admin() {
        warn!(
            "Non-admin {} attempted to create a logger",
            principal.username
        );
        return Err(admin_required());
    }

    if let Err(e) = logger.validate() {
        warn!("Invalid logger input: {}", e);
        return Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.0}))));
    }

    match state.store.loggers().save(&logger).await {
        Ok(created) => {
            info!("Successfully created {} logger", created.logger_type);
            Ok(Json(created))
        }
        Err(e) => {
            error!("Failed to create logger: {:?}", e);
            Err(internal_error())
        }
    }
}

async fn delete_logger(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(logger): Path<String>,
) -> Result<Json<Value>, Error> {
    info!("Handling request to delete the {} logger", logger);

    if !principal.is_admin() {
        warn!(
            "Non-admin {} attempted to delete a logger",
            principal.username
        );
        return Err(admin_required());
    }

    if logger == BASIC {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Basic logger can't be deleted"})),
        ));
    }

    state.store.loggers().delete(&logger).await.map_err(|e| {
        error!("Failed to delete logger {}: {:?}", logger, e);
        internal_error()
    })?;

    info!("Successfully deleted logger {}", logger);
    Ok(Json(json!({"status": "Logger successfully deleted"})))
}
