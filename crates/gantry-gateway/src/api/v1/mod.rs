pub mod auth;
mod builds;
mod envs;
mod loggers;
pub mod middleware;
mod notifications;
pub mod openapi;
mod policies;
mod projects;
pub mod roles;
mod users;

use crate::api::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;

/// Assembles every authenticated route behind the token middleware.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/session", get(auth::session))
        .merge(users::routes())
        .merge(roles::routes())
        .merge(projects::routes())
        .merge(envs::routes())
        .merge(builds::routes())
        .merge(policies::routes())
        .merge(loggers::routes())
        .merge(notifications::routes())
        .layer(from_fn_with_state(state, middleware::auth_middleware))
}
