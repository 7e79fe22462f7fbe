//! # API Routes Aggregator Module
//!
//! This module aggregates all API routes and provides a function to
//! configure the main router. The authentication endpoint and the health,
//! readiness and metrics probes sit outside the token middleware; everything
//! under `/api` requires a valid session token.

pub mod v1;

use axum::{response::IntoResponse, routing::get, routing::post, Router};
use hyper::StatusCode;

use crate::metrics::encode_metrics;
use crate::store::Store;

/// Token signing and verification parameters, taken from the settings at
/// startup.
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC secret for signing and verifying session tokens
    pub secret: String,
    /// Token lifetime in hours
    pub ttl_hours: i64,
}

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Store facade over the backend bus
    pub store: Store,
    /// Session token parameters
    pub tokens: TokenConfig,
}

/// Configures and returns the main application router with all API routes.
pub fn configure_api_routes(state: AppState) -> Router {
    Router::new()
        .route("/auth", post(v1::auth::login))
        .nest("/api", v1::routes(state.clone()))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .merge(v1::openapi::router())
        .with_state(state)
}

/// Health check endpoint handler
///
/// # Returns
///
/// Returns a 200 OK status code with "OK" in the body.
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Ready check endpoint handler
///
/// # Returns
///
/// Returns a 200 OK status code with "Ready" in the body.
async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, "Ready")
}

/// Metrics endpoint handler
///
/// # Returns
///
/// Returns all registered metrics in Prometheus exposition format.
async fn metrics() -> impl IntoResponse {
    (StatusCode::OK, encode_metrics())
}
