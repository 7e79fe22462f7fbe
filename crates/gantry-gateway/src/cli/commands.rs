//! CLI command implementations.

use axum::http::{HeaderName, HeaderValue, Method};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::api::{configure_api_routes, AppState, TokenConfig};
use crate::bus::HttpBus;
use crate::store::Store;
use gantry_utils::config::Settings;
use gantry_utils::logging::prelude::*;

/// Starts the gateway: opens the bus client, wires the store facade and
/// routes, and serves until a shutdown signal arrives.
pub async fn serve(config: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Gantry gateway");

    info!("Creating bus client for {}", config.bus.url);
    let bus = HttpBus::new(
        &config.bus.url,
        Duration::from_secs(config.bus.timeout_seconds),
    )?;
    let store = Store::new(Arc::new(bus));

    let state = AppState {
        store,
        tokens: TokenConfig {
            secret: config.auth.secret.clone(),
            ttl_hours: config.auth.token_ttl_hours,
        },
    };

    info!("Configuring API routes");
    let app = configure_api_routes(state).layer(cors_layer(config));

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

/// Builds the CORS layer from the settings.
fn cors_layer(config: &Settings) -> CorsLayer {
    let mut layer = CorsLayer::new().max_age(Duration::from_secs(config.cors.max_age_seconds));

    if config.cors.allowed_origins.iter().any(|o| o == "*") {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .cors
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer = layer.allow_origin(AllowOrigin::list(origins));
    }

    let methods: Vec<Method> = config
        .cors
        .allowed_methods
        .iter()
        .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
        .collect();

    let headers: Vec<HeaderName> = config
        .cors
        .allowed_headers
        .iter()
        .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
        .collect();

    layer.allow_methods(methods).allow_headers(headers)
}

async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("Failed to install shutdown signal handler");
    info!("Shutdown signal received");
}
