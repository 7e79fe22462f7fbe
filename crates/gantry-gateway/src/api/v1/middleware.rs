//! Authentication middleware for the Gantry API.
//!
//! This module provides middleware for authenticating requests using the
//! session tokens issued by the login endpoint, together with the token
//! signing and verification helpers themselves.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::api::{AppState, TokenConfig};
use crate::authz::Principal;
use crate::metrics;
use gantry_models::models::users::User;
use gantry_utils::logging::prelude::*;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier
    pub sub: i64,
    /// Login name
    pub username: String,
    /// Group the user belongs to
    pub group_id: i64,
    /// Whether the user bypasses per-resource authorization
    pub admin: bool,
    /// Expiry as a unix timestamp
    pub exp: i64,
}

/// Middleware function for authenticating requests.
///
/// Extracts the bearer token from the Authorization header, verifies it,
/// and adds the resulting [`Principal`] to the request's extensions.
///
/// # Arguments
///
/// * `state` - The shared application state.
/// * `request` - The incoming HTTP request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Result` containing either the response from the next middleware or an
/// error status code.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    metrics::HTTP_REQUESTS_TOTAL
        .with_label_values(&[request.uri().path(), request.method().as_str()])
        .inc();

    let token = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
    {
        Some(header) => header.strip_prefix("Bearer ").unwrap_or(header),
        None => {
            warn!("Authorization header missing or invalid");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    match verify_token(&state.tokens, token) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            Ok(next.run(request).await)
        }
        Err(e) => {
            warn!("Token verification failed: {}", e);
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Issues a signed session token for a user.
pub fn issue_token(config: &TokenConfig, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        group_id: user.group_id,
        admin: user.admin,
        exp: (Utc::now() + Duration::hours(config.ttl_hours)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verifies a session token and derives the request principal from its
/// claims.
pub fn verify_token(
    config: &TokenConfig,
    token: &str,
) -> Result<Principal, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(Principal {
        id: data.claims.sub,
        username: data.claims.username,
        group_id: data.claims.group_id,
        admin: data.claims.admin,
    })
}
