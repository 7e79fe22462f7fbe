//! Authentication endpoints: login and session introspection.

use argon2::{Argon2, PasswordVerifier};
use axum::{extract::State, http::StatusCode, Extension, Json};
use password_hash::PasswordHash;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::v1::middleware::issue_token;
use crate::api::AppState;
use crate::authz::Principal;
use crate::store::StoreError;
use gantry_utils::logging::prelude::*;

/// Login request body.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct Credentials {
    /// Login name
    pub username: String,
    /// Plaintext password
    pub password: String,
}

/// Login response carrying the signed session token.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    /// Signed session token to present as a bearer credential
    pub token: String,
}

/// Authenticates a user and issues a session token.
#[utoipa::path(
    post,
    path = "/auth",
    tag = "auth",
    request_body = Credentials,
    responses(
        (status = 200, description = "Authentication succeeded", body = TokenResponse),
        (status = 401, description = "Unknown user or wrong password"),
        (status = 504, description = "User service did not reply in time"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<Value>)> {
    info!("Handling login request for {}", credentials.username);

    let user = match state
        .store
        .users()
        .get_by_username(&credentials.username)
        .await
    {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            warn!("Login attempt for unknown user {}", credentials.username);
            return Err(unauthorized());
        }
        Err(StoreError::Bus(crate::bus::BusError::Timeout)) => {
            error!("User lookup timed out during login");
            return Err((
                StatusCode::GATEWAY_TIMEOUT,
                Json(json!({"error": "Gateway timeout"})),
            ));
        }
        Err(e) => {
            error!("User lookup failed during login: {:?}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error"})),
            ));
        }
    };

    let hash = user.password_hash.as_deref().unwrap_or("");
    if !valid_password(hash, &credentials.password) {
        warn!("Wrong password for user {}", credentials.username);
        return Err(unauthorized());
    }

    let token = issue_token(&state.tokens, &user).map_err(|e| {
        error!("Failed to sign session token: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error"})),
        )
    })?;

    info!("Login succeeded for {}", credentials.username);
    Ok(Json(TokenResponse { token }))
}

/// Returns the authenticated caller's identity.
#[utoipa::path(
    get,
    path = "/api/session",
    tag = "auth",
    responses(
        (status = 200, description = "The authenticated principal"),
        (status = 401, description = "Missing or invalid session token"),
    ),
    security(("bearer" = []))
)]
pub async fn session(Extension(principal): Extension<Principal>) -> Json<Principal> {
    Json(principal)
}

/// Verifies a submitted password against a stored hash. Comparison happens
/// inside the hash verifier in constant time; malformed hashes simply fail.
fn valid_password(hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Verifies a password during a self-service password change; same check as
/// login, exposed for the user controllers.
pub fn verify_for_update(hash: &str, password: &str) -> bool {
    valid_password(hash, password)
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Invalid credentials"})),
    )
}

/// Hashes a plaintext password for storage. Used by the user controllers on
/// create and password change.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    use argon2::PasswordHasher;
    use password_hash::SaltString;

    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|_| password_hash::Error::Crypto)?;
    let salt = SaltString::encode_b64(&salt_bytes)?;

    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}
