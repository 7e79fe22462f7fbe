//! Role-based authorization for the gateway.
//!
//! Every controller that reads or mutates a resource funnels through
//! [`authorize`]: given the authenticated principal, the action being
//! attempted, and the (resource type, resource id) pair it targets, the
//! engine decides allow or deny. Denials come back as ready-to-return
//! `(StatusCode, Json)` pairs so handlers can `?` them straight out.
//!
//! Admin principals bypass per-resource checks entirely; this is an
//! absolute override, checked before any store access. For everyone else
//! the decision rests on the grants held by the authorization service:
//! read actions are satisfied by any grant on the resource, mutating
//! actions require the "owner" grant.
//!
//! The engine is read-only against the role store and holds no state of
//! its own; every call is independently safe to run concurrently.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::metrics;
use crate::store::{Store, StoreError};
use gantry_models::models::is_alphanumeric;
use gantry_models::models::roles::Role;
use gantry_utils::logging::prelude::*;

/// Denial message returned on every 403, identical across flows so a denial
/// does not reveal anything about the resource.
pub const DENIAL_MESSAGE: &str = "You're not authorized to perform this action";

/// The authenticated caller, decoded from a verified session token. Not
/// persisted; carried as a request extension for the lifetime of one
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// User identifier
    pub id: i64,
    /// Login name; grants are keyed on this
    pub username: String,
    /// Group the user belongs to
    pub group_id: i64,
    /// Whether per-resource authorization is bypassed
    pub admin: bool,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.admin
    }
}

/// Actions controllers ask the engine about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    GetProject,
    UpdateProject,
    DeleteProject,
    GetEnv,
    CreateEnv,
    UpdateEnv,
    DeleteEnv,
    SyncEnv,
    ResolveEnv,
    GetBuild,
    CreateBuild,
    GetPolicy,
    UpdatePolicy,
    DeletePolicy,
}

/// Minimum grant an action demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any grant on the resource satisfies the action.
    Any,
    /// Only the "owner" grant satisfies the action.
    Owner,
}

impl Action {
    /// The minimum role required for this action.
    pub fn requirement(&self) -> Requirement {
        match self {
            Action::GetProject | Action::GetEnv | Action::GetBuild | Action::GetPolicy => {
                Requirement::Any
            }
            _ => Requirement::Owner,
        }
    }
}

/// Denial shape handlers propagate with `?`.
pub type Denial = (StatusCode, Json<Value>);

fn denied(resource_type: &str) -> Denial {
    metrics::AUTHZ_DENIALS_TOTAL
        .with_label_values(&[resource_type])
        .inc();
    (
        StatusCode::FORBIDDEN,
        Json(json!({"error": DENIAL_MESSAGE})),
    )
}

/// Decides whether `principal` may perform `action` on the resource
/// identified by `(resource_type, resource_id)`.
///
/// Returns `Ok(())` to proceed, or the denial to return to the caller:
/// 400 for malformed resource identifiers (rejected before any store
/// access), 403 when no sufficient grant exists, 500 when the grant lookup
/// itself fails.
pub async fn authorize(
    store: &Store,
    principal: &Principal,
    action: Action,
    resource_type: &str,
    resource_id: &str,
) -> Result<(), Denial> {
    if principal.is_admin() {
        return Ok(());
    }

    if !is_alphanumeric(resource_id) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Resource ID contains invalid characters"})),
        ));
    }

    let grant = store
        .roles()
        .get(&principal.username, resource_id, resource_type)
        .await
        .map_err(|e| {
            error!("Grant lookup failed for {}: {:?}", resource_id, e);
            internal_error()
        })?;

    let grant = match grant {
        Some(grant) => grant,
        None => {
            warn!(
                "User {} holds no grant on {} {}",
                principal.username, resource_type, resource_id
            );
            return Err(denied(resource_type));
        }
    };

    if !satisfies(&grant, action.requirement()) {
        warn!(
            "User {} grant '{}' is insufficient for {:?} on {} {}",
            principal.username, grant.role, action, resource_type, resource_id
        );
        return Err(denied(resource_type));
    }

    Ok(())
}

/// Whether `principal` holds the owner grant on a resource. Admins own
/// everything.
pub async fn is_owner(
    store: &Store,
    principal: &Principal,
    resource_type: &str,
    resource_id: &str,
) -> Result<bool, StoreError> {
    if principal.is_admin() {
        return Ok(true);
    }

    let grant = store
        .roles()
        .get(&principal.username, resource_id, resource_type)
        .await?;

    Ok(grant.map(|g| g.is_owner()).unwrap_or(false))
}

fn satisfies(grant: &Role, requirement: Requirement) -> bool {
    match requirement {
        Requirement::Any => true,
        Requirement::Owner => grant.is_owner(),
    }
}

/// Generic 500 body for store failures during authorization.
pub fn internal_error() -> Denial {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error"})),
    )
}
