//! # Roles Module
//!
//! This module defines role grants: the binding of one user to one
//! capability over one resource. Grants are held by the authorization data
//! service; the gateway treats (user_id, resource_id, resource_type) as the
//! logical key and keeps at most one current grant per triple.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use utoipa::ToSchema;

use super::{is_alphanumeric, ValidationError};

/// The closed set of resource categories a grant can be scoped to.
pub const RESOURCE_TYPES: [&str; 3] = ["project", "environment", "policy"];

/// Role label that conveys full control over the granted resource.
pub const OWNER: &str = "owner";

/// Represents a role grant in the system.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Role {
    /// Identifier assigned by the authorization service
    #[serde(default)]
    pub id: i64,
    /// Username the grant applies to
    #[serde(default)]
    pub user_id: String,
    /// Identifier of the granted resource
    #[serde(default)]
    pub resource_id: String,
    /// Category of the granted resource, one of [`RESOURCE_TYPES`]
    #[serde(default)]
    pub resource_type: String,
    /// Capability label, e.g. "owner" or "reader"
    #[serde(default)]
    pub role: String,
}

impl Role {
    /// Validates the grant fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.is_empty() {
            return Err(ValidationError::new("User is empty"));
        }

        if !is_alphanumeric(&self.user_id) {
            return Err(ValidationError::new("User ID contains invalid characters"));
        }

        if self.resource_id.is_empty() {
            return Err(ValidationError::new("Resource is empty"));
        }

        if !is_alphanumeric(&self.resource_id) {
            return Err(ValidationError::new(
                "Resource ID contains invalid characters",
            ));
        }

        if !RESOURCE_TYPES.contains(&self.resource_type.as_str()) {
            return Err(ValidationError::new(
                "Resource type accepted values are ['project', 'environment', 'policy']",
            ));
        }

        if self.role.is_empty() {
            return Err(ValidationError::new("Role is empty"));
        }

        Ok(())
    }

    /// Filter matching every grant for this grant's (user, resource, type)
    /// composite key. Role creation resolves an existing grant through this
    /// filter and reuses its identity rather than inserting a duplicate.
    pub fn composite_filter(&self) -> Map<String, Value> {
        let mut filter = Map::new();
        filter.insert("user_id".to_string(), json!(self.user_id));
        filter.insert("resource_id".to_string(), json!(self.resource_id));
        filter.insert("resource_type".to_string(), json!(self.resource_type));
        filter
    }

    /// Whether this grant conveys ownership.
    pub fn is_owner(&self) -> bool {
        self.role == OWNER
    }
}
