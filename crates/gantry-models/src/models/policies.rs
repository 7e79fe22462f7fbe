//! # Policies Module
//!
//! This module defines validation policies attached to environments. A
//! policy's definition document is checked by the mapping service when a
//! build is submitted; the gateway only stores and serves it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{is_alphanumeric, ValidationError};

/// Represents a validation policy in the system.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Policy {
    /// Identifier assigned by the policy service
    #[serde(default)]
    pub id: i64,
    /// Unique policy name
    #[serde(default)]
    pub name: String,
    /// Policy definition document
    #[serde(default)]
    pub definition: String,
}

impl Policy {
    /// Validates the policy fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::new("Policy name is empty"));
        }

        if !is_alphanumeric(&self.name) {
            return Err(ValidationError::new(
                "Policy name contains invalid characters",
            ));
        }

        if self.definition.is_empty() {
            return Err(ValidationError::new("Policy definition is empty"));
        }

        Ok(())
    }
}
