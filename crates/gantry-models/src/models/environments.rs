//! # Environments Module
//!
//! This module defines the environment structure held by the environment
//! data service. An environment's full name is `project/environment`; that
//! full name is the identifier role grants and store filters use.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::ValidationError;

/// Separator between the project and environment parts of a full name.
pub const NAME_SEPARATOR: &str = "/";

/// Represents an environment in the system.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Environment {
    /// Identifier assigned by the environment service
    #[serde(default)]
    pub id: i64,
    /// Identifier of the owning project
    #[serde(default)]
    pub project_id: i64,
    /// Owning project name, attached by the gateway on reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Provider type, attached by the gateway on reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Full name, `project/environment`
    #[serde(default)]
    pub name: String,
    /// Environment type
    #[serde(default, rename = "type")]
    pub env_type: String,
    /// Last known status, e.g. "done" or "in_progress"
    #[serde(default)]
    pub status: String,
    /// Free-form options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
    /// Provider credential overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Map<String, Value>>,
    /// Grant annotations ("user (role)"), attached by the gateway on reads
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl Environment {
    /// Validates the environment fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::new("Environment name is empty"));
        }

        Ok(())
    }

    /// Builds the full name for a project/environment pair.
    pub fn full_name(project: &str, env: &str) -> String {
        format!("{}{}{}", project, NAME_SEPARATOR, env)
    }

    /// Removes provider credentials before the environment is written to a
    /// response.
    pub fn redact(&mut self) {
        self.credentials = None;
    }
}
