//! # Projects Module
//!
//! This module defines the project (provider account) structure held by the
//! project data service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::{is_alphanumeric, ValidationError};

/// Represents a project in the system. A project scopes environments to one
/// provider account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Project {
    /// Identifier assigned by the project service
    #[serde(default)]
    pub id: i64,
    /// Unique project name
    #[serde(default)]
    pub name: String,
    /// Provider type, e.g. "aws" or "azure"
    #[serde(default, rename = "type")]
    pub project_type: String,
    /// Provider credentials, omitted from responses when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Map<String, Value>>,
    /// Free-form provider options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

impl Project {
    /// Validates the project fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::new("Project name is empty"));
        }

        if !is_alphanumeric(&self.name) {
            return Err(ValidationError::new(
                "Project name contains invalid characters",
            ));
        }

        if self.project_type.is_empty() {
            return Err(ValidationError::new("Project type is empty"));
        }

        Ok(())
    }

    /// Removes provider credentials before the project is written to a
    /// response.
    pub fn redact(&mut self) {
        self.credentials = None;
    }
}
