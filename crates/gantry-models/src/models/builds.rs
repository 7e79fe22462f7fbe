//! # Builds Module
//!
//! This module defines the build structure held by the build data service.
//! A build records one submitted change to an environment together with the
//! mapping (component graph) the change was resolved to. The mapping itself
//! is fetched separately; listings carry only the build metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::ValidationError;

/// Represents a build in the system.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Build {
    /// Build identifier assigned by the mapping service
    #[serde(default)]
    pub id: String,
    /// Identifier of the environment the build belongs to
    #[serde(default)]
    pub environment_id: i64,
    /// Kind of change, e.g. "apply", "import" or "destroy"
    #[serde(default, rename = "type")]
    pub build_type: String,
    /// Last known status
    #[serde(default)]
    pub status: String,
    /// User that submitted the build
    #[serde(default)]
    pub user_id: i64,
    /// Username that submitted the build
    #[serde(default)]
    pub username: String,
    /// Submitted definition document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    /// Resolved component mapping, present only on submission payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Build {
    /// Validates the build fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.environment_id == 0 {
            return Err(ValidationError::new("Build environment is empty"));
        }

        Ok(())
    }
}
