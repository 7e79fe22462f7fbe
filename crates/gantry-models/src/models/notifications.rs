//! # Notifications Module
//!
//! This module defines notification channels managed through the
//! notification data service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ValidationError;

/// Represents a notification channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    /// Identifier assigned by the notification service
    #[serde(default)]
    pub id: i64,
    /// Unique channel name
    #[serde(default)]
    pub name: String,
    /// Channel type, e.g. "slack"
    #[serde(default, rename = "type")]
    pub notification_type: String,
    /// Channel configuration document
    #[serde(default)]
    pub config: String,
    /// Environment full names subscribed to the channel
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

impl Notification {
    /// Validates the notification fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::new("Notification name is empty"));
        }

        if self.notification_type.is_empty() {
            return Err(ValidationError::new("Notification type is empty"));
        }

        Ok(())
    }
}
