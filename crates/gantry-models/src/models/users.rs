//! # Users Module
//!
//! This module defines the user account structure held by the user data
//! service and validated at the gateway edge.
//!
//! The `password` and `old_password` fields only travel inbound (create and
//! update requests); `password_hash` only travels between the gateway and the
//! user service. All three are stripped by [`User::redact`] before a user is
//! written to a response.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ValidationError;

static USERNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-zA-Z0-9@._-]+$").expect("username pattern"));

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Represents a user account in the system.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique identifier assigned by the user service
    #[serde(default)]
    pub id: i64,
    /// Group the user belongs to
    #[serde(default)]
    pub group_id: i64,
    /// Login name
    #[serde(default)]
    pub username: String,
    /// Plaintext password, present only on create/update requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Previous password, present only on password-change requests
    #[serde(default, rename = "oldpassword", skip_serializing_if = "Option::is_none")]
    pub old_password: Option<String>,
    /// Password hash as stored by the user service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Whether the user bypasses per-resource authorization entirely
    #[serde(default)]
    pub admin: bool,
}

impl User {
    /// Validates the user's username and, when present, its password.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.is_empty() {
            return Err(ValidationError::new("Username cannot be empty"));
        }

        if !USERNAME.is_match(&self.username) {
            return Err(ValidationError::new(
                "Username can only contain the following characters: a-z 0-9 @._-",
            ));
        }

        if let Some(password) = &self.password {
            if password.len() < MIN_PASSWORD_LENGTH {
                return Err(ValidationError::new(
                    "Minimum password length is 8 characters",
                ));
            }
        }

        Ok(())
    }

    /// Removes all sensitive fields before the user is written to a response.
    pub fn redact(&mut self) {
        self.password = None;
        self.old_password = None;
        self.password_hash = None;
    }
}
