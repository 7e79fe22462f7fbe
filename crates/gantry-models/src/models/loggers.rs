//! # Loggers Module
//!
//! This module defines logger forwarding targets managed through the logger
//! data service. The accepted types and their required fields mirror what
//! the logging service supports.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ValidationError;

/// Logger type that cannot be removed.
pub const BASIC: &str = "basic";

/// Represents a logger forwarding target.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Logger {
    /// Target type: "basic", "logstash" or "rollbar"
    #[serde(default, rename = "type")]
    pub logger_type: String,
    /// Log file path, required for basic loggers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logfile: Option<String>,
    /// Logstash host, required for logstash loggers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Logstash port, required for logstash loggers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    /// Delivery timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    /// Rollbar access token, required for rollbar loggers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Logger {
    /// Validates the logger fields against its declared type.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.logger_type.as_str() {
            "basic" => {
                if self.logfile.as_deref().unwrap_or("").is_empty() {
                    return Err(ValidationError::new("Logger logfile is empty"));
                }
            }
            "logstash" => {
                if self.hostname.as_deref().unwrap_or("").is_empty() {
                    return Err(ValidationError::new("Logger hostname is empty"));
                }
                if self.port.unwrap_or(0) == 0 {
                    return Err(ValidationError::new("Logger port is empty"));
                }
            }
            "rollbar" => {
                if self.token.as_deref().unwrap_or("").is_empty() {
                    return Err(ValidationError::new("Logger token is empty"));
                }
            }
            _ => {
                return Err(ValidationError::new(
                    "Logger type accepted values are ['basic', 'logstash', 'rollbar']",
                ));
            }
        }

        Ok(())
    }
}
