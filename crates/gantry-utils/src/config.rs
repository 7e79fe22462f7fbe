//! # Gantry Config Module
//! This module provides a common configuration framework for the gateway crates.
//!
//! # Variable Naming Convention
//!
//! Variables in this configuration framework follow these naming conventions:
//! - Struct fields use snake_case (e.g., `bus`, `token_ttl_hours`)
//! - Environment variables use SCREAMING_SNAKE_CASE and are prefixed with "GANTRY__"
//!   (e.g., `GANTRY__BUS__URL`)
//! - Configuration file keys use snake_case (e.g., `bus.url`, `log.level`)
//!
//! # Configuration Overriding
//!
//! The configuration values are loaded and overridden in the following order (later
//! sources take precedence):
//!
//! 1. Default values from the embedded `default.toml` file
//! 2. Values from an optional external configuration file (if provided)
//! 3. Environment variables
//!
//! # Available Environment Variables
//!
//! - `GANTRY__SERVER__PORT`: Port the HTTP listener binds to
//!   Default: 8080
//!
//! - `GANTRY__BUS__URL`: Base URL of the message-bus bridge
//!   Default: "http://localhost:4222"
//!
//! - `GANTRY__BUS__TIMEOUT_SECONDS`: Request/reply timeout for bus calls
//!   Default: 5
//!
//! - `GANTRY__AUTH__SECRET`: HMAC secret used to sign and verify session tokens
//!   Default: "change-me" (override in any real deployment)
//!
//! - `GANTRY__AUTH__TOKEN_TTL_HOURS`: Session token lifetime in hours
//!   Default: 72
//!
//! - `GANTRY__LOG__LEVEL`: Log level for the application
//!   Default: "info"
//!   Possible values: "trace", "debug", "info", "warn", "error"
//!
//! - `GANTRY__LOG__FORMAT`: Log output format, "text" or "json"
//!   Default: "text"

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

// Include the default settings file as a string constant
const DEFAULT_SETTINGS: &str = include_str!("../default.toml");

/// Represents the main settings structure for the application
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// HTTP server configuration
    pub server: Server,
    /// Message-bus bridge configuration
    pub bus: Bus,
    /// Session token configuration
    pub auth: Auth,
    /// Logging configuration
    pub log: Log,
    /// CORS configuration
    pub cors: Cors,
}

/// Represents the HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    /// Port the listener binds to
    pub port: u16,
}

/// Represents the message-bus bridge configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Bus {
    /// Base URL requests are posted to, one subject per path segment
    pub url: String,
    /// Bounded request/reply timeout in seconds
    pub timeout_seconds: u64,
}

/// Represents the session token configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Auth {
    /// HMAC secret for signing and verifying tokens
    pub secret: String,
    /// Token lifetime in hours
    pub token_ttl_hours: i64,
}

/// Represents the logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Log {
    /// Log level (e.g., "info", "debug", "warn", "error")
    pub level: String,
    /// Log format: "text" for human-readable, "json" for structured JSON
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Represents the CORS configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Cors {
    /// Allowed origins for CORS requests
    /// Use "*" to allow all origins (not recommended for production)
    pub allowed_origins: Vec<String>,
    /// Allowed HTTP methods
    pub allowed_methods: Vec<String>,
    /// Allowed HTTP headers
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache in seconds
    pub max_age_seconds: u64,
}

impl Settings {
    /// Creates a new `Settings` instance
    ///
    /// # Arguments
    ///
    /// * `file` - An optional path to a configuration file
    ///
    /// # Returns
    ///
    /// Returns a `Result` containing the `Settings` instance or a `ConfigError`
    pub fn new(file: Option<String>) -> Result<Self, ConfigError> {
        // Start with default settings from the embedded TOML file
        let mut s = Config::builder()
            .add_source(File::from_str(DEFAULT_SETTINGS, config::FileFormat::Toml));

        // If a configuration file is provided, add it as a source
        s = match file {
            Some(x) => s.add_source(File::with_name(x.as_str())),
            None => s,
        };

        // Add environment variables as a source, prefixed with "GANTRY" and using "__"
        // as a separator
        s = s.add_source(Environment::with_prefix("GANTRY").separator("__"));

        // Build the configuration
        let settings = s.build()?;

        // Deserialize the configuration into a Settings instance
        settings.try_deserialize()
    }
}
