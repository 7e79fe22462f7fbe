//! Model definitions shared across the gateway.
//!
//! Each resource the gateway fronts has a module here with its struct,
//! validation rules, and any store-facing helpers. The `graph` module holds
//! the read-only component-graph wrapper consumed by the build renderer.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub mod builds;
pub mod environments;
pub mod graph;
pub mod loggers;
pub mod notifications;
pub mod policies;
pub mod projects;
pub mod roles;
pub mod users;

/// Error raised when a model fails input validation. Handlers map it to a
/// 400 with the message as the body.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        ValidationError(msg.into())
    }
}

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-zA-Z0-9@._/-]+$").expect("identifier pattern"));

/// Checks whether an identifier is restricted to the accepted charset.
/// Resource names, environment full names (`project/env`) and usernames all
/// pass through this before being used in a store filter.
pub fn is_alphanumeric(s: &str) -> bool {
    IDENTIFIER.is_match(s)
}
