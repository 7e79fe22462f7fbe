//! Store facade for the backend data services.
//!
//! Each resource collection lives behind a remote data service reached over
//! the bus with `{collection}.find|get|set|del` subjects. The [`Store`]
//! struct owns the bus handle and hands out per-collection facades, so
//! handlers write `store.roles().get(...)` and never touch subjects or
//! payload envelopes directly.
//!
//! Data services report failures inside the reply body as an
//! `{"_error": ..., "_code": ...}` envelope; replies that parse as that
//! envelope are converted into [`StoreError`] values here.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::bus::{Bus, BusError};
use crate::metrics;

mod builds;
mod environments;
mod loggers;
mod mappings;
mod notifications;
mod policies;
mod projects;
mod roles;
mod users;

pub use builds::BuildsStore;
pub use environments::EnvironmentsStore;
pub use loggers::LoggersStore;
pub use mappings::MappingsStore;
pub use notifications::NotificationsStore;
pub use policies::PoliciesStore;
pub use projects::ProjectsStore;
pub use roles::RolesStore;
pub use users::UsersStore;

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The data service reported that no record matched.
    #[error("not found")]
    NotFound,
    /// The data service reported a failure other than not-found.
    #[error("store backend error: {0}")]
    Backend(String),
    /// The bus request itself failed.
    #[error(transparent)]
    Bus(#[from] BusError),
    /// The reply could not be decoded into the expected shape.
    #[error("could not decode store reply: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Error envelope data services embed in reply bodies.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(rename = "_error")]
    error: String,
    #[serde(default, rename = "_code")]
    code: Option<String>,
}

impl ErrorEnvelope {
    /// Attempts to read `reply` as an error envelope. Only objects carrying
    /// a non-empty `_error` count; everything else is a normal reply.
    fn detect(reply: &[u8]) -> Option<ErrorEnvelope> {
        let envelope: ErrorEnvelope = serde_json::from_slice(reply).ok()?;
        if envelope.error.is_empty() {
            return None;
        }
        Some(envelope)
    }

    fn into_store_error(self) -> StoreError {
        let not_found = self
            .code
            .as_deref()
            .map(|c| c == "not_found")
            .unwrap_or(false)
            || self.error.to_lowercase().contains("not found");

        if not_found {
            StoreError::NotFound
        } else {
            StoreError::Backend(self.error)
        }
    }
}

/// Facade over every backend data service, parameterized by the bus handle
/// opened at process start.
#[derive(Clone)]
pub struct Store {
    bus: Arc<dyn Bus>,
}

impl Store {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Store { bus }
    }

    pub fn users(&self) -> UsersStore {
        UsersStore { store: self }
    }

    pub fn roles(&self) -> RolesStore {
        RolesStore { store: self }
    }

    pub fn projects(&self) -> ProjectsStore {
        ProjectsStore { store: self }
    }

    pub fn environments(&self) -> EnvironmentsStore {
        EnvironmentsStore { store: self }
    }

    pub fn builds(&self) -> BuildsStore {
        BuildsStore { store: self }
    }

    pub fn policies(&self) -> PoliciesStore {
        PoliciesStore { store: self }
    }

    pub fn loggers(&self) -> LoggersStore {
        LoggersStore { store: self }
    }

    pub fn notifications(&self) -> NotificationsStore {
        NotificationsStore { store: self }
    }

    pub fn mappings(&self) -> MappingsStore {
        MappingsStore { store: self }
    }

    /// Issues a raw request and converts embedded error envelopes.
    pub(crate) async fn request(
        &self,
        subject: &str,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, StoreError> {
        let timer = metrics::BUS_REQUEST_DURATION_SECONDS
            .with_label_values(&[subject])
            .start_timer();
        let result = self.bus.request(subject, payload).await;
        timer.observe_duration();

        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::BUS_REQUESTS_TOTAL
            .with_label_values(&[subject, outcome])
            .inc();

        let reply = result?;

        if let Some(envelope) = ErrorEnvelope::detect(&reply) {
            return Err(envelope.into_store_error());
        }

        Ok(reply)
    }

    /// Searches `collection` for every record matching `filter`.
    pub(crate) async fn find_by<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: Map<String, Value>,
    ) -> Result<Vec<T>, StoreError> {
        let subject = format!("{}.find", collection);
        let payload = serde_json::to_vec(&Value::Object(filter))?;
        let reply = self.request(&subject, payload).await?;
        Ok(serde_json::from_slice(&reply)?)
    }

    /// Fetches the single record of `collection` matching `filter`.
    pub(crate) async fn get_by<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: Map<String, Value>,
    ) -> Result<T, StoreError> {
        let subject = format!("{}.get", collection);
        let payload = serde_json::to_vec(&Value::Object(filter))?;
        let reply = self.request(&subject, payload).await?;
        Ok(serde_json::from_slice(&reply)?)
    }

    /// Persists `entity` in `collection`, returning the stored record with
    /// any service-assigned fields filled in.
    pub(crate) async fn save<T: Serialize + DeserializeOwned>(
        &self,
        collection: &str,
        entity: &T,
    ) -> Result<T, StoreError> {
        let subject = format!("{}.set", collection);
        let payload = serde_json::to_vec(entity)?;
        let reply = self.request(&subject, payload).await?;
        Ok(serde_json::from_slice(&reply)?)
    }

    /// Deletes every record of `collection` matching `filter`.
    pub(crate) async fn delete(
        &self,
        collection: &str,
        filter: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let subject = format!("{}.del", collection);
        let payload = serde_json::to_vec(&Value::Object(filter))?;
        self.request(&subject, payload).await?;
        Ok(())
    }
}

/// Builds a one-entry filter mapping.
pub(crate) fn filter_on(key: &str, value: impl Into<Value>) -> Map<String, Value> {
    let mut filter = Map::new();
    filter.insert(key.to_string(), value.into());
    filter
}
