//! Store facade for logger targets, held by the logger data service.

use serde_json::Map;

use super::{filter_on, Store, StoreError};
use gantry_models::models::loggers::Logger;

const COLLECTION: &str = "logger";

/// Per-collection facade for logger targets.
pub struct LoggersStore<'a> {
    pub(crate) store: &'a Store,
}

impl<'a> LoggersStore<'a> {
    /// Retrieves every logger target.
    pub async fn find_all(&self) -> Result<Vec<Logger>, StoreError> {
        self.store.find_by(COLLECTION, Map::new()).await
    }

    /// Persists a logger target, returning the stored record.
    pub async fn save(&self, logger: &Logger) -> Result<Logger, StoreError> {
        self.store.save(COLLECTION, logger).await
    }

    /// Deletes a logger target by type.
    pub async fn delete(&self, logger_type: &str) -> Result<(), StoreError> {
        self.store
            .delete(COLLECTION, filter_on("type", logger_type))
            .await
    }
}
