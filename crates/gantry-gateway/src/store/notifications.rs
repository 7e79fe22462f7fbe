//! Store facade for notification channels, held by the notification data
//! service.

use serde_json::Map;

use super::{filter_on, Store, StoreError};
use gantry_models::models::notifications::Notification;

const COLLECTION: &str = "notification";

/// Per-collection facade for notification channels.
pub struct NotificationsStore<'a> {
    pub(crate) store: &'a Store,
}

impl<'a> NotificationsStore<'a> {
    /// Retrieves every notification channel.
    pub async fn find_all(&self) -> Result<Vec<Notification>, StoreError> {
        self.store.find_by(COLLECTION, Map::new()).await
    }

    /// Retrieves a channel by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Notification, StoreError> {
        self.store.get_by(COLLECTION, filter_on("name", name)).await
    }

    /// Retrieves a channel by identifier.
    pub async fn get_by_id(&self, id: i64) -> Result<Notification, StoreError> {
        self.store.get_by(COLLECTION, filter_on("id", id)).await
    }

    /// Persists a channel, returning the stored record.
    pub async fn save(&self, notification: &Notification) -> Result<Notification, StoreError> {
        self.store.save(COLLECTION, notification).await
    }

    /// Deletes a channel by identifier.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.store.delete(COLLECTION, filter_on("id", id)).await
    }
}
