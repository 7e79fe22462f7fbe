//! Store facade for user accounts, held by the user data service.

use serde_json::Map;

use super::{filter_on, Store, StoreError};
use gantry_models::models::users::User;

const COLLECTION: &str = "user";

/// Per-collection facade for user accounts.
pub struct UsersStore<'a> {
    pub(crate) store: &'a Store,
}

impl<'a> UsersStore<'a> {
    /// Retrieves every user on the system.
    pub async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        self.store.find_by(COLLECTION, Map::new()).await
    }

    /// Retrieves a user by login name.
    pub async fn get_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.store
            .get_by(COLLECTION, filter_on("username", username))
            .await
    }

    /// Retrieves a user by identifier.
    pub async fn get_by_id(&self, id: i64) -> Result<User, StoreError> {
        self.store.get_by(COLLECTION, filter_on("id", id)).await
    }

    /// Whether a user with the given login name exists.
    pub async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        match self.get_by_username(username).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Persists a user, returning the stored record.
    pub async fn save(&self, user: &User) -> Result<User, StoreError> {
        self.store.save(COLLECTION, user).await
    }

    /// Deletes a user by identifier.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.store.delete(COLLECTION, filter_on("id", id)).await
    }
}
