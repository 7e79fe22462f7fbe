//! Store facade for role grants, held by the authorization data service.

use serde_json::{json, Map};

use super::{filter_on, Store, StoreError};
use gantry_models::models::roles::Role;

/// Collection name the authorization service listens on.
const COLLECTION: &str = "authorization";

/// Per-collection facade for role grants.
pub struct RolesStore<'a> {
    pub(crate) store: &'a Store,
}

impl<'a> RolesStore<'a> {
    /// Retrieves every grant on the system.
    pub async fn find_all(&self) -> Result<Vec<Role>, StoreError> {
        self.store.find_by(COLLECTION, Map::new()).await
    }

    /// Retrieves every grant held by `user_id`.
    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Role>, StoreError> {
        self.store
            .find_by(COLLECTION, filter_on("user_id", user_id))
            .await
    }

    /// Retrieves every grant held by `user_id` over resources of
    /// `resource_type`.
    pub async fn find_by_user_and_type(
        &self,
        user_id: &str,
        resource_type: &str,
    ) -> Result<Vec<Role>, StoreError> {
        let mut filter = Map::new();
        filter.insert("user_id".to_string(), json!(user_id));
        filter.insert("resource_type".to_string(), json!(resource_type));
        self.store.find_by(COLLECTION, filter).await
    }

    /// Retrieves the ids of every resource of `resource_type` granted to
    /// `user_id`.
    pub async fn resource_ids_for(
        &self,
        user_id: &str,
        resource_type: &str,
    ) -> Result<Vec<String>, StoreError> {
        let roles = self.find_by_user_and_type(user_id, resource_type).await?;
        Ok(roles.into_iter().map(|r| r.resource_id).collect())
    }

    /// Retrieves every grant on one resource.
    pub async fn find_by_resource(
        &self,
        resource_id: &str,
        resource_type: &str,
    ) -> Result<Vec<Role>, StoreError> {
        let mut filter = Map::new();
        filter.insert("resource_id".to_string(), json!(resource_id));
        filter.insert("resource_type".to_string(), json!(resource_type));
        self.store.find_by(COLLECTION, filter).await
    }

    /// Resolves the current grant for a (user, resource, type) composite
    /// key, if one exists.
    pub async fn get(
        &self,
        user_id: &str,
        resource_id: &str,
        resource_type: &str,
    ) -> Result<Option<Role>, StoreError> {
        let mut filter = Map::new();
        filter.insert("user_id".to_string(), json!(user_id));
        filter.insert("resource_id".to_string(), json!(resource_id));
        filter.insert("resource_type".to_string(), json!(resource_type));

        let mut roles: Vec<Role> = self.store.find_by(COLLECTION, filter).await?;
        if roles.is_empty() {
            return Ok(None);
        }
        Ok(Some(roles.remove(0)))
    }

    /// Retrieves a grant by its identifier.
    pub async fn get_by_id(&self, id: i64) -> Result<Role, StoreError> {
        self.store.get_by(COLLECTION, filter_on("id", id)).await
    }

    /// Persists a grant, returning the stored record.
    pub async fn save(&self, role: &Role) -> Result<Role, StoreError> {
        self.store.save(COLLECTION, role).await
    }

    /// Deletes a grant by its identifier and composite key.
    pub async fn delete(&self, role: &Role) -> Result<(), StoreError> {
        let mut filter = role.composite_filter();
        filter.insert("id".to_string(), json!(role.id));
        filter.insert("role".to_string(), json!(role.role));
        self.store.delete(COLLECTION, filter).await
    }
}
