//! Store facade for validation policies, held by the policy data service.

use serde_json::Map;

use super::{filter_on, Store, StoreError};
use gantry_models::models::policies::Policy;

const COLLECTION: &str = "policy";

/// Per-collection facade for policies.
pub struct PoliciesStore<'a> {
    pub(crate) store: &'a Store,
}

impl<'a> PoliciesStore<'a> {
    /// Retrieves every policy on the system.
    pub async fn find_all(&self) -> Result<Vec<Policy>, StoreError> {
        self.store.find_by(COLLECTION, Map::new()).await
    }

    /// Retrieves a policy by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Policy, StoreError> {
        self.store.get_by(COLLECTION, filter_on("name", name)).await
    }

    /// Retrieves a policy by identifier.
    pub async fn get_by_id(&self, id: i64) -> Result<Policy, StoreError> {
        self.store.get_by(COLLECTION, filter_on("id", id)).await
    }

    /// Persists a policy, returning the stored record.
    pub async fn save(&self, policy: &Policy) -> Result<Policy, StoreError> {
        self.store.save(COLLECTION, policy).await
    }

    /// Deletes a policy by identifier.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.store.delete(COLLECTION, filter_on("id", id)).await
    }
}
