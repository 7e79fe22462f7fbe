//! Store facade for environments, held by the environment data service.
//!
//! Besides the uniform find/get/save/delete operations, the environment
//! service owns the sync and resolution flows; those travel on their own
//! subjects with small ad-hoc payloads.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{filter_on, Store, StoreError};
use crate::authz::Principal;
use gantry_models::models::environments::Environment;

const COLLECTION: &str = "environment";

/// Per-collection facade for environments.
pub struct EnvironmentsStore<'a> {
    pub(crate) store: &'a Store,
}

impl<'a> EnvironmentsStore<'a> {
    /// Retrieves every environment matching `filter`.
    pub async fn find(&self, filter: Map<String, Value>) -> Result<Vec<Environment>, StoreError> {
        self.store.find_by(COLLECTION, filter).await
    }

    /// Retrieves every environment on the system.
    pub async fn find_all(&self) -> Result<Vec<Environment>, StoreError> {
        self.store.find_by(COLLECTION, Map::new()).await
    }

    /// Retrieves every environment belonging to a project.
    pub async fn find_by_project_id(&self, id: i64) -> Result<Vec<Environment>, StoreError> {
        self.store
            .find_by(COLLECTION, filter_on("project_id", id))
            .await
    }

    /// Retrieves an environment by its full name (`project/env`).
    pub async fn get_by_name(&self, name: &str) -> Result<Environment, StoreError> {
        self.store.get_by(COLLECTION, filter_on("name", name)).await
    }

    /// Persists an environment, returning the stored record.
    pub async fn save(&self, env: &Environment) -> Result<Environment, StoreError> {
        self.store.save(COLLECTION, env).await
    }

    /// Deletes an environment by its full name.
    pub async fn delete_by_name(&self, name: &str) -> Result<(), StoreError> {
        self.store.delete(COLLECTION, filter_on("name", name)).await
    }

    /// Requests a provider sync of the environment, returning the id of the
    /// sync build the service started.
    pub async fn sync(&self, name: &str, principal: &Principal) -> Result<String, StoreError> {
        let payload = json!({
            "name": name,
            "user_id": principal.id,
            "username": principal.username,
        });

        let reply = self
            .store
            .request("environment.sync", serde_json::to_vec(&payload)?)
            .await?;

        #[derive(Deserialize)]
        struct Reply {
            id: String,
        }

        let reply: Reply = serde_json::from_slice(&reply)?;
        Ok(reply.id)
    }

    /// Submits a resolution ("accept" or "reject") for an environment stuck
    /// in a sync conflict.
    pub async fn resolve(
        &self,
        name: &str,
        principal: &Principal,
        resolution: &str,
    ) -> Result<String, StoreError> {
        self.resolution("environment.resolve", name, principal, resolution)
            .await
    }

    /// Submits an approval resolution for a build awaiting confirmation.
    pub async fn approve(
        &self,
        name: &str,
        principal: &Principal,
        resolution: &str,
    ) -> Result<String, StoreError> {
        self.resolution("build.approval", name, principal, resolution)
            .await
    }

    async fn resolution(
        &self,
        subject: &str,
        name: &str,
        principal: &Principal,
        resolution: &str,
    ) -> Result<String, StoreError> {
        let payload = json!({
            "name": name,
            "user_id": principal.id,
            "username": principal.username,
            "resolution": resolution,
        });

        let reply = self
            .store
            .request(subject, serde_json::to_vec(&payload)?)
            .await?;

        #[derive(Deserialize)]
        struct Reply {
            #[serde(default)]
            id: String,
        }

        let reply: Reply = serde_json::from_slice(&reply)?;
        Ok(reply.id)
    }
}
