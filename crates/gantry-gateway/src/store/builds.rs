//! Store facade for builds, held by the build data service. The mapping
//! stored with a build travels on its own subject; listings stay light.

use serde_json::Value;

use super::{filter_on, Store, StoreError};
use gantry_models::models::builds::Build;

const COLLECTION: &str = "build";

/// Per-collection facade for builds.
pub struct BuildsStore<'a> {
    pub(crate) store: &'a Store,
}

impl<'a> BuildsStore<'a> {
    /// Retrieves every build of an environment.
    pub async fn find_by_environment(&self, environment_id: i64) -> Result<Vec<Build>, StoreError> {
        self.store
            .find_by(COLLECTION, filter_on("environment_id", environment_id))
            .await
    }

    /// Retrieves a build by identifier.
    pub async fn get_by_id(&self, id: &str) -> Result<Build, StoreError> {
        self.store.get_by(COLLECTION, filter_on("id", id)).await
    }

    /// Retrieves the stored component mapping of a build.
    pub async fn mapping(&self, id: &str) -> Result<Value, StoreError> {
        let reply = self
            .store
            .request(
                "build.get.mapping",
                serde_json::to_vec(&Value::Object(filter_on("id", id)))?,
            )
            .await?;
        Ok(serde_json::from_slice(&reply)?)
    }

    /// Persists a build, returning the stored record.
    pub async fn save(&self, build: &Build) -> Result<Build, StoreError> {
        self.store.save(COLLECTION, build).await
    }

    /// Deletes a build by identifier.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(COLLECTION, filter_on("id", id)).await
    }
}
