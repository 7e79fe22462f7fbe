//! Store facade for projects, held by the project data service.

use serde_json::Map;

use super::{filter_on, Store, StoreError};
use gantry_models::models::projects::Project;

const COLLECTION: &str = "project";

/// Per-collection facade for projects.
pub struct ProjectsStore<'a> {
    pub(crate) store: &'a Store,
}

impl<'a> ProjectsStore<'a> {
    /// Retrieves every project on the system.
    pub async fn find_all(&self) -> Result<Vec<Project>, StoreError> {
        self.store.find_by(COLLECTION, Map::new()).await
    }

    /// Retrieves a project by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Project, StoreError> {
        self.store.get_by(COLLECTION, filter_on("name", name)).await
    }

    /// Retrieves a project by identifier.
    pub async fn get_by_id(&self, id: i64) -> Result<Project, StoreError> {
        self.store.get_by(COLLECTION, filter_on("id", id)).await
    }

    /// Persists a project, returning the stored record.
    pub async fn save(&self, project: &Project) -> Result<Project, StoreError> {
        self.store.save(COLLECTION, project).await
    }

    /// Deletes a project by identifier.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.store.delete(COLLECTION, filter_on("id", id)).await
    }
}
