//! Facade for the mapping service, which turns definitions into component
//! graphs. The gateway never builds graphs itself; it submits the relevant
//! request and stores or renders whatever mapping comes back.

use serde_json::{json, Value};

use super::{Store, StoreError};
use crate::authz::Principal;

/// Facade for mapping-service operations.
pub struct MappingsStore<'a> {
    pub(crate) store: &'a Store,
}

impl<'a> MappingsStore<'a> {
    /// Maps a definition onto the environment's current state, returning the
    /// resulting component graph for submission as a build.
    pub async fn apply(
        &self,
        name: &str,
        definition: &str,
        principal: &Principal,
    ) -> Result<Value, StoreError> {
        let payload = json!({
            "name": name,
            "definition": definition,
        });

        let mut mapping = self.request("mapping.apply", payload).await?;
        attach_submitter(&mut mapping, principal);
        Ok(mapping)
    }

    /// Produces the deletion graph for an environment.
    pub async fn delete(&self, name: &str, principal: &Principal) -> Result<Value, StoreError> {
        let payload = json!({ "name": name });

        let mut mapping = self.request("mapping.delete", payload).await?;
        attach_submitter(&mut mapping, principal);
        Ok(mapping)
    }

    /// Diffs two builds of an environment, returning a graph whose change
    /// records describe the transition.
    pub async fn diff(&self, name: &str, from: &str, to: &str) -> Result<Value, StoreError> {
        let payload = json!({
            "name": name,
            "from": from,
            "to": to,
        });

        self.request("mapping.diff", payload).await
    }

    async fn request(&self, subject: &str, payload: Value) -> Result<Value, StoreError> {
        let reply = self
            .store
            .request(subject, serde_json::to_vec(&payload)?)
            .await?;
        Ok(serde_json::from_slice(&reply)?)
    }
}

/// Stamps the submitting principal onto a mapping, the way the build
/// services expect to find it.
fn attach_submitter(mapping: &mut Value, principal: &Principal) {
    if let Some(obj) = mapping.as_object_mut() {
        obj.insert("user_id".to_string(), json!(principal.id));
        obj.insert("username".to_string(), json!(principal.username));
    }
}
