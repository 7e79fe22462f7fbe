//! Test fixture for the gateway integration tests.
//!
//! The backend data services live on the far side of the bus, so the
//! fixture replaces the bus with an in-memory double: collections held in a
//! mutex, the `{collection}.find|get|set|del` subjects interpreted against
//! them, and canned replies for the mapping-service subjects. Handlers,
//! store facade, authorization engine and renderer all run unmodified on
//! top of it.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use gantry_gateway::api::v1::middleware::issue_token;
use gantry_gateway::api::{configure_api_routes, AppState, TokenConfig};
use gantry_gateway::bus::{Bus, BusError};
use gantry_gateway::store::Store;
use gantry_models::models::users::User;

/// In-memory stand-in for the backend data services.
pub struct MemoryBus {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    next_id: AtomicI64,
    next_build: AtomicI64,
    /// Subjects that fail with a transport error
    broken_subjects: Mutex<HashSet<String>>,
    /// Subjects that fail with a timeout
    slow_subjects: Mutex<HashSet<String>>,
    /// Reply for mapping.diff requests
    diff_reply: Mutex<Value>,
}

impl MemoryBus {
    pub fn new() -> Self {
        MemoryBus {
            collections: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            next_build: AtomicI64::new(1),
            broken_subjects: Mutex::new(HashSet::new()),
            slow_subjects: Mutex::new(HashSet::new()),
            diff_reply: Mutex::new(json!({"changes": []})),
        }
    }

    /// Makes a subject fail with a transport error.
    pub fn break_subject(&self, subject: &str) {
        self.broken_subjects
            .lock()
            .unwrap()
            .insert(subject.to_string());
    }

    /// Makes a subject fail with a timeout.
    pub fn delay_subject(&self, subject: &str) {
        self.slow_subjects
            .lock()
            .unwrap()
            .insert(subject.to_string());
    }

    /// Sets the reply served for mapping.diff requests.
    pub fn set_diff_reply(&self, reply: Value) {
        *self.diff_reply.lock().unwrap() = reply;
    }

    /// Inserts a record directly, assigning an id when none is set.
    pub fn insert(&self, collection: &str, mut record: Value) -> Value {
        if record.get("id").and_then(Value::as_i64).unwrap_or(0) == 0
            && record.get("id").and_then(Value::as_str).is_none()
        {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            record["id"] = json!(id);
        }
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        record
    }

    /// Snapshot of a collection's records.
    pub fn records(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn matches(record: &Value, filter: &Map<String, Value>) -> bool {
        filter.iter().all(|(key, value)| record.get(key) == Some(value))
    }

    fn handle(&self, subject: &str, payload: Vec<u8>) -> Vec<u8> {
        let body: Value = serde_json::from_slice(&payload).unwrap_or(Value::Null);

        // Mapping service and environment action subjects
        match subject {
            "mapping.apply" | "mapping.delete" => {
                let id = format!("build-{}", self.next_build.fetch_add(1, Ordering::SeqCst));
                return json!({"id": id, "components": [], "changes": []})
                    .to_string()
                    .into_bytes();
            }
            "mapping.diff" => {
                return self.diff_reply.lock().unwrap().to_string().into_bytes();
            }
            "environment.sync" | "environment.resolve" | "build.approval" => {
                return json!({"id": "action-1"}).to_string().into_bytes();
            }
            "build.get.mapping" => {
                let id = body.get("id").and_then(Value::as_str).unwrap_or("");
                let builds = self.records("build");
                let mapping = builds
                    .iter()
                    .find(|b| b.get("id").and_then(Value::as_str) == Some(id))
                    .and_then(|b| b.get("mapping"))
                    .cloned();
                return match mapping {
                    Some(mapping) => mapping.to_string().into_bytes(),
                    None => not_found(),
                };
            }
            _ => {}
        }

        let Some((collection, verb)) = subject.rsplit_once('.') else {
            return not_found();
        };
        let filter = body.as_object().cloned().unwrap_or_default();

        match verb {
            "find" => {
                let records: Vec<Value> = self
                    .records(collection)
                    .into_iter()
                    .filter(|r| Self::matches(r, &filter))
                    .collect();
                serde_json::to_vec(&records).unwrap()
            }
            "get" => {
                let record = self
                    .records(collection)
                    .into_iter()
                    .find(|r| Self::matches(r, &filter));
                match record {
                    Some(record) => record.to_string().into_bytes(),
                    None => not_found(),
                }
            }
            "set" => {
                let mut record = body;
                let mut collections = self.collections.lock().unwrap();
                let records = collections.entry(collection.to_string()).or_default();

                let existing = match record.get("id") {
                    Some(Value::Number(n)) if n.as_i64().unwrap_or(0) != 0 => records
                        .iter()
                        .position(|r| r.get("id") == record.get("id")),
                    Some(Value::String(s)) if !s.is_empty() => records
                        .iter()
                        .position(|r| r.get("id") == record.get("id")),
                    _ => None,
                };

                match existing {
                    Some(index) => {
                        records[index] = record.clone();
                    }
                    None => {
                        if record.get("id").and_then(Value::as_str).is_none() {
                            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                            record["id"] = json!(id);
                        }
                        records.push(record.clone());
                    }
                }

                record.to_string().into_bytes()
            }
            "del" => {
                let mut collections = self.collections.lock().unwrap();
                if let Some(records) = collections.get_mut(collection) {
                    records.retain(|r| !Self::matches(r, &filter));
                }
                json!({}).to_string().into_bytes()
            }
            _ => not_found(),
        }
    }
}

fn not_found() -> Vec<u8> {
    json!({"_error": "Not found", "_code": "not_found"})
        .to_string()
        .into_bytes()
}

#[async_trait]
impl Bus for MemoryBus {
    async fn request(&self, subject: &str, payload: Vec<u8>) -> Result<Vec<u8>, BusError> {
        if self.broken_subjects.lock().unwrap().contains(subject) {
            return Err(BusError::Transport("connection reset".to_string()));
        }
        if self.slow_subjects.lock().unwrap().contains(subject) {
            return Err(BusError::Timeout);
        }
        Ok(self.handle(subject, payload))
    }
}

/// Represents a test fixture for the gateway.
pub struct TestFixture {
    pub bus: Arc<MemoryBus>,
    pub store: Store,
    pub state: AppState,
}

impl TestFixture {
    /// Creates a new TestFixture instance backed by an in-memory bus.
    pub fn new() -> Self {
        let bus = Arc::new(MemoryBus::new());
        let store = Store::new(bus.clone());
        let state = AppState {
            store: store.clone(),
            tokens: TokenConfig {
                secret: "integration-secret".to_string(),
                ttl_hours: 1,
            },
        };

        TestFixture { bus, store, state }
    }

    /// Builds the full application router.
    pub fn router(&self) -> Router {
        configure_api_routes(self.state.clone())
    }

    /// Inserts a user and returns it. The password for every fixture user
    /// is "fixture-password".
    pub fn insert_user(&self, username: &str, admin: bool) -> User {
        let hash = gantry_gateway::api::v1::auth::hash_password("fixture-password")
            .expect("Failed to hash fixture password");

        let record = self.bus.insert(
            "user",
            json!({
                "id": 0,
                "group_id": 1,
                "username": username,
                "password_hash": hash,
                "admin": admin,
            }),
        );

        serde_json::from_value(record).expect("Failed to decode fixture user")
    }

    /// Inserts a project and returns its id.
    pub fn insert_project(&self, name: &str) -> i64 {
        let record = self.bus.insert(
            "project",
            json!({
                "id": 0,
                "name": name,
                "type": "aws",
            }),
        );
        record["id"].as_i64().unwrap()
    }

    /// Inserts an environment under a project and returns its id. `name`
    /// must be the full `project/env` name.
    pub fn insert_env(&self, project_id: i64, name: &str) -> i64 {
        let record = self.bus.insert(
            "environment",
            json!({
                "id": 0,
                "project_id": project_id,
                "name": name,
                "type": "aws",
                "status": "done",
            }),
        );
        record["id"].as_i64().unwrap()
    }

    /// Inserts a role grant.
    pub fn insert_role(&self, user_id: &str, resource_type: &str, resource_id: &str, role: &str) {
        self.bus.insert(
            "authorization",
            json!({
                "id": 0,
                "user_id": user_id,
                "resource_id": resource_id,
                "resource_type": resource_type,
                "role": role,
            }),
        );
    }

    /// Inserts a build with a stored mapping.
    pub fn insert_build(&self, environment_id: i64, id: &str, mapping: Value) {
        self.bus.insert(
            "build",
            json!({
                "id": id,
                "environment_id": environment_id,
                "type": "apply",
                "status": "done",
                "user_id": 1,
                "username": "fixture",
                "mapping": mapping,
            }),
        );
    }

    /// Issues a session token for a user.
    pub fn token_for(&self, user: &User) -> String {
        issue_token(&self.state.tokens, user).expect("Failed to issue fixture token")
    }
}

/// Sends a request through the router and returns the response.
pub async fn send(
    router: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    router.oneshot(request).await.unwrap()
}

/// Reads a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
