//! Backend trait and implementations for talking to Prowlarr.
//!
//! [`http::HttpBackend`] talks to a live server. [`MockBackend`] keeps
//! resources in memory and records every call, so reconcile logic can be
//! tested without network access:
//!
//! ```
//! use prowlarr_api::backend::{Backend, Call, MockBackend};
//! use prowlarr_api::Resource;
//! use serde_json::json;
//!
//! let mock = MockBackend::new();
//! mock.add_resource(Resource::AppProfile, json!({"name": "Standard", "minimumSeeders": 1}));
//!
//! let profiles = mock.list(Resource::AppProfile).unwrap();
//! assert_eq!(profiles[0]["id"], 1);
//! assert_eq!(mock.calls(), vec![Call::List(Resource::AppProfile)]);
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{CategoryGroup, Resource, SystemStatus, Tag};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Operations the reconciler needs from a Prowlarr server.
///
/// Every method is one logical operation. Implementations must not hold
/// state between calls beyond what the server itself stores.
pub trait Backend: Send + Sync {
    /// List every object in a collection.
    fn list(&self, resource: Resource) -> Result<Vec<Value>>;

    /// List the implementation templates of a collection.
    fn schema(&self, resource: Resource) -> Result<Vec<Value>>;

    /// Create an object, returning the stored object.
    fn create(&self, resource: Resource, payload: &Value) -> Result<Value>;

    /// Replace an object, returning the stored object.
    fn update(&self, resource: Resource, id: i64, payload: &Value) -> Result<Value>;

    /// Delete an object.
    fn delete(&self, resource: Resource, id: i64) -> Result<()>;

    /// List tags.
    fn tags(&self) -> Result<Vec<Tag>>;

    /// Create a tag.
    fn create_tag(&self, label: &str) -> Result<Tag>;

    /// Delete a tag.
    fn delete_tag(&self, id: i64) -> Result<()>;

    /// List indexer categories.
    fn categories(&self) -> Result<Vec<CategoryGroup>>;

    /// Fetch the server status.
    fn system_status(&self) -> Result<SystemStatus>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn list(&self, resource: Resource) -> Result<Vec<Value>> {
        (**self).list(resource)
    }

    fn schema(&self, resource: Resource) -> Result<Vec<Value>> {
        (**self).schema(resource)
    }

    fn create(&self, resource: Resource, payload: &Value) -> Result<Value> {
        (**self).create(resource, payload)
    }

    fn update(&self, resource: Resource, id: i64, payload: &Value) -> Result<Value> {
        (**self).update(resource, id, payload)
    }

    fn delete(&self, resource: Resource, id: i64) -> Result<()> {
        (**self).delete(resource, id)
    }

    fn tags(&self) -> Result<Vec<Tag>> {
        (**self).tags()
    }

    fn create_tag(&self, label: &str) -> Result<Tag> {
        (**self).create_tag(label)
    }

    fn delete_tag(&self, id: i64) -> Result<()> {
        (**self).delete_tag(id)
    }

    fn categories(&self) -> Result<Vec<CategoryGroup>> {
        (**self).categories()
    }

    fn system_status(&self) -> Result<SystemStatus> {
        (**self).system_status()
    }
}

/// A call recorded by [`MockBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(Resource),
    Schema(Resource),
    Create(Resource, Value),
    Update(Resource, i64, Value),
    Delete(Resource, i64),
    Tags,
    CreateTag(String),
    DeleteTag(i64),
    Categories,
    SystemStatus,
}

impl Call {
    /// Whether this call changes server state.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Create(..) | Self::Update(..) | Self::Delete(..) | Self::CreateTag(_) | Self::DeleteTag(_)
        )
    }
}

#[derive(Debug, Default)]
struct MockState {
    resources: BTreeMap<Resource, Vec<Value>>,
    schemas: BTreeMap<Resource, Vec<Value>>,
    tags: Vec<Tag>,
    categories: Vec<CategoryGroup>,
    calls: Vec<Call>,
    next_id: i64,
}

impl MockState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory backend for tests.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect [`MockBackend::calls`] on another.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store an object, assigning an id if it has none. Returns the id.
    pub fn add_resource(&self, resource: Resource, mut object: Value) -> i64 {
        let mut state = self.state();
        let id = match object.get("id").and_then(Value::as_i64) {
            Some(id) => {
                state.next_id = state.next_id.max(id);
                id
            }
            None => state.allocate_id(),
        };
        if let Some(map) = object.as_object_mut() {
            map.insert("id".to_string(), Value::from(id));
        }
        state.resources.entry(resource).or_default().push(object);
        id
    }

    /// Register an implementation template for a collection.
    pub fn add_schema(&self, resource: Resource, schema: Value) {
        self.state().schemas.entry(resource).or_default().push(schema);
    }

    /// Store a tag, returning its id.
    pub fn add_tag(&self, label: &str) -> i64 {
        let mut state = self.state();
        let id = state.allocate_id();
        state.tags.push(Tag {
            id,
            label: label.to_string(),
        });
        id
    }

    /// Register a category group.
    pub fn add_category_group(&self, group: CategoryGroup) {
        self.state().categories.push(group);
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Calls that changed server state.
    #[must_use]
    pub fn mutations(&self) -> Vec<Call> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    /// Forget recorded calls, keeping stored state.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Snapshot of the objects stored in a collection.
    #[must_use]
    pub fn resources(&self, resource: Resource) -> Vec<Value> {
        self.state()
            .resources
            .get(&resource)
            .cloned()
            .unwrap_or_default()
    }
}

impl Backend for MockBackend {
    fn list(&self, resource: Resource) -> Result<Vec<Value>> {
        let mut state = self.state();
        state.calls.push(Call::List(resource));
        Ok(state.resources.get(&resource).cloned().unwrap_or_default())
    }

    fn schema(&self, resource: Resource) -> Result<Vec<Value>> {
        let mut state = self.state();
        state.calls.push(Call::Schema(resource));
        if !resource.has_schema() {
            return Err(Error::http("HTTP 404", Some(404)));
        }
        Ok(state.schemas.get(&resource).cloned().unwrap_or_default())
    }

    fn create(&self, resource: Resource, payload: &Value) -> Result<Value> {
        let mut state = self.state();
        state.calls.push(Call::Create(resource, payload.clone()));
        let id = state.allocate_id();
        let mut stored = payload.clone();
        if let Some(map) = stored.as_object_mut() {
            map.insert("id".to_string(), Value::from(id));
        }
        state
            .resources
            .entry(resource)
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    fn update(&self, resource: Resource, id: i64, payload: &Value) -> Result<Value> {
        let mut state = self.state();
        state.calls.push(Call::Update(resource, id, payload.clone()));
        let slot = state
            .resources
            .get_mut(&resource)
            .and_then(|objects| {
                objects
                    .iter_mut()
                    .find(|o| o.get("id").and_then(Value::as_i64) == Some(id))
            })
            .ok_or_else(|| Error::NotFound {
                resource: resource.to_string(),
                id,
            })?;
        *slot = payload.clone();
        if let Some(map) = slot.as_object_mut() {
            map.insert("id".to_string(), Value::from(id));
        }
        Ok(slot.clone())
    }

    fn delete(&self, resource: Resource, id: i64) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::Delete(resource, id));
        let objects = state.resources.entry(resource).or_default();
        let before = objects.len();
        objects.retain(|o| o.get("id").and_then(Value::as_i64) != Some(id));
        if objects.len() == before {
            return Err(Error::NotFound {
                resource: resource.to_string(),
                id,
            });
        }
        Ok(())
    }

    fn tags(&self) -> Result<Vec<Tag>> {
        let mut state = self.state();
        state.calls.push(Call::Tags);
        Ok(state.tags.clone())
    }

    fn create_tag(&self, label: &str) -> Result<Tag> {
        let mut state = self.state();
        state.calls.push(Call::CreateTag(label.to_string()));
        let tag = Tag {
            id: state.allocate_id(),
            label: label.to_string(),
        };
        state.tags.push(tag.clone());
        Ok(tag)
    }

    fn delete_tag(&self, id: i64) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::DeleteTag(id));
        let before = state.tags.len();
        state.tags.retain(|t| t.id != id);
        if state.tags.len() == before {
            return Err(Error::NotFound {
                resource: "tag".to_string(),
                id,
            });
        }
        Ok(())
    }

    fn categories(&self) -> Result<Vec<CategoryGroup>> {
        let mut state = self.state();
        state.calls.push(Call::Categories);
        Ok(state.categories.clone())
    }

    fn system_status(&self) -> Result<SystemStatus> {
        self.state().calls.push(Call::SystemStatus);
        Ok(SystemStatus {
            app_name: "Prowlarr".to_string(),
            instance_name: "Prowlarr".to_string(),
            version: "1.0.0.0".to_string(),
        })
    }
}
