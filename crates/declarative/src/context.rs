//! Endpoint and lookup provider traits
//!
//! These traits are the engine's only view of the remote server, so the
//! crate can be driven without depending on a specific API client.

use crate::lookup::LookupTable;
use anyhow::Result;
use serde_json::Value;

/// CRUD access to one remote collection
pub trait Endpoint {
    /// List every remote object.
    fn list(&self) -> Result<Vec<Value>>;

    /// List the schema templates of every implementation.
    fn schemas(&self) -> Result<Vec<Value>>;

    /// Create an object, returning the created object.
    fn create(&self, payload: &Value) -> Result<Value>;

    /// Replace an object, returning the updated object.
    fn update(&self, id: i64, payload: &Value) -> Result<Value>;

    fn delete(&self, id: i64) -> Result<()>;
}

/// Provider of name/id lookup tables
pub trait LookupSource {
    /// Fetch the named table.
    fn table(&self, name: &str) -> Result<LookupTable>;
}

/// Lookup source with no tables, for kinds that reference nothing
pub struct NoLookups;

impl LookupSource for NoLookups {
    fn table(&self, name: &str) -> Result<LookupTable> {
        anyhow::bail!("no lookup table named '{name}'")
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory endpoint used by the engine tests.

    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Debug, Clone, PartialEq)]
    pub enum Request {
        Create(Value),
        Update(i64, Value),
        Delete(i64),
    }

    #[derive(Default)]
    pub struct MemoryEndpoint {
        pub objects: RefCell<Vec<Value>>,
        pub schemas: Vec<Value>,
        pub requests: RefCell<Vec<Request>>,
        pub schema_calls: Cell<usize>,
        next_id: Cell<i64>,
    }

    impl MemoryEndpoint {
        pub fn new(objects: Vec<Value>, schemas: Vec<Value>) -> Self {
            let next_id = objects
                .iter()
                .filter_map(|o| o["id"].as_i64())
                .max()
                .unwrap_or(0);
            Self {
                objects: RefCell::new(objects),
                schemas,
                next_id: Cell::new(next_id),
                ..Self::default()
            }
        }
    }

    impl Endpoint for MemoryEndpoint {
        fn list(&self) -> Result<Vec<Value>> {
            Ok(self.objects.borrow().clone())
        }

        fn schemas(&self) -> Result<Vec<Value>> {
            self.schema_calls.set(self.schema_calls.get() + 1);
            Ok(self.schemas.clone())
        }

        fn create(&self, payload: &Value) -> Result<Value> {
            self.requests.borrow_mut().push(Request::Create(payload.clone()));
            self.next_id.set(self.next_id.get() + 1);
            let mut created = payload.clone();
            created["id"] = Value::from(self.next_id.get());
            self.objects.borrow_mut().push(created.clone());
            Ok(created)
        }

        fn update(&self, id: i64, payload: &Value) -> Result<Value> {
            self.requests.borrow_mut().push(Request::Update(id, payload.clone()));
            let mut objects = self.objects.borrow_mut();
            let slot = objects
                .iter_mut()
                .find(|o| o["id"].as_i64() == Some(id))
                .ok_or_else(|| anyhow::anyhow!("no object with id {id}"))?;
            *slot = payload.clone();
            Ok(payload.clone())
        }

        fn delete(&self, id: i64) -> Result<()> {
            self.requests.borrow_mut().push(Request::Delete(id));
            self.objects.borrow_mut().retain(|o| o["id"].as_i64() != Some(id));
            Ok(())
        }
    }

    pub struct StaticLookups {
        pub tables: Vec<LookupTable>,
        pub fetched: RefCell<Vec<String>>,
    }

    impl StaticLookups {
        pub fn new(tables: Vec<LookupTable>) -> Self {
            Self {
                tables,
                fetched: RefCell::new(Vec::new()),
            }
        }
    }

    impl LookupSource for StaticLookups {
        fn table(&self, name: &str) -> Result<LookupTable> {
            self.fetched.borrow_mut().push(name.to_string());
            self.tables
                .iter()
                .find(|t| t.name() == name)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no lookup table named '{name}'"))
        }
    }

    #[test]
    fn test_no_lookups() {
        assert!(NoLookups.table("tags").is_err());
    }
}
