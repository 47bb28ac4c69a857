//! Adapters from the Prowlarr client to the reconcile engine

use anyhow::{Result, bail};
use declarative::{Endpoint, LookupSource, LookupTable};
use prowlarr_api::{Backend, Resource};
use serde_json::Value;

pub const TAGS: &str = "tags";
pub const CATEGORIES: &str = "categories";

/// One REST collection seen through [`Endpoint`].
pub struct ApiEndpoint<'a> {
    backend: &'a dyn Backend,
    resource: Resource,
}

impl<'a> ApiEndpoint<'a> {
    pub fn new(backend: &'a dyn Backend, resource: Resource) -> Self {
        Self { backend, resource }
    }
}

impl Endpoint for ApiEndpoint<'_> {
    fn list(&self) -> Result<Vec<Value>> {
        Ok(self.backend.list(self.resource)?)
    }

    fn schemas(&self) -> Result<Vec<Value>> {
        Ok(self.backend.schema(self.resource)?)
    }

    fn create(&self, payload: &Value) -> Result<Value> {
        Ok(self.backend.create(self.resource, payload)?)
    }

    fn update(&self, id: i64, payload: &Value) -> Result<Value> {
        Ok(self.backend.update(self.resource, id, payload)?)
    }

    fn delete(&self, id: i64) -> Result<()> {
        Ok(self.backend.delete(self.resource, id)?)
    }
}

/// Tag and category tables fetched from the server.
///
/// Tags that a dry run would have created are given negative placeholder ids,
/// so definitions referencing them can still be planned.
pub struct ApiLookups<'a> {
    backend: &'a dyn Backend,
    pending_tags: Vec<String>,
}

impl<'a> ApiLookups<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self {
            backend,
            pending_tags: Vec::new(),
        }
    }

    /// Treat these labels as existing tags.
    pub fn with_pending_tags(mut self, labels: Vec<String>) -> Self {
        self.pending_tags = labels;
        self
    }

    fn tags(&self) -> Result<LookupTable> {
        let mut table = LookupTable::from_pairs(
            TAGS,
            self.backend.tags()?.into_iter().map(|tag| (tag.label, tag.id)),
        );
        let mut placeholder = 0;
        for label in &self.pending_tags {
            if table.id(label).is_none() {
                placeholder -= 1;
                table.insert(label.clone(), placeholder);
            }
        }
        Ok(table)
    }

    fn categories(&self) -> Result<LookupTable> {
        let mut table = LookupTable::new(CATEGORIES).case_insensitive();
        for group in self.backend.categories()? {
            table.insert(group.name.to_lowercase(), group.id);
            for category in group.sub_categories {
                table.insert(category.name.to_lowercase(), category.id);
            }
        }
        Ok(table)
    }
}

impl LookupSource for ApiLookups<'_> {
    fn table(&self, name: &str) -> Result<LookupTable> {
        match name {
            TAGS => self.tags(),
            CATEGORIES => self.categories(),
            other => bail!("no lookup table named '{other}'"),
        }
    }
}
