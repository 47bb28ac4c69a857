//! Tags (`/api/v1/tag`)
//!
//! Tags are plain labels rather than typed resources, so they bypass the
//! reconcile engine. Missing tags are created before any other section is
//! reconciled, and unused tags are only removed after every other section has
//! dropped its references.

use crate::types::{Validation, ValidationError, ensure_not_empty};
use anyhow::{Context, Result};
use prowlarr_api::{Backend, Resource, Tag};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagsSettings {
    /// Delete remote tags that are neither declared nor referenced.
    #[serde(default)]
    pub delete_unmanaged: bool,

    #[serde(default)]
    pub definitions: Vec<String>,
}

impl TagsSettings {
    pub fn validate(&self, tree: &str) -> Validation {
        let mut seen = BTreeSet::new();
        for (i, label) in self.definitions.iter().enumerate() {
            let label_tree = format!("{tree}.definitions[{i}]");
            ensure_not_empty(label, &label_tree)?;
            if !seen.insert(label.as_str()) {
                return Err(ValidationError::new(
                    label_tree,
                    format!("duplicate tag '{label}'"),
                ));
            }
        }
        Ok(())
    }

    /// Every tag on the server, as settings.
    pub fn from_remote(backend: &dyn Backend) -> Result<Self> {
        let tags = backend.tags().context("failed to list tags")?;
        Ok(Self {
            delete_unmanaged: false,
            definitions: tags.into_iter().map(|tag| tag.label).collect(),
        })
    }

    /// Create declared tags missing on the server.
    ///
    /// Returns the labels created, or those that would be on a dry run.
    pub fn create_missing(
        &self,
        tree: &str,
        backend: &dyn Backend,
        dry_run: bool,
    ) -> Result<Vec<String>> {
        if self.definitions.is_empty() {
            return Ok(Vec::new());
        }
        let existing: BTreeSet<String> = backend
            .tags()
            .context("failed to list tags")?
            .into_iter()
            .map(|tag| tag.label)
            .collect();
        let mut created = Vec::new();
        for label in &self.definitions {
            if existing.contains(label) {
                log::debug!("{tree}.definitions['{label}']: (exists)");
                continue;
            }
            log::info!("{tree}.definitions['{label}']: (created)");
            if !dry_run {
                backend
                    .create_tag(label)
                    .with_context(|| format!("{tree}.definitions['{label}']: failed to create"))?;
            }
            created.push(label.clone());
        }
        Ok(created)
    }

    /// Delete remote tags that are not declared and not referenced by any resource.
    ///
    /// Does nothing unless `delete_unmanaged` is set. Returns the tags
    /// deleted, or those that would be on a dry run.
    pub fn delete_unused(
        &self,
        tree: &str,
        backend: &dyn Backend,
        dry_run: bool,
    ) -> Result<Vec<Tag>> {
        if !self.delete_unmanaged {
            return Ok(Vec::new());
        }
        let declared: BTreeSet<&str> = self.definitions.iter().map(String::as_str).collect();
        let used = used_tag_ids(backend)?;
        let mut deleted = Vec::new();
        for tag in backend.tags().context("failed to list tags")? {
            if declared.contains(tag.label.as_str()) {
                continue;
            }
            if used.contains(&tag.id) {
                log::debug!("{tree}.definitions['{}']: (in use)", tag.label);
                continue;
            }
            log::info!("{tree}.definitions['{}']: (deleted)", tag.label);
            if !dry_run {
                backend
                    .delete_tag(tag.id)
                    .with_context(|| format!("{tree}.definitions['{}']: failed to delete", tag.label))?;
            }
            deleted.push(tag);
        }
        Ok(deleted)
    }
}

/// Ids of every tag referenced by a resource of any kind.
fn used_tag_ids(backend: &dyn Backend) -> Result<BTreeSet<i64>> {
    let mut used = BTreeSet::new();
    for resource in Resource::ALL {
        let objects = backend
            .list(resource)
            .with_context(|| format!("failed to list {resource}"))?;
        for object in objects {
            if let Some(tags) = object.get("tags").and_then(Value::as_array) {
                used.extend(tags.iter().filter_map(Value::as_i64));
            }
        }
    }
    Ok(used)
}
