//! Reconciliation planner - turns local definitions and a snapshot into actions

use crate::collection::Collection;
use crate::diff::{FieldChange, diff, render};
use crate::mapping::{self, EXTRA_FIELDS, EXTRA_SECRET_FIELDS, ExtraFields};
use crate::remote_map::get_path;
use crate::resource::{RemoteType, ResourceKind};
use crate::snapshot::Snapshot;
use crate::types::{ExecuteSummary, ReconcileError};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// Schema template keys that must not be sent back on create.
const SCHEMA_ONLY_KEYS: [&str; 3] = ["id", "name", "added"];

/// One step of a reconciliation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    /// Create a new remote object
    Create { name: String, payload: Value },
    /// Replace an existing remote object
    Update {
        name: String,
        id: i64,
        changes: Vec<FieldChange>,
        payload: Value,
    },
    /// Delete a remote object with no local definition
    Delete { name: String, id: i64 },
    /// Leave a remote object with no local definition alone
    Unmanaged { name: String, id: i64 },
    /// Local and remote already agree
    Unchanged { name: String },
}

impl Action {
    pub fn name(&self) -> &str {
        match self {
            Self::Create { name, .. }
            | Self::Update { name, .. }
            | Self::Delete { name, .. }
            | Self::Unmanaged { name, .. }
            | Self::Unchanged { name } => name,
        }
    }

    /// Whether executing the action mutates remote state.
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            Self::Create { .. } | Self::Update { .. } | Self::Delete { .. }
        )
    }
}

/// Ordered actions for one resource kind
///
/// Local definitions come first in document order, then remote-only objects
/// in server order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub kind: &'static str,
    pub tree: String,
    pub actions: Vec<Action>,
}

impl Plan {
    /// Whether executing the plan would change remote state.
    pub fn has_changes(&self) -> bool {
        self.actions.iter().any(Action::is_change)
    }

    /// Outcome executing the plan would produce.
    pub fn summary(&self) -> ExecuteSummary {
        let mut summary = ExecuteSummary::default();
        for action in &self.actions {
            match action {
                Action::Create { .. } => summary.created += 1,
                Action::Update { .. } => summary.modified += 1,
                Action::Delete { .. } => summary.removed += 1,
                Action::Unmanaged { .. } => summary.unmanaged += 1,
                Action::Unchanged { .. } => summary.unchanged += 1,
            }
        }
        summary
    }

    /// Config path of a named definition.
    pub fn definition_tree(&self, name: &str) -> String {
        definition_tree(&self.tree, name)
    }
}

/// Config path of a named definition under a collection path.
pub fn definition_tree(tree: &str, name: &str) -> String {
    format!("{tree}.definitions['{name}']")
}

/// Plan the reconciliation of a collection against a snapshot.
///
/// Attribute changes, creations and deletions are logged as they are planned.
pub fn plan<K: ResourceKind>(
    kind: &K,
    tree: &str,
    collection: &Collection<K::Definition>,
    snapshot: &Snapshot<K::Definition>,
) -> Result<Plan> {
    let extra_fields = kind.carries_extra_fields();
    let mut actions = Vec::new();

    for (name, definition) in collection.definitions.iter() {
        let def_tree = definition_tree(tree, name);
        let local = serde_json::to_value(definition)
            .with_context(|| format!("{def_tree}: failed to serialise definition"))?;
        let local_type = kind.local_type(definition);
        let entries = kind.remote_map(local_type.as_deref());
        let encoded = mapping::encode(&local, &entries, &snapshot.lookups, extra_fields)
            .with_context(|| format!("{def_tree}: failed to encode definition"))?;

        let Some(remote) = snapshot.get(name) else {
            let mut payload = create_base(kind, &def_tree, local_type.as_deref(), snapshot)?;
            if let Some(map) = payload.as_object_mut() {
                for key in SCHEMA_ONLY_KEYS {
                    map.remove(key);
                }
                map.insert("name".to_string(), Value::String(name.to_string()));
            }
            encoded.apply_to(&mut payload);
            log_created(&def_tree, &local, &entries, extra_fields);
            actions.push(Action::Create {
                name: name.to_string(),
                payload,
            });
            continue;
        };

        let remote_definition = match (&remote.kind, &remote.definition) {
            (RemoteType::Known(remote_type), Some(remote_definition)) => {
                if local_type.as_deref() != Some(remote_type.as_str()) {
                    return Err(ReconcileError::TypeChanged {
                        tree: def_tree,
                        remote: remote_type.clone(),
                        local: local_type.unwrap_or_default(),
                    }
                    .into());
                }
                remote_definition
            }
            (RemoteType::Untyped, Some(remote_definition)) => remote_definition,
            (remote_type, _) => {
                let implementation = match remote_type {
                    RemoteType::Unsupported(implementation) => implementation.clone(),
                    RemoteType::Known(kind) => kind.clone(),
                    RemoteType::Untyped => String::new(),
                };
                return Err(ReconcileError::UnknownImplementation {
                    tree: def_tree,
                    implementation,
                }
                .into());
            }
        };

        let remote_value = serde_json::to_value(remote_definition)
            .with_context(|| format!("{def_tree}: failed to serialise remote definition"))?;
        let changes = diff(&def_tree, &local, &remote_value, &entries, extra_fields);
        if changes.is_empty() {
            actions.push(Action::Unchanged {
                name: name.to_string(),
            });
        } else {
            let mut payload = remote.raw.clone();
            encoded.apply_to(&mut payload);
            actions.push(Action::Update {
                name: name.to_string(),
                id: remote.id,
                changes,
                payload,
            });
        }
    }

    for remote in &snapshot.resources {
        if collection.definitions.contains(&remote.name) {
            continue;
        }
        let def_tree = definition_tree(tree, &remote.name);
        if collection.delete_unmanaged {
            log::info!("{def_tree}: (...) -> (deleted)");
            actions.push(Action::Delete {
                name: remote.name.clone(),
                id: remote.id,
            });
        } else {
            log::debug!("{def_tree}: (...) (unmanaged)");
            actions.push(Action::Unmanaged {
                name: remote.name.clone(),
                id: remote.id,
            });
        }
    }

    Ok(Plan {
        kind: kind.name(),
        tree: tree.to_string(),
        actions,
    })
}

/// Starting object for a create: the matching schema template, or an empty object.
fn create_base<K: ResourceKind>(
    kind: &K,
    def_tree: &str,
    local_type: Option<&str>,
    snapshot: &Snapshot<K::Definition>,
) -> Result<Value> {
    match local_type {
        Some(local_type) if kind.uses_schema() => snapshot
            .schema_for(kind, local_type)
            .cloned()
            .ok_or_else(|| {
                ReconcileError::SchemaNotFound {
                    tree: def_tree.to_string(),
                    kind: local_type.to_string(),
                }
                .into()
            }),
        _ => Ok(Value::Object(serde_json::Map::new())),
    }
}

fn log_created(
    def_tree: &str,
    local: &Value,
    entries: &[crate::remote_map::RemoteMapEntry],
    extra_fields: bool,
) {
    let mut seen = HashSet::new();
    for entry in entries {
        if seen.insert(entry.local) {
            let value = get_path(local, entry.local).unwrap_or(&Value::Null);
            log::info!(
                "{def_tree}.{}: {} (created)",
                entry.local,
                render(value, entry.secret)
            );
        }
    }
    if extra_fields {
        let extra = ExtraFields::from_local(local);
        for (key, value) in &extra.fields {
            log::info!("{def_tree}.{EXTRA_FIELDS}['{key}']: {value} (created)");
        }
        for (key, value) in &extra.secret_fields {
            log::info!(
                "{def_tree}.{EXTRA_SECRET_FIELDS}['{key}']: {} (created)",
                render(value, true)
            );
        }
    }
}
