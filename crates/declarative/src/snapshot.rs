//! Remote state snapshot
//!
//! A snapshot is everything the planner needs from the server for one
//! resource kind: the decoded remote objects, the schema templates (only when
//! something must be created) and the lookup tables (only those referenced by
//! a populated value).

use crate::collection::Definitions;
use crate::context::{Endpoint, LookupSource};
use crate::lookup::Lookups;
use crate::mapping;
use crate::remote_map::{get_path, is_populated};
use crate::resource::{RemoteType, ResourceKind};
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeSet;

/// One remote object.
#[derive(Debug, Clone)]
pub struct RemoteResource<D> {
    pub id: i64,
    pub name: String,
    /// The object exactly as returned by the server.
    pub raw: Value,
    pub kind: RemoteType,
    /// Decoded definition, `None` for unsupported implementations.
    pub definition: Option<D>,
}

/// Remote state of one resource kind.
#[derive(Debug, Clone)]
pub struct Snapshot<D> {
    pub resources: Vec<RemoteResource<D>>,
    pub schemas: Vec<Value>,
    pub lookups: Lookups,
}

impl<D> Snapshot<D> {
    /// Fetch the remote state relevant to the given local definitions.
    pub fn fetch<K>(
        kind: &K,
        endpoint: &dyn Endpoint,
        source: &dyn LookupSource,
        local: &Definitions<D>,
    ) -> Result<Self>
    where
        K: ResourceKind<Definition = D>,
        D: serde::Serialize,
    {
        let objects = endpoint
            .list()
            .with_context(|| format!("failed to list remote {}", kind.name()))?;
        log::debug!("{}: {} remote object(s)", kind.name(), objects.len());

        let local_values = local
            .iter()
            .map(|(name, definition)| {
                serde_json::to_value(definition)
                    .map(|value| (name, kind.local_type(definition), value))
                    .with_context(|| format!("failed to serialise {} '{name}'", kind.name()))
            })
            .collect::<Result<Vec<_>>>()?;

        let remote_names: BTreeSet<&str> = objects
            .iter()
            .filter_map(|o| o.get("name").and_then(Value::as_str))
            .collect();
        let needs_create = local.names().any(|name| !remote_names.contains(name));
        let schemas = if kind.uses_schema() && needs_create {
            endpoint
                .schemas()
                .with_context(|| format!("failed to list {} schemas", kind.name()))?
        } else {
            Vec::new()
        };

        let mut tables = BTreeSet::new();
        for (_, local_type, value) in &local_values {
            for entry in kind.remote_map(local_type.as_deref()) {
                if let Some(table) = entry.lookup
                    && is_populated(get_path(value, entry.local))
                {
                    tables.insert(table);
                }
            }
        }
        for object in &objects {
            let remote_type = known_type(&kind.remote_type(object));
            for entry in kind.remote_map(remote_type.as_deref()) {
                if let Some(table) = entry.lookup
                    && is_populated(entry.remote_value(object))
                {
                    tables.insert(table);
                }
            }
        }
        let mut lookups = Lookups::new();
        for table in tables {
            log::debug!("{}: fetching lookup table '{table}'", kind.name());
            lookups.insert(
                source
                    .table(table)
                    .with_context(|| format!("failed to fetch lookup table '{table}'"))?,
            );
        }

        let resources = objects
            .into_iter()
            .map(|raw| decode_remote(kind, raw, &lookups))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            resources,
            schemas,
            lookups,
        })
    }

    /// Remote object by name.
    pub fn get(&self, name: &str) -> Option<&RemoteResource<D>> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Schema template for a discriminator.
    pub fn schema_for<K>(&self, kind: &K, local_type: &str) -> Option<&Value>
    where
        K: ResourceKind<Definition = D>,
    {
        self.schemas
            .iter()
            .find(|schema| kind.matches_schema(local_type, schema))
    }
}

fn known_type(remote_type: &RemoteType) -> Option<String> {
    match remote_type {
        RemoteType::Known(kind) => Some(kind.clone()),
        RemoteType::Untyped | RemoteType::Unsupported(_) => None,
    }
}

/// Decode one remote object into a typed definition.
pub fn decode_remote<K: ResourceKind>(
    kind: &K,
    raw: Value,
    lookups: &Lookups,
) -> Result<RemoteResource<K::Definition>> {
    let id = raw
        .get("id")
        .and_then(Value::as_i64)
        .with_context(|| format!("remote {} object has no id: {raw}", kind.name()))?;
    let name = raw
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string());

    let remote_type = kind.remote_type(&raw);
    let definition = match &remote_type {
        RemoteType::Unsupported(implementation) => {
            log::debug!(
                "{}: remote '{name}' uses unsupported implementation '{implementation}'",
                kind.name()
            );
            None
        }
        RemoteType::Untyped | RemoteType::Known(_) => {
            let local_type = known_type(&remote_type);
            let entries = kind.remote_map(local_type.as_deref());
            let mut local = mapping::decode(&raw, &entries, lookups, kind.carries_extra_fields());
            if let Some(local_type) = local_type {
                local.insert("type".to_string(), Value::String(local_type));
            }
            let definition = serde_json::from_value(Value::Object(local))
                .with_context(|| format!("failed to decode remote {} '{name}'", kind.name()))?;
            Some(definition)
        }
    };

    Ok(RemoteResource {
        id,
        name,
        raw,
        kind: remote_type,
        definition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{MemoryEndpoint, StaticLookups};
    use crate::lookup::LookupTable;
    use crate::resource::testing::{Client, Clients};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn transmission_remote() -> Value {
        json!({
            "id": 1,
            "name": "Transmission",
            "implementation": "Transmission",
            "enable": true,
            "tags": [],
            "fields": [
                {"name": "host", "value": "localhost"},
                {"name": "port", "value": 9091},
                {"name": "password", "value": ""}
            ]
        })
    }

    fn lookups() -> StaticLookups {
        StaticLookups::new(vec![LookupTable::from_pairs("tags", [("tv", 1)])])
    }

    #[test]
    fn test_decode_remote() {
        let resource = decode_remote(&Clients, transmission_remote(), &Lookups::new()).unwrap();
        assert_eq!(resource.id, 1);
        assert_eq!(resource.name, "Transmission");
        assert_eq!(
            resource.definition,
            Some(Client::Transmission {
                enable: true,
                tags: vec![],
                host: "localhost".to_string(),
                port: 9091,
                password: None,
            })
        );
    }

    #[test]
    fn test_decode_unsupported_implementation() {
        let raw = json!({"id": 4, "name": "Sab", "implementation": "Sabnzbd"});
        let resource = decode_remote(&Clients, raw, &Lookups::new()).unwrap();
        assert_eq!(resource.kind, RemoteType::Unsupported("Sabnzbd".to_string()));
        assert!(resource.definition.is_none());
    }

    #[test]
    fn test_schemas_fetched_only_when_creating() {
        let endpoint = MemoryEndpoint::new(vec![transmission_remote()], vec![]);
        let mut local = Definitions::new();
        local.insert(
            "Transmission",
            Client::Transmission {
                enable: true,
                tags: vec![],
                host: "localhost".to_string(),
                port: 9091,
                password: None,
            },
        );
        Snapshot::fetch(&Clients, &endpoint, &lookups(), &local).unwrap();
        assert_eq!(endpoint.schema_calls.get(), 0);

        local.insert(
            "Deluge",
            Client::Deluge {
                enable: true,
                tags: vec![],
                host: "deluge".to_string(),
            },
        );
        Snapshot::fetch(&Clients, &endpoint, &lookups(), &local).unwrap();
        assert_eq!(endpoint.schema_calls.get(), 1);
    }

    #[test]
    fn test_lookups_fetched_only_when_referenced() {
        let endpoint = MemoryEndpoint::new(vec![transmission_remote()], vec![]);
        let source = lookups();
        Snapshot::fetch(&Clients, &endpoint, &source, &Definitions::new()).unwrap();
        assert!(source.fetched.borrow().is_empty());

        let mut tagged = transmission_remote();
        tagged["tags"] = json!([1]);
        let endpoint = MemoryEndpoint::new(vec![tagged], vec![]);
        let snapshot = Snapshot::fetch(&Clients, &endpoint, &source, &Definitions::new()).unwrap();
        assert_eq!(*source.fetched.borrow(), vec!["tags".to_string()]);
        match &snapshot.resources[0].definition {
            Some(Client::Transmission { tags, .. }) => assert_eq!(tags, &vec!["tv".to_string()]),
            other => panic!("unexpected definition: {other:?}"),
        }
    }
}
