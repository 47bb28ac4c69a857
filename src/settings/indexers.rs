//! Indexers (`/api/v1/indexer`)
//!
//! Prowlarr ships hundreds of indexer definitions, each with its own settings,
//! so only the settings common to every indexer are typed. Everything else is
//! carried as `fields` and `secret_fields`, keyed by the remote field name.

use super::TAGS_ENTRY;
use crate::types::{Secret, Validation, ValidationError, ensure, ensure_not_empty};
use declarative::{RemoteMapEntry, RemoteType, ResourceKind};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

const DEFINITION_NAME: &str = "definitionName";

/// An indexer definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indexer {
    /// Site definition name, e.g. `nyaasi`.
    #[serde(rename = "type", default, deserialize_with = "lowercase")]
    pub kind: String,

    #[serde(default)]
    pub enable: bool,

    /// 1 is the highest priority, 50 the lowest.
    #[serde(default = "indexer_priority")]
    pub indexer_priority: u32,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Queries allowed per rolling 24 hours, unset or 0 for no limit.
    #[serde(default)]
    pub query_limit: Option<u32>,

    /// Grabs allowed per rolling 24 hours, unset or 0 for no limit.
    #[serde(default)]
    pub grab_limit: Option<u32>,

    #[serde(default)]
    pub fields: BTreeMap<String, Value>,

    #[serde(default)]
    pub secret_fields: BTreeMap<String, Secret>,
}

fn indexer_priority() -> u32 {
    25
}

fn lowercase<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|s| s.to_lowercase())
}

impl Indexer {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into().to_lowercase(),
            enable: false,
            indexer_priority: indexer_priority(),
            tags: BTreeSet::new(),
            query_limit: None,
            grab_limit: None,
            fields: BTreeMap::new(),
            secret_fields: BTreeMap::new(),
        }
    }

    pub fn validate(&self, tree: &str) -> Validation {
        ensure_not_empty(&self.kind, &format!("{tree}.type"))?;
        ensure(
            (1..=50).contains(&self.indexer_priority),
            &format!("{tree}.indexer_priority"),
            "must be between 1 and 50",
        )?;
        for tag in &self.tags {
            ensure_not_empty(tag, &format!("{tree}.tags"))?;
        }
        if let Some(name) = self
            .secret_fields
            .keys()
            .find(|name| self.fields.contains_key(*name))
        {
            return Err(ValidationError::new(
                format!("{tree}.secret_fields"),
                format!("field '{name}' is defined in both 'fields' and 'secret_fields'"),
            ));
        }
        Ok(())
    }
}

const REMOTE_MAP: [RemoteMapEntry; 5] = [
    RemoteMapEntry::attr("enable", "enable"),
    RemoteMapEntry::attr("indexer_priority", "priority"),
    TAGS_ENTRY,
    RemoteMapEntry::field("query_limit", "baseSettings.queryLimit"),
    RemoteMapEntry::field("grab_limit", "baseSettings.grabLimit"),
];

pub struct Indexers;

impl ResourceKind for Indexers {
    type Definition = Indexer;

    fn name(&self) -> &'static str {
        "indexers"
    }

    fn local_type(&self, definition: &Indexer) -> Option<String> {
        Some(definition.kind.clone())
    }

    fn remote_type(&self, raw: &Value) -> RemoteType {
        match raw.get(DEFINITION_NAME).and_then(Value::as_str) {
            Some(name) if !name.is_empty() => RemoteType::Known(name.to_lowercase()),
            _ => RemoteType::Unsupported(String::new()),
        }
    }

    fn remote_map(&self, _: Option<&str>) -> Vec<RemoteMapEntry> {
        REMOTE_MAP.to_vec()
    }

    fn matches_schema(&self, kind: &str, schema: &Value) -> bool {
        schema
            .get(DEFINITION_NAME)
            .and_then(Value::as_str)
            .is_some_and(|name| name.eq_ignore_ascii_case(kind))
    }

    fn carries_extra_fields(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::snapshot::decode_remote;
    use declarative::{LookupTable, Lookups};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn remote() -> Value {
        json!({
            "id": 4,
            "name": "Nyaa",
            "definitionName": "nyaasi",
            "enable": true,
            "priority": 10,
            "tags": [1],
            "fields": [
                {"name": "baseUrl", "value": "https://nyaa.si/"},
                {"name": "baseSettings.queryLimit", "value": 100},
                {"name": "apiKey", "value": "hunter2"},
                {"name": "info", "type": "info", "value": "read me"},
                {"name": "sonarr_compatibility", "value": false}
            ]
        })
    }

    fn lookups() -> Lookups {
        let mut lookups = Lookups::new();
        lookups.insert(LookupTable::from_pairs("tags", [("anime", 1)]));
        lookups
    }

    #[test]
    fn test_decode_splits_extra_fields() {
        let resource = decode_remote(&Indexers, remote(), &lookups()).unwrap();
        assert_eq!(resource.kind, RemoteType::Known("nyaasi".to_string()));
        let indexer = resource.definition.unwrap();
        assert_eq!(indexer.kind, "nyaasi");
        assert!(indexer.enable);
        assert_eq!(indexer.indexer_priority, 10);
        assert_eq!(indexer.query_limit, Some(100));
        assert_eq!(indexer.grab_limit, None);
        assert_eq!(indexer.tags, BTreeSet::from(["anime".to_string()]));
        assert_eq!(indexer.fields["baseUrl"], json!("https://nyaa.si/"));
        assert_eq!(indexer.fields["sonarr_compatibility"], json!(false));
        assert!(!indexer.fields.contains_key("info"));
        assert_eq!(indexer.secret_fields["apiKey"].expose(), "hunter2");
    }

    #[test]
    fn test_type_is_lowercased() {
        let indexer: Indexer = serde_yaml::from_str("type: NyaaSi").unwrap();
        assert_eq!(indexer.kind, "nyaasi");
        assert_eq!(indexer, Indexer::new("nyaasi"));
    }

    #[test]
    fn test_schema_matches_definition_name() {
        let schema = json!({"definitionName": "NyaaSi", "implementation": "Cardigann"});
        assert!(Indexers.matches_schema("nyaasi", &schema));
        assert!(!Indexers.matches_schema("cardigann", &schema));
    }

    #[test]
    fn test_priority_range() {
        let mut indexer = Indexer::new("nyaasi");
        indexer.indexer_priority = 51;
        assert_eq!(indexer.validate("t").unwrap_err().tree, "t.indexer_priority");
        indexer.indexer_priority = 1;
        assert!(indexer.validate("t").is_ok());
    }

    #[test]
    fn test_fields_and_secret_fields_disjoint() {
        let mut indexer = Indexer::new("nyaasi");
        indexer.fields.insert("apiKey".to_string(), json!("a"));
        indexer
            .secret_fields
            .insert("apiKey".to_string(), Secret::new("b"));
        let err = indexer.validate("t").unwrap_err();
        assert!(err.message.contains("apiKey"));
    }
}
