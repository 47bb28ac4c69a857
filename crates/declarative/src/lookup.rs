//! Name to id lookup tables
//!
//! Remote objects reference tags and categories by numeric id while local
//! definitions use names. A [`LookupTable`] translates in both directions.

use crate::types::ReconcileError;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Bidirectional name/id table.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    name: String,
    by_name: HashMap<String, i64>,
    by_id: BTreeMap<i64, String>,
    case_insensitive: bool,
}

impl LookupTable {
    /// Create an empty, case-sensitive table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Match names case-insensitively. The first spelling seen wins for decoding.
    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Build a table from `(name, id)` pairs.
    pub fn from_pairs<I, S>(name: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut table = Self::new(name);
        table.extend(pairs);
        table
    }

    /// Add `(name, id)` pairs, keeping the first entry for duplicate ids.
    pub fn extend<I, S>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        for (name, id) in pairs {
            self.insert(name, id);
        }
    }

    /// Add one entry.
    pub fn insert(&mut self, name: impl Into<String>, id: i64) {
        let name = name.into();
        self.by_name.insert(self.key(&name), id);
        self.by_id.entry(id).or_insert(name);
    }

    /// Table name used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Id for a name.
    pub fn id(&self, name: &str) -> Option<i64> {
        self.by_name.get(&self.key(name)).copied()
    }

    /// Name for an id.
    pub fn label(&self, id: i64) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Translate a remote id or id array into names.
    ///
    /// Ids missing from the table are dropped: they reference objects that no
    /// longer exist remotely.
    pub fn decode(&self, value: &Value) -> Value {
        match value {
            Value::Array(ids) => Value::Array(
                ids.iter()
                    .filter_map(|id| self.decode_one(id))
                    .collect(),
            ),
            Value::Null => Value::Null,
            other => self.decode_one(other).unwrap_or(Value::Null),
        }
    }

    fn decode_one(&self, id: &Value) -> Option<Value> {
        let id = id.as_i64()?;
        match self.label(id) {
            Some(name) => Some(Value::String(name.to_string())),
            None => {
                log::debug!("{}: dropping unknown id {id}", self.name);
                None
            }
        }
    }

    /// Translate a local name or name array into ids.
    ///
    /// Arrays encode to sorted ids. Unknown names are an error.
    pub fn encode(&self, value: &Value) -> Result<Value, ReconcileError> {
        match value {
            Value::Array(names) => {
                let mut ids = names
                    .iter()
                    .map(|name| self.encode_one(name))
                    .collect::<Result<Vec<i64>, _>>()?;
                ids.sort_unstable();
                ids.dedup();
                Ok(Value::Array(ids.into_iter().map(Value::from).collect()))
            }
            Value::Null => Ok(Value::Null),
            other => self.encode_one(other).map(Value::from),
        }
    }

    fn encode_one(&self, name: &Value) -> Result<i64, ReconcileError> {
        let name = match name {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.id(&name).ok_or_else(|| ReconcileError::UnknownLookup {
            table: self.name.clone(),
            name,
        })
    }

    fn key(&self, name: &str) -> String {
        if self.case_insensitive {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }
}

/// Lookup tables by name, fetched on demand.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    tables: HashMap<String, LookupTable>,
}

impl Lookups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: LookupTable) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn get(&self, name: &str) -> Option<&LookupTable> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Decode through `name`, passing the value through if the table is absent.
    pub fn decode(&self, name: &str, value: &Value) -> Value {
        match self.get(name) {
            Some(table) => table.decode(value),
            None => value.clone(),
        }
    }

    /// Encode through `name`. A missing table behaves like an empty one.
    pub fn encode(&self, name: &str, value: &Value) -> Result<Value, ReconcileError> {
        match self.get(name) {
            Some(table) => table.encode(value),
            None => LookupTable::new(name).encode(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tags() -> LookupTable {
        LookupTable::from_pairs("tags", [("movies", 2), ("tv", 1), ("Anime", 3)])
    }

    #[test]
    fn test_decode_drops_unknown_ids() {
        assert_eq!(tags().decode(&json!([1, 2, 9])), json!(["tv", "movies"]));
        assert_eq!(tags().decode(&json!(3)), json!("Anime"));
        assert_eq!(tags().decode(&json!(9)), Value::Null);
    }

    #[test]
    fn test_encode_sorts_ids() {
        assert_eq!(tags().encode(&json!(["movies", "tv"])).unwrap(), json!([1, 2]));
        assert_eq!(tags().encode(&json!([])).unwrap(), json!([]));
    }

    #[test]
    fn test_encode_unknown_name_fails() {
        let err = tags().encode(&json!(["music"])).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::UnknownLookup {
                table: "tags".to_string(),
                name: "music".to_string()
            }
        );
    }

    #[test]
    fn test_case_sensitivity() {
        assert!(tags().encode(&json!(["anime"])).is_err());

        let categories =
            LookupTable::from_pairs("categories", [("TV/Anime", 5070), ("Movies", 2000)])
                .case_insensitive();
        assert_eq!(categories.encode(&json!(["tv/anime", "MOVIES"])).unwrap(), json!([2000, 5070]));
        assert_eq!(categories.decode(&json!([5070])), json!(["TV/Anime"]));
    }

    #[test]
    fn test_lookups_missing_table() {
        let lookups = Lookups::new();
        assert_eq!(lookups.decode("tags", &json!([1])), json!([1]));
        assert_eq!(lookups.encode("tags", &json!([])).unwrap(), json!([]));
        assert!(lookups.encode("tags", &json!(["x"])).is_err());
    }
}
