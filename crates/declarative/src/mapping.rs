//! Decoding remote objects into local values and encoding them back
//!
//! Decoding produces a JSON object keyed by local attribute paths, ready to be
//! deserialised into a typed definition. Encoding walks the serialised local
//! definition and produces top-level attributes and `fields` entries.

use crate::lookup::Lookups;
use crate::remote_map::{RemoteMapEntry, field_value, get_path, set_path};
use crate::types::ReconcileError;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Local key holding non-secret extra fields.
pub const EXTRA_FIELDS: &str = "fields";
/// Local key holding secret extra fields.
pub const EXTRA_SECRET_FIELDS: &str = "secret_fields";

/// Whether a remote field holds a secret.
///
/// The API carries no sensitivity flag, so string values whose name mentions
/// a key or a password are treated as secrets.
pub fn is_secret_field(name: &str, value: &Value) -> bool {
    if !value.is_string() {
        return false;
    }
    let name = name.to_lowercase();
    name.contains("key") || name.contains("pass")
}

/// Remote fields not covered by the remote map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraFields {
    pub fields: BTreeMap<String, Value>,
    pub secret_fields: BTreeMap<String, Value>,
}

impl ExtraFields {
    /// Collect unmapped fields of a remote object.
    ///
    /// Read-only `info` fields are skipped.
    pub fn from_remote(raw: &Value, entries: &[RemoteMapEntry]) -> Self {
        let mapped: HashSet<&str> = entries
            .iter()
            .filter(|e| e.is_field)
            .map(|e| e.remote)
            .collect();
        let mut extra = Self::default();
        let Some(fields) = raw.get("fields").and_then(Value::as_array) else {
            return extra;
        };
        for field in fields {
            let Some(name) = field.get("name").and_then(Value::as_str) else {
                continue;
            };
            if mapped.contains(name) || field.get("type").and_then(Value::as_str) == Some("info") {
                continue;
            }
            let value = field.get("value").cloned().unwrap_or(Value::Null);
            if is_secret_field(name, &value) {
                extra.secret_fields.insert(name.to_string(), value);
            } else {
                extra.fields.insert(name.to_string(), value);
            }
        }
        extra
    }

    /// Look a field up in either bucket.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .get(name)
            .or_else(|| self.secret_fields.get(name))
    }

    /// Read the extra field maps of a serialised local definition.
    pub fn from_local(local: &Value) -> Self {
        let read = |key: &str| {
            local
                .get(key)
                .and_then(Value::as_object)
                .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default()
        };
        Self {
            fields: read(EXTRA_FIELDS),
            secret_fields: read(EXTRA_SECRET_FIELDS),
        }
    }

    fn into_values(self) -> (Value, Value) {
        let to_object = |m: BTreeMap<String, Value>| Value::Object(m.into_iter().collect());
        (to_object(self.fields), to_object(self.secret_fields))
    }
}

/// Decode a remote object into a local attribute object.
///
/// Absent and null values are left out so local defaults apply.
pub fn decode(
    raw: &Value,
    entries: &[RemoteMapEntry],
    lookups: &Lookups,
    extra_fields: bool,
) -> Map<String, Value> {
    let mut local = Map::new();
    for entry in entries {
        let Some(value) = entry.remote_value(raw) else {
            continue;
        };
        let mut value = entry.decode_value(value);
        if let Some(table) = entry.lookup {
            value = lookups.decode(table, &value);
        }
        if !value.is_null() {
            set_path(&mut local, entry.local, value);
        }
    }
    if extra_fields {
        let (fields, secret_fields) = ExtraFields::from_remote(raw, entries).into_values();
        local.insert(EXTRA_FIELDS.to_string(), fields);
        local.insert(EXTRA_SECRET_FIELDS.to_string(), secret_fields);
    }
    local
}

/// Remote representation of a local definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encoded {
    /// Top-level attributes.
    pub attrs: Map<String, Value>,
    /// Values for the `fields` array, in remote map order.
    pub fields: Vec<(String, Value)>,
}

impl Encoded {
    /// Apply onto a remote object or schema template.
    pub fn apply_to(&self, object: &mut Value) {
        if let Some(map) = object.as_object_mut() {
            for (key, value) in &self.attrs {
                map.insert(key.clone(), value.clone());
            }
        }
        crate::remote_map::overlay_fields(object, &self.fields);
    }
}

/// Encode a serialised local definition.
///
/// When several entries target the same remote value only the first one is
/// encoded.
pub fn encode(
    local: &Value,
    entries: &[RemoteMapEntry],
    lookups: &Lookups,
    extra_fields: bool,
) -> Result<Encoded, ReconcileError> {
    let mut encoded = Encoded::default();
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert((entry.is_field, entry.remote)) {
            continue;
        }
        let mut value = get_path(local, entry.local).cloned().unwrap_or(Value::Null);
        if let Some(table) = entry.lookup {
            value = lookups.encode(table, &value)?;
        }
        let value = entry.encode_value(&value);
        if entry.is_field {
            encoded.fields.push((entry.remote.to_string(), value));
        } else {
            encoded.attrs.insert(entry.remote.to_string(), value);
        }
    }
    if extra_fields {
        let extra = ExtraFields::from_local(local);
        encoded.fields.extend(extra.fields);
        encoded.fields.extend(extra.secret_fields);
    }
    Ok(encoded)
}

/// Remote value of a mapped entry, for log output.
pub fn remote_value_of(raw: &Value, entry: &RemoteMapEntry) -> Value {
    if entry.is_field {
        field_value(raw, entry.remote).cloned().unwrap_or(Value::Null)
    } else {
        raw.get(entry.remote).cloned().unwrap_or(Value::Null)
    }
}
