//! Remote map entries and value codecs
//!
//! A remote map is an ordered list of [`RemoteMapEntry`] values describing how
//! each local attribute of a definition maps onto the remote JSON object.
//! Attributes either live at the top level of the object or inside the
//! `fields: [{name, value}, ...]` array the API uses for
//! implementation-specific settings.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A pure value transform applied while decoding or encoding.
pub type Codec = fn(&Value) -> Value;

/// How one local attribute maps to one remote value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteMapEntry {
    /// Dotted path into the serialised local definition, e.g. `notification_triggers.on_health_issue`.
    pub local: &'static str,
    /// Top-level key, or the `name` of an entry in the `fields` array.
    pub remote: &'static str,
    /// Whether the value lives in the `fields` array.
    pub is_field: bool,
    /// Whether the value must be masked in logs.
    pub secret: bool,
    /// Name of the lookup table translating names to ids for this value.
    pub lookup: Option<&'static str>,
    /// Remote to local transform. Identity when absent.
    pub decoder: Option<Codec>,
    /// Local to remote transform. Identity when absent.
    pub encoder: Option<Codec>,
}

impl RemoteMapEntry {
    /// A top-level attribute.
    pub const fn attr(local: &'static str, remote: &'static str) -> Self {
        Self {
            local,
            remote,
            is_field: false,
            secret: false,
            lookup: None,
            decoder: None,
            encoder: None,
        }
    }

    /// An entry of the `fields` array.
    pub const fn field(local: &'static str, remote: &'static str) -> Self {
        Self {
            is_field: true,
            ..Self::attr(local, remote)
        }
    }

    /// Mask the value in logs.
    pub const fn secret(self) -> Self {
        Self {
            secret: true,
            ..self
        }
    }

    /// Translate names to ids through the given lookup table.
    pub const fn lookup(self, table: &'static str) -> Self {
        Self {
            lookup: Some(table),
            ..self
        }
    }

    /// Set the remote to local transform.
    pub const fn decode(self, decoder: Codec) -> Self {
        Self {
            decoder: Some(decoder),
            ..self
        }
    }

    /// Set the local to remote transform.
    pub const fn encode(self, encoder: Codec) -> Self {
        Self {
            encoder: Some(encoder),
            ..self
        }
    }

    /// Set both transforms.
    pub const fn codec(self, decoder: Codec, encoder: Codec) -> Self {
        self.decode(decoder).encode(encoder)
    }

    /// Optional string stored remotely as `""` when unset.
    pub const fn optional(self) -> Self {
        self.codec(empty_as_null, null_as_empty)
    }

    /// Apply the decoder, if any.
    pub fn decode_value(&self, value: &Value) -> Value {
        match self.decoder {
            Some(decoder) => decoder(value),
            None => value.clone(),
        }
    }

    /// Apply the encoder, if any.
    pub fn encode_value(&self, value: &Value) -> Value {
        match self.encoder {
            Some(encoder) => encoder(value),
            None => value.clone(),
        }
    }

    /// Read the raw remote value this entry points at.
    pub fn remote_value<'a>(&self, object: &'a Value) -> Option<&'a Value> {
        if self.is_field {
            field_value(object, self.remote)
        } else {
            object.get(self.remote)
        }
    }
}

// ============================================================================
// Codecs
// ============================================================================

/// `""` and `null` decode to `null`.
pub fn empty_as_null(value: &Value) -> Value {
    match value {
        Value::String(s) if s.is_empty() => Value::Null,
        other => other.clone(),
    }
}

/// `null` encodes to `""`.
pub fn null_as_empty(value: &Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        other => other.clone(),
    }
}

/// Sort an array so set-valued attributes encode deterministically.
pub fn sorted(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut items = items.clone();
            items.sort_by(compare_values);
            Value::Array(items)
        }
        other => other.clone(),
    }
}

/// Split a comma separated string into an array of trimmed, non-empty items.
pub fn split_comma_list(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::Array(
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_string()))
                .collect(),
        ),
        Value::Null => Value::Array(Vec::new()),
        other => other.clone(),
    }
}

/// Join an array of strings into a sorted comma separated string.
pub fn join_comma_list(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            parts.sort_unstable();
            Value::String(parts.join(","))
        }
        Value::Null => Value::String(String::new()),
        other => other.clone(),
    }
}

/// Total order over JSON scalars used for sorting set values.
fn compare_values(a: &Value, b: &Value) -> std::cmp::Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or_default()
            .total_cmp(&y.as_f64().unwrap_or_default()),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// An enumeration written by name locally and by value remotely.
///
/// Implemented through the `remote_enum!` macro in the binary crate. The
/// serde representation of the type is the local name.
pub trait RemoteEnum: Sized + Serialize + DeserializeOwned {
    /// Remote value for this variant.
    fn to_remote(&self) -> Value;

    /// Variant for a remote value.
    fn from_remote(value: &Value) -> Option<Self>;
}

/// Decode a remote enum value, or an array of them, into local names.
///
/// Unknown values are passed through so deserialisation reports them.
pub fn decode_enum<E: RemoteEnum>(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(decode_enum::<E>).collect()),
        other => E::from_remote(other)
            .and_then(|variant| serde_json::to_value(variant).ok())
            .unwrap_or_else(|| other.clone()),
    }
}

/// Encode local enum names, or an array of them, into remote values.
///
/// Arrays are sorted so set-valued attributes encode deterministically.
pub fn encode_enum<E: RemoteEnum>(value: &Value) -> Value {
    match value {
        Value::Array(items) => sorted(&Value::Array(items.iter().map(encode_enum::<E>).collect())),
        other => serde_json::from_value::<E>(other.clone())
            .map(|variant| variant.to_remote())
            .unwrap_or_else(|_| other.clone()),
    }
}

// ============================================================================
// Paths and fields
// ============================================================================

/// Read a dotted path from a JSON object.
pub fn get_path<'a>(object: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(object, |current, key| current.get(key))
}

/// Write a dotted path into a JSON object map, creating intermediate objects.
pub fn set_path(object: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            object.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = object
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                set_path(child, rest, value);
            }
        }
    }
}

/// Value of a named entry in the object's `fields` array.
pub fn field_value<'a>(object: &'a Value, name: &str) -> Option<&'a Value> {
    object
        .get("fields")?
        .as_array()?
        .iter()
        .find(|f| f.get("name").and_then(Value::as_str) == Some(name))
        .map(|f| f.get("value").unwrap_or(&Value::Null))
}

/// Set named values in the object's `fields` array.
///
/// Existing entries keep every other key (`type`, `label`, ...) and only have
/// their `value` replaced. Names missing from the array are appended, and
/// entries not named in `values` are left untouched.
pub fn overlay_fields(object: &mut Value, values: &[(String, Value)]) {
    if values.is_empty() {
        return;
    }
    let Some(map) = object.as_object_mut() else {
        return;
    };
    let fields = map
        .entry("fields")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !fields.is_array() {
        *fields = Value::Array(Vec::new());
    }
    let Value::Array(fields) = fields else {
        return;
    };
    for (name, value) in values {
        let existing = fields
            .iter_mut()
            .find(|f| f.get("name").and_then(Value::as_str) == Some(name.as_str()));
        match existing.and_then(Value::as_object_mut) {
            Some(field) => {
                field.insert("value".to_string(), value.clone());
            }
            None => {
                let mut field = Map::new();
                field.insert("name".to_string(), Value::String(name.clone()));
                field.insert("value".to_string(), value.clone());
                fields.push(Value::Object(field));
            }
        }
    }
}

/// Whether a value counts as "in use" for lazy lookup fetching.
pub fn is_populated(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Priority {
        Last,
        First,
    }

    impl RemoteEnum for Priority {
        fn to_remote(&self) -> Value {
            match self {
                Self::Last => json!(0),
                Self::First => json!(1),
            }
        }

        fn from_remote(value: &Value) -> Option<Self> {
            match value.as_i64()? {
                0 => Some(Self::Last),
                1 => Some(Self::First),
                _ => None,
            }
        }
    }

    #[test]
    fn test_entry_builders() {
        const ENTRY: RemoteMapEntry = RemoteMapEntry::field("password", "password").secret();
        assert!(ENTRY.is_field);
        assert!(ENTRY.secret);
        assert_eq!(ENTRY.lookup, None);

        let tags = RemoteMapEntry::attr("tags", "tags").lookup("tags");
        assert!(!tags.is_field);
        assert_eq!(tags.lookup, Some("tags"));
    }

    #[test]
    fn test_optional_codec() {
        let entry = RemoteMapEntry::field("url_base", "urlBase").optional();
        assert_eq!(entry.decode_value(&json!("")), Value::Null);
        assert_eq!(entry.decode_value(&json!("/rpc")), json!("/rpc"));
        assert_eq!(entry.encode_value(&Value::Null), json!(""));
        assert_eq!(entry.encode_value(&json!("/rpc")), json!("/rpc"));
    }

    #[test]
    fn test_identity_without_codec() {
        let entry = RemoteMapEntry::attr("enable", "enable");
        assert_eq!(entry.decode_value(&json!(true)), json!(true));
        assert_eq!(entry.encode_value(&json!(false)), json!(false));
    }

    #[test]
    fn test_sorted() {
        assert_eq!(sorted(&json!([3, 1, 2])), json!([1, 2, 3]));
        assert_eq!(sorted(&json!(["b", "a"])), json!(["a", "b"]));
        assert_eq!(sorted(&json!("x")), json!("x"));
    }

    #[test]
    fn test_comma_list_codecs() {
        assert_eq!(
            split_comma_list(&json!("phone, tablet ,,laptop")),
            json!(["phone", "tablet", "laptop"])
        );
        assert_eq!(split_comma_list(&json!("")), json!([]));
        assert_eq!(join_comma_list(&json!(["tablet", "phone"])), json!("phone,tablet"));
        assert_eq!(join_comma_list(&json!([])), json!(""));
    }

    #[test]
    fn test_enum_codecs() {
        assert_eq!(decode_enum::<Priority>(&json!(1)), json!("first"));
        assert_eq!(decode_enum::<Priority>(&json!([1, 0])), json!(["first", "last"]));
        assert_eq!(decode_enum::<Priority>(&json!(9)), json!(9));
        assert_eq!(encode_enum::<Priority>(&json!("first")), json!(1));
        assert_eq!(encode_enum::<Priority>(&json!(["first", "last"])), json!([0, 1]));
    }

    #[test]
    fn test_get_and_set_path() {
        let mut map = Map::new();
        set_path(&mut map, "notification_triggers.on_health_issue", json!(true));
        set_path(&mut map, "enable", json!(false));
        let object = Value::Object(map);
        assert_eq!(
            get_path(&object, "notification_triggers.on_health_issue"),
            Some(&json!(true))
        );
        assert_eq!(get_path(&object, "enable"), Some(&json!(false)));
        assert_eq!(get_path(&object, "missing.path"), None);
    }

    #[test]
    fn test_field_value() {
        let object = json!({"fields": [
            {"name": "host", "value": "localhost"},
            {"name": "apiPath"}
        ]});
        assert_eq!(field_value(&object, "host"), Some(&json!("localhost")));
        assert_eq!(field_value(&object, "apiPath"), Some(&Value::Null));
        assert_eq!(field_value(&object, "port"), None);
    }

    #[test]
    fn test_overlay_fields_keeps_unrelated_entries() {
        let mut object = json!({"fields": [
            {"name": "host", "value": "localhost", "type": "textbox"},
            {"name": "legacy", "value": 7}
        ]});
        overlay_fields(
            &mut object,
            &[
                ("host".to_string(), json!("transmission")),
                ("port".to_string(), json!(9091)),
            ],
        );
        assert_eq!(
            object,
            json!({"fields": [
                {"name": "host", "value": "transmission", "type": "textbox"},
                {"name": "legacy", "value": 7},
                {"name": "port", "value": 9091}
            ]})
        );
    }

    #[test]
    fn test_is_populated() {
        assert!(!is_populated(None));
        assert!(!is_populated(Some(&json!(null))));
        assert!(!is_populated(Some(&json!([]))));
        assert!(is_populated(Some(&json!([1]))));
        assert!(is_populated(Some(&json!("x"))));
    }
}
