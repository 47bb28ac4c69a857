//! Field-level diff between a local definition and its remote counterpart

use crate::mapping::{EXTRA_FIELDS, EXTRA_SECRET_FIELDS, ExtraFields};
use crate::remote_map::{RemoteMapEntry, get_path};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Placeholder rendered instead of secret values.
pub const MASK: &str = "********";

/// One differing attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    /// Local attribute path, e.g. `port` or `fields['seedRatio']`.
    pub attr: String,
    pub old: Value,
    pub new: Value,
    pub secret: bool,
}

impl FieldChange {
    /// Render a value for logs, masking secrets.
    pub fn render(&self, value: &Value) -> String {
        render(value, self.secret)
    }
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.attr,
            self.render(&self.old),
            self.render(&self.new)
        )
    }
}

/// Render a value for logs.
pub fn render(value: &Value, secret: bool) -> String {
    if secret && !value.is_null() {
        MASK.to_string()
    } else {
        value.to_string()
    }
}

/// Compare the serialised local and remote definitions.
///
/// Mapped attributes are compared at their local path, each path once. Extra
/// fields are only compared for keys declared locally, so remote-only fields
/// never show up as changes. Unchanged attributes are logged at debug level
/// under `tree`.
pub fn diff(
    tree: &str,
    local: &Value,
    remote: &Value,
    entries: &[RemoteMapEntry],
    extra_fields: bool,
) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.local) {
            continue;
        }
        let old = get_path(remote, entry.local).cloned().unwrap_or(Value::Null);
        let new = get_path(local, entry.local).cloned().unwrap_or(Value::Null);
        compare(tree, entry.local.to_string(), old, new, entry.secret, &mut changes);
    }
    if extra_fields {
        let local_extra = ExtraFields::from_local(local);
        let remote_extra = ExtraFields::from_local(remote);
        for (bucket, values, secret) in [
            (EXTRA_FIELDS, &local_extra.fields, false),
            (EXTRA_SECRET_FIELDS, &local_extra.secret_fields, true),
        ] {
            for (key, new) in values {
                let old = remote_extra.get(key).cloned().unwrap_or(Value::Null);
                compare(tree, format!("{bucket}['{key}']"), old, new.clone(), secret, &mut changes);
            }
        }
    }
    changes
}

fn compare(
    tree: &str,
    attr: String,
    old: Value,
    new: Value,
    secret: bool,
    changes: &mut Vec<FieldChange>,
) {
    if old == new {
        log::debug!("{tree}.{attr}: {} (up to date)", render(&new, secret));
        return;
    }
    let change = FieldChange {
        attr,
        old,
        new,
        secret,
    };
    log::info!("{tree}.{change}");
    changes.push(change);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entries() -> Vec<RemoteMapEntry> {
        vec![
            RemoteMapEntry::attr("enable", "enable"),
            RemoteMapEntry::field("port", "port"),
            RemoteMapEntry::field("password", "password").secret(),
            RemoteMapEntry::field("port", "legacyPort"),
            RemoteMapEntry::field("notification_triggers.on_health_issue", "onHealthIssue"),
        ]
    }

    #[test]
    fn test_identical_definitions() {
        let value = json!({"enable": true, "port": 9091, "password": "x"});
        assert!(diff("t", &value, &value, &entries(), false).is_empty());
    }

    #[test]
    fn test_changed_attribute() {
        let local = json!({"enable": true, "port": 9091});
        let remote = json!({"enable": true, "port": 9092});
        assert_eq!(
            diff("t", &local, &remote, &entries(), false),
            vec![FieldChange {
                attr: "port".to_string(),
                old: json!(9092),
                new: json!(9091),
                secret: false,
            }]
        );
    }

    #[test]
    fn test_nested_attribute() {
        let local = json!({"notification_triggers": {"on_health_issue": true}});
        let remote = json!({"notification_triggers": {"on_health_issue": false}});
        let changes = diff("t", &local, &remote, &entries(), false);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].attr, "notification_triggers.on_health_issue");
    }

    #[test]
    fn test_secret_rendering() {
        let local = json!({"password": "new"});
        let remote = json!({"password": "old"});
        let changes = diff("t", &local, &remote, &entries(), false);
        assert_eq!(changes[0].to_string(), "password: ******** -> ********");

        let cleared = FieldChange {
            attr: "password".to_string(),
            old: json!("old"),
            new: Value::Null,
            secret: true,
        };
        assert_eq!(cleared.to_string(), "password: ******** -> null");
    }

    #[test]
    fn test_extra_fields_only_compare_local_keys() {
        let local = json!({"fields": {"seedRatio": 2.0}, "secret_fields": {"apiKey": "k"}});
        let remote = json!({
            "fields": {"seedRatio": 1.0, "remoteOnly": true},
            "secret_fields": {"apiKey": "k", "passkey": "p"}
        });
        let changes = diff("t", &local, &remote, &[], true);
        assert_eq!(
            changes,
            vec![FieldChange {
                attr: "fields['seedRatio']".to_string(),
                old: json!(1.0),
                new: json!(2.0),
                secret: false,
            }]
        );
    }

    #[test]
    fn test_extra_field_found_in_other_bucket() {
        let local = json!({"fields": {"apiKey": "k"}});
        let remote = json!({"fields": {}, "secret_fields": {"apiKey": "k"}});
        assert!(diff("t", &local, &remote, &[], true).is_empty());
    }
}
