//! Resource kind trait for declarative reconciliation
//!
//! A resource kind is one collection of remote objects (indexers, download
//! clients, ...). It knows how to tell which implementation a definition or
//! a remote object uses, and how each attribute maps onto the remote JSON.
//! Everything else (decoding, diffing, creating, deleting) is derived by the
//! engine from this description.

use crate::remote_map::RemoteMapEntry;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Discriminator of a remote object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteType {
    /// The kind has a single shape.
    Untyped,
    /// A supported implementation, by local type name.
    Known(String),
    /// An implementation this kind cannot decode, by remote name.
    Unsupported(String),
}

/// Core trait for reconcilable resource kinds
///
/// # Example
///
/// ```
/// use declarative::{RemoteMapEntry, RemoteType, ResourceKind};
/// use serde::{Deserialize, Serialize};
/// use serde_json::Value;
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Profile {
///     #[serde(default)]
///     minimum_seeders: u32,
/// }
///
/// struct Profiles;
///
/// impl ResourceKind for Profiles {
///     type Definition = Profile;
///
///     fn name(&self) -> &'static str {
///         "sync_profiles"
///     }
///
///     fn local_type(&self, _: &Profile) -> Option<String> {
///         None
///     }
///
///     fn remote_type(&self, _: &Value) -> RemoteType {
///         RemoteType::Untyped
///     }
///
///     fn remote_map(&self, _: Option<&str>) -> Vec<RemoteMapEntry> {
///         vec![RemoteMapEntry::attr("minimum_seeders", "minimumSeeders")]
///     }
///
///     fn uses_schema(&self) -> bool {
///         false
///     }
/// }
/// ```
pub trait ResourceKind {
    /// Local definition type. Its serialised form must use the local
    /// attribute paths of the remote map, plus a `type` key for typed kinds.
    type Definition: Serialize + DeserializeOwned + Clone + fmt::Debug;

    /// Name of the collection, used in logs.
    fn name(&self) -> &'static str;

    /// Discriminator of a local definition, `None` for untyped kinds.
    fn local_type(&self, definition: &Self::Definition) -> Option<String>;

    /// Discriminator of a remote object.
    fn remote_type(&self, raw: &Value) -> RemoteType;

    /// Remote map for a discriminator.
    fn remote_map(&self, kind: Option<&str>) -> Vec<RemoteMapEntry>;

    /// Whether a schema template belongs to a discriminator.
    fn matches_schema(&self, kind: &str, schema: &Value) -> bool {
        schema
            .get("implementation")
            .and_then(Value::as_str)
            .is_some_and(|implementation| implementation.eq_ignore_ascii_case(kind))
    }

    /// Whether new objects are created from a server-provided schema template.
    fn uses_schema(&self) -> bool {
        true
    }

    /// Whether unmapped remote fields are carried as `fields`/`secret_fields`.
    fn carries_extra_fields(&self) -> bool {
        false
    }
}

impl<K: ResourceKind + ?Sized> ResourceKind for &K {
    type Definition = K::Definition;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn local_type(&self, definition: &Self::Definition) -> Option<String> {
        (**self).local_type(definition)
    }

    fn remote_type(&self, raw: &Value) -> RemoteType {
        (**self).remote_type(raw)
    }

    fn remote_map(&self, kind: Option<&str>) -> Vec<RemoteMapEntry> {
        (**self).remote_map(kind)
    }

    fn matches_schema(&self, kind: &str, schema: &Value) -> bool {
        (**self).matches_schema(kind, schema)
    }

    fn uses_schema(&self) -> bool {
        (**self).uses_schema()
    }

    fn carries_extra_fields(&self) -> bool {
        (**self).carries_extra_fields()
    }
}
