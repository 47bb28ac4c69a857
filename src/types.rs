//! Shared configuration value types

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use url::Url;

/// A configuration value that is invalid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{tree}: {message}")]
pub struct ValidationError {
    /// Config path of the offending value
    pub tree: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(tree: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tree: tree.into(),
            message: message.into(),
        }
    }
}

/// Shorthand for validators.
pub type Validation = Result<(), ValidationError>;

/// Fail with `message` at `tree` unless `condition` holds.
pub fn ensure(condition: bool, tree: &str, message: impl Into<String>) -> Validation {
    if condition {
        Ok(())
    } else {
        Err(ValidationError::new(tree, message))
    }
}

/// Require a non-blank string.
pub fn ensure_not_empty(value: &str, tree: &str) -> Validation {
    ensure(!value.trim().is_empty(), tree, "must not be empty")
}

/// Require a usable TCP port.
pub fn ensure_port(port: u16, tree: &str) -> Validation {
    ensure(port != 0, tree, "must be between 1 and 65535")
}

/// Require an absolute `http://` or `https://` URL.
pub fn ensure_http_url(value: &str, tree: &str) -> Validation {
    let valid = Url::parse(value).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|host| !host.is_empty())
    });
    ensure(valid, tree, format!("'{value}' is not an http(s) URL"))
}

// ============================================================================
// Secrets
// ============================================================================

/// A string that never shows up in logs or debug output.
///
/// Serialises in plain text, since payloads and dumped configuration need
/// the real value.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The plain text value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", declarative::MASK)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(declarative::MASK)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// Sets
// ============================================================================

/// Deserialise a set of strings, lowercasing every item.
pub fn lowercase_set<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<String>, D::Error> {
    let items = Vec::<String>::deserialize(deserializer)?;
    Ok(items.into_iter().map(|item| item.to_lowercase()).collect())
}

pub const fn default_true() -> bool {
    true
}

// ============================================================================
// Enumerations
// ============================================================================

/// Declare an enumeration written by name in configuration and by value remotely.
///
/// ```ignore
/// remote_enum! {
///     pub enum WebhookMethod {
///         #[default]
///         Post = "POST" => 1,
///         Put = "PUT" => 2,
///     }
/// }
/// ```
macro_rules! remote_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $local:literal => $remote:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $local)] $variant ),+
        }

        impl declarative::RemoteEnum for $name {
            fn to_remote(&self) -> serde_json::Value {
                match self {
                    $( Self::$variant => serde_json::json!($remote) ),+
                }
            }

            fn from_remote(value: &serde_json::Value) -> Option<Self> {
                $(
                    if *value == serde_json::json!($remote) {
                        return Some(Self::$variant);
                    }
                )+
                None
            }
        }
    };
}

pub(crate) use remote_enum;

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::RemoteEnum;
    use declarative::remote_map::{decode_enum, encode_enum};
    use serde_json::json;

    remote_enum! {
        enum Method {
            #[default]
            Post = "POST" => 1,
            Put = "PUT" => 2,
        }
    }

    #[test]
    fn test_secret_is_masked() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret}"), "********");
        assert_eq!(format!("{secret:?}"), "Secret(********)");
        assert_eq!(secret.expose(), "hunter2");
        assert_eq!(serde_json::to_value(&secret).unwrap(), json!("hunter2"));
    }

    #[test]
    fn test_remote_enum() {
        assert_eq!(Method::default(), Method::Post);
        assert_eq!(Method::Put.to_remote(), json!(2));
        assert_eq!(Method::from_remote(&json!(1)), Some(Method::Post));
        assert_eq!(Method::from_remote(&json!(3)), None);
        assert_eq!(decode_enum::<Method>(&json!(2)), json!("PUT"));
        assert_eq!(encode_enum::<Method>(&json!("POST")), json!(1));
    }

    #[test]
    fn test_validators() {
        assert!(ensure_not_empty("x", "t").is_ok());
        assert_eq!(
            ensure_not_empty("  ", "prowlarr.settings").unwrap_err().to_string(),
            "prowlarr.settings: must not be empty"
        );
        assert!(ensure_http_url("http://localhost:8989", "t").is_ok());
        assert!(ensure_http_url("https://sonarr.example.com/", "t").is_ok());
        assert!(ensure_http_url("sonarr:8989", "t").is_err());
        assert!(ensure_http_url("http://", "t").is_err());
    }

    #[test]
    fn test_lowercase_set() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(deserialize_with = "lowercase_set")]
            items: BTreeSet<String>,
        }
        let holder: Holder = serde_json::from_value(json!({"items": ["TV/Anime", "tv/anime", "Movies"]})).unwrap();
        assert_eq!(holder.items, BTreeSet::from(["movies".to_string(), "tv/anime".to_string()]));
    }
}
