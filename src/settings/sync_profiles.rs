//! Application sync profiles (`/api/v1/appprofile`)

use crate::types::{Validation, default_true, ensure};
use declarative::{RemoteMapEntry, RemoteType, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which searches applications may run against the indexers in a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProfile {
    #[serde(default = "default_true")]
    pub enable_rss: bool,

    /// Used for searches started from the application's UI.
    #[serde(default = "default_true")]
    pub enable_interactive_search: bool,

    #[serde(default = "default_true")]
    pub enable_automatic_search: bool,

    /// Releases with fewer seeders are not grabbed.
    #[serde(default = "minimum_seeders")]
    pub minimum_seeders: u32,
}

fn minimum_seeders() -> u32 {
    1
}

impl Default for SyncProfile {
    fn default() -> Self {
        Self {
            enable_rss: true,
            enable_interactive_search: true,
            enable_automatic_search: true,
            minimum_seeders: minimum_seeders(),
        }
    }
}

impl SyncProfile {
    pub fn validate(&self, tree: &str) -> Validation {
        ensure(
            self.minimum_seeders >= 1,
            &format!("{tree}.minimum_seeders"),
            "must be at least 1",
        )
    }
}

const REMOTE_MAP: [RemoteMapEntry; 4] = [
    RemoteMapEntry::attr("enable_rss", "enableRss"),
    RemoteMapEntry::attr("enable_interactive_search", "enableInteractiveSearch"),
    RemoteMapEntry::attr("enable_automatic_search", "enableAutomaticSearch"),
    RemoteMapEntry::attr("minimum_seeders", "minimumSeeders"),
];

pub struct SyncProfiles;

impl ResourceKind for SyncProfiles {
    type Definition = SyncProfile;

    fn name(&self) -> &'static str {
        "sync_profiles"
    }

    fn local_type(&self, _: &SyncProfile) -> Option<String> {
        None
    }

    fn remote_type(&self, _: &Value) -> RemoteType {
        RemoteType::Untyped
    }

    fn remote_map(&self, _: Option<&str>) -> Vec<RemoteMapEntry> {
        REMOTE_MAP.to_vec()
    }

    fn uses_schema(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::Lookups;
    use declarative::snapshot::decode_remote;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let profile: SyncProfile = serde_yaml::from_str("{}").unwrap();
        assert_eq!(profile, SyncProfile::default());
        assert!(profile.validate("t").is_ok());
    }

    #[test]
    fn test_minimum_seeders_validated() {
        let profile: SyncProfile = serde_yaml::from_str("minimum_seeders: 0").unwrap();
        assert_eq!(profile.validate("t").unwrap_err().tree, "t.minimum_seeders");
    }

    #[test]
    fn test_decode_remote_profile() {
        let raw = json!({
            "id": 1,
            "name": "Standard",
            "enableRss": true,
            "enableInteractiveSearch": false,
            "enableAutomaticSearch": true,
            "minimumSeeders": 3
        });
        let resource = decode_remote(&SyncProfiles, raw, &Lookups::new()).unwrap();
        assert_eq!(resource.kind, RemoteType::Untyped);
        let profile = resource.definition.unwrap();
        assert!(!profile.enable_interactive_search);
        assert_eq!(profile.minimum_seeders, 3);
    }
}
