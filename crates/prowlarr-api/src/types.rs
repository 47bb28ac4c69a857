//! Core types for the Prowlarr API client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// API version prefix for every endpoint.
pub const API_ROOT: &str = "/api/v1";

/// Default timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Resource
// =============================================================================

/// A REST collection on the Prowlarr API that supports list/create/update/delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    /// Indexers (`/api/v1/indexer`).
    Indexer,
    /// Indexer proxies (`/api/v1/indexerproxy`).
    IndexerProxy,
    /// Download clients (`/api/v1/downloadclient`).
    DownloadClient,
    /// Application links (`/api/v1/applications`).
    Application,
    /// Sync profiles (`/api/v1/appprofile`).
    AppProfile,
    /// Notification connections (`/api/v1/notification`).
    Notification,
}

impl Resource {
    /// All resource collections.
    pub const ALL: [Resource; 6] = [
        Resource::Indexer,
        Resource::IndexerProxy,
        Resource::DownloadClient,
        Resource::Application,
        Resource::AppProfile,
        Resource::Notification,
    ];

    /// Path segment under the API root.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Indexer => "indexer",
            Self::IndexerProxy => "indexerproxy",
            Self::DownloadClient => "downloadclient",
            Self::Application => "applications",
            Self::AppProfile => "appprofile",
            Self::Notification => "notification",
        }
    }

    /// Whether the collection exposes a `/schema` listing.
    #[must_use]
    pub fn has_schema(&self) -> bool {
        !matches!(self, Self::AppProfile)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

// =============================================================================
// Auxiliary lookup types
// =============================================================================

/// A tag as returned by `/api/v1/tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Remote id.
    pub id: i64,
    /// Tag label.
    pub label: String,
}

/// A single indexer category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Newznab category id.
    pub id: i64,
    /// Display name, e.g. `Movies/HD`.
    pub name: String,
}

/// A top-level category with its sub-categories, from `/api/v1/indexer/categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    /// Newznab category id.
    pub id: i64,
    /// Display name, e.g. `Movies`.
    pub name: String,
    /// Sub-categories.
    #[serde(default)]
    pub sub_categories: Vec<Category>,
}

/// Subset of `/api/v1/system/status` used for connection checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    /// Application name reported by the server.
    #[serde(default)]
    pub app_name: String,
    /// Instance name.
    #[serde(default)]
    pub instance_name: String,
    /// Server version.
    pub version: String,
}

// =============================================================================
// Connection
// =============================================================================

/// Everything needed to open an authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Base URL including protocol, port and url base, without trailing slash.
    pub host_url: String,
    /// Value sent in the `X-Api-Key` header.
    pub api_key: String,
}

impl Credentials {
    /// Create credentials, normalising the trailing slash of the host URL.
    pub fn new(host_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let host_url = host_url.into();
        Self {
            host_url: host_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Full URL for a path under the API root.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}/{}", self.host_url, API_ROOT, path.trim_start_matches('/'))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host_url", &self.host_url)
            .field("api_key", &"********")
            .finish()
    }
}

/// Values scraped from `initialize.js`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitializeJs {
    /// API root, normally `/api/v1`.
    pub api_root: Option<String>,
    /// API key, present when authentication is disabled for the caller.
    pub api_key: Option<String>,
    /// URL base the server is configured with.
    pub url_base: Option<String>,
    /// Server version.
    pub version: Option<String>,
    /// Instance name.
    pub instance_name: Option<String>,
}
