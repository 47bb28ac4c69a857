//! Applications Prowlarr syncs indexers to (`/api/v1/applications`)

use super::{Implementations, TAGS_ENTRY};
use crate::api::CATEGORIES;
use crate::config::API_KEY_LENGTH;
use crate::types::{
    Secret, Validation, ensure, ensure_http_url, ensure_not_empty, lowercase_set, remote_enum,
};
use declarative::remote_map::{decode_enum, encode_enum};
use declarative::{RemoteMapEntry, RemoteType, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

remote_enum! {
    /// How indexer changes are pushed to the application.
    pub enum SyncLevel {
        Disabled = "disabled" => "disabled",
        #[default]
        AddAndRemoveOnly = "add_and_remove_only" => "addOnly",
        FullSync = "full_sync" => "fullSync",
    }
}

/// An application link definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    /// Prowlarr's URL as the application sees it.
    #[serde(default)]
    pub prowlarr_url: String,

    /// The application's URL as Prowlarr sees it.
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub sync_level: SyncLevel,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(flatten)]
    pub app: ApplicationType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ApplicationType {
    LazyLibrary(LazyLibrary),
    Lidarr(Lidarr),
    Mylar(Mylar),
    Radarr(Radarr),
    Readarr(Readarr),
    Sonarr(Sonarr),
    Whisparr(Whisparr),
}

impl ApplicationType {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::LazyLibrary(_) => "lazylibrary",
            Self::Lidarr(_) => "lidarr",
            Self::Mylar(_) => "mylar",
            Self::Radarr(_) => "radarr",
            Self::Readarr(_) => "readarr",
            Self::Sonarr(_) => "sonarr",
            Self::Whisparr(_) => "whisparr",
        }
    }

    /// Whether the API key follows the 32 character *arr format.
    fn uses_arr_api_key(&self) -> bool {
        !matches!(self, Self::LazyLibrary(_) | Self::Mylar(_))
    }

    fn credentials(&self) -> (&Secret, &BTreeSet<String>) {
        match self {
            Self::LazyLibrary(a) => (&a.api_key, &a.sync_categories),
            Self::Lidarr(a) => (&a.api_key, &a.sync_categories),
            Self::Mylar(a) => (&a.api_key, &a.sync_categories),
            Self::Radarr(a) => (&a.api_key, &a.sync_categories),
            Self::Readarr(a) => (&a.api_key, &a.sync_categories),
            Self::Sonarr(a) => (&a.api_key, &a.sync_categories),
            Self::Whisparr(a) => (&a.api_key, &a.sync_categories),
        }
    }
}

fn category_set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_lowercase()).collect()
}

// ============================================================================
// Application types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LazyLibrary {
    #[serde(default)]
    pub api_key: Secret,
    #[serde(default = "book_categories", deserialize_with = "lowercase_set")]
    pub sync_categories: BTreeSet<String>,
}

fn book_categories() -> BTreeSet<String> {
    category_set(&[
        "Books/Mags",
        "Books/EBook",
        "Books/Comics",
        "Books/Technical",
        "Books/Other",
        "Books/Foreign",
    ])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lidarr {
    #[serde(default)]
    pub api_key: Secret,
    #[serde(default = "lidarr_categories", deserialize_with = "lowercase_set")]
    pub sync_categories: BTreeSet<String>,
}

fn lidarr_categories() -> BTreeSet<String> {
    category_set(&[
        "Audio/MP3",
        "Audio/Audiobook",
        "Audio/Lossless",
        "Audio/Other",
        "Audio/Foreign",
    ])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mylar {
    #[serde(default)]
    pub api_key: Secret,
    #[serde(default = "mylar_categories", deserialize_with = "lowercase_set")]
    pub sync_categories: BTreeSet<String>,
}

fn mylar_categories() -> BTreeSet<String> {
    category_set(&["Books/Comics"])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Radarr {
    #[serde(default)]
    pub api_key: Secret,
    #[serde(default = "radarr_categories", deserialize_with = "lowercase_set")]
    pub sync_categories: BTreeSet<String>,
}

fn radarr_categories() -> BTreeSet<String> {
    category_set(&[
        "Movies/Foreign",
        "Movies/Other",
        "Movies/SD",
        "Movies/HD",
        "Movies/UHD",
        "Movies/BluRay",
        "Movies/3D",
        "Movies/DVD",
        "Movies/WEB-DL",
    ])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readarr {
    #[serde(default)]
    pub api_key: Secret,
    #[serde(default = "readarr_categories", deserialize_with = "lowercase_set")]
    pub sync_categories: BTreeSet<String>,
}

fn readarr_categories() -> BTreeSet<String> {
    let mut categories = book_categories();
    categories.insert("audio/audiobook".to_string());
    categories
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sonarr {
    #[serde(default)]
    pub api_key: Secret,
    #[serde(default = "sonarr_categories", deserialize_with = "lowercase_set")]
    pub sync_categories: BTreeSet<String>,
    #[serde(default = "anime_categories", deserialize_with = "lowercase_set")]
    pub anime_sync_categories: BTreeSet<String>,
}

fn sonarr_categories() -> BTreeSet<String> {
    category_set(&["TV/WEB-DL", "TV/Foreign", "TV/SD", "TV/HD", "TV/UHD", "TV/Other"])
}

fn anime_categories() -> BTreeSet<String> {
    category_set(&["TV/Anime"])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Whisparr {
    #[serde(default)]
    pub api_key: Secret,
    #[serde(default = "whisparr_categories", deserialize_with = "lowercase_set")]
    pub sync_categories: BTreeSet<String>,
}

fn whisparr_categories() -> BTreeSet<String> {
    category_set(&[
        "XXX/DVD",
        "XXX/WMV",
        "XXX/XviD",
        "XXX/x264",
        "XXX/Pack",
        "XXX/Other",
        "XXX/SD",
        "XXX/WEB-DL",
    ])
}

impl Application {
    pub fn validate(&self, tree: &str) -> Validation {
        ensure_http_url(&self.prowlarr_url, &format!("{tree}.prowlarr_url"))?;
        ensure_http_url(&self.base_url, &format!("{tree}.base_url"))?;
        for tag in &self.tags {
            ensure_not_empty(tag, &format!("{tree}.tags"))?;
        }
        let (api_key, categories) = self.app.credentials();
        if self.app.uses_arr_api_key() {
            ensure(
                api_key.len() == API_KEY_LENGTH,
                &format!("{tree}.api_key"),
                format!("must be {API_KEY_LENGTH} characters long"),
            )?;
        } else {
            ensure_not_empty(api_key.expose(), &format!("{tree}.api_key"))?;
        }
        for category in categories {
            ensure_not_empty(category, &format!("{tree}.sync_categories"))?;
        }
        if let ApplicationType::Sonarr(sonarr) = &self.app {
            for category in &sonarr.anime_sync_categories {
                ensure_not_empty(category, &format!("{tree}.anime_sync_categories"))?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Resource kind
// ============================================================================

const IMPLEMENTATIONS: Implementations = Implementations::new(&[
    ("lazylibrary", "LazyLibrarian"),
    ("lidarr", "Lidarr"),
    ("mylar", "Mylar"),
    ("radarr", "Radarr"),
    ("readarr", "Readarr"),
    ("sonarr", "Sonarr"),
    ("whisparr", "Whisparr"),
]);

pub struct Applications;

impl ResourceKind for Applications {
    type Definition = Application;

    fn name(&self) -> &'static str {
        "applications"
    }

    fn local_type(&self, definition: &Application) -> Option<String> {
        Some(definition.app.type_name().to_string())
    }

    fn remote_type(&self, raw: &Value) -> RemoteType {
        IMPLEMENTATIONS.remote_type(raw)
    }

    fn remote_map(&self, kind: Option<&str>) -> Vec<RemoteMapEntry> {
        let mut entries = vec![
            RemoteMapEntry::field("prowlarr_url", "prowlarrUrl"),
            RemoteMapEntry::field("base_url", "baseUrl"),
            RemoteMapEntry::attr("sync_level", "syncLevel")
                .codec(decode_enum::<SyncLevel>, encode_enum::<SyncLevel>),
            TAGS_ENTRY,
        ];
        if kind.is_some() {
            entries.push(RemoteMapEntry::field("api_key", "apiKey").secret());
            entries.push(RemoteMapEntry::field("sync_categories", "syncCategories").lookup(CATEGORIES));
        }
        if kind == Some("sonarr") {
            entries.push(
                RemoteMapEntry::field("anime_sync_categories", "animeSyncCategories").lookup(CATEGORIES),
            );
        }
        entries
    }

    fn matches_schema(&self, kind: &str, schema: &Value) -> bool {
        IMPLEMENTATIONS.matches_schema(kind, schema)
    }
}
