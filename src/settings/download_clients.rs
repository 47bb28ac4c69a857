//! Download clients (`/api/v1/downloadclient`)
//!
//! Only torrent clients are managed. Remote usenet clients are reported as
//! unmanaged, or deleted when `delete_unmanaged` is set.

use super::{Implementations, TAGS_ENTRY};
use crate::types::{
    Secret, Validation, default_true, ensure, ensure_not_empty, ensure_port, remote_enum,
};
use declarative::remote_map::{decode_enum, encode_enum, sorted};
use declarative::{RemoteMapEntry, RemoteType, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

remote_enum! {
    /// Where new torrents are placed in the client queue.
    pub enum QueuePriority {
        #[default]
        Last = "last" => 0,
        First = "first" => 1,
    }
}

remote_enum! {
    pub enum RtorrentPriority {
        VeryLow = "verylow" => 0,
        Low = "low" => 1,
        #[default]
        Normal = "normal" => 2,
        High = "high" => 3,
    }
}

remote_enum! {
    /// State of a torrent right after it is added.
    pub enum InitialState {
        #[default]
        Start = "start" => 0,
        ForceStart = "force_start" => 1,
        Pause = "pause" => 2,
    }
}

remote_enum! {
    pub enum UtorrentState {
        #[default]
        Start = "start" => 0,
        ForceStart = "force_start" => 1,
        Pause = "pause" => 2,
        Stop = "stop" => 3,
    }
}

remote_enum! {
    /// Media attributes Flood adds as torrent tags.
    pub enum FloodMediaTag {
        #[default]
        TitleSlug = "title_slug" => 0,
        Quality = "quality" => 1,
        Language = "language" => 2,
        ReleaseGroup = "release_group" => 3,
        Year = "year" => 4,
        Indexer = "indexer" => 5,
        Network = "network" => 6,
    }
}

/// A download client definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadClient {
    #[serde(default = "default_true")]
    pub enable: bool,

    /// Lower values are preferred; equal priorities are used round-robin.
    #[serde(default = "default_priority")]
    pub priority: u32,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(flatten)]
    pub client: ClientType,
}

fn default_priority() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientType {
    Aria2(Aria2),
    Deluge(Deluge),
    #[serde(rename = "downloadstation-torrent")]
    DownloadStationTorrent(DownloadStation),
    Flood(Flood),
    Hadouken(Hadouken),
    Qbittorrent(Qbittorrent),
    #[serde(alias = "rutorrent")]
    Rtorrent(Rtorrent),
    TorrentBlackhole(TorrentBlackhole),
    Transmission(Transmission),
    Vuze(Transmission),
    Utorrent(Utorrent),
}

impl ClientType {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Aria2(_) => "aria2",
            Self::Deluge(_) => "deluge",
            Self::DownloadStationTorrent(_) => "downloadstation-torrent",
            Self::Flood(_) => "flood",
            Self::Hadouken(_) => "hadouken",
            Self::Qbittorrent(_) => "qbittorrent",
            Self::Rtorrent(_) => "rtorrent",
            Self::TorrentBlackhole(_) => "torrent-blackhole",
            Self::Transmission(_) => "transmission",
            Self::Vuze(_) => "vuze",
            Self::Utorrent(_) => "utorrent",
        }
    }
}

// ============================================================================
// Client types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aria2 {
    #[serde(default)]
    pub host: String,
    #[serde(default = "aria2_port")]
    pub port: u16,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default = "aria2_rpc_path")]
    pub rpc_path: String,
    #[serde(default)]
    pub secret_token: Secret,
}

fn aria2_port() -> u16 {
    6800
}

fn aria2_rpc_path() -> String {
    "/rpc".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deluge {
    #[serde(default)]
    pub host: String,
    #[serde(default = "deluge_port")]
    pub port: u16,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default)]
    pub url_base: Option<String>,
    #[serde(default)]
    pub password: Secret,
    #[serde(default = "default_category")]
    pub category: Option<String>,
    #[serde(default)]
    pub client_priority: QueuePriority,
}

fn deluge_port() -> u16 {
    8112
}

fn default_category() -> Option<String> {
    Some("prowlarr".to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadStation {
    #[serde(default)]
    pub host: String,
    #[serde(default = "download_station_port")]
    pub port: u16,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Secret,
    #[serde(default)]
    pub category: Option<String>,
    /// Shared folder to put downloads into, relative to the DiskStation.
    #[serde(default)]
    pub directory: Option<String>,
}

fn download_station_port() -> u16 {
    5000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flood {
    #[serde(default)]
    pub host: String,
    #[serde(default = "flood_port")]
    pub port: u16,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default)]
    pub url_base: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Secret,
    #[serde(default)]
    pub destination: Option<String>,
    /// Tags Flood applies to every added torrent.
    #[serde(default = "flood_tags")]
    pub flood_tags: BTreeSet<String>,
    #[serde(default)]
    pub additional_tags: BTreeSet<FloodMediaTag>,
    #[serde(default)]
    pub add_paused: bool,
}

fn flood_port() -> u16 {
    3000
}

fn flood_tags() -> BTreeSet<String> {
    BTreeSet::from(["prowlarr".to_string()])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hadouken {
    #[serde(default)]
    pub host: String,
    #[serde(default = "hadouken_port")]
    pub port: u16,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default)]
    pub url_base: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Secret,
    #[serde(default = "hadouken_category")]
    pub category: String,
}

fn hadouken_port() -> u16 {
    7070
}

fn hadouken_category() -> String {
    "prowlarr".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qbittorrent {
    #[serde(default)]
    pub host: String,
    #[serde(default = "webui_port")]
    pub port: u16,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default)]
    pub url_base: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Secret,
    #[serde(default = "default_category")]
    pub category: Option<String>,
    #[serde(default)]
    pub client_priority: QueuePriority,
    #[serde(default)]
    pub initial_state: InitialState,
}

fn webui_port() -> u16 {
    8080
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rtorrent {
    #[serde(default)]
    pub host: String,
    #[serde(default = "webui_port")]
    pub port: u16,
    #[serde(default)]
    pub use_ssl: bool,
    /// XMLRPC endpoint path.
    #[serde(default = "rtorrent_url_base")]
    pub url_base: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Secret,
    #[serde(default = "default_category")]
    pub category: Option<String>,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub client_priority: RtorrentPriority,
    #[serde(default)]
    pub add_stopped: bool,
}

fn rtorrent_url_base() -> String {
    "RPC2".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentBlackhole {
    #[serde(default)]
    pub torrent_folder: String,
    #[serde(default)]
    pub save_magnet_files: bool,
    #[serde(default = "magnet_file_extension")]
    pub magnet_file_extension: String,
}

fn magnet_file_extension() -> String {
    ".magnet".to_string()
}

/// Transmission, and Vuze through its Transmission-compatible RPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transmission {
    #[serde(default)]
    pub host: String,
    #[serde(default = "transmission_port")]
    pub port: u16,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default = "transmission_url_base")]
    pub url_base: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub client_priority: QueuePriority,
    #[serde(default)]
    pub add_paused: bool,
}

fn transmission_port() -> u16 {
    9091
}

fn transmission_url_base() -> String {
    "/transmission/".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utorrent {
    #[serde(default)]
    pub host: String,
    #[serde(default = "webui_port")]
    pub port: u16,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default)]
    pub url_base: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Secret,
    #[serde(default = "default_category")]
    pub category: Option<String>,
    #[serde(default)]
    pub client_priority: QueuePriority,
    #[serde(default)]
    pub initial_state: UtorrentState,
}

// ============================================================================
// Validation
// ============================================================================

fn ensure_server(host: &str, port: u16, tree: &str) -> Validation {
    ensure_not_empty(host, &format!("{tree}.host"))?;
    ensure_port(port, &format!("{tree}.port"))
}

fn ensure_login(username: &str, password: &Secret, tree: &str) -> Validation {
    ensure_not_empty(username, &format!("{tree}.username"))?;
    ensure_not_empty(password.expose(), &format!("{tree}.password"))
}

impl DownloadClient {
    pub fn validate(&self, tree: &str) -> Validation {
        for tag in &self.tags {
            ensure_not_empty(tag, &format!("{tree}.tags"))?;
        }
        match &self.client {
            ClientType::Aria2(c) => {
                ensure_server(&c.host, c.port, tree)?;
                ensure_not_empty(&c.rpc_path, &format!("{tree}.rpc_path"))
            }
            ClientType::Deluge(c) => {
                ensure_server(&c.host, c.port, tree)?;
                ensure_not_empty(c.password.expose(), &format!("{tree}.password"))
            }
            ClientType::DownloadStationTorrent(c) => {
                ensure_server(&c.host, c.port, tree)?;
                ensure_login(&c.username, &c.password, tree)
            }
            ClientType::Flood(c) => {
                ensure_server(&c.host, c.port, tree)?;
                ensure_login(&c.username, &c.password, tree)?;
                ensure(
                    c.flood_tags.iter().all(|t| !t.trim().is_empty()),
                    &format!("{tree}.flood_tags"),
                    "tags must not be empty",
                )
            }
            ClientType::Hadouken(c) => {
                ensure_server(&c.host, c.port, tree)?;
                ensure_login(&c.username, &c.password, tree)?;
                ensure_not_empty(&c.category, &format!("{tree}.category"))
            }
            ClientType::Qbittorrent(c) => {
                ensure_server(&c.host, c.port, tree)?;
                ensure_login(&c.username, &c.password, tree)
            }
            ClientType::Rtorrent(c) => {
                ensure_server(&c.host, c.port, tree)?;
                ensure_login(&c.username, &c.password, tree)?;
                ensure_not_empty(&c.url_base, &format!("{tree}.url_base"))
            }
            ClientType::TorrentBlackhole(c) => {
                ensure_not_empty(&c.torrent_folder, &format!("{tree}.torrent_folder"))?;
                ensure_not_empty(&c.magnet_file_extension, &format!("{tree}.magnet_file_extension"))
            }
            ClientType::Transmission(c) | ClientType::Vuze(c) => {
                ensure_server(&c.host, c.port, tree)?;
                ensure_not_empty(&c.url_base, &format!("{tree}.url_base"))
            }
            ClientType::Utorrent(c) => {
                ensure_server(&c.host, c.port, tree)?;
                ensure_login(&c.username, &c.password, tree)
            }
        }
    }
}

// ============================================================================
// Resource kind
// ============================================================================

const IMPLEMENTATIONS: Implementations = Implementations::new(&[
    ("aria2", "Aria2"),
    ("deluge", "Deluge"),
    ("downloadstation-torrent", "TorrentDownloadStation"),
    ("flood", "Flood"),
    ("hadouken", "Hadouken"),
    ("qbittorrent", "QBittorrent"),
    ("rtorrent", "RTorrent"),
    ("torrent-blackhole", "TorrentBlackhole"),
    ("transmission", "Transmission"),
    ("vuze", "Vuze"),
    ("utorrent", "UTorrent"),
]);

const HOST: RemoteMapEntry = RemoteMapEntry::field("host", "host");
const PORT: RemoteMapEntry = RemoteMapEntry::field("port", "port");
const USE_SSL: RemoteMapEntry = RemoteMapEntry::field("use_ssl", "useSsl");
const URL_BASE: RemoteMapEntry = RemoteMapEntry::field("url_base", "urlBase").optional();
const USERNAME: RemoteMapEntry = RemoteMapEntry::field("username", "username");
const PASSWORD: RemoteMapEntry = RemoteMapEntry::field("password", "password").secret();
const CATEGORY: RemoteMapEntry = RemoteMapEntry::field("category", "category").optional();

fn client_priority(remote: &'static str) -> RemoteMapEntry {
    RemoteMapEntry::field("client_priority", remote)
        .codec(decode_enum::<QueuePriority>, encode_enum::<QueuePriority>)
}

fn type_map(kind: &str) -> Vec<RemoteMapEntry> {
    match kind {
        "aria2" => vec![
            HOST,
            PORT,
            USE_SSL,
            RemoteMapEntry::field("rpc_path", "rpcPath"),
            RemoteMapEntry::field("secret_token", "secretToken").secret(),
        ],
        "deluge" => vec![HOST, PORT, USE_SSL, URL_BASE, PASSWORD, CATEGORY, client_priority("priority")],
        "downloadstation-torrent" => vec![
            HOST,
            PORT,
            USE_SSL,
            USERNAME,
            PASSWORD,
            RemoteMapEntry::field("category", "tvCategory").optional(),
            RemoteMapEntry::field("directory", "tvDirectory").optional(),
        ],
        "flood" => vec![
            HOST,
            PORT,
            USE_SSL,
            URL_BASE,
            USERNAME,
            PASSWORD,
            RemoteMapEntry::field("destination", "destination").optional(),
            RemoteMapEntry::field("flood_tags", "tags").encode(sorted),
            RemoteMapEntry::field("additional_tags", "additionalTags")
                .codec(decode_enum::<FloodMediaTag>, encode_enum::<FloodMediaTag>),
            RemoteMapEntry::field("add_paused", "addPaused"),
        ],
        "hadouken" => vec![
            HOST,
            PORT,
            USE_SSL,
            URL_BASE,
            USERNAME,
            PASSWORD,
            RemoteMapEntry::field("category", "category"),
        ],
        "qbittorrent" => vec![
            HOST,
            PORT,
            USE_SSL,
            URL_BASE,
            USERNAME,
            PASSWORD,
            CATEGORY,
            client_priority("priority"),
            RemoteMapEntry::field("initial_state", "initialState")
                .codec(decode_enum::<InitialState>, encode_enum::<InitialState>),
        ],
        "rtorrent" => vec![
            HOST,
            PORT,
            USE_SSL,
            RemoteMapEntry::field("url_base", "urlBase"),
            USERNAME,
            PASSWORD,
            CATEGORY,
            RemoteMapEntry::field("directory", "directory").optional(),
            RemoteMapEntry::field("client_priority", "recentTvPriority")
                .codec(decode_enum::<RtorrentPriority>, encode_enum::<RtorrentPriority>),
            RemoteMapEntry::field("add_stopped", "addStopped"),
        ],
        "torrent-blackhole" => vec![
            RemoteMapEntry::field("torrent_folder", "torrentFolder"),
            RemoteMapEntry::field("save_magnet_files", "saveMagnetFiles"),
            RemoteMapEntry::field("magnet_file_extension", "magnetFileExtension"),
        ],
        "transmission" | "vuze" => vec![
            HOST,
            PORT,
            USE_SSL,
            RemoteMapEntry::field("url_base", "urlBase"),
            RemoteMapEntry::field("username", "username").optional(),
            PASSWORD.optional(),
            CATEGORY,
            RemoteMapEntry::field("directory", "directory").optional(),
            client_priority("priority"),
            RemoteMapEntry::field("add_paused", "addPaused"),
        ],
        "utorrent" => vec![
            HOST,
            PORT,
            USE_SSL,
            URL_BASE,
            USERNAME,
            PASSWORD,
            CATEGORY,
            client_priority("priority"),
            RemoteMapEntry::field("initial_state", "initialState")
                .codec(decode_enum::<UtorrentState>, encode_enum::<UtorrentState>),
        ],
        _ => Vec::new(),
    }
}

pub struct DownloadClients;

impl ResourceKind for DownloadClients {
    type Definition = DownloadClient;

    fn name(&self) -> &'static str {
        "download_clients"
    }

    fn local_type(&self, definition: &DownloadClient) -> Option<String> {
        Some(definition.client.type_name().to_string())
    }

    fn remote_type(&self, raw: &Value) -> RemoteType {
        IMPLEMENTATIONS.remote_type(raw)
    }

    fn remote_map(&self, kind: Option<&str>) -> Vec<RemoteMapEntry> {
        let mut entries = vec![
            RemoteMapEntry::attr("enable", "enable"),
            RemoteMapEntry::attr("priority", "priority"),
            TAGS_ENTRY,
        ];
        entries.extend(kind.map(type_map).unwrap_or_default());
        entries
    }

    fn matches_schema(&self, kind: &str, schema: &Value) -> bool {
        IMPLEMENTATIONS.matches_schema(kind, schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::snapshot::decode_remote;
    use declarative::{LookupTable, Lookups};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn lookups() -> Lookups {
        let mut lookups = Lookups::new();
        lookups.insert(LookupTable::from_pairs("tags", [("anime", 1)]));
        lookups
    }

    fn qbittorrent_remote() -> Value {
        json!({
            "id": 4,
            "name": "qBittorrent",
            "implementation": "QBittorrent",
            "enable": true,
            "priority": 2,
            "tags": [1],
            "fields": [
                {"name": "host", "value": "qbittorrent"},
                {"name": "port", "value": 8080},
                {"name": "useSsl", "value": false},
                {"name": "urlBase", "value": ""},
                {"name": "username", "value": "admin"},
                {"name": "password", "value": "adminadmin"},
                {"name": "category", "value": "prowlarr"},
                {"name": "priority", "value": 1},
                {"name": "initialState", "value": 2},
                {"name": "sequentialOrder", "value": false}
            ]
        })
    }

    #[test]
    fn test_parse_transmission_defaults() {
        let client: DownloadClient =
            serde_yaml::from_str("type: transmission\nhost: transmission\n").unwrap();
        assert!(client.enable);
        assert_eq!(client.priority, 1);
        let ClientType::Transmission(transmission) = &client.client else {
            panic!("expected transmission, got {client:?}");
        };
        assert_eq!(transmission.port, 9091);
        assert_eq!(transmission.url_base, "/transmission/");
        assert!(transmission.password.is_none());
        assert!(client.validate("t").is_ok());
    }

    #[test]
    fn test_rutorrent_alias() {
        let client: DownloadClient =
            serde_yaml::from_str("type: rutorrent\nhost: h\nusername: u\npassword: p\n").unwrap();
        assert_eq!(client.client.type_name(), "rtorrent");
    }

    #[test]
    fn test_decode_qbittorrent() {
        let remote = decode_remote(&DownloadClients, qbittorrent_remote(), &lookups()).unwrap();
        assert_eq!(remote.kind, RemoteType::Known("qbittorrent".to_string()));
        let client = remote.definition.unwrap();
        assert_eq!(client.priority, 2);
        assert_eq!(client.tags, BTreeSet::from(["anime".to_string()]));
        let ClientType::Qbittorrent(qbit) = client.client else {
            panic!("expected qbittorrent");
        };
        assert_eq!(qbit.url_base, None);
        assert_eq!(qbit.client_priority, QueuePriority::First);
        assert_eq!(qbit.initial_state, InitialState::Pause);
        assert_eq!(qbit.password.expose(), "adminadmin");
    }

    #[test]
    fn test_priority_attr_and_field_are_distinct() {
        let entries = DownloadClients.remote_map(Some("deluge"));
        let local = json!({
            "enable": true,
            "priority": 5,
            "tags": [],
            "type": "deluge",
            "host": "deluge",
            "port": 8112,
            "use_ssl": false,
            "url_base": null,
            "password": "deluge",
            "category": "prowlarr",
            "client_priority": "first"
        });
        let encoded = declarative::mapping::encode(&local, &entries, &lookups(), false).unwrap();
        assert_eq!(encoded.attrs["priority"], json!(5));
        assert!(encoded.fields.contains(&("priority".to_string(), json!(1))));
    }

    #[test]
    fn test_download_station_category_and_directory() {
        let entries = type_map("downloadstation-torrent");
        let remotes: Vec<_> = entries
            .iter()
            .filter(|e| e.local == "category" || e.local == "directory")
            .map(|e| e.remote)
            .collect();
        assert_eq!(remotes, vec!["tvCategory", "tvDirectory"]);
    }

    #[test]
    fn test_usenet_client_is_unsupported() {
        let raw = json!({"id": 9, "name": "SABnzbd", "implementation": "Sabnzbd"});
        assert_eq!(
            DownloadClients.remote_type(&raw),
            RemoteType::Unsupported("Sabnzbd".to_string())
        );
    }

    #[test]
    fn test_schema_matching() {
        let schema = json!({"implementation": "TorrentDownloadStation", "implementationName": "Download Station"});
        assert!(DownloadClients.matches_schema("downloadstation-torrent", &schema));
        assert!(!DownloadClients.matches_schema("transmission", &schema));
    }

    #[test]
    fn test_validation_errors() {
        let client: DownloadClient = serde_yaml::from_str("type: qbittorrent\nhost: qbit\n").unwrap();
        let err = client.validate("download_clients.definitions['qBittorrent']").unwrap_err();
        assert_eq!(err.tree, "download_clients.definitions['qBittorrent'].username");
    }

    #[test]
    fn test_flood_tags_sorted() {
        let client: DownloadClient = serde_yaml::from_str(
            "type: flood\nhost: h\nusername: u\npassword: p\nadditional_tags: [year, quality]\n",
        )
        .unwrap();
        let local = serde_json::to_value(&client).unwrap();
        let encoded =
            declarative::mapping::encode(&local, &DownloadClients.remote_map(Some("flood")), &lookups(), false)
                .unwrap();
        assert!(encoded.fields.contains(&("additionalTags".to_string(), json!([1, 4]))));
        assert!(encoded.fields.contains(&("tags".to_string(), json!(["prowlarr"]))));
    }
}
