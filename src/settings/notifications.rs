//! Notification connections (`/api/v1/notification`)

use super::{Implementations, TAGS_ENTRY};
use crate::types::{
    Secret, Validation, default_true, ensure, ensure_http_url, ensure_not_empty, ensure_port,
    remote_enum,
};
use declarative::remote_map::{decode_enum, encode_enum, join_comma_list, sorted, split_comma_list};
use declarative::{RemoteMapEntry, RemoteType, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

remote_enum! {
    /// Sections of a Discord message sent when a release is grabbed.
    pub enum OnGrabField {
        #[default]
        Overview = "overview" => 0,
        Rating = "rating" => 1,
        Genres = "genres" => 2,
        Quality = "quality" => 3,
        Group = "group" => 4,
        Size = "size" => 5,
        Links = "links" => 6,
        Release = "release" => 7,
        Poster = "poster" => 8,
        Fanart = "fanart" => 9,
    }
}

remote_enum! {
    /// Sections of a Discord message sent when a release is imported.
    pub enum OnImportField {
        #[default]
        Overview = "overview" => 0,
        Rating = "rating" => 1,
        Genres = "genres" => 2,
        Quality = "quality" => 3,
        Codecs = "codecs" => 4,
        Group = "group" => 5,
        Size = "size" => 6,
        Languages = "languages" => 7,
        Subtitles = "subtitles" => 8,
        Links = "links" => 9,
        Release = "release" => 10,
        Poster = "poster" => 11,
        Fanart = "fanart" => 12,
    }
}

remote_enum! {
    pub enum GotifyPriority {
        Min = "min" => 0,
        Low = "low" => 2,
        #[default]
        Normal = "normal" => 5,
        High = "high" => 8,
    }
}

remote_enum! {
    /// Priority scale shared by Join and Pushover.
    pub enum PushPriority {
        Silent = "silent" => -2,
        Quiet = "quiet" => -1,
        #[default]
        Normal = "normal" => 0,
        High = "high" => 1,
        Emergency = "emergency" => 2,
    }
}

remote_enum! {
    pub enum ProwlPriority {
        VeryLow = "verylow" => -2,
        Low = "low" => -1,
        #[default]
        Normal = "normal" => 0,
        High = "high" => 1,
        Emergency = "emergency" => 2,
    }
}

remote_enum! {
    pub enum WebhookMethod {
        #[default]
        Post = "POST" => 1,
        Put = "PUT" => 2,
    }
}

/// Events a connection is notified about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationTriggers {
    #[serde(default)]
    pub on_health_issue: bool,
    /// Also notify on health warnings. Only applies with `on_health_issue`.
    #[serde(default)]
    pub include_health_warnings: bool,
    #[serde(default)]
    pub on_application_update: bool,
}

/// A notification connection definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub notification_triggers: NotificationTriggers,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(flatten)]
    pub connection: ConnectionType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionType {
    Boxcar(Boxcar),
    CustomScript(CustomScript),
    Discord(Discord),
    Email(Email),
    Gotify(Gotify),
    Join(Join),
    Notifiarr(Notifiarr),
    Prowl(Prowl),
    Pushbullet(Pushbullet),
    Pushover(Pushover),
    SendGrid(SendGrid),
    Slack(Slack),
    Telegram(Telegram),
    Twitter(Twitter),
    Webhook(Webhook),
}

impl ConnectionType {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boxcar(_) => "boxcar",
            Self::CustomScript(_) => "customscript",
            Self::Discord(_) => "discord",
            Self::Email(_) => "email",
            Self::Gotify(_) => "gotify",
            Self::Join(_) => "join",
            Self::Notifiarr(_) => "notifiarr",
            Self::Prowl(_) => "prowl",
            Self::Pushbullet(_) => "pushbullet",
            Self::Pushover(_) => "pushover",
            Self::SendGrid(_) => "sendgrid",
            Self::Slack(_) => "slack",
            Self::Telegram(_) => "telegram",
            Self::Twitter(_) => "twitter",
            Self::Webhook(_) => "webhook",
        }
    }
}

// ============================================================================
// Connection types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boxcar {
    #[serde(default)]
    pub access_token: Secret,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomScript {
    /// Script to run, on the Prowlarr host.
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discord {
    #[serde(default)]
    pub webhook_url: String,
    /// Overrides the username of the webhook.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_grab_fields")]
    pub on_grab_fields: BTreeSet<OnGrabField>,
    #[serde(default = "default_import_fields")]
    pub on_import_fields: BTreeSet<OnImportField>,
}

fn default_grab_fields() -> BTreeSet<OnGrabField> {
    use OnGrabField::{Fanart, Genres, Links, Overview, Poster, Quality, Rating, Release, Size};
    BTreeSet::from([Overview, Rating, Genres, Quality, Size, Links, Release, Poster, Fanart])
}

fn default_import_fields() -> BTreeSet<OnImportField> {
    use OnImportField::{
        Codecs, Fanart, Genres, Group, Languages, Links, Overview, Poster, Quality, Rating,
        Release, Size, Subtitles,
    };
    BTreeSet::from([
        Overview, Rating, Genres, Quality, Codecs, Group, Size, Languages, Subtitles, Links,
        Release, Poster, Fanart,
    ])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    #[serde(default)]
    pub server: String,
    #[serde(default = "email_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub use_encryption: bool,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Secret,
    #[serde(default)]
    pub from_address: String,
    #[serde(default)]
    pub recipient_addresses: Vec<String>,
    #[serde(default)]
    pub cc_addresses: Vec<String>,
    #[serde(default)]
    pub bcc_addresses: Vec<String>,
}

fn email_port() -> u16 {
    587
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gotify {
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub app_token: Secret,
    #[serde(default)]
    pub priority: GotifyPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    #[serde(default)]
    pub api_key: Secret,
    #[serde(default)]
    pub device_names: BTreeSet<String>,
    #[serde(default)]
    pub priority: PushPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notifiarr {
    #[serde(default)]
    pub api_key: Secret,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prowl {
    #[serde(default)]
    pub api_key: Secret,
    #[serde(default)]
    pub priority: ProwlPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pushbullet {
    #[serde(default)]
    pub api_key: Secret,
    #[serde(default)]
    pub device_ids: Vec<String>,
    #[serde(default)]
    pub channel_tags: Vec<String>,
    #[serde(default)]
    pub sender_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pushover {
    #[serde(default)]
    pub user_key: Secret,
    #[serde(default)]
    pub api_key: Secret,
    #[serde(default)]
    pub devices: BTreeSet<String>,
    #[serde(default)]
    pub priority: PushPriority,
    /// Seconds between emergency retries, `0` or at least 30.
    #[serde(default)]
    pub retry: u32,
    /// Seconds to keep retrying emergency alerts for.
    #[serde(default)]
    pub expire: u32,
    #[serde(default)]
    pub sound: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendGrid {
    #[serde(default)]
    pub api_key: Secret,
    #[serde(default)]
    pub from_address: String,
    #[serde(default)]
    pub recipient_addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slack {
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telegram {
    #[serde(default)]
    pub bot_token: Secret,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default)]
    pub send_silently: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Twitter {
    #[serde(default)]
    pub consumer_key: Secret,
    #[serde(default)]
    pub consumer_secret: Secret,
    #[serde(default)]
    pub access_token: Secret,
    #[serde(default)]
    pub access_token_secret: Secret,
    #[serde(default)]
    pub mention: String,
    #[serde(default = "default_true")]
    pub direct_message: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: WebhookMethod,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Secret,
}

// ============================================================================
// Validation
// ============================================================================

const PUSHOVER_KEY_LENGTH: usize = 30;
const PUSHOVER_MIN_RETRY: u32 = 30;
const PUSHOVER_MAX_EXPIRE: u32 = 86_400;

fn ensure_secret(value: &Secret, tree: &str, attr: &str) -> Validation {
    ensure_not_empty(value.expose(), &format!("{tree}.{attr}"))
}

fn ensure_address(address: &str, tree: &str) -> Validation {
    ensure(
        address.contains('@'),
        tree,
        format!("'{address}' is not an email address"),
    )
}

fn ensure_addresses(addresses: &[String], tree: &str, required: bool) -> Validation {
    if required {
        ensure(!addresses.is_empty(), tree, "at least one address is required")?;
    }
    let mut seen = BTreeSet::new();
    for address in addresses {
        ensure_address(address, tree)?;
        ensure(seen.insert(address), tree, format!("duplicate address '{address}'"))?;
    }
    Ok(())
}

impl Notification {
    pub fn validate(&self, tree: &str) -> Validation {
        for tag in &self.tags {
            ensure_not_empty(tag, &format!("{tree}.tags"))?;
        }
        match &self.connection {
            ConnectionType::Boxcar(c) => ensure_secret(&c.access_token, tree, "access_token"),
            ConnectionType::CustomScript(c) => ensure_not_empty(&c.path, &format!("{tree}.path")),
            ConnectionType::Discord(c) => ensure_http_url(&c.webhook_url, &format!("{tree}.webhook_url")),
            ConnectionType::Email(c) => {
                ensure_not_empty(&c.server, &format!("{tree}.server"))?;
                ensure_port(c.port, &format!("{tree}.port"))?;
                ensure_not_empty(&c.username, &format!("{tree}.username"))?;
                ensure_secret(&c.password, tree, "password")?;
                ensure_address(&c.from_address, &format!("{tree}.from_address"))?;
                ensure_addresses(&c.recipient_addresses, &format!("{tree}.recipient_addresses"), true)?;
                ensure_addresses(&c.cc_addresses, &format!("{tree}.cc_addresses"), false)?;
                ensure_addresses(&c.bcc_addresses, &format!("{tree}.bcc_addresses"), false)
            }
            ConnectionType::Gotify(c) => {
                ensure_http_url(&c.server, &format!("{tree}.server"))?;
                ensure_secret(&c.app_token, tree, "app_token")
            }
            ConnectionType::Join(c) => {
                ensure_secret(&c.api_key, tree, "api_key")?;
                ensure(
                    c.device_names.iter().all(|d| !d.trim().is_empty() && !d.contains(',')),
                    &format!("{tree}.device_names"),
                    "device names must be non-empty and contain no commas",
                )
            }
            ConnectionType::Notifiarr(c) => ensure_secret(&c.api_key, tree, "api_key"),
            ConnectionType::Prowl(c) => ensure_secret(&c.api_key, tree, "api_key"),
            ConnectionType::Pushbullet(c) => ensure_secret(&c.api_key, tree, "api_key"),
            ConnectionType::Pushover(c) => {
                for (attr, key) in [("user_key", &c.user_key), ("api_key", &c.api_key)] {
                    ensure(
                        key.len() == PUSHOVER_KEY_LENGTH,
                        &format!("{tree}.{attr}"),
                        format!("must be {PUSHOVER_KEY_LENGTH} characters long"),
                    )?;
                }
                ensure(
                    c.retry == 0 || c.retry >= PUSHOVER_MIN_RETRY,
                    &format!("{tree}.retry"),
                    format!("must be 0 or at least {PUSHOVER_MIN_RETRY}"),
                )?;
                ensure(
                    c.expire <= PUSHOVER_MAX_EXPIRE,
                    &format!("{tree}.expire"),
                    format!("must be at most {PUSHOVER_MAX_EXPIRE}"),
                )
            }
            ConnectionType::SendGrid(c) => {
                ensure_secret(&c.api_key, tree, "api_key")?;
                ensure_address(&c.from_address, &format!("{tree}.from_address"))?;
                ensure_addresses(&c.recipient_addresses, &format!("{tree}.recipient_addresses"), true)
            }
            ConnectionType::Slack(c) => {
                ensure_http_url(&c.webhook_url, &format!("{tree}.webhook_url"))?;
                ensure_not_empty(&c.username, &format!("{tree}.username"))
            }
            ConnectionType::Telegram(c) => {
                ensure_secret(&c.bot_token, tree, "bot_token")?;
                ensure_not_empty(&c.chat_id, &format!("{tree}.chat_id"))
            }
            ConnectionType::Twitter(c) => {
                ensure_secret(&c.consumer_key, tree, "consumer_key")?;
                ensure_secret(&c.consumer_secret, tree, "consumer_secret")?;
                ensure_secret(&c.access_token, tree, "access_token")?;
                ensure_secret(&c.access_token_secret, tree, "access_token_secret")?;
                ensure_not_empty(&c.mention, &format!("{tree}.mention"))
            }
            ConnectionType::Webhook(c) => {
                ensure_http_url(&c.url, &format!("{tree}.url"))?;
                ensure_not_empty(&c.username, &format!("{tree}.username"))?;
                ensure_secret(&c.password, tree, "password")
            }
        }
    }
}

// ============================================================================
// Resource kind
// ============================================================================

const IMPLEMENTATIONS: Implementations = Implementations::new(&[
    ("boxcar", "Boxcar"),
    ("customscript", "CustomScript"),
    ("discord", "Discord"),
    ("email", "Email"),
    ("gotify", "Gotify"),
    ("join", "Join"),
    ("notifiarr", "Notifiarr"),
    ("prowl", "Prowl"),
    ("pushbullet", "Pushbullet"),
    ("pushover", "Pushover"),
    ("sendgrid", "SendGrid"),
    ("slack", "Slack"),
    ("telegram", "Telegram"),
    ("twitter", "Twitter"),
    ("webhook", "Webhook"),
]);

const API_KEY: RemoteMapEntry = RemoteMapEntry::field("api_key", "apiKey").secret();

fn enum_field<E: declarative::RemoteEnum>(local: &'static str, remote: &'static str) -> RemoteMapEntry {
    RemoteMapEntry::field(local, remote).codec(decode_enum::<E>, encode_enum::<E>)
}

fn type_map(kind: &str) -> Vec<RemoteMapEntry> {
    match kind {
        "boxcar" => vec![RemoteMapEntry::field("access_token", "token").secret()],
        "customscript" => vec![RemoteMapEntry::field("path", "path")],
        "discord" => vec![
            RemoteMapEntry::field("webhook_url", "webHookUrl"),
            RemoteMapEntry::field("username", "username").optional(),
            RemoteMapEntry::field("avatar", "avatar").optional(),
            RemoteMapEntry::field("host", "host").optional(),
            enum_field::<OnGrabField>("on_grab_fields", "grabFields"),
            enum_field::<OnImportField>("on_import_fields", "importFields"),
        ],
        "email" => vec![
            RemoteMapEntry::field("server", "server"),
            RemoteMapEntry::field("port", "port"),
            RemoteMapEntry::field("use_encryption", "requireEncryption"),
            RemoteMapEntry::field("username", "username"),
            RemoteMapEntry::field("password", "password").secret(),
            RemoteMapEntry::field("from_address", "from"),
            RemoteMapEntry::field("recipient_addresses", "to"),
            RemoteMapEntry::field("cc_addresses", "cc"),
            RemoteMapEntry::field("bcc_addresses", "bcc"),
        ],
        "gotify" => vec![
            RemoteMapEntry::field("server", "server"),
            RemoteMapEntry::field("app_token", "appToken").secret(),
            enum_field::<GotifyPriority>("priority", "priority"),
        ],
        "join" => vec![
            API_KEY,
            RemoteMapEntry::field("device_names", "deviceNames").codec(split_comma_list, join_comma_list),
            enum_field::<PushPriority>("priority", "priority"),
        ],
        "notifiarr" => vec![API_KEY],
        "prowl" => vec![API_KEY, enum_field::<ProwlPriority>("priority", "priority")],
        "pushbullet" => vec![
            API_KEY,
            RemoteMapEntry::field("device_ids", "deviceIds"),
            RemoteMapEntry::field("channel_tags", "channelTags"),
            RemoteMapEntry::field("sender_id", "senderId").optional(),
        ],
        "pushover" => vec![
            RemoteMapEntry::field("user_key", "userKey").secret(),
            API_KEY,
            RemoteMapEntry::field("devices", "devices").encode(sorted),
            enum_field::<PushPriority>("priority", "priority"),
            RemoteMapEntry::field("retry", "retry"),
            RemoteMapEntry::field("expire", "expire"),
            RemoteMapEntry::field("sound", "sound").optional(),
        ],
        "sendgrid" => vec![
            API_KEY,
            RemoteMapEntry::field("from_address", "from"),
            RemoteMapEntry::field("recipient_addresses", "recipients"),
        ],
        "slack" => vec![
            RemoteMapEntry::field("webhook_url", "webHookUrl"),
            RemoteMapEntry::field("username", "username"),
            RemoteMapEntry::field("icon", "icon").optional(),
            RemoteMapEntry::field("channel", "channel").optional(),
        ],
        "telegram" => vec![
            RemoteMapEntry::field("bot_token", "botToken").secret(),
            RemoteMapEntry::field("chat_id", "chatId"),
            RemoteMapEntry::field("send_silently", "sendSilently"),
        ],
        "twitter" => vec![
            RemoteMapEntry::field("consumer_key", "consumerKey").secret(),
            RemoteMapEntry::field("consumer_secret", "consumerSecret").secret(),
            RemoteMapEntry::field("access_token", "accessToken").secret(),
            RemoteMapEntry::field("access_token_secret", "accessTokenSecret").secret(),
            RemoteMapEntry::field("mention", "mention"),
            RemoteMapEntry::field("direct_message", "direct_message"),
        ],
        "webhook" => vec![
            RemoteMapEntry::field("url", "url"),
            enum_field::<WebhookMethod>("method", "method"),
            RemoteMapEntry::field("username", "username"),
            RemoteMapEntry::field("password", "password").secret(),
        ],
        _ => Vec::new(),
    }
}

pub struct Notifications;

impl ResourceKind for Notifications {
    type Definition = Notification;

    fn name(&self) -> &'static str {
        "notifications"
    }

    fn local_type(&self, definition: &Notification) -> Option<String> {
        Some(definition.connection.type_name().to_string())
    }

    fn remote_type(&self, raw: &Value) -> RemoteType {
        IMPLEMENTATIONS.remote_type(raw)
    }

    fn remote_map(&self, kind: Option<&str>) -> Vec<RemoteMapEntry> {
        let mut entries = vec![
            RemoteMapEntry::attr("notification_triggers.on_health_issue", "onHealthIssue"),
            RemoteMapEntry::attr(
                "notification_triggers.include_health_warnings",
                "includeHealthWarnings",
            ),
            RemoteMapEntry::attr(
                "notification_triggers.on_application_update",
                "onApplicationUpdate",
            ),
            TAGS_ENTRY,
        ];
        entries.extend(kind.map(type_map).unwrap_or_default());
        entries
    }

    fn matches_schema(&self, kind: &str, schema: &Value) -> bool {
        IMPLEMENTATIONS.matches_schema(kind, schema)
    }
}
