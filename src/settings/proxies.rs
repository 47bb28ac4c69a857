//! Indexer proxies (`/api/v1/indexerproxy`)

use super::{Implementations, TAGS_ENTRY};
use crate::types::{Secret, Validation, ensure, ensure_http_url, ensure_not_empty, ensure_port};
use declarative::{RemoteMapEntry, RemoteType, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// An indexer proxy definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proxy {
    /// Indexers with a matching tag are routed through this proxy.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(flatten)]
    pub proxy: ProxyType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProxyType {
    FlareSolverr(FlareSolverr),
    Http(HttpProxy),
    Socks4(SocksProxy),
    Socks5(SocksProxy),
}

impl ProxyType {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::FlareSolverr(_) => "flaresolverr",
            Self::Http(_) => "http",
            Self::Socks4(_) => "socks4",
            Self::Socks5(_) => "socks5",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlareSolverr {
    #[serde(default)]
    pub host_url: String,
    /// Seconds to wait for a challenge to be solved.
    #[serde(default = "flaresolverr_timeout")]
    pub request_timeout: u32,
}

fn flaresolverr_timeout() -> u32 {
    60
}

/// HTTP proxy server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpProxy {
    #[serde(default)]
    pub hostname: String,
    #[serde(default = "http_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret>,
}

fn http_port() -> u16 {
    8080
}

/// SOCKS4 or SOCKS5 proxy server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocksProxy {
    #[serde(default)]
    pub hostname: String,
    #[serde(default = "socks_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret>,
}

fn socks_port() -> u16 {
    1080
}

impl Proxy {
    pub fn validate(&self, tree: &str) -> Validation {
        for tag in &self.tags {
            ensure_not_empty(tag, &format!("{tree}.tags"))?;
        }
        match &self.proxy {
            ProxyType::FlareSolverr(p) => {
                ensure_http_url(&p.host_url, &format!("{tree}.host_url"))?;
                ensure(
                    p.request_timeout > 0,
                    &format!("{tree}.request_timeout"),
                    "must be a positive number of seconds",
                )
            }
            ProxyType::Http(p) => ensure_server(&p.hostname, p.port, tree),
            ProxyType::Socks4(p) | ProxyType::Socks5(p) => ensure_server(&p.hostname, p.port, tree),
        }
    }
}

fn ensure_server(hostname: &str, port: u16, tree: &str) -> Validation {
    ensure_not_empty(hostname, &format!("{tree}.hostname"))?;
    ensure_port(port, &format!("{tree}.port"))
}

const IMPLEMENTATIONS: Implementations = Implementations::new(&[
    ("flaresolverr", "FlareSolverr"),
    ("http", "Http"),
    ("socks4", "Socks4"),
    ("socks5", "Socks5"),
]);

pub struct Proxies;

impl ResourceKind for Proxies {
    type Definition = Proxy;

    fn name(&self) -> &'static str {
        "proxies"
    }

    fn local_type(&self, definition: &Proxy) -> Option<String> {
        Some(definition.proxy.type_name().to_string())
    }

    fn remote_type(&self, raw: &Value) -> RemoteType {
        IMPLEMENTATIONS.remote_type(raw)
    }

    fn remote_map(&self, kind: Option<&str>) -> Vec<RemoteMapEntry> {
        let mut entries = vec![TAGS_ENTRY];
        match kind {
            Some("flaresolverr") => entries.extend([
                RemoteMapEntry::field("host_url", "host"),
                RemoteMapEntry::field("request_timeout", "requestTimeout"),
            ]),
            Some(_) => entries.extend([
                RemoteMapEntry::field("hostname", "host"),
                RemoteMapEntry::field("port", "port"),
                RemoteMapEntry::field("username", "username").optional(),
                RemoteMapEntry::field("password", "password").secret().optional(),
            ]),
            None => {}
        }
        entries
    }

    fn matches_schema(&self, kind: &str, schema: &Value) -> bool {
        IMPLEMENTATIONS.matches_schema(kind, schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::Lookups;
    use declarative::snapshot::decode_remote;
    use serde_json::json;

    #[test]
    fn test_default_ports() {
        let http: Proxy = serde_yaml::from_str("type: http\nhostname: proxy\n").unwrap();
        let socks: Proxy = serde_yaml::from_str("type: socks5\nhostname: proxy\n").unwrap();
        let ProxyType::Http(http) = http.proxy else {
            panic!("expected http");
        };
        let ProxyType::Socks5(socks) = socks.proxy else {
            panic!("expected socks5");
        };
        assert_eq!(http.port, 8080);
        assert_eq!(socks.port, 1080);
    }

    #[test]
    fn test_decode_flaresolverr() {
        let raw = json!({
            "id": 1,
            "name": "FlareSolverr",
            "implementation": "FlareSolverr",
            "tags": [],
            "fields": [
                {"name": "host", "value": "http://flaresolverr:8191/"},
                {"name": "requestTimeout", "value": 60}
            ]
        });
        let proxy = decode_remote(&Proxies, raw, &Lookups::new())
            .unwrap()
            .definition
            .unwrap();
        assert_eq!(
            proxy.proxy,
            ProxyType::FlareSolverr(FlareSolverr {
                host_url: "http://flaresolverr:8191/".to_string(),
                request_timeout: 60,
            })
        );
        assert!(proxy.validate("t").is_ok());
    }

    #[test]
    fn test_flaresolverr_needs_url() {
        let proxy: Proxy = serde_yaml::from_str("type: flaresolverr\nhost_url: flaresolverr\n").unwrap();
        assert_eq!(proxy.validate("t").unwrap_err().tree, "t.host_url");
    }
}
