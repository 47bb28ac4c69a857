//! Configuration file loading and validation

use crate::settings::ProwlarrSettings;
use crate::types::{Secret, Validation, ensure, ensure_not_empty};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "prowlarr.yml";

/// Length of a Prowlarr API key
pub const API_KEY_LENGTH: usize = 32;

/// Longest accepted request timeout, in seconds (one day)
pub const MAX_REQUEST_TIMEOUT: f64 = 86_400.0;

// ============================================================================
// Main Config
// ============================================================================

/// Configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Timeout of every HTTP request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: f64,

    pub prowlarr: InstanceConfig,
}

fn default_request_timeout() -> f64 {
    30.0
}

impl Config {
    /// Config for one instance, with the default request timeout.
    pub fn new(prowlarr: InstanceConfig) -> Self {
        Self {
            request_timeout: default_request_timeout(),
            prowlarr,
        }
    }

    /// Load a config file, picking the format from its extension.
    ///
    /// `.toml` files are read as TOML, everything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let config: Self = if is_toml {
            toml::from_str(&content)
                .with_context(|| format!("Invalid TOML format in {}", path.display()))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML format in {}", path.display()))?
        };
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn load_validated(path: &Path) -> Result<Self> {
        let config = Self::load(path)?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Validation {
        ensure(
            self.request_timeout > 0.0 && self.request_timeout <= MAX_REQUEST_TIMEOUT,
            "request_timeout",
            format!("must be a number of seconds between 0 and {MAX_REQUEST_TIMEOUT}"),
        )?;
        self.prowlarr.validate("prowlarr")
    }

    /// Request timeout, or the default when the configured value is out of range.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_timeout)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or_else(|| Duration::from_secs_f64(default_request_timeout()))
    }
}

// ============================================================================
// Instance
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Http => "http",
            Self::Https => "https",
        })
    }
}

/// Connection settings and desired state of one Prowlarr instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceConfig {
    #[serde(default = "default_hostname")]
    pub hostname: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub protocol: Protocol,

    /// Path prefix Prowlarr is served under, e.g. `/prowlarr`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_base: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<Secret>,

    #[serde(default)]
    pub settings: ProwlarrSettings,
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    9696
}

impl InstanceConfig {
    /// Connection settings with no desired state.
    pub fn new(hostname: impl Into<String>, port: u16, protocol: Protocol) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            protocol,
            url_base: None,
            api_key: None,
            settings: ProwlarrSettings::default(),
        }
    }

    /// Base URL of the instance, without a trailing slash.
    pub fn host_url(&self) -> String {
        let url_base = self
            .url_base
            .as_deref()
            .map(|base| base.trim_matches('/'))
            .filter(|base| !base.is_empty())
            .map(|base| format!("/{base}"))
            .unwrap_or_default();
        format!("{}://{}:{}{url_base}", self.protocol, self.hostname, self.port)
    }

    pub fn validate(&self, tree: &str) -> Validation {
        ensure_not_empty(&self.hostname, &format!("{tree}.hostname"))?;
        ensure(self.port != 0, &format!("{tree}.port"), "must be between 1 and 65535")?;
        if let Some(api_key) = &self.api_key {
            ensure(
                api_key.len() == API_KEY_LENGTH,
                &format!("{tree}.api_key"),
                format!("must be {API_KEY_LENGTH} characters long"),
            )?;
        }
        self.settings.validate(&format!("{tree}.settings"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_yaml_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "prowlarr.yml", "prowlarr: {}\n");
        let config = Config::load_validated(&path).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.prowlarr.host_url(), "http://localhost:9696");
        assert!(config.prowlarr.api_key.is_none());
        assert!(config.prowlarr.settings.tags.definitions.is_empty());
    }

    #[test]
    fn test_load_toml() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "prowlarr.toml",
            r#"
request_timeout = 5.5

[prowlarr]
hostname = "prowlarr.lan"
port = 443
protocol = "https"
url_base = "/prowlarr/"
"#,
        );
        let config = Config::load_validated(&path).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs_f64(5.5));
        assert_eq!(config.prowlarr.host_url(), "https://prowlarr.lan:443/prowlarr");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "prowlarr.yml", "prowlarr:\n  hostnme: typo\n");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_api_key_length() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "prowlarr.yml", "prowlarr:\n  api_key: short\n");
        let err = Config::load(&path).unwrap().validate().unwrap_err();
        assert_eq!(err.tree, "prowlarr.api_key");
    }

    #[test]
    fn test_invalid_timeout() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "prowlarr.yml", "request_timeout: 0\nprowlarr: {}\n");
        let err = Config::load(&path).unwrap().validate().unwrap_err();
        assert_eq!(err.tree, "request_timeout");
    }

    #[test]
    fn test_huge_timeout_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "prowlarr.yml", "request_timeout: 1.0e+30\nprowlarr: {}\n");
        let config = Config::load(&path).unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.tree, "request_timeout");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_timeout_upper_bound_accepted() {
        let mut config = Config::new(InstanceConfig::new("localhost", 9696, Protocol::Http));
        config.request_timeout = MAX_REQUEST_TIMEOUT;
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/prowlarr.yml")).unwrap_err();
        assert!(err.to_string().contains("Could not read config file"));
    }
}
