//! Connection secrets for a Prowlarr instance

use crate::config::InstanceConfig;
use crate::types::Secret;
use anyhow::{Context, Result};
use prowlarr_api::{Backend, Credentials, Error, HttpBackend, InitializeJs, SystemStatus, initialize};
use std::time::Duration;

/// Environment variable consulted when the config file has no API key.
pub const API_KEY_ENV: &str = "PROWLARR_API_KEY";

/// Where the API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Config,
    Environment,
    Discovered,
}

/// Authenticated connection parameters, passed to every reconcile call.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub host_url: String,
    pub api_key: Secret,
    pub source: KeySource,
    pub timeout: Duration,
}

impl Secrets {
    /// Resolve the API key for an instance.
    ///
    /// The config file wins over `PROWLARR_API_KEY`. Without either, the key
    /// is read from `initialize.js`, which only works while authentication
    /// is disabled for this host.
    pub fn resolve(instance: &InstanceConfig, timeout: Duration) -> Result<Self> {
        let env_key = std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty());
        Self::resolve_with(instance, timeout, env_key)
    }

    fn resolve_with(
        instance: &InstanceConfig,
        timeout: Duration,
        env_key: Option<String>,
    ) -> Result<Self> {
        let host_url = instance.host_url();
        let (api_key, source) = if let Some(key) = &instance.api_key {
            (key.clone(), KeySource::Config)
        } else if let Some(key) = env_key {
            (Secret::new(key), KeySource::Environment)
        } else {
            let discovered = initialize::fetch(&host_url, None, timeout)
                .with_context(|| format!("Could not fetch initialize.js from {host_url}"))?;
            (discovered_key(&host_url, discovered)?, KeySource::Discovered)
        };
        log::debug!("{host_url}: using API key from {source:?}");
        Ok(Self {
            host_url,
            api_key,
            source,
            timeout,
        })
    }

    /// Secrets for an explicit URL and key.
    pub fn from_parts(host_url: impl Into<String>, api_key: Secret, timeout: Duration) -> Self {
        Self {
            host_url: host_url.into(),
            api_key,
            source: KeySource::Config,
            timeout,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.host_url, self.api_key.expose())
    }

    /// HTTP backend authenticated with these secrets.
    pub fn backend(&self) -> HttpBackend {
        HttpBackend::with_timeout(self.credentials(), self.timeout)
    }
}

/// The key embedded in `initialize.js`, if authentication let it through.
fn discovered_key(host_url: &str, discovered: InitializeJs) -> Result<Secret> {
    match discovered.api_key {
        Some(key) => Ok(Secret::new(key)),
        None => Err(Error::MissingApiKey {
            host_url: host_url.to_string(),
        })
        .with_context(|| {
            format!("Set prowlarr.api_key in the config file or {API_KEY_ENV} in the environment")
        }),
    }
}

/// Check that the server answers and accepts the key.
pub fn test_connection(backend: &dyn Backend) -> Result<SystemStatus> {
    backend
        .system_status()
        .context("Could not query system status, check the URL and API key")
}
