use crate::config::{Config, InstanceConfig, Protocol};
use crate::secrets::{Secrets, test_connection};
use crate::settings::ProwlarrSettings;
use crate::types::Secret;
use anyhow::{Context, Result, bail};
use prowlarr_api::Backend;
use url::Url;

/// Print the configuration of a running instance as YAML
pub fn run(url: &str, api_key: Option<String>) -> Result<()> {
    let mut instance = instance_from_url(url)?;
    let api_key = match api_key.filter(|key| !key.is_empty()) {
        Some(key) => key,
        None => prompt_api_key()?,
    };
    instance.api_key = Some(Secret::new(api_key));

    let config = Config::new(instance);
    let secrets = Secrets::from_parts(
        config.prowlarr.host_url(),
        config.prowlarr.api_key.clone().unwrap_or_default(),
        config.timeout(),
    );
    let backend = secrets.backend();
    let status = test_connection(&backend)?;
    log::info!("dumping {} {} at {}", status.app_name, status.version, secrets.host_url);

    print!("{}", dump(config, &backend)?);
    Ok(())
}

/// Connection settings for the instance at `raw`.
///
/// A missing port defaults to the scheme's, and any path becomes the URL base.
pub fn instance_from_url(raw: &str) -> Result<InstanceConfig> {
    let url = Url::parse(raw).with_context(|| format!("Invalid URL: {raw}"))?;
    let protocol = match url.scheme() {
        "http" => Protocol::Http,
        "https" => Protocol::Https,
        other => bail!("Unsupported URL scheme '{other}', expected http or https"),
    };
    let hostname = url
        .host_str()
        .filter(|host| !host.is_empty())
        .with_context(|| format!("URL has no host: {raw}"))?;
    let port = url.port().unwrap_or(protocol.default_port());

    let mut instance = InstanceConfig::new(hostname, port, protocol);
    let path = url.path().trim_matches('/');
    if !path.is_empty() {
        instance.url_base = Some(format!("/{path}"));
    }
    Ok(instance)
}

/// Render `config` with its settings replaced by those read from `backend`.
pub fn dump(mut config: Config, backend: &dyn Backend) -> Result<String> {
    config.prowlarr.settings = ProwlarrSettings::from_remote(backend)?;
    serde_yaml::to_string(&config).context("Could not serialize configuration")
}

fn prompt_api_key() -> Result<String> {
    use dialoguer::Password;

    let key = Password::new()
        .with_prompt("Prowlarr API key")
        .interact()?;

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prowlarr_api::{MockBackend, Resource};
    use serde_json::json;

    #[test]
    fn test_instance_from_url() {
        let instance = instance_from_url("https://prowlarr.example.com/prowlarr/").unwrap();
        assert_eq!(instance.hostname, "prowlarr.example.com");
        assert_eq!(instance.port, 443);
        assert_eq!(instance.protocol, Protocol::Https);
        assert_eq!(instance.url_base.as_deref(), Some("/prowlarr"));
        assert_eq!(instance.host_url(), "https://prowlarr.example.com:443/prowlarr");
    }

    #[test]
    fn test_instance_from_url_with_port() {
        let instance = instance_from_url("http://localhost:9696").unwrap();
        assert_eq!(instance.port, 9696);
        assert_eq!(instance.protocol, Protocol::Http);
        assert!(instance.url_base.is_none());
    }

    #[test]
    fn test_instance_from_url_rejects_other_schemes() {
        assert!(instance_from_url("ftp://localhost").is_err());
        assert!(instance_from_url("not a url").is_err());
    }

    #[test]
    fn test_dump_parses_back() {
        let mock = MockBackend::new();
        let anime = mock.add_tag("anime");
        mock.add_resource(
            Resource::AppProfile,
            json!({
                "name": "Standard",
                "enableRss": true,
                "enableInteractiveSearch": true,
                "enableAutomaticSearch": false,
                "minimumSeeders": 2,
                "tags": [anime]
            }),
        );

        let config = Config::new(instance_from_url("http://localhost:9696").unwrap());
        let yaml = dump(config, &mock).unwrap();
        assert!(yaml.contains("anime"));
        assert!(yaml.contains("Standard"));

        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert!(parsed.validate().is_ok());
        let profile = parsed
            .prowlarr
            .settings
            .apps
            .sync_profiles
            .definitions
            .get("Standard")
            .unwrap();
        assert!(!profile.enable_automatic_search);
        assert_eq!(profile.minimum_seeders, 2);
    }
}
