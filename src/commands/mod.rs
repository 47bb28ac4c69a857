//! Subcommand implementations

pub mod apply;
pub mod diff;
pub mod dump_config;
pub mod test_config;

use crate::config::Config;
use crate::secrets::{Secrets, test_connection};
use crate::ui;
use anyhow::Result;
use prowlarr_api::{HttpBackend, SystemStatus};
use std::path::Path;

/// Config path of the instance settings, used to name definitions in logs.
pub const SETTINGS_TREE: &str = "prowlarr.settings";

/// A validated configuration and a live connection to its instance.
pub struct Session {
    pub config: Config,
    pub backend: HttpBackend,
    pub status: SystemStatus,
}

impl Session {
    /// Load and validate the config file, then connect to the instance it names.
    pub fn open(config_path: &Path) -> Result<Self> {
        let config = Config::load_validated(config_path)?;
        let secrets = Secrets::resolve(&config.prowlarr, config.timeout())?;
        let backend = secrets.backend();
        let status = test_connection(&backend)?;
        log::info!(
            "connected to {} {} at {}",
            status.app_name,
            status.version,
            secrets.host_url
        );
        Ok(Self {
            config,
            backend,
            status,
        })
    }

    pub fn print(&self) {
        ui::kv("Instance", &self.config.prowlarr.host_url());
        ui::kv("Version", &self.status.version);
    }
}
