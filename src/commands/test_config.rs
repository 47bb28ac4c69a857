use crate::Context;
use crate::config::Config;
use crate::settings::ProwlarrSettings;
use crate::ui;
use anyhow::Result;
use std::path::Path;

/// Parse and validate the configuration file, without connecting
pub fn run(ctx: &Context, config_path: &Path) -> Result<()> {
    let config = Config::load_validated(config_path)?;
    ui::success(&format!("{} is valid", config_path.display()));
    if ctx.quiet {
        return Ok(());
    }

    ui::kv("Instance", &config.prowlarr.host_url());
    for (section, count) in definition_counts(&config.prowlarr.settings) {
        ui::kv(section, &count.to_string());
    }
    Ok(())
}

/// Number of definitions declared per section.
pub fn definition_counts(settings: &ProwlarrSettings) -> [(&'static str, usize); 7] {
    [
        ("tags", settings.tags.definitions.len()),
        ("indexers", settings.indexers.indexers.definitions.len()),
        ("proxies", settings.indexers.proxies.definitions.len()),
        ("applications", settings.apps.applications.definitions.len()),
        ("sync profiles", settings.apps.sync_profiles.definitions.len()),
        ("download clients", settings.download_clients.definitions.len()),
        ("notifications", settings.notifications.definitions.len()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_definition_counts() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prowlarr.yml");
        fs::write(
            &path,
            r"
prowlarr:
  settings:
    tags:
      definitions: [anime, movies]
    apps:
      sync_profiles:
        definitions:
          Standard: {}
",
        )
        .unwrap();
        let config = Config::load_validated(&path).unwrap();
        let counts = definition_counts(&config.prowlarr.settings);
        assert_eq!(counts[0], ("tags", 2));
        assert_eq!(counts[4], ("sync profiles", 1));
        assert_eq!(counts[1], ("indexers", 0));
    }

    #[test]
    fn test_invalid_config_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prowlarr.yml");
        fs::write(&path, "prowlarr:\n  port: 0\n").unwrap();
        let ctx = Context {
            verbose: 0,
            quiet: true,
        };
        assert!(run(&ctx, &path).is_err());
    }
}
