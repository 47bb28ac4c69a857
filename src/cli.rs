use crate::config::DEFAULT_CONFIG_PATH;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "prowlarr-sync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative configuration for Prowlarr instances", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (.yml, .yaml or .toml)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Bring the Prowlarr instance in line with the configuration file
    Apply(ApplyArgs),

    /// Show what apply would change, without changing anything
    Diff,

    /// Print the configuration of a running instance as YAML
    DumpConfig(DumpConfigArgs),

    /// Parse and validate the configuration file without connecting
    TestConfig,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Command Arguments
// ============================================================================

#[derive(Args)]
pub struct ApplyArgs {
    /// Plan and log every change without making it
    #[arg(long)]
    pub dry_run: bool,

    /// Apply without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct DumpConfigArgs {
    /// Instance URL, e.g. http://localhost:9696/prowlarr
    pub url: String,

    /// API key, prompted for when omitted
    #[arg(short = 'k', long, env = "PROWLARR_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let cli = Cli::try_parse_from(["prowlarr-sync", "-vv", "apply", "--dry-run"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert!(args.dry_run);
        assert!(!args.yes);
    }

    #[test]
    fn test_config_is_global() {
        let cli = Cli::try_parse_from(["prowlarr-sync", "test-config", "-c", "other.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(matches!(cli.command, Command::TestConfig));
    }

    #[test]
    fn test_dump_config_requires_url() {
        assert!(Cli::try_parse_from(["prowlarr-sync", "dump-config"]).is_err());
        let cli = Cli::try_parse_from([
            "prowlarr-sync",
            "dump-config",
            "http://localhost:9696",
            "--api-key",
            "abc",
        ])
        .unwrap();
        let Command::DumpConfig(args) = cli.command else {
            panic!("expected dump-config");
        };
        assert_eq!(args.url, "http://localhost:9696");
        assert_eq!(args.api_key.as_deref(), Some("abc"));
    }
}
