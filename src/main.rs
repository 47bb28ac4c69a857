mod api;
mod cli;
mod commands;
mod config;
mod secrets;
mod settings;
mod types;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Command::Apply(args) => commands::apply::run(&ctx, &cli.config, args.dry_run, args.yes),
        Command::Diff => commands::diff::run(&ctx, &cli.config),
        Command::DumpConfig(args) => commands::dump_config::run(&args.url, args.api_key),
        Command::TestConfig => commands::test_config::run(&ctx, &cli.config),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "prowlarr-sync", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(err) = &result {
        ui::error(&format!("{err:#}"));
        if let Some(api_err) = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<prowlarr_api::Error>())
        {
            let category = api_err.category();
            ui::dim(&format!("{}: {}", category.description(), category.advice()));
        }
        std::process::exit(1);
    }
    Ok(())
}
