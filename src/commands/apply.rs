use super::{SETTINGS_TREE, Session};
use crate::Context;
use crate::settings::{ProwlarrSettings, SettingsReport};
use crate::ui;
use anyhow::Result;
use declarative::ReconcileOptions;
use prowlarr_api::Backend;
use std::path::Path;

/// Apply the configuration file to its instance
pub fn run(ctx: &Context, config_path: &Path, dry_run: bool, yes: bool) -> Result<()> {
    ui::header("Applying Prowlarr Configuration");
    if dry_run {
        ui::warn("Dry run - no changes will be made");
    }

    let session = Session::open(config_path)?;
    if !ctx.quiet {
        session.print();
    }

    let settings = &session.config.prowlarr.settings;
    let report = execute(settings, &session.backend, dry_run, |plan| {
        if !ctx.quiet {
            ui::display_report(plan, ctx.verbose > 0);
        }
        if yes || dry_run {
            Ok(true)
        } else {
            confirm_proceed()
        }
    })?;

    match report {
        Some(report) => ui::print_summary(&report),
        None if dry_run => ui::info("Dry run complete"),
        None => {}
    }
    Ok(())
}

/// Plan every section, then apply the plan once `review` accepts it.
///
/// `review` sees every plan with changes, dry runs included. Returns the
/// report of the applied run, or `None` when nothing was applied: the plan
/// had no changes, this is a dry run, or `review` declined.
pub fn execute(
    settings: &ProwlarrSettings,
    backend: &dyn Backend,
    dry_run: bool,
    review: impl FnOnce(&SettingsReport) -> Result<bool>,
) -> Result<Option<SettingsReport>> {
    let plan = settings.reconcile(SETTINGS_TREE, backend, ReconcileOptions { dry_run: true })?;
    if !plan.changed() {
        ui::success("No changes - current state matches desired state");
        return Ok(None);
    }
    if !review(&plan)? || dry_run {
        return Ok(None);
    }
    let report = settings.reconcile(SETTINGS_TREE, backend, ReconcileOptions::default())?;
    Ok(Some(report))
}

fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}
