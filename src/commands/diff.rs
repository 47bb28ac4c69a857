use super::{SETTINGS_TREE, Session};
use crate::Context;
use crate::ui;
use anyhow::Result;
use declarative::ReconcileOptions;
use std::path::Path;

/// Show what applying the configuration file would change
pub fn run(ctx: &Context, config_path: &Path) -> Result<()> {
    ui::header("Configuration Diff");

    let session = Session::open(config_path)?;
    if !ctx.quiet {
        session.print();
    }

    let report = session.config.prowlarr.settings.reconcile(
        SETTINGS_TREE,
        &session.backend,
        ReconcileOptions { dry_run: true },
    )?;

    if report.changed() {
        ui::display_report(&report, ctx.verbose > 0);
        println!();
        ui::dim("Run 'prowlarr-sync apply' to make these changes");
    } else {
        ui::success("No changes - current state matches desired state");
    }
    Ok(())
}
