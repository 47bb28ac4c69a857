use crate::settings::SettingsReport;
use colored::Colorize;
use declarative::Action;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Plan Display
// ============================================================================

const RULE: &str = "─────────────────────────────────────────────────────";

/// Print a report as a boxed plan
pub fn display_report(report: &SettingsReport, show_unchanged: bool) {
    println!();
    println!("{}", render_report(report, show_unchanged));
}

/// Render a report, one block per collection with something to show.
///
/// Unchanged and unmanaged definitions only appear with `show_unchanged`.
pub fn render_report(report: &SettingsReport, show_unchanged: bool) -> String {
    let mut lines = vec![
        format!("┌─ {} ─────────────────────────────────────────┐", "Plan".bold()),
        "│".to_string(),
    ];

    if !report.tags_created.is_empty() || !report.tags_deleted.is_empty() {
        lines.push(format!("│ {}", "tags".bold()));
        for label in &report.tags_created {
            lines.push(format!("│   {} {label:<30} {}", "+".green(), "(create)".dimmed()));
        }
        for tag in &report.tags_deleted {
            lines.push(format!("│   {} {:<30} {}", "-".red(), tag.label, "(delete)".dimmed()));
        }
        lines.push("│".to_string());
    }

    for section in &report.sections {
        let mut block = Vec::new();
        for action in &section.plan.actions {
            match action {
                Action::Create { name, .. } => {
                    block.push(format!("│   {} {name:<30} {}", "+".green(), "(create)".dimmed()));
                }
                Action::Update { name, changes, .. } => {
                    block.push(format!(
                        "│   {} {name:<30} {}",
                        "~".yellow(),
                        format!("({} changed)", changes.len()).dimmed()
                    ));
                    for change in changes {
                        block.push(format!("│       {}", change.to_string().dimmed()));
                    }
                }
                Action::Delete { name, .. } => {
                    block.push(format!("│   {} {name:<30} {}", "-".red(), "(delete)".dimmed()));
                }
                Action::Unmanaged { name, .. } if show_unchanged => {
                    block.push(format!("│   {} {name:<30} {}", "?".dimmed(), "(unmanaged)".dimmed()));
                }
                Action::Unchanged { name } if show_unchanged => {
                    block.push(format!("│   {} {name:<30} {}", "=".dimmed(), "(up to date)".dimmed()));
                }
                Action::Unmanaged { .. } | Action::Unchanged { .. } => {}
            }
        }
        if block.is_empty() {
            continue;
        }
        lines.push(format!("│ {}", section.plan.tree.bold()));
        lines.extend(block);
        lines.push("│".to_string());
    }

    let summary = report.summary();
    let tag_changes = report.tags_created.len() + report.tags_deleted.len();
    lines.push(format!("├{RULE}┤"));
    lines.push(format!(
        "│ Summary: {} changes ({} created, {} modified, {} removed, {} tag changes)",
        (summary.total_changes() + tag_changes).to_string().bold(),
        summary.created.to_string().green(),
        summary.modified.to_string().yellow(),
        summary.removed.to_string().red(),
        tag_changes
    ));
    lines.push(format!("└{RULE}┘"));
    lines.join("\n")
}

/// Print what an apply run did
pub fn print_summary(report: &SettingsReport) {
    let summary = report.summary();
    println!();
    println!("  {} Configuration applied successfully!", "✓".green().bold());
    if !report.tags_created.is_empty() {
        println!("    • {} tags created", report.tags_created.len());
    }
    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} resources modified", summary.modified);
    }
    if summary.removed > 0 {
        println!("    • {} resources removed", summary.removed);
    }
    if !report.tags_deleted.is_empty() {
        println!("    • {} tags removed", report.tags_deleted.len());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{ExecuteSummary, FieldChange, Plan, Reconciled};
    use prowlarr_api::Tag;
    use serde_json::json;

    fn report() -> SettingsReport {
        let actions = vec![
            Action::Create {
                name: "Deluge".to_string(),
                payload: json!({}),
            },
            Action::Update {
                name: "Transmission".to_string(),
                id: 1,
                changes: vec![
                    FieldChange {
                        attr: "port".to_string(),
                        old: json!(9092),
                        new: json!(9091),
                        secret: false,
                    },
                    FieldChange {
                        attr: "password".to_string(),
                        old: json!("old"),
                        new: json!("new"),
                        secret: true,
                    },
                ],
                payload: json!({}),
            },
            Action::Unchanged {
                name: "qBittorrent".to_string(),
            },
        ];
        let plan = Plan {
            kind: "download_clients",
            tree: "prowlarr.settings.download_clients".to_string(),
            actions,
        };
        let summary = plan.summary();
        SettingsReport {
            tags_created: vec!["anime".to_string()],
            sections: vec![Reconciled { plan, summary }],
            tags_deleted: vec![Tag {
                id: 3,
                label: "old".to_string(),
            }],
        }
    }

    #[test]
    fn test_render_report() {
        colored::control::set_override(false);
        let rendered = render_report(&report(), false);
        assert!(rendered.contains("│ prowlarr.settings.download_clients"));
        assert!(rendered.contains("+ Deluge"));
        assert!(rendered.contains("~ Transmission"));
        assert!(rendered.contains("port: 9092 -> 9091"));
        assert!(rendered.contains("+ anime"));
        assert!(rendered.contains("- old"));
        assert!(!rendered.contains("qBittorrent"));
        assert!(rendered.contains("Summary: 4 changes (1 created, 1 modified, 0 removed, 2 tag changes)"));
    }

    #[test]
    fn test_render_masks_secrets() {
        colored::control::set_override(false);
        let rendered = render_report(&report(), false);
        assert!(rendered.contains("password: ******** -> ********"));
        assert!(!rendered.contains("\"new\""));
    }

    #[test]
    fn test_render_unchanged_when_asked() {
        colored::control::set_override(false);
        let rendered = render_report(&report(), true);
        assert!(rendered.contains("= qBittorrent"));
    }

    #[test]
    fn test_render_skips_quiet_sections() {
        colored::control::set_override(false);
        let plan = Plan {
            kind: "indexers",
            tree: "prowlarr.settings.indexers.indexers".to_string(),
            actions: vec![Action::Unchanged {
                name: "Nyaa".to_string(),
            }],
        };
        let report = SettingsReport {
            sections: vec![Reconciled {
                plan,
                summary: ExecuteSummary::default(),
            }],
            ..SettingsReport::default()
        };
        let rendered = render_report(&report, false);
        assert!(!rendered.contains("indexers"));
        assert!(rendered.contains("Summary: 0 changes"));
    }
}
