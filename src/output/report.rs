//! Operator facing reports printed to stdout.

use super::terminal::{format_field, rule};
use crate::dashboard::Organization;
use crate::processing::{
    preview, ApplyReport, NetworkAction, NetworkOutcome, Outcome, Plan, Preview, RowResult,
    Scope, ValidationReport,
};
use colored::Colorize;
use std::path::Path;

const WIDTH: usize = 60;

/// Organizations visible with the current credentials.
pub fn print_organizations(orgs: &[Organization]) {
    println!("{}", "API connection successful!".green().bold());
    println!("\nFound {} organization(s):", orgs.len());
    for org in orgs {
        println!("  - {} (ID: {})", format_field(&org.name, 30), org.id);
    }
}

/// Every violation as `Row N: <field>: <rule>`, then the verdict.
pub fn print_validation(report: &ValidationReport) {
    println!("{}", rule("VALIDATION", WIDTH));
    for error in &report.errors {
        println!("{}", error.to_string().red());
    }
    if report.is_valid() {
        println!(
            "{} {} rows checked, all valid",
            "VALID".on_green(),
            report.row_count
        );
    } else {
        println!(
            "{} {} rows checked, {} error(s)",
            "INVALID".on_red(),
            report.row_count,
            report.errors.len()
        );
    }
}

/// Lines of a dry-run plan under `scope`, uncolored. Operations the command
/// would not perform carry a SKIP or FAIL marker.
pub fn plan_lines(plan: &Plan, scope: Scope) -> Vec<String> {
    let mut lines = Vec::new();
    for network in &plan.networks {
        if let NetworkAction::Unavailable { reason, .. } = &network.action {
            lines.push(format!(
                "SKIP network '{}': VLANs could not be read ({reason})",
                network.name
            ));
        }
    }
    lines.extend(preview(plan, scope).iter().map(|(op, fate)| match fate {
        Preview::Run => op.to_string(),
        Preview::Skip(why) => format!("SKIP {op}: {why}"),
        Preview::Fail(why) => format!("FAIL {op}: {why}"),
    }));
    lines
}

pub fn print_plan(plan: &Plan, scope: Scope) {
    println!("{}", rule("DRY RUN", WIDTH).yellow());
    let lines = plan_lines(plan, scope);
    if lines.is_empty() {
        println!("Nothing to do, dashboard already matches the spreadsheet.");
    }
    for line in lines {
        println!("  {line}");
    }
    println!(
        "{} operation(s) planned, {} VLAN(s) unchanged. No changes made.",
        preview(plan, scope)
            .iter()
            .filter(|(_, fate)| *fate == Preview::Run)
            .count(),
        plan.unchanged_count()
    );
}

/// One line per row result, uncolored.
pub fn row_line(row: &RowResult) -> String {
    format!(
        "Row {} {} vlan {}: {}",
        format_field(row.row, 4),
        format_field(&row.network, 20),
        format_field(row.vlan_id, 4),
        row.outcome
    )
}

pub fn print_apply_report(report: &ApplyReport) {
    println!("{}", rule("RESULT", WIDTH));
    for network in &report.networks {
        let line = match &network.outcome {
            NetworkOutcome::Existing => format!("network '{}': exists", network.name).normal(),
            NetworkOutcome::Created(id) => {
                format!("network '{}': created ({id})", network.name).green()
            }
            NetworkOutcome::Skipped => {
                format!("network '{}': missing, creation not in scope", network.name).yellow()
            }
            NetworkOutcome::Unavailable(why) => {
                format!("network '{}': VLANs unavailable: {why}", network.name).red()
            }
            NetworkOutcome::Failed(why) => {
                format!("network '{}': failed: {why}", network.name).red()
            }
        };
        println!("{line}");
    }
    for row in &report.rows {
        let line = row_line(row);
        let line = match row.outcome {
            Outcome::Created | Outcome::Updated => line.green(),
            Outcome::Unchanged => line.normal(),
            Outcome::Skipped(_) => line.yellow(),
            Outcome::Aborted(_) | Outcome::Failed(_) => line.red(),
        };
        println!("{line}");
    }
    println!(
        "Summary: {} network(s) created, {} VLAN(s) created, {} updated, {} unchanged, {} skipped, {} aborted, {} failed",
        report.networks_created(),
        report.created(),
        report.updated(),
        report.unchanged(),
        report.skipped(),
        report.aborted(),
        report.failures()
    );
    if report.is_success() {
        println!("{}", "Apply completed successfully".green().bold());
    } else {
        println!("{}", "Apply completed with errors".red().bold());
    }
}

pub fn print_export_summary(path: &Path, vlans: usize, networks: usize) {
    println!("\n{}", "Export completed successfully!".green().bold());
    println!("Total VLANs exported: {vlans}");
    println!("Networks processed: {networks}");
    println!("Output file: {}", path.display());
}
