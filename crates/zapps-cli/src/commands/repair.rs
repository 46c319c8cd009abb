//! Repair report output

use colored::Colorize;
use zapps_core::RepairReport;

use crate::error::Result;

/// Print what the startup sweep changed.
pub fn print_repair(report: &RepairReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    if report.is_clean() {
        println!("{} nothing to repair", "OK:".green().bold());
        return Ok(());
    }

    if report.library_created {
        println!("  {} created empty library", "+".green());
    }
    for path in &report.reset_files {
        println!("  {} reset {}", "!".yellow(), path.display());
    }
    for path in &report.removed_transient {
        println!("  {} removed {}", "-".dimmed(), path.display());
    }
    if report.removed_staging > 0 {
        println!("  {} removed {} staged file(s)", "-".dimmed(), report.removed_staging);
    }
    for id in &report.adopted {
        println!("  {} adopted {}", "+".green(), id.cyan());
    }
    for id in &report.dropped {
        println!("  {} dropped {}", "-".yellow(), id.cyan());
    }
    for error in &report.errors {
        println!("  {} {}", "error:".red().bold(), error);
    }
    Ok(())
}
