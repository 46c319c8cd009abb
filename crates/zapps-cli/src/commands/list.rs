//! Library listing

use colored::Colorize;
use zapps_core::LibraryRecord;

use crate::context::Runtime;
use crate::error::Result;

/// Print installed packages, as a table or as JSON.
pub fn run_list(runtime: &Runtime, json: bool) -> Result<()> {
    let records = runtime.library()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    print_records(&records);
    Ok(())
}

/// The terminal stand-in for the launcher window.
pub fn print_launcher(runtime: &Runtime) -> Result<()> {
    runtime.show_launcher()?;
    println!("{} Zapps library", "zapps".green().bold());
    println!();
    print_records(&runtime.library()?);
    println!();
    println!(
        "Run {} to open a bundle or {} to start an installed one.",
        "zapps <bundle.zapp>".cyan(),
        "zapps launch <id>".cyan()
    );
    Ok(())
}

fn print_records(records: &[LibraryRecord]) {
    if records.is_empty() {
        println!("{}", "No packages installed.".dimmed());
        return;
    }
    for record in records {
        println!(
            "  {:<32} {:<24} {}",
            record.id.green(),
            record.display_name(),
            record.version.as_deref().unwrap_or("-").dimmed()
        );
    }
}
