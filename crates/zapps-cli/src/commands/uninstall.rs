//! Uninstall command

use colored::Colorize;

use crate::context::Runtime;
use crate::error::Result;

pub fn run_uninstall(runtime: &Runtime, id: &str) -> Result<()> {
    let report = runtime.uninstall(id)?;
    if report.was_noop() {
        println!("{} '{}' is not installed", "Nothing to do:".yellow().bold(), id);
    } else {
        println!("{} {}", "Uninstalled:".green().bold(), id.cyan());
    }
    Ok(())
}
