//! Pin command: desktop and start-menu shortcuts

use colored::Colorize;

use crate::context::Runtime;
use crate::error::Result;
use crate::shortcut::DesktopEntryWriter;

pub fn run_pin(runtime: &Runtime, id: &str, name: Option<&str>) -> Result<()> {
    let exe = std::env::current_exe()?;
    let written = runtime.create_shortcut(id, name, &exe, &DesktopEntryWriter)?;

    if written.is_empty() {
        println!(
            "{} no shortcut destinations are available",
            "warning:".yellow().bold()
        );
    }
    for path in &written {
        println!("{} {}", "Pinned:".green().bold(), path.display());
    }
    Ok(())
}
