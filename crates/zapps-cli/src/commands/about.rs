//! About command

use colored::Colorize;

use crate::context::Runtime;
use crate::error::Result;

pub fn run_about(runtime: &Runtime, json: bool) -> Result<()> {
    let about = runtime.about();
    if json {
        println!("{}", serde_json::to_string_pretty(&about)?);
        return Ok(());
    }

    println!("{} {}", about.name.bold(), about.version);
    println!("  {:<14} {}", "identity".dimmed(), about.identity);
    println!("  {:<14} {}", "launch mode".dimmed(), about.launch_mode);
    println!("  {:<14} {}", "user data".dimmed(), about.user_data.display());
    println!("  {:<14} {}", "packages".dimmed(), about.package_root.display());
    Ok(())
}
