//! Runtime update commands

use colored::Colorize;
use tokio_stream::StreamExt;
use zapps_core::{UpdateEvent, UpdateOutcome};

use crate::context::Runtime;
use crate::error::{CliError, Result};

/// Check the feed, printing status events as they arrive.
pub async fn run_check_update(runtime: &Runtime) -> Result<()> {
    let mut events = runtime.subscribe_updates();
    let check = runtime.check_for_update();
    tokio::pin!(check);

    let outcome = loop {
        tokio::select! {
            biased;
            Some(event) = events.next() => print_event(&event),
            outcome = &mut check => break outcome?,
        }
    };

    // Events published just before the check returned.
    loop {
        let pending = tokio::select! {
            biased;
            event = events.next() => event,
            _ = std::future::ready(()) => None,
        };
        match pending {
            Some(event) => print_event(&event),
            None => break,
        }
    }

    match outcome {
        UpdateOutcome::UpToDate { current } => {
            println!("{} {} is current", "Up to date:".green().bold(), current);
        }
        UpdateOutcome::Downloaded(release) => {
            println!(
                "Run {} to install {}.",
                "zapps restart-update".cyan(),
                release.version
            );
        }
    }
    Ok(())
}

fn print_event(event: &UpdateEvent) {
    match event {
        UpdateEvent::Progress { percent } => {
            tracing::debug!(percent, "download progress");
        }
        other => {
            if let Some(text) = other.status_text() {
                println!("{}", text.dimmed());
            }
        }
    }
}

/// Hand a downloaded update to the host.
pub fn run_restart_update(runtime: &Runtime) -> Result<()> {
    if runtime.restart_to_apply_update() {
        println!("{} restarting to apply update", "Update:".green().bold());
        Ok(())
    } else {
        Err(CliError::user(
            "no downloaded update to apply; run `zapps check-update` first",
        ))
    }
}
