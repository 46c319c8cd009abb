//! Zapps CLI
//!
//! Installs, launches and manages `.zapp` application bundles.

mod cli;
mod commands;
mod context;
mod error;
mod host;
mod shortcut;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zapps_core::{EntryAction, RepairReport};

use cli::{Cli, Commands, StorageAction};
use context::{Runtime, RuntimeOptions, open_runtime};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = RuntimeOptions {
        data_dir: cli.data_dir.clone(),
        direct: cli.direct,
        headless: cli.headless,
    };
    let (runtime, report) = open_runtime(&options)?;

    match cli.command {
        Some(cmd) => execute_command(&runtime, &report, cmd),
        None => match zapps_core::entry_action(cli.bundle.iter()) {
            EntryAction::OpenBundle(bundle) => commands::run_open(&runtime, &bundle),
            EntryAction::ShowLauncher => match cli.bundle {
                Some(other) => Err(error::CliError::user(format!(
                    "'{}' is not a .zapp bundle",
                    other.display()
                ))),
                None => commands::print_launcher(&runtime),
            },
        },
    }
}

/// Logs go to stderr. `--verbose` forces debug; otherwise `RUST_LOG`
/// applies, defaulting to warnings only.
fn init_tracing(verbose: bool) {
    let result = if verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };
    if let Err(e) = result {
        eprintln!("{}: cannot install log subscriber: {e}", "warning".yellow().bold());
    }
    tracing::debug!("verbose mode enabled");
}

fn execute_command(runtime: &Runtime, report: &RepairReport, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Install { bundle } => commands::run_install(runtime, &bundle),
        Commands::Open { bundle } => commands::run_open(runtime, &bundle),
        Commands::Launch { id } => commands::run_launch(runtime, &id),
        Commands::List { json } => commands::run_list(runtime, json),
        Commands::Uninstall { id } => commands::run_uninstall(runtime, &id),
        Commands::Pin { id, name } => commands::run_pin(runtime, &id, name.as_deref()),
        Commands::About { json } => commands::run_about(runtime, json),
        Commands::CheckUpdate => cmd_check_update(runtime),
        Commands::RestartUpdate => commands::run_restart_update(runtime),
        Commands::Storage { action } => match action {
            StorageAction::Get { id, key } => commands::run_storage_get(runtime, &id, &key),
            StorageAction::Set { id, key, value } => {
                commands::run_storage_set(runtime, &id, &key, &value)
            }
        },
        Commands::Notify { title, body } => {
            commands::run_notify(runtime, title.as_deref(), body.as_deref())
        }
        Commands::Repair { json } => commands::print_repair(report, json),
    }
}

fn cmd_check_update(runtime: &Runtime) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(commands::run_check_update(runtime))
}
