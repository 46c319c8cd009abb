//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Zapps - install and launch zipped application bundles
#[derive(Parser, Debug)]
#[command(name = "zapps")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// User data directory (library, installed packages, storage)
    #[arg(long, global = true, env = "ZAPPS_HOME")]
    pub data_dir: Option<PathBuf>,

    /// Launch bundles straight from a temporary extraction without installing
    #[arg(long, global = true)]
    pub direct: bool,

    /// Record window and notification requests instead of opening anything
    #[arg(long, global = true)]
    pub headless: bool,

    /// Bundle to open. Without one, the library is shown.
    pub bundle: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Install a bundle (or update the installed package with the same id)
    Install {
        /// Path to the .zapp bundle
        bundle: PathBuf,
    },

    /// Install a bundle, then launch it
    ///
    /// With --direct the bundle is launched without being installed.
    Open {
        /// Path to the .zapp bundle
        bundle: PathBuf,
    },

    /// Launch an installed package by id
    Launch {
        /// Package id, e.g. com.acme.notes
        id: String,
    },

    /// List installed packages
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Remove an installed package
    Uninstall {
        /// Package id
        id: String,
    },

    /// Create desktop and start-menu shortcuts for an installed package
    Pin {
        /// Package id
        id: String,

        /// Shortcut label (defaults to the package name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Show runtime version and data locations
    About {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Check the configured feed for a runtime update and download it
    CheckUpdate,

    /// Apply a downloaded runtime update
    RestartUpdate,

    /// Read or write per-package storage
    Storage {
        #[command(subcommand)]
        action: StorageAction,
    },

    /// Send a desktop notification
    Notify {
        /// Notification title (default: Zapps)
        #[arg(long)]
        title: Option<String>,

        /// Notification body
        #[arg(long)]
        body: Option<String>,
    },

    /// Run the startup repair sweep and report what it fixed
    Repair {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

/// Storage actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum StorageAction {
    /// Print the value stored under a key
    Get {
        /// Package id
        id: String,
        /// Key to read
        key: String,
    },

    /// Store a value under a key
    ///
    /// The value is parsed as JSON; anything that is not valid JSON is
    /// stored as a string.
    Set {
        /// Package id
        id: String,
        /// Key to write
        key: String,
        /// Value to store
        value: String,
    },
}
