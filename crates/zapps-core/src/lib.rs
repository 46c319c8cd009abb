//! Package lifecycle engine for zapps
//!
//! A zapp is a zip archive with a `zapp.json` manifest at its root. This
//! crate installs zapps into a durable package root, tracks them in the
//! library store, launches them from a transient run directory and keeps
//! everything consistent across crashes and concurrent commands.
//!
//! # Architecture
//!
//! ```text
//!                   ZappRuntime (command surface)
//!                            |
//!        +----------+--------+---------+-----------+
//!        |          |                  |           |
//!    Installer   Launcher         Uninstaller   Updater
//!        |          |                  |
//!   extract + manifest           Library (library.json)
//!        |
//!    zapps-fs (locked atomic I/O)
//! ```
//!
//! Windowing, notifications and shortcut files are collaborators reached
//! through the [`WindowHost`] and [`ShortcutWriter`] traits.

pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod host;
pub mod installer;
pub mod launcher;
pub mod library;
pub mod manifest;
pub mod paths;
pub mod repair;
pub mod runtime;
pub mod shortcut;
pub mod storage;
pub mod uninstall;
pub mod updates;

/// File name of the manifest at the root of every bundle.
pub const MANIFEST_FILENAME: &str = "zapp.json";

/// File extension of zapp bundles, without the dot.
pub const ZAPP_EXTENSION: &str = "zapp";

/// Platform identity of the runtime itself, before any package is launched.
pub const RUNTIME_APP_ID: &str = "com.zapps.runtime";

pub use config::{LaunchMode, RuntimeConfig, ShortcutConfig};
pub use context::PackageContext;
pub use error::{Error, Result};
pub use extract::{ExtractSummary, extract_archive};
pub use host::{HeadlessHost, HostError, Notification, WindowHandle, WindowHost};
pub use installer::{InstalledPackage, Installer};
pub use launcher::{LaunchDescriptor, Launcher};
pub use library::{Library, LibraryRecord, Records, UpsertOutcome};
pub use manifest::{PackageManifest, WindowHints, WindowSpec, read_manifest};
pub use paths::ZappPaths;
pub use repair::{RepairReport, self_repair};
pub use runtime::{AboutInfo, EntryAction, ZappRuntime, entry_action};
pub use shortcut::{ShortcutDestinations, ShortcutSpec, ShortcutWriter, create_shortcut};
pub use storage::{KvStore, PackageStorage};
pub use uninstall::{UninstallReport, Uninstaller};
pub use updates::{
    LocalFeed, Release, UpdateChannel, UpdateEvent, UpdateOutcome, UpdateSource, Updater,
};
