//! Filesystem layer for the Zapps runtime
//!
//! Provides locked, atomic file replacement and format-agnostic structured
//! stores. Everything that persists state (library, per-package storage,
//! staged installs) goes through this crate.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod lock;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use lock::FileLock;
pub use path::{resolve_within, validate_file_stem};
