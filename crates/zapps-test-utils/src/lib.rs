//! Shared test utilities for the zapps workspace.
//!
//! Dev-dependency only. Must not depend on `zapps-core`, whose unit tests
//! use it.
//!
//! # Modules
//!
//! - [`bundle`]: [`ZappBuilder`] for producing zapp archives
//! - [`env`]: [`TestEnv`] sandbox with user-data and temp roots

pub mod bundle;
pub mod env;

pub use bundle::ZappBuilder;
pub use env::{TestEnv, snapshot_dir};
