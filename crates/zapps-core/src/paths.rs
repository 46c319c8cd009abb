//! Fixed on-disk layout of the runtime
//!
//! ```text
//! {user_data}/
//!   library.json            library store
//!   library.json.lock       single-writer lock for the store
//!   config.toml             optional runtime configuration
//!   {package_id}.json       per-package key-value storage
//!   packages/{id}.zapp      installed archives
//!   staging/                two-phase install staging
//!   updates/                downloaded runtime updates
//! {temp_root}/
//!   zapps_runtime/          run directory (one launch at a time)
//!   zapps_probe/            install probe directory
//!   zapps_runtime.lock
//!   zapps_runtime.inflight  present while a launch is still extracting
//!   zapps_probe.lock
//! ```

use std::path::{Path, PathBuf};

use crate::ZAPP_EXTENSION;

/// Resolved locations of every file and directory the runtime touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZappPaths {
    user_data: PathBuf,
    temp_root: PathBuf,
}

impl ZappPaths {
    pub fn new(user_data: impl Into<PathBuf>, temp_root: impl Into<PathBuf>) -> Self {
        Self {
            user_data: user_data.into(),
            temp_root: temp_root.into(),
        }
    }

    /// Default user-data root: `{data_dir}/zapps`.
    pub fn default_user_data() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("zapps"))
    }

    pub fn user_data(&self) -> &Path {
        &self.user_data
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    pub fn library_file(&self) -> PathBuf {
        self.user_data.join("library.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.user_data.join("config.toml")
    }

    pub fn package_root(&self) -> PathBuf {
        self.user_data.join("packages")
    }

    /// Staging area for two-phase installs. Must share a filesystem with
    /// [`Self::package_root`] so the final rename is atomic.
    pub fn staging_dir(&self) -> PathBuf {
        self.user_data.join("staging")
    }

    pub fn updates_dir(&self) -> PathBuf {
        self.user_data.join("updates")
    }

    /// Durable installed archive for `id`. The id must already be validated.
    pub fn installed_archive(&self, id: &str) -> PathBuf {
        self.package_root().join(format!("{id}.{ZAPP_EXTENSION}"))
    }

    /// Per-package storage file for `id`. The id must already be validated.
    pub fn storage_file(&self, id: &str) -> PathBuf {
        self.user_data.join(format!("{id}.json"))
    }

    pub fn run_dir(&self) -> PathBuf {
        self.temp_root.join("zapps_runtime")
    }

    pub fn run_lock(&self) -> PathBuf {
        self.temp_root.join("zapps_runtime.lock")
    }

    /// Exists from the start of a launch's extraction until the host has
    /// accepted the window. A run directory without it belongs to a
    /// completed launch whose app may still be reading it.
    pub fn run_marker(&self) -> PathBuf {
        self.temp_root.join("zapps_runtime.inflight")
    }

    pub fn probe_dir(&self) -> PathBuf {
        self.temp_root.join("zapps_probe")
    }

    /// Held by installs for their whole run and by uninstalls while they
    /// remove an archive and its record.
    pub fn probe_lock(&self) -> PathBuf {
        self.temp_root.join("zapps_probe.lock")
    }
}
