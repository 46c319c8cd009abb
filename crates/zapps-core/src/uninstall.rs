//! Package removal

use serde::Serialize;
use zapps_fs::{FileLock, RobustnessConfig};

use crate::context::validate_package_id;
use crate::error::Result;
use crate::library::Library;
use crate::paths::ZappPaths;

/// What an uninstall actually removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UninstallReport {
    pub archive_removed: bool,
    pub record_removed: bool,
}

impl UninstallReport {
    /// True when the package was not installed to begin with.
    pub fn was_noop(&self) -> bool {
        !self.archive_removed && !self.record_removed
    }
}

/// Removes installed archives and their library records.
///
/// Uninstalling is idempotent. Running windows of the package and its
/// per-package storage file are left alone.
///
/// Removal takes the same lock as [`Installer::install_or_update`], so an
/// install and an uninstall of one package never interleave their archive
/// and record writes.
///
/// [`Installer::install_or_update`]: crate::installer::Installer::install_or_update
#[derive(Debug, Clone)]
pub struct Uninstaller {
    paths: ZappPaths,
    robustness: RobustnessConfig,
    library: Library,
}

impl Uninstaller {
    pub fn new(paths: ZappPaths, robustness: RobustnessConfig) -> Self {
        let library = Library::new(paths.library_file(), robustness);
        Self {
            paths,
            robustness,
            library,
        }
    }

    pub fn uninstall(&self, id: &str) -> Result<UninstallReport> {
        // An id that could never have been installed has nothing to remove.
        if validate_package_id(id).is_err() {
            tracing::debug!(id = %id, "uninstall of invalid id ignored");
            return Ok(UninstallReport::default());
        }

        let _install_lock =
            FileLock::acquire(self.paths.probe_lock(), self.robustness.lock_timeout)?;
        let archive_removed =
            zapps_fs::io::remove_file_if_exists(&self.paths.installed_archive(id))?;
        let record_removed = self.library.remove(id)?.is_some();

        let report = UninstallReport {
            archive_removed,
            record_removed,
        };
        if report.was_noop() {
            tracing::debug!(id = %id, "package was not installed");
        } else {
            tracing::info!(id = %id, archive_removed, record_removed, "package uninstalled");
        }
        Ok(report)
    }
}
