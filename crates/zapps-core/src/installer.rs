//! Package installer
//!
//! Installing is a two-phase commit:
//!
//! 1. The source archive is extracted into the probe directory and its
//!    manifest validated.
//! 2. The original archive (not the extracted tree) is copied to
//!    `staging/{id}.{uuid}.zapp`, fsynced and renamed onto
//!    `packages/{id}.zapp`.
//! 3. Only then is the library record written, under the store lock.
//!
//! A crash before step 2's rename leaves a staging file that startup repair
//! deletes. A crash between the rename and step 3 leaves an orphaned archive
//! that startup repair adopts.

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;
use zapps_fs::checksum::compute_file_checksum;
use zapps_fs::{FileLock, RobustnessConfig};

use crate::ZAPP_EXTENSION;
use crate::context::PackageContext;
use crate::error::{Error, Result};
use crate::extract::extract_archive;
use crate::library::{Library, LibraryRecord, UpsertOutcome};
use crate::manifest::{PackageManifest, read_manifest};
use crate::paths::ZappPaths;

/// Result of a successful install or update.
#[derive(Debug, Clone)]
pub struct InstalledPackage {
    /// Context for follow-up operations on the installed package.
    pub context: PackageContext,
    /// Durable archive under the package root.
    pub archive_path: PathBuf,
    pub record: LibraryRecord,
    pub outcome: UpsertOutcome,
}

/// Installs source archives into the package root and library.
#[derive(Debug, Clone)]
pub struct Installer {
    paths: ZappPaths,
    robustness: RobustnessConfig,
    library: Library,
}

impl Installer {
    pub fn new(paths: ZappPaths, robustness: RobustnessConfig) -> Self {
        let library = Library::new(paths.library_file(), robustness);
        Self {
            paths,
            robustness,
            library,
        }
    }

    /// Install `source`, or update the installed package with the same id.
    ///
    /// The probe directory lock is held for the whole operation so two
    /// installs never interleave their extractions.
    pub fn install_or_update(&self, source: &Path) -> Result<InstalledPackage> {
        let probe_dir = self.paths.probe_dir();
        let _probe_lock = FileLock::acquire(self.paths.probe_lock(), self.robustness.lock_timeout)?;

        let result = self.install_locked(source, &probe_dir);

        if let Err(e) = zapps_fs::io::remove_dir_if_exists(&probe_dir) {
            tracing::warn!(error = %e, "failed to clean probe directory");
        }
        result
    }

    fn install_locked(&self, source: &Path, probe_dir: &Path) -> Result<InstalledPackage> {
        tracing::debug!(source = %source.display(), "probing bundle");
        extract_archive(source, probe_dir)?;
        let manifest = read_manifest(probe_dir)?;
        let context = validate_for_install(&manifest)?;
        let id = context.package_id();

        let checksum = compute_file_checksum(source).map_err(|e| zapps_fs::Error::io(source, e))?;

        let archive_path = self.paths.installed_archive(id);
        let staged = self
            .paths
            .staging_dir()
            .join(format!("{id}.{}.{ZAPP_EXTENSION}", Uuid::new_v4()));
        let bytes = zapps_fs::io::copy_atomic(source, &staged, &archive_path)?;
        tracing::debug!(id = %id, bytes, archive = %archive_path.display(), "archive committed");

        let record = LibraryRecord::from_manifest(id, &manifest)
            .with_checksum(checksum)
            .with_installed_at(Utc::now());
        let outcome = self.library.upsert(record.clone())?;

        tracing::info!(
            id = %id,
            version = manifest.version.as_deref().unwrap_or("-"),
            ?outcome,
            "package installed"
        );
        Ok(InstalledPackage {
            context,
            archive_path,
            record,
            outcome,
        })
    }
}

/// Enforce the fields an installable manifest must carry.
fn validate_for_install(manifest: &PackageManifest) -> Result<PackageContext> {
    let id = manifest
        .id()
        .ok_or_else(|| Error::invalid_package("manifest has no id"))?;
    let context = PackageContext::new(id)?;
    if manifest.entry().is_none() {
        return Err(Error::invalid_package(format!(
            "package '{id}' declares no entry"
        )));
    }
    Ok(context)
}
