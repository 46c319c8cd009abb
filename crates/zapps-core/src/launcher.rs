//! Launch orchestrator
//!
//! Every launch extracts the archive into the fixed run directory, discarding
//! the previous run's files, so stale assets from another version can never
//! leak in. The run directory lock is held from extraction until the host
//! has created the window.
//!
//! The run marker brackets the same span. Startup repair only removes a run
//! directory while the marker is present, so a launch that finished keeps
//! its files after this process exits and the host app is still using them.

use std::path::{Path, PathBuf};

use serde::Serialize;
use zapps_fs::{FileLock, RobustnessConfig, resolve_within};

use crate::context::PackageContext;
use crate::error::{Error, Result};
use crate::extract::extract_archive;
use crate::host::WindowHost;
use crate::manifest::read_manifest;
use crate::paths::ZappPaths;

/// Everything the host needs to open a package window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchDescriptor {
    pub context: PackageContext,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    /// Absolute icon path, when declared and present.
    pub icon: Option<PathBuf>,
    /// Absolute path of the entry file inside the run directory.
    pub entry: PathBuf,
    pub run_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Launcher {
    paths: ZappPaths,
    robustness: RobustnessConfig,
}

impl Launcher {
    pub fn new(paths: ZappPaths, robustness: RobustnessConfig) -> Self {
        Self { paths, robustness }
    }

    /// Extract `archive` into the run directory and build its descriptor.
    ///
    /// The caller must hold the run directory lock.
    fn prepare(&self, archive: &Path) -> Result<LaunchDescriptor> {
        let run_dir = self.paths.run_dir();
        extract_archive(archive, &run_dir)?;

        let manifest = read_manifest(&run_dir).map_err(|e| match e {
            Error::ManifestMissing { .. } | Error::ManifestInvalid { .. } => {
                Error::launch_failed(e.to_string())
            }
            other => other,
        })?;

        let id = manifest
            .id()
            .ok_or_else(|| Error::launch_failed("manifest has no id"))?;
        let context =
            PackageContext::new(id).map_err(|e| Error::launch_failed(e.to_string()))?;

        let entry_rel = manifest
            .entry()
            .ok_or_else(|| Error::launch_failed(format!("package '{id}' declares no entry")))?;
        let entry = resolve_within(&run_dir, entry_rel)
            .map_err(|e| Error::launch_failed(e.to_string()))?;
        if !entry.is_file() {
            return Err(Error::launch_failed(format!(
                "entry '{entry_rel}' not found in package '{id}'"
            )));
        }

        let icon = manifest.icon().and_then(|rel| match resolve_within(&run_dir, rel) {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => {
                tracing::debug!(id = %id, icon = rel, "declared icon not found, omitting");
                None
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "ignoring icon outside the package");
                None
            }
        });

        let window = manifest.window();
        Ok(LaunchDescriptor {
            context,
            title: manifest.title().to_string(),
            width: window.width,
            height: window.height,
            resizable: window.resizable,
            icon,
            entry,
            run_dir,
        })
    }

    /// Launch an arbitrary archive: extract, validate, rebind identity and
    /// hand the descriptor to `host`.
    pub fn launch(&self, archive: &Path, host: &dyn WindowHost) -> Result<LaunchDescriptor> {
        let _run_lock = FileLock::acquire(self.paths.run_lock(), self.robustness.lock_timeout)?;

        // Stays behind on failure; the next startup then clears the run
        // directory.
        let marker = self.paths.run_marker();
        set_marker(&marker)?;

        let descriptor = self.prepare(archive)?;
        host.bind_identity(descriptor.context.package_id())?;
        let window = host.create_window(&descriptor)?;

        if let Err(e) = zapps_fs::io::remove_file_if_exists(&marker) {
            tracing::warn!(error = %e, "failed to clear run marker");
        }

        tracing::info!(
            id = %descriptor.context,
            window = %window.label,
            entry = %descriptor.entry.display(),
            "package launched"
        );
        Ok(descriptor)
    }

    /// Launch the installed copy of `id`.
    ///
    /// Fails with [`Error::NotInstalled`] before touching the run directory
    /// when no installed archive exists.
    pub fn launch_installed(&self, id: &str, host: &dyn WindowHost) -> Result<LaunchDescriptor> {
        let context = PackageContext::new(id).map_err(|_| Error::NotInstalled { id: id.to_string() })?;
        let archive = self.paths.installed_archive(context.package_id());
        if !archive.is_file() {
            return Err(Error::NotInstalled { id: id.to_string() });
        }
        self.launch(&archive, host)
    }
}

fn set_marker(marker: &Path) -> Result<()> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = marker.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(marker, std::process::id().to_string())
    };
    write().map_err(|e| zapps_fs::Error::io(marker, e).into())
}
