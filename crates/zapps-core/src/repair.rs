//! Startup self-repair
//!
//! Runs once before any install or launch. Every step is best-effort: a
//! failure is logged, recorded in the [`RepairReport`] and the sweep moves on.
//! Availability wins over preserving files that are already unreadable.
//!
//! Steps, in order:
//!
//! 1. Ensure the user-data root, package root and library file exist.
//! 2. Reset unparseable top-level `*.json` files to an empty value
//!    (`[]` for the library, `{}` for package storage).
//! 3. Remove stale run and probe directories, skipping any whose lock is
//!    held by a live process. The run directory only counts as stale while
//!    its in-flight marker exists; otherwise it belongs to an app that a
//!    completed launch handed to the host. Leftover staging files go with
//!    the probe.
//! 4. Reconcile the library with the package root: adopt orphaned archives
//!    and drop records whose archive is gone.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use zapps_fs::checksum::compute_file_checksum;
use zapps_fs::{FileLock, RobustnessConfig};

use crate::ZAPP_EXTENSION;
use crate::library::{Library, LibraryRecord, Records};
use crate::manifest::read_archive_manifest;
use crate::paths::ZappPaths;

const EMPTY_LIBRARY: &[u8] = b"[]\n";
const EMPTY_OBJECT: &[u8] = b"{}\n";

/// Everything the sweep changed or failed to change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub library_created: bool,
    pub reset_files: Vec<PathBuf>,
    pub removed_transient: Vec<PathBuf>,
    /// Transient directories left alone because another process holds them.
    pub skipped_transient: Vec<PathBuf>,
    pub removed_staging: usize,
    pub adopted: Vec<String>,
    pub dropped: Vec<String>,
    pub errors: Vec<String>,
}

impl RepairReport {
    /// True when the sweep found nothing to fix.
    pub fn is_clean(&self) -> bool {
        !self.library_created
            && self.reset_files.is_empty()
            && self.removed_transient.is_empty()
            && self.removed_staging == 0
            && self.adopted.is_empty()
            && self.dropped.is_empty()
            && self.errors.is_empty()
    }

    fn error(&mut self, context: &str, error: impl std::fmt::Display) {
        tracing::warn!(error = %error, "{context}");
        self.errors.push(format!("{context}: {error}"));
    }
}

/// Run the startup sweep. Never fails; see [`RepairReport::errors`].
pub fn self_repair(paths: &ZappPaths, robustness: RobustnessConfig) -> RepairReport {
    let mut report = RepairReport::default();

    ensure_layout(paths, robustness, &mut report);
    reset_corrupt_files(paths, robustness, &mut report);
    clear_transient(paths, &mut report);
    reconcile_library(paths, robustness, &mut report);

    if report.is_clean() {
        tracing::debug!("startup repair found nothing to fix");
    } else {
        tracing::info!(
            reset = report.reset_files.len(),
            adopted = report.adopted.len(),
            dropped = report.dropped.len(),
            errors = report.errors.len(),
            "startup repair finished"
        );
    }
    report
}

fn ensure_layout(paths: &ZappPaths, robustness: RobustnessConfig, report: &mut RepairReport) {
    for dir in [
        paths.user_data().to_path_buf(),
        paths.package_root(),
        paths.staging_dir(),
    ] {
        if let Err(e) = fs::create_dir_all(&dir) {
            report.error(&format!("cannot create {}", dir.display()), e);
        }
    }

    let library = paths.library_file();
    if !library.exists() {
        match zapps_fs::io::write_atomic(&library, EMPTY_LIBRARY, robustness) {
            Ok(()) => report.library_created = true,
            Err(e) => report.error("cannot create library", e),
        }
    }
}

fn reset_corrupt_files(paths: &ZappPaths, robustness: RobustnessConfig, report: &mut RepairReport) {
    let entries = match fs::read_dir(paths.user_data()) {
        Ok(entries) => entries,
        Err(e) => {
            report.error("cannot scan user data", e);
            return;
        }
    };

    let library = paths.library_file();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }

        let is_library = path == library;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                report.error(&format!("cannot read {}", path.display()), e);
                continue;
            }
        };
        let valid = if is_library {
            serde_json::from_str::<Records>(&content).is_ok()
        } else {
            serde_json::from_str::<Map<String, Value>>(&content).is_ok()
        };
        if valid {
            continue;
        }

        let empty = if is_library { EMPTY_LIBRARY } else { EMPTY_OBJECT };
        match zapps_fs::io::write_atomic(&path, empty, robustness) {
            Ok(()) => {
                tracing::warn!(file = %path.display(), "reset unreadable store");
                report.reset_files.push(path);
            }
            Err(e) => report.error(&format!("cannot reset {}", path.display()), e),
        }
    }
}

fn clear_transient(paths: &ZappPaths, report: &mut RepairReport) {
    match FileLock::try_acquire(paths.run_lock()) {
        Ok(Some(_guard)) => clear_interrupted_launch(paths, report),
        Ok(None) => report.skipped_transient.push(paths.run_dir()),
        Err(e) => report.error("cannot lock run directory", e),
    }

    // Staging files belong to an in-flight install exactly when the probe
    // lock is held, so both are cleared under it.
    match FileLock::try_acquire(paths.probe_lock()) {
        Ok(Some(_guard)) => {
            remove_transient(&paths.probe_dir(), report);
            clear_staging(&paths.staging_dir(), report);
        }
        Ok(None) => {
            report.skipped_transient.push(paths.probe_dir());
            report.skipped_transient.push(paths.staging_dir());
        }
        Err(e) => report.error("cannot lock probe directory", e),
    }
}

fn clear_interrupted_launch(paths: &ZappPaths, report: &mut RepairReport) {
    let marker = paths.run_marker();
    if !marker.exists() {
        return;
    }
    remove_transient(&paths.run_dir(), report);
    if let Err(e) = zapps_fs::io::remove_file_if_exists(&marker) {
        report.error("cannot remove run marker", e);
    }
}

fn remove_transient(dir: &Path, report: &mut RepairReport) {
    match zapps_fs::io::remove_dir_if_exists(dir) {
        Ok(true) => {
            tracing::debug!(dir = %dir.display(), "removed stale transient directory");
            report.removed_transient.push(dir.to_path_buf());
        }
        Ok(false) => {}
        Err(e) => report.error(&format!("cannot remove {}", dir.display()), e),
    }
}

fn clear_staging(dir: &Path, report: &mut RepairReport) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let removed = if path.is_dir() {
            zapps_fs::io::remove_dir_if_exists(&path)
        } else {
            zapps_fs::io::remove_file_if_exists(&path)
        };
        match removed {
            Ok(true) => {
                tracing::warn!(file = %path.display(), "removed interrupted install");
                report.removed_staging += 1;
            }
            Ok(false) => {}
            Err(e) => report.error(&format!("cannot remove {}", path.display()), e),
        }
    }
}

/// Installed archives keyed by file stem.
fn installed_archives(package_root: &Path) -> std::io::Result<BTreeMap<String, PathBuf>> {
    let mut archives = BTreeMap::new();
    for entry in fs::read_dir(package_root)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != ZAPP_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            archives.insert(stem.to_string(), path.clone());
        }
    }
    Ok(archives)
}

fn reconcile_library(paths: &ZappPaths, robustness: RobustnessConfig, report: &mut RepairReport) {
    let archives = match installed_archives(&paths.package_root()) {
        Ok(archives) => archives,
        Err(e) => {
            report.error("cannot scan package root", e);
            return;
        }
    };

    let library = Library::new(paths.library_file(), robustness);
    let mut adopted = Vec::new();
    let mut dropped = Vec::new();
    let mut skipped = Vec::new();

    let result = library.update(|records| {
        records.retain(|record| {
            let keep = archives.contains_key(&record.id);
            if !keep {
                dropped.push(record.id.clone());
            }
            keep
        });

        for (stem, archive) in &archives {
            if records.get(stem).is_some() {
                continue;
            }
            match adopt(stem, archive) {
                Ok(record) => {
                    records.upsert(record);
                    adopted.push(stem.clone());
                }
                Err(reason) => skipped.push(format!("{}: {reason}", archive.display())),
            }
        }

        (!adopted.is_empty() || !dropped.is_empty()).then_some(())
    });

    if let Err(e) = result {
        report.error("cannot reconcile library", e);
        return;
    }
    for id in &dropped {
        tracing::warn!(id = %id, "dropped library record without installed archive");
    }
    for id in &adopted {
        tracing::warn!(id = %id, "adopted installed archive without library record");
    }
    for reason in skipped {
        report.error("cannot adopt orphaned archive", reason);
    }
    report.adopted = adopted;
    report.dropped = dropped;
}

/// Build a record for an archive that has no library entry.
fn adopt(stem: &str, archive: &Path) -> Result<LibraryRecord, String> {
    let manifest = read_archive_manifest(archive).map_err(|e| e.to_string())?;
    if manifest.id() != Some(stem) {
        return Err(format!(
            "manifest id {:?} does not match file name",
            manifest.id().unwrap_or_default()
        ));
    }
    let checksum = compute_file_checksum(archive).map_err(|e| e.to_string())?;
    let installed_at: DateTime<Utc> = fs::metadata(archive)
        .and_then(|m| m.modified())
        .map(DateTime::from)
        .unwrap_or_else(|_| Utc::now());

    Ok(LibraryRecord::from_manifest(stem, &manifest)
        .with_checksum(checksum)
        .with_installed_at(installed_at))
}
