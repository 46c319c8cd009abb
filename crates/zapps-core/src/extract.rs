//! Archive extraction into a clean target directory.
//!
//! The target is always removed and recreated first, so its contents after a
//! successful call depend only on the archive. A failure part-way leaves the
//! entries that completed; callers re-validate through the manifest reader.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use zip::ZipArchive;

use crate::error::{Error, Result};

/// Counts reported after a successful extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub dirs: usize,
    pub bytes: u64,
}

/// Extract `archive` into `target`, discarding anything already there.
///
/// Entries are streamed to disk one at a time. Entries whose names would
/// resolve outside `target` (absolute paths, `..`) abort the extraction with
/// [`Error::ExtractionFailed`].
pub fn extract_archive(archive: &Path, target: &Path) -> Result<ExtractSummary> {
    zapps_fs::io::remove_dir_if_exists(target)?;
    fs::create_dir_all(target).map_err(|e| zapps_fs::Error::io(target, e))?;

    let failed = |message: String| Error::ExtractionFailed {
        archive: archive.to_path_buf(),
        message,
    };

    let file = File::open(archive).map_err(|e| failed(e.to_string()))?;
    let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|e| failed(e.to_string()))?;

    let mut summary = ExtractSummary::default();
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| failed(e.to_string()))?;
        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            return Err(failed(format!("unsafe entry path '{}'", entry.name())));
        };
        let out_path = target.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| zapps_fs::Error::io(&out_path, e))?;
            summary.dirs += 1;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| zapps_fs::Error::io(parent, e))?;
        }
        let mut out = File::create(&out_path).map_err(|e| zapps_fs::Error::io(&out_path, e))?;
        let written = io::copy(&mut entry, &mut out)
            .map_err(|e| failed(format!("{}: {e}", relative.display())))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode((mode & 0o777) | 0o600);
            fs::set_permissions(&out_path, permissions)
                .map_err(|e| zapps_fs::Error::io(&out_path, e))?;
        }

        summary.files += 1;
        summary.bytes += written;
    }

    tracing::debug!(
        archive = %archive.display(),
        target = %target.display(),
        files = summary.files,
        bytes = summary.bytes,
        "archive extracted"
    );
    Ok(summary)
}
