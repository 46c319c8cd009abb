//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, FileLock, Result};

/// Tuning knobs for locked writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// How long to wait for the sidecar lock before giving up.
    pub lock_timeout: Duration,
    /// Whether to fsync the temp file before renaming it into place.
    pub enable_fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(10),
            enable_fsync: true,
        }
    }
}

/// Sidecar lock path used to serialize writers of `path`.
///
/// `library.json` is guarded by `library.json.lock`.
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

/// Write content atomically to a file with locking.
///
/// Acquires the sidecar lock (see [`lock_path_for`]) and then performs
/// [`replace_atomic`]. Callers that already hold the sidecar lock for a
/// read-modify-write cycle must call [`replace_atomic`] directly.
pub fn write_atomic(path: &Path, content: &[u8], config: RobustnessConfig) -> Result<()> {
    let _lock = FileLock::acquire(lock_path_for(path), config.lock_timeout)?;
    replace_atomic(path, content, config.enable_fsync)
}

/// Replace `path` with `content` using write-to-temp-then-rename.
///
/// The temp file lives in the same directory so the rename never crosses a
/// filesystem boundary. Does not lock.
pub fn replace_atomic(path: &Path, content: &[u8], fsync: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let result = (|| {
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::io(&temp_path, e))?;

        temp_file
            .write_all(content)
            .map_err(|e| Error::io(&temp_path, e))?;

        if fsync {
            temp_file
                .sync_all()
                .map_err(|e| Error::io(&temp_path, e))?;
        }
        drop(temp_file);

        fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Read text content from a file.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Write text content to a file atomically with default robustness settings.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes(), RobustnessConfig::default())
}

/// Copy `src` onto `dest` so that `dest` is either the old file or the full
/// new one, never a partial copy.
///
/// The copy is staged at `staged` first (which must be on the same
/// filesystem as `dest`), fsynced, then renamed over `dest`.
pub fn copy_atomic(src: &Path, staged: &Path, dest: &Path) -> Result<u64> {
    if let Some(parent) = staged.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let bytes = fs::copy(src, staged).map_err(|e| Error::io(src, e))?;

    let sync = OpenOptions::new()
        .write(true)
        .open(staged)
        .and_then(|f| f.sync_all());
    if let Err(e) = sync {
        let _ = fs::remove_file(staged);
        return Err(Error::io(staged, e));
    }

    if let Err(e) = fs::rename(staged, dest) {
        let _ = fs::remove_file(staged);
        return Err(Error::io(dest, e));
    }
    Ok(bytes)
}

/// Remove a directory tree if it exists. Missing directories are not an error.
pub fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Remove a file if it exists. Missing files are not an error.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}
