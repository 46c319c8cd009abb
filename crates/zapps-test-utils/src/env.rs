//! [`TestEnv`] sandbox for lifecycle tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::ZappBuilder;

/// A temporary sandbox with separate user-data, temp and source roots.
///
/// Keeping the transient area outside the user-data root mirrors the real
/// layout, where run and probe directories live in the OS temp dir.
pub struct TestEnv {
    root: TempDir,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    /// # Panics
    /// Panics if the temp directory cannot be created.
    pub fn new() -> Self {
        let root = TempDir::new().unwrap_or_else(|e| panic!("TestEnv: failed to create temp dir: {e}"));
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Root of the persisted user-data area (not created until used).
    pub fn user_data(&self) -> PathBuf {
        self.root.path().join("data")
    }

    /// Root of the transient area (run and probe directories).
    pub fn temp_root(&self) -> PathBuf {
        self.root.path().join("tmp")
    }

    /// Write a bundle under the sources directory and return its path.
    pub fn write_bundle(&self, file_name: &str, bundle: &ZappBuilder) -> PathBuf {
        bundle.write_to(&self.root.path().join("sources").join(file_name))
    }
}

/// Snapshot every file under `dir` as relative path -> bytes.
///
/// Missing directories snapshot as empty.
///
/// # Panics
/// Panics on read errors other than a missing root.
pub fn snapshot_dir(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut out = BTreeMap::new();
    if dir.exists() {
        walk(dir, dir, &mut out);
    }
    out
}

fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<String, Vec<u8>>) {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("snapshot_dir: failed to read {}: {e}", dir.display()));
    for entry in entries {
        let entry = entry.unwrap_or_else(|e| panic!("snapshot_dir: bad entry: {e}"));
        let path = entry.path();
        let relative = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        if path.is_dir() {
            out.insert(format!("{relative}/"), Vec::new());
            walk(root, &path, out);
        } else {
            let bytes = fs::read(&path)
                .unwrap_or_else(|e| panic!("snapshot_dir: failed to read {}: {e}", path.display()));
            out.insert(relative, bytes);
        }
    }
}
