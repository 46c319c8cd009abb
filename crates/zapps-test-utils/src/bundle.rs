//! [`ZappBuilder`] produces zip bundles in memory or on disk.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Builder for zapp archives used as test inputs.
///
/// # Example
///
/// ```rust,no_run
/// use zapps_test_utils::ZappBuilder;
///
/// let bytes = ZappBuilder::app("com.acme.notes", "1.0")
///     .file("assets/app.js", "console.log('hi')")
///     .to_bytes();
/// assert!(!bytes.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ZappBuilder {
    manifest: Option<String>,
    files: Vec<(String, Vec<u8>)>,
    dirs: Vec<String>,
}

impl ZappBuilder {
    /// An empty archive with no manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// A launchable bundle: manifest with `id`, `name`, `version` and
    /// `entry = "index.html"`, plus the entry file itself.
    pub fn app(id: &str, version: &str) -> Self {
        Self::new()
            .manifest(json!({
                "id": id,
                "name": "Notes",
                "version": version,
                "entry": "index.html",
            }))
            .file("index.html", format!("<h1>{id} {version}</h1>"))
    }

    /// Replace the manifest with a JSON value.
    pub fn manifest(mut self, value: Value) -> Self {
        self.manifest = Some(value.to_string());
        self
    }

    /// Replace the manifest with raw text (use for unparsable manifests).
    pub fn raw_manifest(mut self, text: impl Into<String>) -> Self {
        self.manifest = Some(text.into());
        self
    }

    /// Drop the manifest entirely.
    pub fn without_manifest(mut self) -> Self {
        self.manifest = None;
        self
    }

    /// Add or replace a file entry.
    pub fn file(mut self, path: &str, contents: impl AsRef<[u8]>) -> Self {
        self.files.retain(|(p, _)| p != path);
        self.files.push((path.to_string(), contents.as_ref().to_vec()));
        self
    }

    /// Add an explicit directory entry.
    pub fn dir(mut self, path: &str) -> Self {
        self.dirs.push(path.to_string());
        self
    }

    /// Render the archive to bytes.
    ///
    /// # Panics
    /// Panics if the zip writer fails, which only happens on programmer error.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for dir in &self.dirs {
            writer
                .add_directory(dir.as_str(), options)
                .unwrap_or_else(|e| panic!("ZappBuilder: failed to add dir {dir}: {e}"));
        }
        if let Some(manifest) = &self.manifest {
            writer
                .start_file("zapp.json", options)
                .unwrap_or_else(|e| panic!("ZappBuilder: failed to start zapp.json: {e}"));
            writer
                .write_all(manifest.as_bytes())
                .unwrap_or_else(|e| panic!("ZappBuilder: failed to write zapp.json: {e}"));
        }
        for (path, contents) in &self.files {
            writer
                .start_file(path.as_str(), options)
                .unwrap_or_else(|e| panic!("ZappBuilder: failed to start {path}: {e}"));
            writer
                .write_all(contents)
                .unwrap_or_else(|e| panic!("ZappBuilder: failed to write {path}: {e}"));
        }

        writer
            .finish()
            .unwrap_or_else(|e| panic!("ZappBuilder: failed to finish archive: {e}"))
            .into_inner()
    }

    /// Write the archive to `path`, creating parent directories.
    ///
    /// # Panics
    /// Panics if the filesystem operations fail.
    pub fn write_to(&self, path: &Path) -> PathBuf {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("ZappBuilder: failed to create {}: {e}", parent.display()));
        }
        fs::write(path, self.to_bytes())
            .unwrap_or_else(|e| panic!("ZappBuilder: failed to write {}: {e}", path.display()));
        path.to_path_buf()
    }
}
