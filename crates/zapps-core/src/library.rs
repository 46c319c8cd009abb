//! Library store: the durable list of installed packages
//!
//! The store is a pretty-printed JSON array at `{user_data}/library.json`.
//! Record order is insertion order; updates happen in place. Every mutation
//! is a read-modify-write under the `library.json.lock` sidecar lock, so
//! concurrent installers and uninstallers never lose each other's updates.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zapps_fs::io::lock_path_for;
use zapps_fs::{ConfigStore, FileLock, RobustnessConfig};

use crate::error::{Error, Result};
use crate::manifest::PackageManifest;

/// One installed package as shown in the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// SHA-256 of the installed archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<DateTime<Utc>>,
}

impl LibraryRecord {
    /// Mirror the manifest fields the library displays.
    pub fn from_manifest(id: impl Into<String>, manifest: &PackageManifest) -> Self {
        Self {
            id: id.into(),
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            icon: manifest.icon.clone(),
            checksum: None,
            installed_at: None,
        }
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    pub fn with_installed_at(mut self, at: DateTime<Utc>) -> Self {
        self.installed_at = Some(at);
        self
    }

    /// Display label: name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

/// Whether an upsert created a record or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Ordered record list with at most one record per id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Records(Vec<LibraryRecord>);

impl Records {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[LibraryRecord] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<LibraryRecord> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LibraryRecord> {
        self.0.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LibraryRecord> {
        self.0.iter()
    }

    /// Update the record with the same id in place, or append.
    pub fn upsert(&mut self, record: LibraryRecord) -> UpsertOutcome {
        match self.0.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                existing.name = record.name;
                existing.version = record.version;
                existing.icon = record.icon;
                existing.checksum = record.checksum;
                existing.installed_at = record.installed_at;
                UpsertOutcome::Updated
            }
            None => {
                self.0.push(record);
                UpsertOutcome::Inserted
            }
        }
    }

    /// Remove every record with `id`. Returns the removed record, if any.
    pub fn remove(&mut self, id: &str) -> Option<LibraryRecord> {
        let pos = self.0.iter().position(|r| r.id == id)?;
        let removed = self.0.remove(pos);
        self.0.retain(|r| r.id != id);
        Some(removed)
    }

    /// Keep only records for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&LibraryRecord) -> bool) {
        self.0.retain(keep);
    }
}

impl<'a> IntoIterator for &'a Records {
    type Item = &'a LibraryRecord;
    type IntoIter = std::slice::Iter<'a, LibraryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Handle to the library file.
#[derive(Debug, Clone)]
pub struct Library {
    path: PathBuf,
    store: ConfigStore,
}

impl Library {
    pub fn new(path: impl Into<PathBuf>, robustness: RobustnessConfig) -> Self {
        Self {
            path: path.into(),
            store: ConfigStore::with_robustness(robustness),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current records. A missing file is an empty library.
    pub fn load(&self) -> Result<Records> {
        self.store
            .load_or_default(&self.path)
            .map_err(|e| corrupt_or(e, &self.path))
    }

    pub fn get(&self, id: &str) -> Result<Option<LibraryRecord>> {
        Ok(self.load()?.get(id).cloned())
    }

    /// Insert or refresh `record` and persist.
    pub fn upsert(&self, record: LibraryRecord) -> Result<UpsertOutcome> {
        let id = record.id.clone();
        let outcome = self.update(|records| Some(records.upsert(record)))?;
        let outcome = outcome.unwrap_or(UpsertOutcome::Inserted);
        tracing::debug!(id = %id, ?outcome, "library record written");
        Ok(outcome)
    }

    /// Remove the record for `id`. The file is only rewritten when a record
    /// was actually removed.
    pub fn remove(&self, id: &str) -> Result<Option<LibraryRecord>> {
        let removed = self.update(|records| records.remove(id))?;
        if removed.is_some() {
            tracing::debug!(id = %id, "library record removed");
        }
        Ok(removed)
    }

    /// Run a read-modify-write cycle under the store lock.
    ///
    /// The file is written only when `change` returns `Some`.
    pub fn update<T>(&self, change: impl FnOnce(&mut Records) -> Option<T>) -> Result<Option<T>> {
        let robustness = self.store.robustness();
        let _lock = FileLock::acquire(lock_path_for(&self.path), robustness.lock_timeout)?;

        let mut records = self.load()?;
        let result = change(&mut records);
        if result.is_some() {
            self.store.save_locked(&self.path, &records)?;
        }
        Ok(result)
    }
}

fn corrupt_or(error: zapps_fs::Error, path: &Path) -> Error {
    match error {
        zapps_fs::Error::ConfigParse { message, .. } => Error::StoreCorrupt {
            path: path.to_path_buf(),
            message,
        },
        other => Error::Fs(other),
    }
}
