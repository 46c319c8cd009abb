//! Per-package key-value storage
//!
//! Each package gets one JSON object at `{user_data}/{id}.json`, mapping
//! string keys to arbitrary JSON values. The store is always addressed
//! through an explicit [`PackageContext`]; there is no ambient "current
//! package".

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use zapps_fs::io::lock_path_for;
use zapps_fs::{ConfigStore, FileLock, RobustnessConfig};

use crate::context::PackageContext;
use crate::error::{Error, Result};
use crate::paths::ZappPaths;

/// Key-value persistence scoped to a single package.
pub trait KvStore {
    /// Value stored under `key`. A stored `null` reads as absent.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Every stored entry.
    fn entries(&self) -> Result<Map<String, Value>>;
}

/// Flat-file [`KvStore`] backed by `{user_data}/{id}.json`.
#[derive(Debug, Clone)]
pub struct PackageStorage {
    context: PackageContext,
    path: PathBuf,
    store: ConfigStore,
}

impl PackageStorage {
    pub fn new(paths: &ZappPaths, context: PackageContext, robustness: RobustnessConfig) -> Self {
        let path = paths.storage_file(context.package_id());
        Self {
            context,
            path,
            store: ConfigStore::with_robustness(robustness),
        }
    }

    pub fn context(&self) -> &PackageContext {
        &self.context
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>> {
        self.store
            .load_or_default(&self.path)
            .map_err(|e| match e {
                zapps_fs::Error::ConfigParse { message, .. } => Error::StoreCorrupt {
                    path: self.path.clone(),
                    message,
                },
                other => Error::Fs(other),
            })
    }
}

impl KvStore for PackageStorage {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.load()?.remove(key).filter(|v| !v.is_null()))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let robustness = self.store.robustness();
        let _lock = FileLock::acquire(lock_path_for(&self.path), robustness.lock_timeout)?;

        let mut entries = self.load()?;
        entries.insert(key.to_string(), value);
        self.store.save_locked(&self.path, &entries)?;

        tracing::debug!(id = %self.context, key, "storage value written");
        Ok(())
    }

    fn entries(&self) -> Result<Map<String, Value>> {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn storage(dir: &Path, id: &str) -> PackageStorage {
        PackageStorage::new(
            &ZappPaths::new(dir, dir.join("tmp")),
            PackageContext::new(id).unwrap(),
            RobustnessConfig::default(),
        )
    }

    #[test]
    fn get_on_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(storage(dir.path(), "a").get("theme").unwrap(), None);
    }

    #[test]
    fn set_then_get_structured_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = storage(dir.path(), "com.acme.notes");

        store.set("prefs", json!({"theme": "dark", "size": 14})).unwrap();
        store.set("count", json!(3)).unwrap();

        assert_eq!(
            store.get("prefs").unwrap(),
            Some(json!({"theme": "dark", "size": 14}))
        );
        assert_eq!(store.entries().unwrap().len(), 2);
        assert!(dir.path().join("com.acme.notes.json").is_file());
    }

    #[test]
    fn stores_are_isolated_per_package() {
        let dir = tempfile::tempdir().unwrap();
        storage(dir.path(), "one").set("k", json!("from one")).unwrap();

        assert_eq!(storage(dir.path(), "two").get("k").unwrap(), None);
    }

    #[test]
    fn null_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = storage(dir.path(), "a");
        store.set("gone", Value::Null).unwrap();
        assert_eq!(store.get("gone").unwrap(), None);
    }

    #[test]
    fn non_object_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), "[1, 2]").unwrap();

        let err = storage(dir.path(), "a").get("k").unwrap_err();
        assert!(matches!(err, Error::StoreCorrupt { .. }), "got: {err:?}");
    }
}
