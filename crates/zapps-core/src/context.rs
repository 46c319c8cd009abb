//! Explicit package context
//!
//! Operations that act "as" a package (per-package storage, platform
//! identity) take a [`PackageContext`] instead of reading an ambient
//! "current app" value. Install and launch return one for the package they
//! handled.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ids that would collide with runtime-owned files in the user-data root.
const RESERVED_IDS: &[&str] = &["library", "config"];

/// Identity of the package an operation is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageContext {
    package_id: String,
}

impl PackageContext {
    /// Build a context after validating `id` with [`validate_package_id`].
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let package_id = id.into();
        validate_package_id(&package_id)?;
        Ok(Self { package_id })
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }
}

impl fmt::Display for PackageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.package_id)
    }
}

/// Check that a manifest id is usable as a primary key and as a file stem
/// (`packages/{id}.zapp`, `{id}.json`).
pub fn validate_package_id(id: &str) -> Result<()> {
    zapps_fs::validate_file_stem(id).map_err(|e| match e {
        zapps_fs::Error::InvalidName { name, reason } => {
            Error::invalid_package(format!("id '{name}' {reason}"))
        }
        other => Error::Fs(other),
    })?;
    if RESERVED_IDS.iter().any(|r| r.eq_ignore_ascii_case(id)) {
        return Err(Error::invalid_package(format!("id '{id}' is reserved")));
    }
    Ok(())
}
