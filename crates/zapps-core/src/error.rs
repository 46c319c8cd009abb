//! Error types for zapps-core

use std::path::PathBuf;

use crate::host::HostError;

/// Result type for zapps-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the package lifecycle engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The bundle has no `zapp.json` at its root
    #[error("manifest not found at {path}")]
    ManifestMissing { path: PathBuf },

    /// `zapp.json` exists but is not parseable
    #[error("invalid manifest at {path}: {message}")]
    ManifestInvalid { path: PathBuf, message: String },

    /// The manifest parsed but is unusable for install
    #[error("invalid package: {reason}")]
    InvalidPackage { reason: String },

    /// The archive is corrupt, unreadable, or contains unsafe entries
    #[error("failed to extract {archive}: {message}")]
    ExtractionFailed { archive: PathBuf, message: String },

    /// No installed archive exists for the requested id
    #[error("package '{id}' is not installed")]
    NotInstalled { id: String },

    /// The package cannot be launched
    #[error("launch failed: {reason}")]
    LaunchFailed { reason: String },

    /// A persisted store could not be parsed
    #[error("store at {path} is corrupt: {message}")]
    StoreCorrupt { path: PathBuf, message: String },

    /// A configuration value is not recognized
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Update check or download failed
    #[error("update failed: {message}")]
    Update { message: String },

    /// Windowing, notification or shortcut collaborator failed
    #[error(transparent)]
    Host(#[from] HostError),

    /// Filesystem error from zapps-fs
    #[error(transparent)]
    Fs(#[from] zapps_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_package(reason: impl Into<String>) -> Self {
        Self::InvalidPackage {
            reason: reason.into(),
        }
    }

    pub(crate) fn launch_failed(reason: impl Into<String>) -> Self {
        Self::LaunchFailed {
            reason: reason.into(),
        }
    }

    pub(crate) fn update(message: impl Into<String>) -> Self {
        Self::Update {
            message: message.into(),
        }
    }
}
