//! Windowing host collaborator
//!
//! The lifecycle engine never renders anything itself. It hands finished
//! [`LaunchDescriptor`]s to a [`WindowHost`], which owns windows, platform
//! identity, notifications and the restart-to-update hand-off.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::launcher::LaunchDescriptor;

/// Errors raised by host implementations.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("{operation} is not supported by this host")]
    Unsupported { operation: String },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

/// Opaque reference to a window the host created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowHandle {
    pub label: String,
}

impl WindowHandle {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// A desktop notification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Windowing and OS integration surface used by the runtime.
///
/// Package windows are independent of each other and of the launcher
/// window; creating one must not block on any other.
pub trait WindowHost: Send + Sync {
    /// Re-bind the process identity (taskbar grouping, notification
    /// source) to `app_id`. Hosts without per-app identity keep the default.
    fn bind_identity(&self, app_id: &str) -> Result<(), HostError> {
        let _ = app_id;
        Ok(())
    }

    /// Open a window for a launched package.
    fn create_window(&self, descriptor: &LaunchDescriptor) -> Result<WindowHandle, HostError>;

    /// Show the launcher (library) window.
    fn create_launcher_window(&self) -> Result<WindowHandle, HostError>;

    fn notify(&self, notification: &Notification) -> Result<(), HostError>;

    /// Quit and install the staged update artifact. Fire-and-forget: the
    /// runtime does not wait for the restart.
    fn apply_update(&self, artifact: &Path) -> Result<(), HostError> {
        Err(HostError::Unsupported {
            operation: format!("applying update {}", artifact.display()),
        })
    }
}

/// Host that opens nothing and records every request.
///
/// Used for `--headless` runs and as the test double for the runtime.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    state: Mutex<Recorded>,
}

#[derive(Debug, Default, Clone)]
struct Recorded {
    identities: Vec<String>,
    windows: Vec<LaunchDescriptor>,
    launcher_windows: usize,
    notifications: Vec<Notification>,
    applied_updates: Vec<PathBuf>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, Recorded> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn identities(&self) -> Vec<String> {
        self.state().identities.clone()
    }

    /// The most recently bound identity.
    pub fn current_identity(&self) -> Option<String> {
        self.state().identities.last().cloned()
    }

    pub fn windows(&self) -> Vec<LaunchDescriptor> {
        self.state().windows.clone()
    }

    pub fn launcher_windows(&self) -> usize {
        self.state().launcher_windows
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.clone()
    }

    pub fn applied_updates(&self) -> Vec<PathBuf> {
        self.state().applied_updates.clone()
    }
}

impl WindowHost for HeadlessHost {
    fn bind_identity(&self, app_id: &str) -> Result<(), HostError> {
        self.state().identities.push(app_id.to_string());
        Ok(())
    }

    fn create_window(&self, descriptor: &LaunchDescriptor) -> Result<WindowHandle, HostError> {
        let mut state = self.state();
        state.windows.push(descriptor.clone());
        Ok(WindowHandle::new(format!(
            "{}#{}",
            descriptor.context,
            state.windows.len()
        )))
    }

    fn create_launcher_window(&self) -> Result<WindowHandle, HostError> {
        self.state().launcher_windows += 1;
        Ok(WindowHandle::new("launcher"))
    }

    fn notify(&self, notification: &Notification) -> Result<(), HostError> {
        self.state().notifications.push(notification.clone());
        Ok(())
    }

    fn apply_update(&self, artifact: &Path) -> Result<(), HostError> {
        self.state().applied_updates.push(artifact.to_path_buf());
        Ok(())
    }
}
