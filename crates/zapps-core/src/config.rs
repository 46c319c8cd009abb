//! Runtime configuration loaded from `{user_data}/config.toml`

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zapps_fs::{ConfigStore, RobustnessConfig};

use crate::error::{Error, Result};
use crate::paths::ZappPaths;
use crate::shortcut::ShortcutDestinations;

/// How an opened bundle is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchMode {
    /// Install the bundle into the package root, then launch the installed copy.
    #[default]
    Install,
    /// Launch straight from a temporary extraction without installing.
    Direct,
}

impl FromStr for LaunchMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "install" | "persistent" => Ok(LaunchMode::Install),
            "direct" => Ok(LaunchMode::Direct),
            _ => Err(Error::InvalidConfig {
                message: format!("unknown launch mode '{s}' (expected install or direct)"),
            }),
        }
    }
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchMode::Install => write!(f, "install"),
            LaunchMode::Direct => write!(f, "direct"),
        }
    }
}

/// Overrides for the two shortcut destinations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShortcutConfig {
    #[serde(default)]
    pub desktop_dir: Option<PathBuf>,
    #[serde(default)]
    pub start_menu_dir: Option<PathBuf>,
}

/// Top-level runtime configuration.
///
/// Every field has a default, so an absent or empty file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub launch_mode: LaunchMode,
    /// Maximum wait for a transient-directory or store lock.
    pub lock_timeout_ms: u64,
    /// Transient area for run and probe directories. Defaults to the OS temp dir.
    pub temp_root: Option<PathBuf>,
    /// Local update feed (`{ "version", "artifact" }`).
    pub update_feed: Option<PathBuf>,
    pub shortcuts: ShortcutConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            launch_mode: LaunchMode::default(),
            lock_timeout_ms: 10_000,
            temp_root: None,
            update_feed: None,
            shortcuts: ShortcutConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load `config.toml` from the user-data root, defaulting when absent.
    pub fn load(user_data: &Path) -> Result<Self> {
        let path = user_data.join("config.toml");
        let config = ConfigStore::new().load_or_default(&path)?;
        tracing::debug!(path = %path.display(), "runtime configuration loaded");
        Ok(config)
    }

    /// Resolve the on-disk layout for this configuration.
    pub fn paths(&self, user_data: impl Into<PathBuf>) -> ZappPaths {
        let temp_root = self
            .temp_root
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        ZappPaths::new(user_data, temp_root)
    }

    pub fn robustness(&self) -> RobustnessConfig {
        RobustnessConfig {
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            enable_fsync: true,
        }
    }

    /// Shortcut destinations: configured overrides, else the platform
    /// desktop directory and `{data_dir}/applications`.
    pub fn shortcut_destinations(&self) -> ShortcutDestinations {
        ShortcutDestinations {
            desktop: self
                .shortcuts
                .desktop_dir
                .clone()
                .or_else(dirs::desktop_dir),
            start_menu: self
                .shortcuts
                .start_menu_dir
                .clone()
                .or_else(|| dirs::data_dir().map(|d| d.join("applications"))),
        }
    }
}
