//! Runtime construction from global flags
//!
//! Resolves the user-data directory, loads `config.toml`, applies flag
//! overrides, and runs the startup repair before any command executes.

use std::path::{Path, PathBuf};

use zapps_core::{LaunchMode, RepairReport, RuntimeConfig, ZappPaths, ZappRuntime};

use crate::error::{CliError, Result};
use crate::host::CliHost;

/// The runtime every command operates on.
pub type Runtime = ZappRuntime<CliHost>;

/// Global options that shape the runtime.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    pub data_dir: Option<PathBuf>,
    pub direct: bool,
    pub headless: bool,
}

/// Resolve the user-data directory: the explicit flag, else the platform
/// default.
pub fn resolve_user_data(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir.to_path_buf()),
        None => ZappPaths::default_user_data().ok_or_else(|| {
            CliError::user("cannot determine a user data directory; pass --data-dir")
        }),
    }
}

/// Build the runtime and run the startup sweep.
pub fn open_runtime(options: &RuntimeOptions) -> Result<(Runtime, RepairReport)> {
    let user_data = resolve_user_data(options.data_dir.as_deref())?;
    let mut config = RuntimeConfig::load(&user_data)?;
    if options.direct {
        config.launch_mode = LaunchMode::Direct;
    }

    let runtime = ZappRuntime::new(&user_data, config, CliHost::new(options.headless));
    let report = runtime.startup();
    for error in &report.errors {
        tracing::warn!("{error}");
    }
    tracing::debug!(user_data = %user_data.display(), "runtime ready");
    Ok((runtime, report))
}

/// Options for a headless runtime rooted in `root`: data under `root/data`,
/// transient directories under `root/tmp`. `extra_config` is appended to
/// the generated `config.toml`.
#[cfg(test)]
pub(crate) fn test_options(root: &Path, extra_config: &str, direct: bool) -> RuntimeOptions {
    let data = root.join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("config.toml"),
        format!(
            "temp_root = '{}'\n{extra_config}",
            root.join("tmp").display()
        ),
    )
    .unwrap();
    RuntimeOptions {
        data_dir: Some(data),
        direct,
        headless: true,
    }
}
