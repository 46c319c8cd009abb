//! Runtime facade
//!
//! [`ZappRuntime`] is the command surface a UI (or the CLI) drives: install,
//! launch, library listing, shortcuts, uninstall, storage, notifications and
//! updates. It owns the configuration and the window host and wires the
//! lifecycle components together.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use semver::Version;
use serde::Serialize;
use serde_json::Value;
use tokio_stream::Stream;

use crate::RUNTIME_APP_ID;
use crate::ZAPP_EXTENSION;
use crate::config::{LaunchMode, RuntimeConfig};
use crate::context::PackageContext;
use crate::error::Result;
use crate::host::{Notification, WindowHandle, WindowHost};
use crate::installer::{InstalledPackage, Installer};
use crate::launcher::{LaunchDescriptor, Launcher};
use crate::library::{Library, LibraryRecord};
use crate::paths::ZappPaths;
use crate::repair::{RepairReport, self_repair};
use crate::shortcut::{ShortcutWriter, create_shortcut};
use crate::storage::{KvStore, PackageStorage};
use crate::uninstall::{UninstallReport, Uninstaller};
use crate::updates::{
    LocalFeed, UpdateChannel, UpdateEvent, UpdateOutcome, Updater, restart_to_apply,
};

const RUNTIME_NAME: &str = "Zapps";
const DEFAULT_NOTIFICATION_TITLE: &str = "Zapps";

/// What the process should do given its command-line arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryAction {
    /// A bundle path was passed: open it.
    OpenBundle(PathBuf),
    /// No bundle: show the launcher.
    ShowLauncher,
}

/// Pick the entry action from process arguments: the first argument ending
/// in `.zapp` is opened, otherwise the launcher is shown.
pub fn entry_action<I, S>(args: I) -> EntryAction
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let suffix = format!(".{ZAPP_EXTENSION}");
    args.into_iter()
        .map(|arg| PathBuf::from(arg.as_ref()))
        .find(|arg| arg.to_string_lossy().ends_with(&suffix))
        .map_or(EntryAction::ShowLauncher, EntryAction::OpenBundle)
}

/// Static facts about the running runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AboutInfo {
    pub name: String,
    pub version: String,
    pub identity: String,
    pub launch_mode: LaunchMode,
    pub user_data: PathBuf,
    pub package_root: PathBuf,
}

pub struct ZappRuntime<H: WindowHost> {
    config: RuntimeConfig,
    paths: ZappPaths,
    host: H,
    installer: Installer,
    launcher: Launcher,
    uninstaller: Uninstaller,
    library: Library,
    updates: UpdateChannel,
}

impl<H: WindowHost> ZappRuntime<H> {
    pub fn new(user_data: impl Into<PathBuf>, config: RuntimeConfig, host: H) -> Self {
        let paths = config.paths(user_data);
        let robustness = config.robustness();
        Self {
            installer: Installer::new(paths.clone(), robustness),
            launcher: Launcher::new(paths.clone(), robustness),
            uninstaller: Uninstaller::new(paths.clone(), robustness),
            library: Library::new(paths.library_file(), robustness),
            updates: UpdateChannel::new(),
            config,
            paths,
            host,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn paths(&self) -> &ZappPaths {
        &self.paths
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Repair the user-data area and bind the runtime's own identity.
    /// Call once before anything else.
    pub fn startup(&self) -> RepairReport {
        let report = self_repair(&self.paths, self.config.robustness());
        if let Err(e) = self.host.bind_identity(RUNTIME_APP_ID) {
            tracing::warn!(error = %e, "cannot bind runtime identity");
        }
        report
    }

    /// Dispatch the process entry contract.
    pub fn enter(&self, action: EntryAction) -> Result<()> {
        match action {
            EntryAction::OpenBundle(path) => self.open_and_launch(&path).map(|_| ()),
            EntryAction::ShowLauncher => self.show_launcher().map(|_| ()),
        }
    }

    pub fn install(&self, source: &Path) -> Result<InstalledPackage> {
        self.installer.install_or_update(source)
    }

    /// Open a bundle the user picked or dropped.
    ///
    /// In install mode the bundle is installed and the installed copy is
    /// launched. In direct mode it is launched from a temporary extraction
    /// and never touches the library.
    pub fn open_and_launch(&self, source: &Path) -> Result<LaunchDescriptor> {
        match self.config.launch_mode {
            LaunchMode::Install => {
                let installed = self.install(source)?;
                self.launcher.launch(&installed.archive_path, &self.host)
            }
            LaunchMode::Direct => self.launcher.launch(source, &self.host),
        }
    }

    pub fn launch_by_id(&self, id: &str) -> Result<LaunchDescriptor> {
        self.launcher.launch_installed(id, &self.host)
    }

    pub fn library(&self) -> Result<Vec<LibraryRecord>> {
        Ok(self.library.load()?.into_vec())
    }

    /// Pin an installed package. Without an explicit display name the
    /// library name is used.
    pub fn create_shortcut(
        &self,
        id: &str,
        display_name: Option<&str>,
        exe: &Path,
        writer: &dyn ShortcutWriter,
    ) -> Result<Vec<PathBuf>> {
        let name = match display_name {
            Some(name) => name.to_string(),
            None => self
                .library
                .get(id)?
                .map(|r| r.display_name().to_string())
                .unwrap_or_else(|| id.to_string()),
        };
        create_shortcut(
            &self.paths,
            id,
            &name,
            exe,
            &self.config.shortcut_destinations(),
            writer,
        )
    }

    pub fn uninstall(&self, id: &str) -> Result<UninstallReport> {
        self.uninstaller.uninstall(id)
    }

    pub fn about(&self) -> AboutInfo {
        AboutInfo {
            name: RUNTIME_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            identity: RUNTIME_APP_ID.to_string(),
            launch_mode: self.config.launch_mode,
            user_data: self.paths.user_data().to_path_buf(),
            package_root: self.paths.package_root(),
        }
    }

    fn current_version() -> Version {
        Version::parse(env!("CARGO_PKG_VERSION")).unwrap_or_else(|_| Version::new(0, 0, 0))
    }

    fn updater(&self) -> Option<Updater> {
        let feed = self.config.update_feed.as_ref()?;
        Some(Updater::new(
            Box::new(LocalFeed::new(feed)),
            self.updates.clone(),
            Self::current_version(),
            self.paths.updates_dir(),
        ))
    }

    /// Stream of update events for a UI surface.
    pub fn subscribe_updates(&self) -> impl Stream<Item = UpdateEvent> + Send + Unpin + use<H> {
        self.updates.subscribe()
    }

    /// Check the configured feed. With no feed configured the runtime
    /// reports itself up to date.
    pub async fn check_for_update(&self) -> Result<UpdateOutcome> {
        match self.updater() {
            Some(updater) => updater.check().await,
            None => {
                self.updates.publish(UpdateEvent::Checking);
                self.updates.publish(UpdateEvent::NotAvailable);
                Ok(UpdateOutcome::UpToDate {
                    current: Self::current_version(),
                })
            }
        }
    }

    /// Fire-and-forget: hand the downloaded update to the host.
    pub fn restart_to_apply_update(&self) -> bool {
        restart_to_apply(&self.paths.updates_dir(), &self.host)
    }

    pub fn storage(&self, context: PackageContext) -> PackageStorage {
        PackageStorage::new(&self.paths, context, self.config.robustness())
    }

    pub fn storage_get(&self, context: &PackageContext, key: &str) -> Result<Option<Value>> {
        self.storage(context.clone()).get(key)
    }

    pub fn storage_set(&self, context: &PackageContext, key: &str, value: Value) -> Result<()> {
        self.storage(context.clone()).set(key, value)
    }

    pub fn send_notification(&self, title: Option<&str>, body: Option<&str>) -> Result<()> {
        let notification = Notification {
            title: title
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_NOTIFICATION_TITLE)
                .to_string(),
            body: body.unwrap_or_default().to_string(),
        };
        self.host.notify(&notification)?;
        Ok(())
    }

    pub fn show_launcher(&self) -> Result<WindowHandle> {
        Ok(self.host.create_launcher_window()?)
    }
}
