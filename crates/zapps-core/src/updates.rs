//! Runtime self-update channel
//!
//! An [`Updater`] asks an [`UpdateSource`] for the latest release, downloads
//! newer ones into `{user_data}/updates/` and broadcasts [`UpdateEvent`]s
//! as it goes. UI surfaces consume the events through
//! [`UpdateChannel::subscribe`]. Each subscription is its own lazy stream
//! starting at the moment it was created.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use semver::Version;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};
use zapps_fs::ConfigStore;

use crate::error::{Error, Result};
use crate::host::WindowHost;

const CHANNEL_CAPACITY: usize = 64;
const CHUNK_SIZE: usize = 64 * 1024;
const PENDING_FILE: &str = "pending.json";

/// Progress of an update check, in the order they are emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum UpdateEvent {
    Checking,
    Available { version: String },
    NotAvailable,
    Progress { percent: u8 },
    Downloaded { version: String },
}

impl UpdateEvent {
    /// Status line shown by the launcher. Progress events carry a
    /// percentage instead.
    pub fn status_text(&self) -> Option<&'static str> {
        match self {
            UpdateEvent::Checking => Some("Checking for updates…"),
            UpdateEvent::Available { .. } => Some("Update found. Downloading…"),
            UpdateEvent::NotAvailable => Some("Zapps is up to date."),
            UpdateEvent::Progress { .. } => None,
            UpdateEvent::Downloaded { .. } => Some("Update ready. Restart to apply."),
        }
    }
}

/// Broadcast hub for [`UpdateEvent`]s.
#[derive(Debug, Clone)]
pub struct UpdateChannel {
    sender: broadcast::Sender<UpdateEvent>,
}

impl Default for UpdateChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Send to every live subscriber. Having none is fine.
    pub fn publish(&self, event: UpdateEvent) {
        tracing::debug!(?event, "update event");
        let _ = self.sender.send(event);
    }

    /// A stream of every event published from now on.
    ///
    /// Slow subscribers skip the events they lagged behind on.
    pub fn subscribe(&self) -> impl Stream<Item = UpdateEvent> + Send + Unpin + use<> {
        BroadcastStream::new(self.sender.subscribe()).filter_map(|item| match item {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "update subscriber lagged");
                None
            }
        })
    }
}

/// A published runtime release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub version: Version,
    /// Where the release artifact can be read from (or, once downloaded,
    /// where it was stored).
    pub artifact: PathBuf,
}

/// Result of [`Updater::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    UpToDate { current: Version },
    Downloaded(Release),
}

/// Somewhere releases come from.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// The newest published release, or `None` if nothing is published.
    async fn latest(&self) -> Result<Option<Release>>;

    /// Copy `release` into `dest_dir`, calling `progress` with a
    /// percentage as bytes arrive. Returns the downloaded file.
    async fn download(
        &self,
        release: &Release,
        dest_dir: &Path,
        progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<PathBuf>;
}

/// JSON feed on the local filesystem:
///
/// ```json
/// { "version": "0.2.0", "artifact": "zapps-0.2.0.bin" }
/// ```
///
/// A relative `artifact` is resolved against the feed's directory.
#[derive(Debug, Clone)]
pub struct LocalFeed {
    feed: PathBuf,
}

#[derive(Debug, Deserialize)]
struct FeedFile {
    version: String,
    artifact: PathBuf,
}

impl LocalFeed {
    pub fn new(feed: impl Into<PathBuf>) -> Self {
        Self { feed: feed.into() }
    }
}

#[async_trait]
impl UpdateSource for LocalFeed {
    async fn latest(&self) -> Result<Option<Release>> {
        let content = match tokio::fs::read_to_string(&self.feed).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(zapps_fs::Error::io(&self.feed, e).into()),
        };
        let file: FeedFile = serde_json::from_str(&content)
            .map_err(|e| Error::update(format!("invalid feed {}: {e}", self.feed.display())))?;
        let version = Version::parse(file.version.trim_start_matches('v'))
            .map_err(|e| Error::update(format!("invalid version '{}': {e}", file.version)))?;

        let artifact = match self.feed.parent() {
            Some(dir) if file.artifact.is_relative() => dir.join(&file.artifact),
            _ => file.artifact,
        };
        Ok(Some(Release { version, artifact }))
    }

    async fn download(
        &self,
        release: &Release,
        dest_dir: &Path,
        progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<PathBuf> {
        let source = &release.artifact;
        let file_name = source
            .file_name()
            .ok_or_else(|| Error::update(format!("artifact {} has no file name", source.display())))?;
        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| zapps_fs::Error::io(dest_dir, e))?;

        let dest = dest_dir.join(file_name);
        let mut partial_name = file_name.to_os_string();
        partial_name.push(".part");
        let partial = dest_dir.join(partial_name);

        let mut reader = tokio::fs::File::open(source)
            .await
            .map_err(|e| zapps_fs::Error::io(source, e))?;
        let total = reader
            .metadata()
            .await
            .map_err(|e| zapps_fs::Error::io(source, e))?
            .len();
        let mut writer = tokio::fs::File::create(&partial)
            .await
            .map_err(|e| zapps_fs::Error::io(&partial, e))?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut copied = 0u64;
        let mut last_percent = None;
        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| zapps_fs::Error::io(source, e))?;
            if n == 0 {
                break;
            }
            writer
                .write_all(&buf[..n])
                .await
                .map_err(|e| zapps_fs::Error::io(&partial, e))?;
            copied += n as u64;

            let percent = percent_of(copied, total);
            if last_percent != Some(percent) {
                progress(percent);
                last_percent = Some(percent);
            }
        }
        if last_percent != Some(100) {
            progress(100);
        }

        writer
            .sync_all()
            .await
            .map_err(|e| zapps_fs::Error::io(&partial, e))?;
        drop(writer);
        tokio::fs::rename(&partial, &dest)
            .await
            .map_err(|e| zapps_fs::Error::io(&dest, e))?;
        Ok(dest)
    }
}

fn percent_of(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (done.saturating_mul(100) / total).min(100) as u8
}

/// Drives update checks against one source.
pub struct Updater {
    source: Box<dyn UpdateSource>,
    channel: UpdateChannel,
    current: Version,
    updates_dir: PathBuf,
}

impl Updater {
    pub fn new(
        source: Box<dyn UpdateSource>,
        channel: UpdateChannel,
        current: Version,
        updates_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            channel,
            current,
            updates_dir: updates_dir.into(),
        }
    }

    pub fn channel(&self) -> &UpdateChannel {
        &self.channel
    }

    /// Check for a newer release and download it if there is one.
    ///
    /// The downloaded release is recorded in `updates/pending.json` so a
    /// later process can apply it.
    pub async fn check(&self) -> Result<UpdateOutcome> {
        self.channel.publish(UpdateEvent::Checking);

        let release = match self.source.latest().await? {
            Some(release) if release.version > self.current => release,
            _ => {
                self.channel.publish(UpdateEvent::NotAvailable);
                return Ok(UpdateOutcome::UpToDate {
                    current: self.current.clone(),
                });
            }
        };

        let version = release.version.to_string();
        self.channel.publish(UpdateEvent::Available {
            version: version.clone(),
        });

        let channel = self.channel.clone();
        let report = move |percent: u8| channel.publish(UpdateEvent::Progress { percent });
        let artifact = self
            .source
            .download(&release, &self.updates_dir, &report)
            .await?;

        let downloaded = Release {
            version: release.version,
            artifact,
        };
        ConfigStore::new().save(&self.pending_file(), &downloaded)?;

        tracing::info!(version = %version, "update downloaded");
        self.channel.publish(UpdateEvent::Downloaded { version });
        Ok(UpdateOutcome::Downloaded(downloaded))
    }

    fn pending_file(&self) -> PathBuf {
        self.updates_dir.join(PENDING_FILE)
    }

    /// The downloaded release waiting to be applied, if any.
    pub fn pending(&self) -> Result<Option<Release>> {
        pending_release(&self.updates_dir)
    }

    pub fn restart_to_apply(&self, host: &dyn WindowHost) -> bool {
        restart_to_apply(&self.updates_dir, host)
    }
}

/// The release recorded in `{updates_dir}/pending.json`, if its artifact
/// still exists.
pub fn pending_release(updates_dir: &Path) -> Result<Option<Release>> {
    match ConfigStore::new().load::<Release>(&updates_dir.join(PENDING_FILE)) {
        Ok(release) if release.artifact.is_file() => Ok(Some(release)),
        Ok(_) => Ok(None),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Hand the pending artifact to the host and return without waiting.
///
/// Returns whether anything was handed off. Failures are logged.
pub fn restart_to_apply(updates_dir: &Path, host: &dyn WindowHost) -> bool {
    let release = match pending_release(updates_dir) {
        Ok(Some(release)) => release,
        Ok(None) => {
            tracing::info!("no downloaded update to apply");
            return false;
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot read pending update");
            return false;
        }
    };
    match host.apply_update(&release.artifact) {
        Ok(()) => {
            tracing::info!(version = %release.version, "restarting to apply update");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "host refused update");
            false
        }
    }
}
