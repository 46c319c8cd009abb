//! Shortcut collaborator
//!
//! The core resolves what a shortcut points at; writing the OS-specific file
//! is delegated to a [`ShortcutWriter`].

use std::path::{Path, PathBuf};

use crate::context::PackageContext;
use crate::error::{Error, Result};
use crate::host::HostError;
use crate::paths::ZappPaths;

/// What a shortcut launches: the host executable with the installed archive
/// as its argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutSpec {
    pub id: String,
    pub display_name: String,
    pub exe: PathBuf,
    pub archive: PathBuf,
}

/// Writes one shortcut file into a destination directory.
pub trait ShortcutWriter {
    /// Returns the path of the written shortcut.
    fn write(&self, dest_dir: &Path, spec: &ShortcutSpec) -> std::result::Result<PathBuf, HostError>;
}

/// The two places a shortcut is pinned to. `None` skips that destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortcutDestinations {
    pub desktop: Option<PathBuf>,
    pub start_menu: Option<PathBuf>,
}

/// Pin an installed package to the desktop and start menu.
///
/// Fails with [`Error::NotInstalled`] when `id` has no installed archive.
pub fn create_shortcut(
    paths: &ZappPaths,
    id: &str,
    display_name: &str,
    exe: &Path,
    destinations: &ShortcutDestinations,
    writer: &dyn ShortcutWriter,
) -> Result<Vec<PathBuf>> {
    let not_installed = || Error::NotInstalled { id: id.to_string() };
    let context = PackageContext::new(id).map_err(|_| not_installed())?;
    let archive = paths.installed_archive(context.package_id());
    if !archive.is_file() {
        return Err(not_installed());
    }

    let spec = ShortcutSpec {
        id: id.to_string(),
        display_name: display_name.to_string(),
        exe: exe.to_path_buf(),
        archive,
    };

    let mut written = Vec::new();
    for dest in [&destinations.desktop, &destinations.start_menu]
        .into_iter()
        .flatten()
    {
        let path = writer.write(dest, &spec)?;
        tracing::info!(id = %id, shortcut = %path.display(), "shortcut created");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingWriter {
        calls: Mutex<Vec<(PathBuf, ShortcutSpec)>>,
    }

    impl ShortcutWriter for RecordingWriter {
        fn write(
            &self,
            dest_dir: &Path,
            spec: &ShortcutSpec,
        ) -> std::result::Result<PathBuf, HostError> {
            self.calls
                .lock()
                .unwrap()
                .push((dest_dir.to_path_buf(), spec.clone()));
            Ok(dest_dir.join(format!("{}.lnk", spec.id)))
        }
    }

    #[test]
    fn writes_to_both_destinations() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ZappPaths::new(dir.path(), dir.path().join("tmp"));
        let archive = paths.installed_archive("com.acme.notes");
        std::fs::create_dir_all(archive.parent().unwrap()).unwrap();
        std::fs::write(&archive, "zip").unwrap();
        let destinations = ShortcutDestinations {
            desktop: Some(dir.path().join("Desktop")),
            start_menu: Some(dir.path().join("Programs")),
        };
        let writer = RecordingWriter::default();

        let written = create_shortcut(
            &paths,
            "com.acme.notes",
            "Notes",
            Path::new("/usr/bin/zapps"),
            &destinations,
            &writer,
        )
        .unwrap();

        assert_eq!(written.len(), 2);
        let calls = writer.calls.lock().unwrap();
        assert_eq!(calls[0].0, dir.path().join("Desktop"));
        assert_eq!(calls[1].1.archive, archive);
        assert_eq!(calls[1].1.display_name, "Notes");
    }

    #[test]
    fn not_installed_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ZappPaths::new(dir.path(), dir.path().join("tmp"));
        let writer = RecordingWriter::default();

        let err = create_shortcut(
            &paths,
            "com.acme.ghost",
            "Ghost",
            Path::new("/usr/bin/zapps"),
            &ShortcutDestinations {
                desktop: Some(dir.path().to_path_buf()),
                start_menu: None,
            },
            &writer,
        )
        .unwrap_err();

        assert!(matches!(err, Error::NotInstalled { .. }));
        assert!(writer.calls.lock().unwrap().is_empty());
    }
}
