//! Freedesktop `.desktop` shortcut writer

use std::path::{Path, PathBuf};

use zapps_core::{HostError, ShortcutSpec, ShortcutWriter};

/// Writes `{dest}/{id}.desktop` launching the runtime with the installed
/// archive.
#[derive(Debug, Default)]
pub struct DesktopEntryWriter;

impl DesktopEntryWriter {
    fn render(spec: &ShortcutSpec) -> String {
        format!(
            "[Desktop Entry]\nType=Application\nName={}\nExec=\"{}\" \"{}\"\nTerminal=false\n",
            spec.display_name,
            spec.exe.display(),
            spec.archive.display()
        )
    }
}

impl ShortcutWriter for DesktopEntryWriter {
    fn write(&self, dest_dir: &Path, spec: &ShortcutSpec) -> Result<PathBuf, HostError> {
        let path = dest_dir.join(format!("{}.desktop", spec.id));
        zapps_fs::io::replace_atomic(&path, Self::render(spec).as_bytes(), true)
            .map_err(|e| HostError::Other(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .map_err(|e| HostError::Other(format!("{}: {e}", path.display())))?;
        }

        Ok(path)
    }
}
