//! Install command

use std::path::Path;

use colored::Colorize;
use zapps_core::UpsertOutcome;

use crate::context::Runtime;
use crate::error::Result;

/// Install a bundle, or update the installed package with the same id.
pub fn run_install(runtime: &Runtime, bundle: &Path) -> Result<()> {
    let installed = runtime.install(bundle)?;
    let verb = match installed.outcome {
        UpsertOutcome::Inserted => "Installed",
        UpsertOutcome::Updated => "Updated",
    };
    let version = installed.record.version.as_deref().unwrap_or("-");

    println!(
        "{} {} {} ({})",
        format!("{verb}:").green().bold(),
        installed.record.display_name(),
        version.dimmed(),
        installed.context.package_id().cyan()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{open_runtime, test_options};
    use tempfile::TempDir;
    use zapps_test_utils::ZappBuilder;

    fn headless(dir: &TempDir) -> Runtime {
        open_runtime(&test_options(dir.path(), "", false)).unwrap().0
    }

    #[test]
    fn install_adds_library_record() {
        let temp = TempDir::new().unwrap();
        let runtime = headless(&temp);
        let bundle = ZappBuilder::app("com.acme.notes", "1.0").write_to(&temp.path().join("n.zapp"));

        run_install(&runtime, &bundle).unwrap();

        let library = runtime.library().unwrap();
        assert_eq!(library.len(), 1);
        assert_eq!(library[0].id, "com.acme.notes");
    }

    #[test]
    fn install_missing_bundle_fails() {
        let temp = TempDir::new().unwrap();
        let runtime = headless(&temp);

        assert!(run_install(&runtime, &temp.path().join("absent.zapp")).is_err());
        assert!(runtime.library().unwrap().is_empty());
    }
}
