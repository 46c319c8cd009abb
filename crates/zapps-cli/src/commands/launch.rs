//! Open and launch commands

use std::path::Path;

use colored::Colorize;
use zapps_core::LaunchDescriptor;

use crate::context::Runtime;
use crate::error::Result;

/// Open a bundle: install then launch, or launch directly with `--direct`.
pub fn run_open(runtime: &Runtime, bundle: &Path) -> Result<()> {
    let descriptor = runtime.open_and_launch(bundle)?;
    report(&descriptor);
    Ok(())
}

/// Launch an installed package by id.
pub fn run_launch(runtime: &Runtime, id: &str) -> Result<()> {
    let descriptor = runtime.launch_by_id(id)?;
    report(&descriptor);
    Ok(())
}

fn report(descriptor: &LaunchDescriptor) {
    println!(
        "{} {} ({})",
        "Launched:".green().bold(),
        descriptor.title,
        descriptor.context.package_id().cyan()
    );
    tracing::debug!(
        entry = %descriptor.entry.display(),
        width = descriptor.width,
        height = descriptor.height,
        "window requested"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{open_runtime, test_options};
    use crate::host::CliHost;
    use tempfile::TempDir;
    use zapps_core::Error;
    use zapps_test_utils::ZappBuilder;

    fn headless(dir: &TempDir, direct: bool) -> Runtime {
        open_runtime(&test_options(dir.path(), "", direct)).unwrap().0
    }

    fn windows(runtime: &Runtime) -> usize {
        match runtime.host() {
            CliHost::Headless(host) => host.windows().len(),
            CliHost::Process(_) => unreachable!("tests run headless"),
        }
    }

    #[test]
    fn open_installs_then_launches() {
        let temp = TempDir::new().unwrap();
        let runtime = headless(&temp, false);
        let bundle = ZappBuilder::app("com.acme.notes", "1.0").write_to(&temp.path().join("n.zapp"));

        run_open(&runtime, &bundle).unwrap();

        assert_eq!(windows(&runtime), 1);
        assert_eq!(runtime.library().unwrap().len(), 1);
    }

    #[test]
    fn direct_open_skips_library() {
        let temp = TempDir::new().unwrap();
        let runtime = headless(&temp, true);
        let bundle = ZappBuilder::app("com.acme.notes", "1.0").write_to(&temp.path().join("n.zapp"));

        run_open(&runtime, &bundle).unwrap();

        assert_eq!(windows(&runtime), 1);
        assert!(runtime.library().unwrap().is_empty());
    }

    #[test]
    fn launch_unknown_id_is_not_installed() {
        let temp = TempDir::new().unwrap();
        let runtime = headless(&temp, false);

        let err = run_launch(&runtime, "com.acme.absent").unwrap_err();

        assert!(matches!(
            err,
            crate::error::CliError::Core(Error::NotInstalled { .. })
        ));
        assert_eq!(windows(&runtime), 0);
    }
}
