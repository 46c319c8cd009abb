//! Window hosts available to the CLI
//!
//! [`ProcessHost`] opens package entry files with the desktop's default
//! handler (`xdg-open`, `open`, `start`). Set `ZAPPS_OPENER` to use a
//! different program. [`CliHost`] picks between it and the recording
//! headless host.

use std::path::Path;
use std::process::{Command, Stdio};

use zapps_core::{HeadlessHost, HostError, LaunchDescriptor, Notification, WindowHandle, WindowHost};

/// Environment variable overriding the program used to open entry files.
pub const OPENER_ENV: &str = "ZAPPS_OPENER";

#[derive(Debug, Default)]
pub struct ProcessHost;

impl ProcessHost {
    fn opener() -> (String, Vec<String>) {
        if let Ok(custom) = std::env::var(OPENER_ENV) {
            let mut parts = custom.split_whitespace().map(str::to_string);
            if let Some(program) = parts.next() {
                return (program, parts.collect());
            }
        }
        if cfg!(target_os = "macos") {
            ("open".into(), Vec::new())
        } else if cfg!(windows) {
            ("cmd".into(), vec!["/C".into(), "start".into(), String::new()])
        } else {
            ("xdg-open".into(), Vec::new())
        }
    }

    /// Start `program` detached. The child is never waited on.
    fn spawn(program: &str, args: &[String], target: &Path) -> Result<(), HostError> {
        Command::new(program)
            .args(args)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|source| HostError::Spawn {
                program: program.to_string(),
                source,
            })
    }
}

impl WindowHost for ProcessHost {
    fn create_window(&self, descriptor: &LaunchDescriptor) -> Result<WindowHandle, HostError> {
        let (program, args) = Self::opener();
        Self::spawn(&program, &args, &descriptor.entry)?;
        tracing::debug!(program = %program, entry = %descriptor.entry.display(), "entry opened");
        Ok(WindowHandle::new(descriptor.context.to_string()))
    }

    /// The terminal is the launcher; the caller prints the library.
    fn create_launcher_window(&self) -> Result<WindowHandle, HostError> {
        Ok(WindowHandle::new("terminal"))
    }

    fn notify(&self, notification: &Notification) -> Result<(), HostError> {
        if cfg!(target_os = "linux") {
            Command::new("notify-send")
                .arg(&notification.title)
                .arg(&notification.body)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map(|_| ())
                .map_err(|source| HostError::Spawn {
                    program: "notify-send".into(),
                    source,
                })
        } else {
            Err(HostError::Unsupported {
                operation: "desktop notifications".into(),
            })
        }
    }

    fn apply_update(&self, artifact: &Path) -> Result<(), HostError> {
        Command::new(artifact)
            .stdin(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|source| HostError::Spawn {
                program: artifact.display().to_string(),
                source,
            })
    }
}

/// Host selected by `--headless`.
pub enum CliHost {
    Process(ProcessHost),
    Headless(HeadlessHost),
}

impl CliHost {
    pub fn new(headless: bool) -> Self {
        if headless {
            Self::Headless(HeadlessHost::new())
        } else {
            Self::Process(ProcessHost)
        }
    }

    fn inner(&self) -> &dyn WindowHost {
        match self {
            Self::Process(host) => host,
            Self::Headless(host) => host,
        }
    }
}

impl WindowHost for CliHost {
    fn bind_identity(&self, app_id: &str) -> Result<(), HostError> {
        self.inner().bind_identity(app_id)
    }

    fn create_window(&self, descriptor: &LaunchDescriptor) -> Result<WindowHandle, HostError> {
        self.inner().create_window(descriptor)
    }

    fn create_launcher_window(&self) -> Result<WindowHandle, HostError> {
        self.inner().create_launcher_window()
    }

    fn notify(&self, notification: &Notification) -> Result<(), HostError> {
        self.inner().notify(notification)
    }

    fn apply_update(&self, artifact: &Path) -> Result<(), HostError> {
        self.inner().apply_update(artifact)
    }
}
