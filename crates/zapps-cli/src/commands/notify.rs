//! Notification command

use crate::context::Runtime;
use crate::error::Result;

pub fn run_notify(runtime: &Runtime, title: Option<&str>, body: Option<&str>) -> Result<()> {
    runtime.send_notification(title, body)?;
    Ok(())
}
