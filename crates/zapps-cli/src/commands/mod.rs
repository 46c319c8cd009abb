//! Command implementations for zapps-cli

pub mod about;
pub mod install;
pub mod launch;
pub mod list;
pub mod notify;
pub mod pin;
pub mod repair;
pub mod storage;
pub mod uninstall;
pub mod update;

pub use about::run_about;
pub use install::run_install;
pub use launch::{run_launch, run_open};
pub use list::{print_launcher, run_list};
pub use notify::run_notify;
pub use pin::run_pin;
pub use repair::print_repair;
pub use storage::{run_storage_get, run_storage_set};
pub use uninstall::run_uninstall;
pub use update::{run_check_update, run_restart_update};
