//! Per-package storage commands

use colored::Colorize;
use serde_json::Value;
use zapps_core::PackageContext;

use crate::context::Runtime;
use crate::error::Result;

pub fn run_storage_get(runtime: &Runtime, id: &str, key: &str) -> Result<()> {
    let context = PackageContext::new(id)?;
    match runtime.storage_get(&context, key)? {
        Some(value) => println!("{value}"),
        None => eprintln!("{} '{}' is not set", "note:".dimmed(), key),
    }
    Ok(())
}

pub fn run_storage_set(runtime: &Runtime, id: &str, key: &str, raw: &str) -> Result<()> {
    let context = PackageContext::new(id)?;
    let value = parse_value(raw);
    runtime.storage_set(&context, key, value)?;
    tracing::debug!(id = %id, key = %key, "value stored");
    Ok(())
}

/// JSON when it parses, otherwise the raw text as a string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
