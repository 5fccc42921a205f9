//! Logger setup for the hook process

use anyhow::{Context, Result};
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;

/// Initialize env_logger at `level`, writing to `log_file` (appending) or stderr.
///
/// Stdout is reserved for the provisioning decision, so logs never go there.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> Result<()> {
    let level = LevelFilter::from_str(level)
        .with_context(|| format!("Invalid log level '{}'", level))?;

    let mut builder = Builder::from_default_env();
    builder.filter_level(level);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(Target::Stderr);
        }
    }

    builder
        .try_init()
        .context("Failed to initialize logger")
}
