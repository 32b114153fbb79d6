//! Logging setup built on `fern`.
//!
//! The crate itself only emits records through the `log` facade; applications
//! that do not install their own logger can call [`init`] with the
//! `[logging]` section of their configuration.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use chrono::Local;
use log::LevelFilter;

/// Install a global `fern` dispatcher according to `config`.
///
/// Does nothing when logging is disabled. Fails if a global logger has
/// already been installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    let level: LevelFilter = config
        .level
        .parse()
        .with_context(|| format!("Invalid logging level '{}'", config.level))?;

    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {:<5} {}] {}",
                Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Off)
        .level_for("sea_crud", level);

    let dispatch = match &config.file {
        Some(path) => dispatch.chain(
            fern::log_file(path).with_context(|| format!("Failed to open log file: {}", path.display()))?,
        ),
        None => dispatch.chain(std::io::stderr()),
    };

    dispatch.apply().context("A global logger is already installed")?;
    Ok(())
}
