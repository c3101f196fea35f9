// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running the viewer
//! - Listing capture devices
//! - Showing the effective configuration

use camview::Config;
use camview::app;
use camview::backends::camera::list_devices as enumerate_devices;
use camview::errors::{AppError, AppResult};

/// Run the viewer with the effective configuration
pub fn view(config: &Config) -> AppResult<()> {
    let report = app::run(config)?;

    if config.frame_count.is_some() {
        println!(
            "Captured {} frames in {:.1}s ({:.1} fps), displayed {}",
            report.capture.frames,
            report.capture.elapsed.as_secs_f64(),
            report.capture.average_fps(),
            report.render.uploads
        );
    }
    Ok(())
}

/// List all capture devices
pub fn list_devices() -> AppResult<()> {
    let devices = enumerate_devices();

    if devices.is_empty() {
        println!("No capture devices found.");
        return Ok(());
    }

    println!("Available capture devices:");
    println!();
    for device in &devices {
        println!("  {} - {} ({})", device.path, device.card, device.driver);
        if device.real_path != device.path {
            println!("      Node: {}", device.real_path);
        }
        if !device.formats.is_empty() {
            println!("      Formats: {}", device.formats.join(", "));
        }
        if !device.has_supported_format() {
            println!("      (no format camview can convert)");
        }
        println!();
    }

    Ok(())
}

/// Print the effective configuration, optionally storing it
pub fn print_config(config: &Config, save: bool) -> AppResult<()> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Config(format!("failed to serialize config: {}", e)))?;
    println!("{}", json);

    if save {
        config.save()?;
        if let Some(dir) = Config::config_dir() {
            println!("Saved to {}", dir.display());
        }
    }
    Ok(())
}
