// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 device discovery
//!
//! Used by the `list` subcommand to show which device nodes can feed the
//! viewer and in which formats.

use super::types::DeviceInfo;
use std::path::Path;
use tracing::debug;
use v4l::capability::Flags;
use v4l::prelude::*;
use v4l::video::Capture;

/// Enumerate `/dev/video*` capture nodes, sorted by path
///
/// Nodes that cannot be opened or are not video capture devices (metadata
/// nodes, output-only devices) are skipped.
pub fn list_devices() -> Vec<DeviceInfo> {
    let mut devices: Vec<DeviceInfo> = v4l::context::enum_devices()
        .iter()
        .filter_map(|node| probe_device(node.path()))
        .collect();
    devices.sort_by(|a, b| a.path.cmp(&b.path));
    devices
}

/// Build DeviceInfo for one node
///
/// Resolves symlinks to get the real device path and queries card, driver
/// and the offered capture FourCCs.
pub fn probe_device(path: &Path) -> Option<DeviceInfo> {
    let path_str = path.to_string_lossy().to_string();

    let dev = match Device::with_path(path) {
        Ok(dev) => dev,
        Err(e) => {
            debug!(device = %path_str, error = %e, "Cannot open device, skipping");
            return None;
        }
    };

    let caps = dev.query_caps().ok()?;
    if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
        debug!(device = %path_str, "Not a capture device, skipping");
        return None;
    }

    let formats = dev
        .enum_formats()
        .map(|descriptions| {
            descriptions
                .iter()
                .map(|d| d.fourcc.to_string().trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    // Get real path by resolving symlinks
    let real_path = std::fs::canonicalize(path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| path_str.clone());

    debug!(device = %path_str, card = %caps.card, "Found capture device");

    Some(DeviceInfo {
        card: caps.card,
        driver: caps.driver,
        path: path_str,
        real_path,
        formats,
    })
}
