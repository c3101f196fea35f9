// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application identifier used for the config directory
pub const APP_NAME: &str = "camview";

/// Config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Capture device opened when none is configured
pub const DEFAULT_DEVICE: &str = "/dev/video0";

/// Width requested when forcing a format without an explicit size
pub const DEFAULT_WIDTH: u32 = 640;

/// Height requested when forcing a format without an explicit size
pub const DEFAULT_HEIGHT: u32 = 480;

/// Pixel format requested when forcing a format without an explicit FourCC
pub const DEFAULT_FOURCC: &str = "YUYV";

/// Number of driver buffers in the capture queue
pub const CAPTURE_BUFFER_COUNT: u32 = 4;

/// Longest wait for the device to hand over a filled buffer
pub const DEVICE_WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Display refresh rate used when none is configured
pub const DEFAULT_REFRESH_HZ: u32 = 60;

/// Upper bound for the configurable refresh rate
pub const MAX_REFRESH_HZ: u32 = 240;

/// Bytes per destination pixel (R, G, B, A)
pub const RGBA_BYTES_PER_PIXEL: usize = 4;

/// Opacity written for every converted pixel
pub const OPAQUE: u8 = 255;

/// Frames between capture throughput log lines
pub const CAPTURE_LOG_INTERVAL: u64 = 60;

/// Interval between headless renderer stats lines
pub const RENDER_STATS_INTERVAL: Duration = Duration::from_secs(1);

/// Presentation interval for a refresh rate, clamped to the supported range
pub fn refresh_interval(refresh_hz: u32) -> Duration {
    let hz = refresh_hz.clamp(1, MAX_REFRESH_HZ);
    Duration::from_micros(1_000_000 / hz as u64)
}
