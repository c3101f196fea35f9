// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera capture

//! Shared types for camera capture

use crate::config::FormatSettings;
use crate::media::formats::{ChromaLayout, FrameGeometry, LumaRange, YuvFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How capture buffers are exchanged with the driver
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum IoMethod {
    /// Driver-allocated buffers mapped into our address space
    #[default]
    Mmap,
    /// Buffers allocated by us and handed to the driver
    #[value(name = "userptr")]
    UserPtr,
}

impl std::fmt::Display for IoMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoMethod::Mmap => write!(f, "mmap"),
            IoMethod::UserPtr => write!(f, "userptr"),
        }
    }
}

/// What to open and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Device node (e.g., /dev/video0)
    pub device: String,
    pub io_method: IoMethod,
    /// Format to force; `None` keeps the device's current format
    pub force_format: Option<FormatSettings>,
}

/// Capture format agreed with the device, fixed for the whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedFormat {
    /// Device node the format was negotiated on
    pub device: String,
    pub geometry: FrameGeometry,
    pub layout: ChromaLayout,
    /// Bytes per line (luma plane for 4:2:0)
    pub row_stride: usize,
    /// Luma range reported by the driver, if it reports one
    pub reported_range: Option<LumaRange>,
}

impl NegotiatedFormat {
    /// Source format for the converter, applying the luma range precedence
    pub fn yuv_format(&self, requested: Option<LumaRange>) -> YuvFormat {
        YuvFormat::new(
            self.layout,
            LumaRange::resolve(requested, self.reported_range, self.layout),
        )
    }

    /// Exact byte count of one sample in this format
    pub fn sample_len(&self) -> usize {
        self.layout.source_len(&self.geometry, self.row_stride)
    }
}

impl std::fmt::Display for NegotiatedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} stride {}",
            self.layout.fourcc(),
            self.geometry,
            self.row_stride
        )
    }
}

/// Device information from V4L2 capability
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceInfo {
    /// Name of the device (V4L2 card)
    pub card: String,
    /// Driver name (V4L2 driver)
    pub driver: String,
    /// Device path (e.g., /dev/video0)
    pub path: String,
    /// Real device path (resolved symlinks)
    pub real_path: String,
    /// FourCCs the device offers for capture
    pub formats: Vec<String>,
}

impl DeviceInfo {
    /// Whether any offered format can be converted
    pub fn has_supported_format(&self) -> bool {
        self.formats
            .iter()
            .any(|f| ChromaLayout::from_fourcc(f).is_ok())
    }
}

/// Why a capture loop ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// The configured frame count was reached
    #[default]
    FrameLimit,
    /// Stop was requested from outside the loop
    Requested,
}

/// Outcome of a finished capture loop
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CaptureSummary {
    /// Samples converted and published
    pub frames: u64,
    /// "No data yet" results that were retried
    pub retries: u64,
    pub elapsed: Duration,
    pub reason: StopReason,
}

impl CaptureSummary {
    pub fn average_fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}
