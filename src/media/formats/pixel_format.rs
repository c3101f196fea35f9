// SPDX-License-Identifier: GPL-3.0-only

//! Chroma-subsampled source layouts and luma range conventions

use super::FrameGeometry;
use crate::errors::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chroma subsampling family of a source layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsampling {
    /// One chroma pair per 2x1 luma block, interleaved with luma
    Packed422,
    /// One chroma pair per 2x2 luma block, stored after the luma plane
    Planar420,
}

/// Byte layout of a raw YUV sample as delivered by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChromaLayout {
    /// Packed 4:2:2 - Y0 U Y1 V
    Yuyv,
    /// Packed 4:2:2 - Y0 V Y1 U
    Yvyu,
    /// Packed 4:2:2 - U Y0 V Y1
    Uyvy,
    /// Packed 4:2:2 - V Y0 U Y1
    Vyuy,
    /// Planar 4:2:0 - Y plane, U plane, V plane
    I420,
    /// Planar 4:2:0 - Y plane, V plane, U plane
    Yv12,
    /// Semi-planar 4:2:0 - Y plane, interleaved U V plane
    Nv12,
    /// Semi-planar 4:2:0 - Y plane, interleaved V U plane
    Nv21,
}

/// Byte positions inside one 4-byte packed 4:2:2 group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PackedOffsets {
    pub y0: usize,
    pub u: usize,
    pub y1: usize,
    pub v: usize,
}

/// Where the two chroma samples of a 4:2:0 layout live, relative to the
/// start of the buffer, for a luma row stride `s` and frame height `h`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChromaPlanes {
    pub u_offset: usize,
    pub v_offset: usize,
    /// Bytes per chroma row
    pub stride: usize,
    /// Distance between horizontally adjacent chroma samples
    pub step: usize,
}

impl ChromaLayout {
    /// All layouts the converter handles
    pub const ALL: [ChromaLayout; 8] = [
        ChromaLayout::Yuyv,
        ChromaLayout::Yvyu,
        ChromaLayout::Uyvy,
        ChromaLayout::Vyuy,
        ChromaLayout::I420,
        ChromaLayout::Yv12,
        ChromaLayout::Nv12,
        ChromaLayout::Nv21,
    ];

    /// Parse a V4L2 FourCC (trailing spaces and case are ignored)
    pub fn from_fourcc(fourcc: &str) -> Result<Self, ConvertError> {
        match fourcc.trim().to_uppercase().as_str() {
            "YUYV" | "YUY2" => Ok(Self::Yuyv),
            "YVYU" => Ok(Self::Yvyu),
            "UYVY" => Ok(Self::Uyvy),
            "VYUY" => Ok(Self::Vyuy),
            "YU12" | "I420" => Ok(Self::I420),
            "YV12" => Ok(Self::Yv12),
            "NV12" => Ok(Self::Nv12),
            "NV21" => Ok(Self::Nv21),
            other => Err(ConvertError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Canonical V4L2 FourCC
    pub fn fourcc(&self) -> &'static str {
        match self {
            Self::Yuyv => "YUYV",
            Self::Yvyu => "YVYU",
            Self::Uyvy => "UYVY",
            Self::Vyuy => "VYUY",
            Self::I420 => "YU12",
            Self::Yv12 => "YV12",
            Self::Nv12 => "NV12",
            Self::Nv21 => "NV21",
        }
    }

    pub fn subsampling(&self) -> Subsampling {
        match self {
            Self::Yuyv | Self::Yvyu | Self::Uyvy | Self::Vyuy => Subsampling::Packed422,
            Self::I420 | Self::Yv12 | Self::Nv12 | Self::Nv21 => Subsampling::Planar420,
        }
    }

    /// Smallest valid row stride in bytes (luma plane for 4:2:0 layouts)
    pub fn min_row_stride(&self, width: u32) -> usize {
        match self.subsampling() {
            Subsampling::Packed422 => width as usize * 2,
            Subsampling::Planar420 => width as usize,
        }
    }

    /// Exact byte count of one sample with the given row stride
    pub fn source_len(&self, geometry: &FrameGeometry, row_stride: usize) -> usize {
        let height = geometry.height() as usize;
        match self {
            Self::Yuyv | Self::Yvyu | Self::Uyvy | Self::Vyuy => row_stride * height,
            Self::I420 | Self::Yv12 => row_stride * height + 2 * (row_stride / 2) * (height / 2),
            Self::Nv12 | Self::Nv21 => row_stride * height + row_stride * (height / 2),
        }
    }

    pub(crate) fn packed_offsets(&self) -> Option<PackedOffsets> {
        let (y0, u, y1, v) = match self {
            Self::Yuyv => (0, 1, 2, 3),
            Self::Yvyu => (0, 3, 2, 1),
            Self::Uyvy => (1, 0, 3, 2),
            Self::Vyuy => (1, 2, 3, 0),
            _ => return None,
        };
        Some(PackedOffsets { y0, u, y1, v })
    }

    pub(crate) fn chroma_planes(&self, row_stride: usize, height: usize) -> Option<ChromaPlanes> {
        let luma_len = row_stride * height;
        match self {
            Self::I420 | Self::Yv12 => {
                let stride = row_stride / 2;
                let first = luma_len;
                let second = luma_len + stride * (height / 2);
                let (u_offset, v_offset) = if *self == Self::I420 {
                    (first, second)
                } else {
                    (second, first)
                };
                Some(ChromaPlanes {
                    u_offset,
                    v_offset,
                    stride,
                    step: 1,
                })
            }
            Self::Nv12 | Self::Nv21 => {
                let (u_offset, v_offset) = if *self == Self::Nv12 {
                    (luma_len, luma_len + 1)
                } else {
                    (luma_len + 1, luma_len)
                };
                Some(ChromaPlanes {
                    u_offset,
                    v_offset,
                    stride: row_stride,
                    step: 2,
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for ChromaLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fourcc())
    }
}

/// How the 0-255 luma byte maps onto brightness
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LumaRange {
    /// Y is used as-is
    Full,
    /// Y spans 16-235 and is rescaled with (Y - 16) * 1.164
    Studio,
}

impl LumaRange {
    /// Range assumed when neither the user nor the driver says otherwise.
    ///
    /// Packed 4:2:2 comes from UVC webcams, which use limited-range video
    /// levels. The 4:2:0 path serves ISP low-resolution streams, which are
    /// delivered with full-range JPEG quantization.
    pub fn default_for(layout: ChromaLayout) -> Self {
        match layout.subsampling() {
            Subsampling::Packed422 => LumaRange::Studio,
            Subsampling::Planar420 => LumaRange::Full,
        }
    }

    /// Pick the range for a negotiated format: explicit override, then the
    /// driver-reported quantization, then the layout default
    pub fn resolve(
        requested: Option<LumaRange>,
        reported: Option<LumaRange>,
        layout: ChromaLayout,
    ) -> Self {
        requested
            .or(reported)
            .unwrap_or_else(|| Self::default_for(layout))
    }
}

impl fmt::Display for LumaRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LumaRange::Full => write!(f, "full"),
            LumaRange::Studio => write!(f, "studio"),
        }
    }
}

/// Source format chosen once at startup from the negotiated capture format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YuvFormat {
    pub layout: ChromaLayout,
    pub luma_range: LumaRange,
}

impl YuvFormat {
    pub fn new(layout: ChromaLayout, luma_range: LumaRange) -> Self {
        Self { layout, luma_range }
    }

    /// Format with the layout's default luma range
    pub fn with_default_range(layout: ChromaLayout) -> Self {
        Self::new(layout, LumaRange::default_for(layout))
    }
}

impl fmt::Display for YuvFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} range)", self.layout, self.luma_range)
    }
}
