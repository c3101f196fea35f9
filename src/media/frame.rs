// SPDX-License-Identifier: GPL-3.0-only

//! Display-ready RGBA frames

use super::formats::FrameGeometry;
use crate::constants::RGBA_BYTES_PER_PIXEL;
use std::fmt;

/// Packed RGBA pixels, row-major, row stride `width * 4`
///
/// Produced by the converter with `sequence == 0`; the frame publisher
/// stamps the sequence number when it takes ownership.
#[derive(Clone, PartialEq, Eq)]
pub struct RgbaFrame {
    geometry: FrameGeometry,
    sequence: u64,
    data: Vec<u8>,
}

impl RgbaFrame {
    /// Wrap an RGBA buffer, returning `None` if its length does not match
    pub fn from_raw(geometry: FrameGeometry, data: Vec<u8>) -> Option<Self> {
        if data.len() != geometry.rgba_len() {
            return None;
        }
        Some(Self {
            geometry,
            sequence: 0,
            data,
        })
    }

    /// Caller guarantees `data.len() == geometry.rgba_len()`
    pub(crate) fn from_converted(geometry: FrameGeometry, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), geometry.rgba_len());
        Self {
            geometry,
            sequence: 0,
            data,
        }
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    pub fn width(&self) -> u32 {
        self.geometry.width()
    }

    pub fn height(&self) -> u32 {
        self.geometry.height()
    }

    /// Publish order, starting at 1; 0 for frames never published
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    /// Raw RGBA bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// RGBA value at (x, y), coordinates clamped to the frame
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let x = x.min(self.width() - 1) as usize;
        let y = y.min(self.height() - 1) as usize;
        let idx = y * self.geometry.rgba_row_len() + x * RGBA_BYTES_PER_PIXEL;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }
}

impl fmt::Debug for RgbaFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RgbaFrame({}, seq {}, {} bytes)",
            self.geometry,
            self.sequence,
            self.data.len()
        )
    }
}
