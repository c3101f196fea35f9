// SPDX-License-Identifier: GPL-3.0-only

//! Frame dimensions shared by the converter, the frame slot and the renderers

use crate::errors::ConvertError;
use std::fmt;

/// Width and height of a frame in pixels
///
/// Both dimensions are positive and even, so every 2x1 and 2x2 chroma block
/// lies fully inside the frame. The fields are private to keep that true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameGeometry {
    width: u32,
    height: u32,
}

impl FrameGeometry {
    /// Create a geometry, rejecting zero or odd dimensions
    pub fn new(width: u32, height: u32) -> Result<Self, ConvertError> {
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(ConvertError::InvalidGeometry { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels in the frame
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Byte length of a packed RGBA buffer of this size
    pub fn rgba_len(&self) -> usize {
        self.pixel_count() * crate::constants::RGBA_BYTES_PER_PIXEL
    }

    /// Bytes in one row of a packed RGBA buffer
    pub fn rgba_row_len(&self) -> usize {
        self.width as usize * crate::constants::RGBA_BYTES_PER_PIXEL
    }

    /// Whether this geometry fits inside `outer` without scaling
    pub fn fits_within(&self, outer: &FrameGeometry) -> bool {
        self.width <= outer.width && self.height <= outer.height
    }

    /// Offset of a centered `inner` rectangle, rounded down to even values
    /// so the crop starts on a chroma block boundary
    pub fn center_crop_offset(&self, inner: &FrameGeometry) -> (u32, u32) {
        let off_x = (self.width.saturating_sub(inner.width) / 2) & !1;
        let off_y = (self.height.saturating_sub(inner.height) / 2) & !1;
        (off_x, off_y)
    }
}

impl fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
