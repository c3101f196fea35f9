// SPDX-License-Identifier: GPL-3.0-only

//! Frame geometry and source pixel formats
//!
//! The negotiated geometry and [`YuvFormat`] are fixed once capture starts
//! and are treated as constant inputs to the converter.

pub mod geometry;
pub mod pixel_format;

pub use geometry::FrameGeometry;
pub use pixel_format::{ChromaLayout, LumaRange, Subsampling, YuvFormat};
