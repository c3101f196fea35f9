// SPDX-License-Identifier: GPL-3.0-only

//! Pixel conversion and frame handoff
//!
//! Camera samples arrive in a chroma-subsampled YUV layout (packed 4:2:2 or
//! planar 4:2:0). The [`yuv_converter`] turns each one into a packed RGBA
//! [`RgbaFrame`], and the [`frame_slot`] hands the newest frame to whoever
//! draws it.
//!
//! # Modules
//!
//! - [`formats`]: Frame geometry, chroma layouts and luma ranges
//! - [`frame`]: The RGBA frame type
//! - [`yuv_converter`]: YUV to RGBA conversion with center crop
//! - [`frame_slot`]: Latest-frame channel between capture and display

pub mod formats;
pub mod frame;
pub mod frame_slot;
pub mod yuv_converter;

pub use formats::{ChromaLayout, FrameGeometry, LumaRange, YuvFormat};
pub use frame::RgbaFrame;
pub use frame_slot::{FramePublisher, FrameReader};
pub use yuv_converter::{YuvConverter, convert};
