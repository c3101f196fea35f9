// SPDX-License-Identifier: GPL-3.0-only

//! camview - live V4L2 camera viewer
//!
//! Captures frames from a camera, converts them from the device's YUV layout
//! to RGBA and shows the most recent one, with capture and display running
//! on independent threads.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`media`]: Pixel formats, YUV→RGBA conversion and the latest-frame slot
//! - [`pipelines`]: Sample validation, conversion and publishing
//! - [`backends`]: V4L2 capture and device discovery
//! - [`render`]: Render loop and renderers
//! - [`terminal`]: Terminal renderer
//! - [`app`]: Startup, thread wiring and shutdown
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! let (publisher, reader) = camview::media::frame_slot::channel();
//! publisher.publish(frame);
//! if let Some(latest) = reader.take_latest() {
//!     draw(&latest);
//! }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pipelines;
pub mod render;
pub mod terminal;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use media::{FramePublisher, FrameReader, RgbaFrame, YuvConverter};
