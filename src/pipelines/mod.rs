// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines between capture and display
//!
//! ```text
//! ┌──────────────┐     ┌────────────────────┐     ┌──────────────┐
//! │  Raw sample  │ ──▶ │  Preview Pipeline  │ ──▶ │  Frame slot  │
//! │ (YUYV/NV12…) │     │  - size check      │     │ (latest RGBA)│
//! │              │     │  - YUV→RGBA        │     │              │
//! └──────────────┘     └────────────────────┘     └──────────────┘
//! ```

pub mod preview;

pub use preview::PreviewPipeline;
