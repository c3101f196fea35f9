// SPDX-License-Identifier: GPL-3.0-only

//! Hardware access
//!
//! # Modules
//!
//! - [`camera`]: V4L2 device discovery, format negotiation and frame capture

pub mod camera;
