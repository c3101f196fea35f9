// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use camview::constants::{
    CAPTURE_BUFFER_COUNT, DEFAULT_FOURCC, DEFAULT_HEIGHT, DEFAULT_REFRESH_HZ, DEFAULT_WIDTH,
    DEVICE_WAIT_TIMEOUT, MAX_REFRESH_HZ, refresh_interval,
};
use camview::media::{ChromaLayout, FrameGeometry};
use std::time::Duration;

#[test]
fn test_default_geometry_is_valid() {
    // Default capture size must satisfy the even-dimension invariant
    assert!(FrameGeometry::new(DEFAULT_WIDTH, DEFAULT_HEIGHT).is_ok());
}

#[test]
fn test_default_fourcc_is_convertible() {
    assert!(ChromaLayout::from_fourcc(DEFAULT_FOURCC).is_ok());
}

#[test]
fn test_buffer_queue_allows_streaming() {
    // One buffer in flight with the app, at least one with the driver
    assert!(CAPTURE_BUFFER_COUNT >= 2);
}

#[test]
fn test_device_timeout_is_seconds() {
    assert!(DEVICE_WAIT_TIMEOUT >= Duration::from_secs(1));
}

#[test]
fn test_refresh_interval_ordering() {
    // Higher refresh rates give shorter intervals up to the cap
    let mut prev = Duration::MAX;
    for hz in [1, 24, 30, DEFAULT_REFRESH_HZ, 120, MAX_REFRESH_HZ] {
        let interval = refresh_interval(hz);
        assert!(interval < prev, "{} Hz should be faster than the previous rate", hz);
        prev = interval;
    }
    assert_eq!(
        refresh_interval(MAX_REFRESH_HZ * 2),
        refresh_interval(MAX_REFRESH_HZ)
    );
}
