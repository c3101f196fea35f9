// SPDX-License-Identifier: GPL-3.0-only

//! Capture-side preview pipeline
//!
//! Every raw sample the capture source hands over is checked against the
//! negotiated size, converted to RGBA and published to the frame slot before
//! [`PreviewPipeline::deliver_raw_sample`] returns. The caller can release
//! the device buffer as soon as the call is done.

use crate::constants::CAPTURE_LOG_INTERVAL;
use crate::errors::CaptureError;
use crate::media::frame_slot::FramePublisher;
use crate::media::yuv_converter::YuvConverter;
use std::time::Instant;
use tracing::{debug, info};

/// Converter plus publisher for one capture session
pub struct PreviewPipeline {
    converter: YuvConverter,
    publisher: FramePublisher,
    expected_len: usize,
    delivered: u64,
    window_start: Instant,
}

impl PreviewPipeline {
    pub fn new(converter: YuvConverter, publisher: FramePublisher) -> Self {
        let expected_len = converter.expected_len();
        info!(
            format = %converter.format(),
            source = %converter.source_geometry(),
            dest = %converter.dest_geometry(),
            stride = converter.row_stride(),
            expected_len,
            "Preview pipeline ready"
        );
        Self {
            converter,
            publisher,
            expected_len,
            delivered: 0,
            window_start: Instant::now(),
        }
    }

    /// Validate, convert and publish one raw sample
    ///
    /// Returns the sequence number the frame was published under. A sample
    /// of the wrong size is reported as [`CaptureError::SampleSize`] and
    /// nothing is published.
    pub fn deliver_raw_sample(&mut self, bytes: &[u8]) -> Result<u64, CaptureError> {
        if bytes.len() != self.expected_len {
            return Err(CaptureError::SampleSize {
                expected: self.expected_len,
                actual: bytes.len(),
            });
        }

        let frame = self.converter.convert(bytes);
        let sequence = self.publisher.publish(frame);
        self.delivered += 1;

        if self.delivered % CAPTURE_LOG_INTERVAL == 0 {
            let elapsed = self.window_start.elapsed().as_secs_f64();
            let fps = if elapsed > 0.0 {
                CAPTURE_LOG_INTERVAL as f64 / elapsed
            } else {
                0.0
            };
            debug!(
                delivered = self.delivered,
                sequence,
                fps = format!("{:.1}", fps),
                "Capture throughput"
            );
            self.window_start = Instant::now();
        }

        Ok(sequence)
    }

    /// Samples converted and published so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}
