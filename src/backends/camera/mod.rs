// SPDX-License-Identifier: GPL-3.0-only

//! Camera capture
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ CaptureLoopController│  ← capture thread lifecycle, error reporting
//! └──────────┬───────────┘
//!            │ run_capture
//!            ▼
//! ┌──────────────────────┐     ┌──────────────────┐
//! │  FrameSource trait   │ ──▶ │ PreviewPipeline  │
//! └──────────┬───────────┘     └──────────────────┘
//!            │
//!            ▼
//!       ┌────────┐
//!       │  V4L2  │  ← concrete implementation (v4l crate)
//!       └────────┘
//! ```
//!
//! The device is opened and its format negotiated on the calling thread, so
//! configuration errors surface before any thread starts. Streaming begins
//! on the capture thread, which owns the device from then on.

pub mod frame_loop;
pub mod types;
pub mod v4l2_capture;
pub mod v4l2_utils;

pub use frame_loop::CaptureLoopController;
pub use types::*;
pub use v4l2_capture::{V4l2Device, V4l2Source};
pub use v4l2_utils::list_devices;

use crate::errors::CaptureError;
use crate::pipelines::PreviewPipeline;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// A stream of raw samples in a fixed negotiated format
pub trait FrameSource {
    /// Format every sample is delivered in
    fn format(&self) -> &NegotiatedFormat;

    /// Wait for the next filled buffer
    ///
    /// # Returns
    /// * `Ok(Some(bytes))` - A sample; the buffer goes back to the device on the next call
    /// * `Ok(None)` - No data yet, try again
    /// * `Err(CaptureError)` - Device-level failure, capture cannot continue
    fn next_sample(&mut self) -> Result<Option<&[u8]>, CaptureError>;
}

/// Drive `source` into `pipeline` until the frame limit, a stop request or an error
///
/// `max_frames == None` runs until `stop` is set. Transient "no data yet"
/// results are retried; any other failure ends the loop with that error.
pub fn run_capture<S>(
    source: &mut S,
    pipeline: &mut PreviewPipeline,
    max_frames: Option<u64>,
    stop: &AtomicBool,
) -> Result<CaptureSummary, CaptureError>
where
    S: FrameSource + ?Sized,
{
    let started = Instant::now();
    let mut summary = CaptureSummary::default();

    info!(format = %source.format(), max_frames = ?max_frames, "Capture loop started");

    loop {
        if stop.load(Ordering::SeqCst) {
            summary.reason = StopReason::Requested;
            break;
        }
        if max_frames.is_some_and(|max| summary.frames >= max) {
            summary.reason = StopReason::FrameLimit;
            break;
        }

        match source.next_sample()? {
            Some(bytes) => {
                pipeline.deliver_raw_sample(bytes)?;
                summary.frames += 1;
            }
            None => {
                summary.retries += 1;
                debug!(retries = summary.retries, "No frame ready yet");
            }
        }
    }

    summary.elapsed = started.elapsed();
    info!(
        frames = summary.frames,
        retries = summary.retries,
        reason = ?summary.reason,
        fps = format!("{:.1}", summary.average_fps()),
        "Capture loop finished"
    );
    Ok(summary)
}


#[cfg(test)]
mod tests {
    use super::testing::{ScriptedSource, Step};
    use super::*;
    use crate::media::frame_slot;
    use crate::media::yuv_converter::YuvConverter;

    fn pipeline_for(source: &ScriptedSource) -> (PreviewPipeline, frame_slot::FrameReader) {
        let format = source.format();
        let converter =
            YuvConverter::new(format.yuv_format(None), format.geometry, format.geometry).unwrap();
        let (publisher, reader) = frame_slot::channel();
        (PreviewPipeline::new(converter, publisher), reader)
    }

    fn sample(value: u8) -> Vec<u8> {
        vec![value; 4 * 2 * 2]
    }

    #[test]
    fn test_stops_at_frame_limit() {
        let mut source = ScriptedSource::yuyv(4, 2, vec![]);
        source.repeat = Some(sample(128));
        let (mut pipeline, reader) = pipeline_for(&source);

        let summary =
            run_capture(&mut source, &mut pipeline, Some(5), &AtomicBool::new(false)).unwrap();
        assert_eq!(summary.frames, 5);
        assert_eq!(summary.reason, StopReason::FrameLimit);
        assert_eq!(reader.latest_sequence(), Some(5));
    }

    #[test]
    fn test_transient_results_are_retried() {
        let mut source = ScriptedSource::yuyv(
            4,
            2,
            vec![
                Step::NotReady,
                Step::Sample(sample(100)),
                Step::NotReady,
                Step::NotReady,
                Step::Sample(sample(200)),
            ],
        );
        let (mut pipeline, reader) = pipeline_for(&source);

        let summary =
            run_capture(&mut source, &mut pipeline, Some(2), &AtomicBool::new(false)).unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.retries, 3);
        assert_eq!(reader.take_latest().unwrap().sequence(), 2);
    }

    #[test]
    fn test_device_error_is_fatal() {
        let mut source = ScriptedSource::yuyv(
            4,
            2,
            vec![
                Step::Sample(sample(128)),
                Step::Fail(CaptureError::Timeout {
                    device: "scripted".into(),
                    waited_ms: 2000,
                }),
                Step::Sample(sample(128)),
            ],
        );
        let (mut pipeline, reader) = pipeline_for(&source);

        let err = run_capture(&mut source, &mut pipeline, None, &AtomicBool::new(false))
            .unwrap_err();
        assert!(matches!(err, CaptureError::Timeout { .. }));
        assert_eq!(reader.latest_sequence(), Some(1));
    }

    #[test]
    fn test_wrong_sample_size_is_fatal() {
        let mut source = ScriptedSource::yuyv(4, 2, vec![Step::Sample(vec![0; 7])]);
        let (mut pipeline, reader) = pipeline_for(&source);

        let err = run_capture(&mut source, &mut pipeline, None, &AtomicBool::new(false))
            .unwrap_err();
        assert!(matches!(
            err,
            CaptureError::SampleSize {
                expected: 16,
                actual: 7
            }
        ));
        assert!(reader.take_latest().is_none());
    }

    #[test]
    fn test_stop_flag_ends_loop_before_reading() {
        let mut source = ScriptedSource::yuyv(4, 2, vec![]);
        let (mut pipeline, _reader) = pipeline_for(&source);

        let summary =
            run_capture(&mut source, &mut pipeline, None, &AtomicBool::new(true)).unwrap();
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.reason, StopReason::Requested);
    }

    #[test]
    fn test_zero_frame_limit_reads_nothing() {
        let mut source = ScriptedSource::yuyv(4, 2, vec![]);
        let (mut pipeline, _reader) = pipeline_for(&source);

        let summary =
            run_capture(&mut source, &mut pipeline, Some(0), &AtomicBool::new(false)).unwrap();
        assert_eq!(summary.frames, 0);
        assert_eq!(summary.reason, StopReason::FrameLimit);
    }
}
