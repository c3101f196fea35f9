// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end capture → convert → publish → render without a device

use camview::backends::camera::{
    CaptureLoopController, FrameSource, NegotiatedFormat, StopReason, run_capture,
};
use camview::errors::{CaptureError, RenderError};
use camview::media::frame_slot;
use camview::media::{ChromaLayout, FrameGeometry, RgbaFrame, YuvConverter};
use camview::pipelines::PreviewPipeline;
use camview::render::{FrameRenderer, LoopAction, run_render_loop};
use std::thread;
use std::time::Duration;

/// NV12 source whose luma plane is filled with the frame counter
struct CountingSource {
    format: NegotiatedFormat,
    buffer: Vec<u8>,
    counter: u8,
    fail_after: Option<u8>,
}

impl CountingSource {
    fn new(width: u32, height: u32) -> Self {
        let layout = ChromaLayout::Nv12;
        let format = NegotiatedFormat {
            device: "counting".into(),
            geometry: FrameGeometry::new(width, height).unwrap(),
            layout,
            row_stride: layout.min_row_stride(width),
            reported_range: None,
        };
        let buffer = vec![128; format.sample_len()];
        Self {
            format,
            buffer,
            counter: 0,
            fail_after: None,
        }
    }
}

impl FrameSource for CountingSource {
    fn format(&self) -> &NegotiatedFormat {
        &self.format
    }

    fn next_sample(&mut self) -> Result<Option<&[u8]>, CaptureError> {
        if self.fail_after == Some(self.counter) {
            return Err(CaptureError::Stream("device unplugged".into()));
        }
        self.counter = self.counter.wrapping_add(1);
        // Every other call simulates "no buffer ready yet"
        if self.counter % 2 == 0 {
            return Ok(None);
        }
        let luma_len = self.format.row_stride * self.format.geometry.height() as usize;
        self.buffer[..luma_len].fill(self.counter);
        thread::sleep(Duration::from_millis(1));
        Ok(Some(&self.buffer))
    }
}

/// Keeps every uploaded frame
struct RecordingRenderer {
    frames: Vec<RgbaFrame>,
}

impl FrameRenderer for RecordingRenderer {
    fn upload(&mut self, frame: RgbaFrame) {
        self.frames.push(frame);
    }

    fn draw(&mut self) -> Result<LoopAction, RenderError> {
        thread::sleep(Duration::from_millis(2));
        Ok(LoopAction::Continue)
    }
}

fn pipeline_for(format: &NegotiatedFormat) -> (PreviewPipeline, frame_slot::FrameReader) {
    let dest = FrameGeometry::new(8, 4).unwrap();
    let converter = YuvConverter::new(format.yuv_format(None), format.geometry, dest)
        .unwrap()
        .with_row_stride(format.row_stride)
        .unwrap();
    let (publisher, reader) = frame_slot::channel();
    (PreviewPipeline::new(converter, publisher), reader)
}

#[test]
fn test_capture_thread_feeds_render_loop() {
    let mut source = CountingSource::new(16, 8);
    let (mut pipeline, reader) = pipeline_for(source.format());

    let capture = CaptureLoopController::start("test-capture", move |stop| {
        run_capture(&mut source, &mut pipeline, Some(40), stop)
    })
    .unwrap();

    let mut renderer = RecordingRenderer { frames: Vec::new() };
    let stats = run_render_loop(&reader, &mut renderer, || capture.is_running()).unwrap();

    let summary = capture.join().unwrap();
    assert_eq!(summary.frames, 40);
    assert_eq!(summary.reason, StopReason::FrameLimit);
    assert!(summary.retries >= 39);

    assert_eq!(stats.uploads as usize, renderer.frames.len());
    // Each frame is uploaded once, in publish order
    assert!(
        renderer
            .frames
            .windows(2)
            .all(|w| w[0].sequence() < w[1].sequence())
    );
    for frame in &renderer.frames {
        assert_eq!(frame.width(), 8);
        assert_eq!(frame.height(), 4);
        // Sequence n comes from the n-th delivered sample, luma 2n - 1 (full range, gray)
        let luma = (2 * frame.sequence() - 1) as u8;
        assert_eq!(frame.pixel(0, 0), [luma, luma, luma, 255]);
    }

    // The slot ends with the last published frame
    assert_eq!(reader.latest_sequence(), Some(40));
}

#[test]
fn test_capture_error_reaches_join() {
    let mut source = CountingSource::new(16, 8);
    source.fail_after = Some(5);
    let (mut pipeline, reader) = pipeline_for(source.format());

    let capture = CaptureLoopController::start("test-capture-error", move |stop| {
        run_capture(&mut source, &mut pipeline, None, stop)
    })
    .unwrap();

    let mut renderer = RecordingRenderer { frames: Vec::new() };
    run_render_loop(&reader, &mut renderer, || capture.is_running()).unwrap();

    let err = capture.join().unwrap_err();
    assert!(matches!(err, CaptureError::Stream(_)));
    // Counter values 1, 3 and 5 were delivered before the failure
    assert_eq!(reader.latest_sequence(), Some(3));
}
