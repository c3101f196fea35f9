// SPDX-License-Identifier: GPL-3.0-only

//! Viewer startup and shutdown
//!
//! ```text
//! main thread                          capture thread
//! ───────────                          ──────────────
//! open + negotiate (errors here abort)
//! build converter, channel
//! spawn ─────────────────────────────▶ start stream
//! render loop ◀── take_latest ── slot ◀── publish ◀── run_capture
//! request_stop ──────────────────────▶ loop ends
//! join ◀────────────────────────────── Result<CaptureSummary>
//! ```

use crate::backends::camera::{
    CaptureLoopController, CaptureSettings, CaptureSummary, NegotiatedFormat, V4l2Device,
    run_capture,
};
use crate::config::{Config, RendererKind};
use crate::errors::{AppError, AppResult};
use crate::media::frame_slot::{self, FrameReader};
use crate::media::yuv_converter::YuvConverter;
use crate::pipelines::PreviewPipeline;
use crate::render::{FrameRenderer, HeadlessRenderer, RenderStats, run_render_loop};
use crate::terminal::TerminalRenderer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

/// Name of the capture thread
const CAPTURE_THREAD_NAME: &str = "camview-capture";

/// What a finished run did
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub capture: CaptureSummary,
    pub render: RenderStats,
}

/// Capture settings taken from the configuration
pub fn capture_settings(config: &Config) -> CaptureSettings {
    CaptureSettings {
        device: config.device.clone(),
        io_method: config.io_method,
        force_format: config.force_format.clone(),
    }
}

/// Converter for the negotiated format and the configured output size
pub fn build_converter(format: &NegotiatedFormat, config: &Config) -> AppResult<YuvConverter> {
    let yuv = format.yuv_format(config.luma_range);
    let dest = match config.output_size {
        Some(size) => size.geometry()?,
        None => format.geometry,
    };

    let converter =
        YuvConverter::new(yuv, format.geometry, dest)?.with_row_stride(format.row_stride)?;
    Ok(converter)
}

/// Run the viewer until the user quits, the frame limit is reached or capture fails
pub fn run(config: &Config) -> AppResult<RunReport> {
    let device = V4l2Device::open(&capture_settings(config))?;
    let negotiated = device.format().clone();
    let converter = build_converter(&negotiated, config)?;
    let label = format!("{} {}", converter.format(), converter.dest_geometry());

    info!(
        device = %negotiated.device,
        format = %converter.format(),
        source = %negotiated.geometry,
        dest = %converter.dest_geometry(),
        renderer = %config.renderer,
        "Starting viewer"
    );

    let (publisher, reader) = frame_slot::channel();
    let mut pipeline = PreviewPipeline::new(converter, publisher);
    let max_frames = config.frame_count;

    let capture = CaptureLoopController::start(CAPTURE_THREAD_NAME, move |stop| {
        let mut source = device.start_stream()?;
        run_capture(&mut source, &mut pipeline, max_frames, stop)
    })?;

    let render_result = match config.renderer {
        RendererKind::Terminal => {
            let mut renderer = TerminalRenderer::new(config.refresh_hz, label)?;
            let result = render_until_capture_ends(&reader, &mut renderer, &capture);
            renderer.restore()?;
            result
        }
        RendererKind::Headless => {
            let stop_flag = Arc::new(AtomicBool::new(false));
            let handler_flag = Arc::clone(&stop_flag);
            ctrlc::set_handler(move || {
                handler_flag.store(true, Ordering::SeqCst);
            })
            .map_err(|e| AppError::Other(format!("failed to install Ctrl+C handler: {}", e)))?;

            let mut renderer = HeadlessRenderer::new(config.refresh_hz).with_stop_flag(stop_flag);
            render_until_capture_ends(&reader, &mut renderer, &capture)
        }
    };

    capture.request_stop();
    let capture_result = capture.join();

    // A capture failure is what ended rendering, so it is reported first
    let capture_summary = capture_result.inspect_err(|e| error!(error = %e, "Capture failed"))?;
    let render_stats = render_result?;

    info!(
        frames = capture_summary.frames,
        uploads = render_stats.uploads,
        repeats = render_stats.repeats,
        "Viewer finished"
    );

    Ok(RunReport {
        capture: capture_summary,
        render: render_stats,
    })
}

fn render_until_capture_ends<R: FrameRenderer>(
    reader: &FrameReader,
    renderer: &mut R,
    capture: &CaptureLoopController,
) -> Result<RenderStats, AppError> {
    Ok(run_render_loop(reader, renderer, || capture.is_running())?)
}
