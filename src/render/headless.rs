// SPDX-License-Identifier: GPL-3.0-only

//! Renderer without a display
//!
//! Keeps the latest uploaded frame, sleeps one refresh interval per draw and
//! logs a stats line every second. An optional stop flag (set from a Ctrl+C
//! handler) ends the loop.

use super::{FrameRenderer, LoopAction};
use crate::constants::{RENDER_STATS_INTERVAL, refresh_interval};
use crate::errors::RenderError;
use crate::media::frame::RgbaFrame;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

pub struct HeadlessRenderer {
    interval: Duration,
    current: Option<RgbaFrame>,
    window_start: Instant,
    window_uploads: u64,
    window_draws: u64,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl HeadlessRenderer {
    pub fn new(refresh_hz: u32) -> Self {
        Self {
            interval: refresh_interval(refresh_hz),
            current: None,
            window_start: Instant::now(),
            window_uploads: 0,
            window_draws: 0,
            stop_flag: None,
        }
    }

    /// Stop rendering once `flag` is set
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    /// Frame currently "on screen"
    pub fn current(&self) -> Option<&RgbaFrame> {
        self.current.as_ref()
    }

    fn log_window(&mut self) {
        let elapsed = self.window_start.elapsed();
        if elapsed < RENDER_STATS_INTERVAL {
            return;
        }

        let secs = elapsed.as_secs_f64();
        match &self.current {
            Some(frame) => info!(
                geometry = %frame.geometry(),
                sequence = frame.sequence(),
                new_fps = format!("{:.1}", self.window_uploads as f64 / secs),
                draw_fps = format!("{:.1}", self.window_draws as f64 / secs),
                "Render stats"
            ),
            None => info!(
                draw_fps = format!("{:.1}", self.window_draws as f64 / secs),
                "Waiting for first frame"
            ),
        }

        self.window_start = Instant::now();
        self.window_uploads = 0;
        self.window_draws = 0;
    }
}

impl FrameRenderer for HeadlessRenderer {
    fn upload(&mut self, frame: RgbaFrame) {
        self.current = Some(frame);
        self.window_uploads += 1;
    }

    fn draw(&mut self) -> Result<LoopAction, RenderError> {
        if let Some(flag) = &self.stop_flag
            && flag.load(Ordering::SeqCst)
        {
            return Ok(LoopAction::Stop);
        }

        self.window_draws += 1;
        self.log_window();
        thread::sleep(self.interval);
        Ok(LoopAction::Continue)
    }
}
