// SPDX-License-Identifier: GPL-3.0-only

//! Display side of the viewer
//!
//! The render loop polls the frame slot once per refresh. A new frame is
//! handed to the renderer; an empty slot or a frame that was already shown
//! just redraws what is on screen. The renderer's `draw` call does the
//! presentation wait, so the loop runs at the display cadence and never at
//! the capture cadence.
//!
//! # Modules
//!
//! - [`headless`]: Renderer without a display, for logging and benchmarking

pub mod headless;

pub use headless::HeadlessRenderer;

use crate::errors::RenderError;
use crate::media::frame::RgbaFrame;
use crate::media::frame_slot::FrameReader;
use tracing::debug;

/// Action returned by a renderer after each presented frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Something that can show RGBA frames
pub trait FrameRenderer {
    /// Take ownership of a new frame to show from the next draw on
    fn upload(&mut self, frame: RgbaFrame);

    /// Present the current content and wait for the next refresh
    ///
    /// Before the first upload this shows a blank or placeholder image.
    fn draw(&mut self) -> Result<LoopAction, RenderError>;
}

/// Counters collected by [`run_render_loop`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Refresh iterations run
    pub iterations: u64,
    /// New frames handed to the renderer
    pub uploads: u64,
    /// Iterations that found the already uploaded frame again
    pub repeats: u64,
    /// Iterations that found the slot empty
    pub empty: u64,
}

/// Poll `reader` once per refresh and feed new frames to `renderer`
///
/// Runs until the renderer returns [`LoopAction::Stop`] or `keep_running`
/// returns false (checked before every iteration).
pub fn run_render_loop<R, K>(
    reader: &FrameReader,
    renderer: &mut R,
    mut keep_running: K,
) -> Result<RenderStats, RenderError>
where
    R: FrameRenderer + ?Sized,
    K: FnMut() -> bool,
{
    let mut stats = RenderStats::default();
    let mut last_uploaded: Option<u64> = None;

    while keep_running() {
        stats.iterations += 1;

        // Compare sequences first so a repeated frame is never copied
        match reader.latest_sequence() {
            None => stats.empty += 1,
            Some(sequence) if Some(sequence) == last_uploaded => stats.repeats += 1,
            Some(_) => match reader.take_latest() {
                Some(frame) => {
                    last_uploaded = Some(frame.sequence());
                    renderer.upload(frame);
                    stats.uploads += 1;
                }
                None => stats.empty += 1,
            },
        }

        if renderer.draw()? == LoopAction::Stop {
            debug!("Renderer requested stop");
            break;
        }
    }

    debug!(
        iterations = stats.iterations,
        uploads = stats.uploads,
        repeats = stats.repeats,
        empty = stats.empty,
        "Render loop finished"
    );
    Ok(stats)
}
