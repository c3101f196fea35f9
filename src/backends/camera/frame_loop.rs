// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for the capture loop
//!
//! The capture loop runs on its own named thread. Its outcome, including a
//! fatal device error or a panic, is handed back through
//! [`CaptureLoopController::join`] so the caller can restore the display and
//! report the failure itself.

use super::types::CaptureSummary;
use crate::errors::CaptureError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

type LoopResult = Result<CaptureSummary, CaptureError>;

/// Controller for a capture loop running in a separate thread
///
/// # Example
///
/// ```ignore
/// let controller = CaptureLoopController::start("capture", move |stop| {
///     let mut source = device.start_stream()?;
///     run_capture(&mut source, &mut pipeline, None, stop)
/// })?;
///
/// // Later, stop the loop and collect its outcome
/// controller.request_stop();
/// let summary = controller.join()?;
/// ```
pub struct CaptureLoopController {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<LoopResult>>,
    /// Signal to stop the loop
    stop_signal: Arc<AtomicBool>,
    /// Name for logging
    name: String,
}

impl CaptureLoopController {
    /// Start `body` on a new thread
    ///
    /// `body` receives the stop signal and is expected to return once it is
    /// set. Its result is returned by [`join`](Self::join).
    pub fn start<F>(name: &str, body: F) -> Result<Self, CaptureError>
    where
        F: FnOnce(&AtomicBool) -> LoopResult + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(name = %name_clone, "Capture loop thread started");
                let result = body(&stop_signal_clone);
                match &result {
                    Ok(summary) => {
                        info!(name = %name_clone, frames = summary.frames, "Capture loop thread exiting")
                    }
                    Err(e) => warn!(name = %name_clone, error = %e, "Capture loop failed"),
                }
                result
            })
            .map_err(|e| CaptureError::Stream(format!("failed to spawn {} thread: {}", name, e)))?;

        Ok(Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        })
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Get a clone of the stop signal for external use
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_signal)
    }

    /// Signal the loop to stop (non-blocking)
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting capture loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Wait for the thread to finish and return the loop's outcome
    ///
    /// Does not send the stop signal; call [`request_stop`](Self::request_stop)
    /// first unless the loop ends by itself.
    pub fn join(mut self) -> LoopResult {
        self.wait()
    }

    fn wait(&mut self) -> LoopResult {
        let Some(handle) = self.thread_handle.take() else {
            return Ok(CaptureSummary::default());
        };

        debug!(name = %self.name, "Waiting for capture loop thread to finish");
        match handle.join() {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(name = %self.name, panic = %message, "Capture loop thread panicked");
                Err(CaptureError::ThreadPanicked(message))
            }
        }
    }
}

impl Drop for CaptureLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoopController dropped, stopping loop");
            self.request_stop();
            if let Err(e) = self.wait() {
                warn!(name = %self.name, error = %e, "Capture loop ended with error");
            }
        }
    }
}
