// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 capture via the `v4l` crate
//!
//! [`V4l2Device::open`] checks capabilities and settles the format.
//! [`V4l2Device::start_stream`] then queues the driver buffers and turns the
//! device into a [`V4l2Source`]. Each [`FrameSource::next_sample`] call
//! re-queues the previously returned buffer and dequeues the next one, so a
//! sample stays valid until the following call.
//!
//! `v4l` queues the previous buffer before waiting for the next one. When
//! that wait is interrupted, the previous buffer is already back with the
//! driver, and queueing it again fails with EINVAL. The source remembers the
//! interruption and first dequeues without queueing, which drops one frame
//! and puts the queue back in step.

use super::FrameSource;
use super::types::{CaptureSettings, IoMethod, NegotiatedFormat};
use crate::constants::{CAPTURE_BUFFER_COUNT, DEVICE_WAIT_TIMEOUT};
use crate::errors::CaptureError;
use crate::media::formats::{ChromaLayout, FrameGeometry, LumaRange};
use std::io;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::format::Quantization;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// An opened capture device with a negotiated format, not yet streaming
pub struct V4l2Device {
    device: Device,
    format: NegotiatedFormat,
    io_method: IoMethod,
}

impl V4l2Device {
    /// Open the device node and negotiate the capture format
    pub fn open(settings: &CaptureSettings) -> Result<Self, CaptureError> {
        let path = settings.device.as_str();

        let device = Device::with_path(path).map_err(|e| CaptureError::OpenFailed {
            device: path.to_string(),
            reason: e.to_string(),
        })?;

        let caps = device.query_caps().map_err(|e| CaptureError::Unsupported {
            device: path.to_string(),
            reason: format!("not a V4L2 device ({})", e),
        })?;

        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            return Err(CaptureError::Unsupported {
                device: path.to_string(),
                reason: "not a video capture device".into(),
            });
        }
        if !caps.capabilities.contains(Flags::STREAMING) {
            return Err(CaptureError::Unsupported {
                device: path.to_string(),
                reason: "does not support streaming i/o".into(),
            });
        }

        info!(
            device = %path,
            card = %caps.card,
            driver = %caps.driver,
            "Opened capture device"
        );

        let raw = match &settings.force_format {
            Some(forced) => {
                let fourcc = fourcc_from_str(&forced.pixel_format)?;
                let requested = Format::new(forced.width, forced.height, fourcc);
                let actual = device.set_format(&requested).map_err(|e| {
                    CaptureError::NegotiationFailed(format!(
                        "{}: set format {}x{} {}: {}",
                        path, forced.width, forced.height, forced.pixel_format, e
                    ))
                })?;
                if actual.width != forced.width || actual.height != forced.height {
                    // The driver may adjust width and height
                    warn!(
                        requested = format!("{}x{}", forced.width, forced.height),
                        actual = format!("{}x{}", actual.width, actual.height),
                        "Driver adjusted the requested size"
                    );
                }
                actual
            }
            None => device.format().map_err(|e| {
                CaptureError::NegotiationFailed(format!("{}: get format: {}", path, e))
            })?,
        };

        let format = negotiated_from_v4l(path, &raw)?;
        info!(format = %format, range = ?format.reported_range, "Capture format negotiated");

        Ok(Self {
            device,
            format,
            io_method: settings.io_method,
        })
    }

    pub fn format(&self) -> &NegotiatedFormat {
        &self.format
    }

    /// Allocate and queue the driver buffers
    pub fn start_stream(self) -> Result<V4l2Source, CaptureError> {
        let stream_err = |e: io::Error| {
            CaptureError::Stream(format!(
                "{}: {} buffer setup failed: {}",
                self.format.device, self.io_method, e
            ))
        };

        let stream = match self.io_method {
            IoMethod::Mmap => {
                let mut stream =
                    MmapStream::with_buffers(&self.device, Type::VideoCapture, CAPTURE_BUFFER_COUNT)
                        .map_err(stream_err)?;
                stream.set_timeout(DEVICE_WAIT_TIMEOUT);
                BufferStream::Mmap(stream)
            }
            IoMethod::UserPtr => {
                let mut stream = UserptrStream::with_buffers(
                    &self.device,
                    Type::VideoCapture,
                    CAPTURE_BUFFER_COUNT,
                )
                .map_err(stream_err)?;
                stream.set_timeout(DEVICE_WAIT_TIMEOUT);
                BufferStream::UserPtr(stream)
            }
        };

        debug!(
            device = %self.format.device,
            io_method = %self.io_method,
            buffers = CAPTURE_BUFFER_COUNT,
            "Capture stream created"
        );

        Ok(V4l2Source {
            _device: self.device,
            format: self.format,
            stream,
            resync: false,
        })
    }
}

enum BufferStream {
    Mmap(MmapStream<'static>),
    UserPtr(UserptrStream),
}

/// The two buffer exchanges the capture source needs from a stream
trait BufferQueue {
    /// Queue the buffer handed out last, wait for a filled one and return
    /// it with the driver's `bytesused`
    fn next_filled(&mut self) -> io::Result<(&[u8], u32)>;

    /// Wait for a filled buffer without queueing one first
    fn dequeue_pending(&mut self) -> io::Result<()>;
}

impl BufferQueue for BufferStream {
    fn next_filled(&mut self) -> io::Result<(&[u8], u32)> {
        let (buf, meta) = match self {
            BufferStream::Mmap(stream) => CaptureStream::next(stream)?,
            BufferStream::UserPtr(stream) => CaptureStream::next(stream)?,
        };
        Ok((buf, meta.bytesused))
    }

    fn dequeue_pending(&mut self) -> io::Result<()> {
        match self {
            BufferStream::Mmap(stream) => CaptureStream::dequeue(stream)?,
            BufferStream::UserPtr(stream) => CaptureStream::dequeue(stream)?,
        };
        Ok(())
    }
}

/// Next filled buffer, or `None` while nothing is ready
///
/// `resync` is set when a wait was interrupted after the previous buffer was
/// already queued, and cleared once that buffer has been taken back.
fn next_payload<'q, Q>(queue: &'q mut Q, resync: &mut bool) -> io::Result<Option<&'q [u8]>>
where
    Q: BufferQueue + ?Sized,
{
    if *resync {
        match queue.dequeue_pending() {
            Ok(()) => {
                debug!("Buffer queue back in step, dropping one frame");
                *resync = false;
            }
            Err(e) if is_transient(&e) => return Ok(None),
            Err(e) => return Err(e),
        }
    }

    match queue.next_filled() {
        Ok((buf, used)) => Ok(Some(payload(buf, used))),
        Err(e) if is_transient(&e) => {
            *resync = true;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Bytes the driver filled; some drivers leave `bytesused` at zero
fn payload(buf: &[u8], bytesused: u32) -> &[u8] {
    let used = bytesused as usize;
    if used == 0 || used > buf.len() {
        buf
    } else {
        &buf[..used]
    }
}

/// A streaming capture device
pub struct V4l2Source {
    // Keeps the device handle open for as long as the stream runs
    _device: Device,
    format: NegotiatedFormat,
    stream: BufferStream,
    resync: bool,
}

impl FrameSource for V4l2Source {
    fn format(&self) -> &NegotiatedFormat {
        &self.format
    }

    fn next_sample(&mut self) -> Result<Option<&[u8]>, CaptureError> {
        match next_payload(&mut self.stream, &mut self.resync) {
            Ok(sample) => Ok(sample),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Err(CaptureError::Timeout {
                device: self.format.device.clone(),
                waited_ms: DEVICE_WAIT_TIMEOUT.as_millis() as u64,
            }),
            Err(e) => Err(CaptureError::Stream(format!(
                "{}: dequeue failed: {}",
                self.format.device, e
            ))),
        }
    }
}

/// "No buffer ready yet" conditions that are retried
fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// FourCC from a user-supplied string, padded with spaces to four bytes
pub fn fourcc_from_str(s: &str) -> Result<FourCC, CaptureError> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.len() > 4 || !trimmed.is_ascii() {
        return Err(CaptureError::NegotiationFailed(format!(
            "invalid pixel format '{}'",
            s
        )));
    }
    let mut code = [b' '; 4];
    code[..trimmed.len()].copy_from_slice(trimmed.to_ascii_uppercase().as_bytes());
    Ok(FourCC::new(&code))
}

/// Map driver quantization onto a luma range; `Default` leaves the choice open
pub fn luma_range_from_quantization(quantization: Quantization) -> Option<LumaRange> {
    match quantization {
        Quantization::FullRange => Some(LumaRange::Full),
        Quantization::LimitedRange => Some(LumaRange::Studio),
        Quantization::Default => None,
    }
}

fn negotiated_from_v4l(device: &str, raw: &Format) -> Result<NegotiatedFormat, CaptureError> {
    let fourcc = raw.fourcc.to_string();
    let layout = ChromaLayout::from_fourcc(&fourcc)?;
    let geometry = FrameGeometry::new(raw.width, raw.height)?;

    let minimum = layout.min_row_stride(raw.width);
    let reported = raw.stride as usize;
    // Buggy driver paranoia
    let row_stride = if reported < minimum {
        debug!(reported, minimum, "Driver stride too small, using minimum");
        minimum
    } else {
        reported
    };

    Ok(NegotiatedFormat {
        device: device.to_string(),
        geometry,
        layout,
        row_stride,
        reported_range: luma_range_from_quantization(raw.quantization),
    })
}
