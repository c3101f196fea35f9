// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera viewer
//!
//! Contract violations inside the conversion core (a sample whose length
//! does not match the negotiated format, a crop larger than the source) are
//! assertions, not values of these types. Everything here is a condition the
//! collaborators around the core can report and act on.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Format/geometry errors found while setting up conversion
    Convert(ConvertError),
    /// Camera capture errors
    Capture(CaptureError),
    /// Display errors
    Render(RenderError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Errors describing an unusable conversion setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Width or height is zero or odd
    InvalidGeometry { width: u32, height: u32 },
    /// Destination is larger than the source in some dimension
    CropOutOfRange {
        source: (u32, u32),
        dest: (u32, u32),
    },
    /// Row stride shorter than one row of samples
    StrideTooSmall { stride: usize, minimum: usize },
    /// Device pixel format the converter has no layout for
    UnsupportedFormat(String),
}

/// Capture-side errors
#[derive(Debug, Clone)]
pub enum CaptureError {
    /// Device node could not be opened
    OpenFailed { device: String, reason: String },
    /// Device lacks a required capability
    Unsupported { device: String, reason: String },
    /// Format query or negotiation failed
    NegotiationFailed(String),
    /// Negotiated format cannot be converted
    Format(ConvertError),
    /// Buffer queue setup or dequeue failed
    Stream(String),
    /// No buffer became ready within the wait timeout
    Timeout { device: String, waited_ms: u64 },
    /// Delivered sample does not match the negotiated size
    SampleSize { expected: usize, actual: usize },
    /// Capture thread ended abnormally
    ThreadPanicked(String),
}

/// Render-side errors
#[derive(Debug, Clone)]
pub enum RenderError {
    /// Terminal setup or drawing failed
    Terminal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Convert(e) => write!(f, "Conversion error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Render(e) => write!(f, "Render error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::InvalidGeometry { width, height } => write!(
                f,
                "Invalid frame geometry {}x{} (dimensions must be positive and even)",
                width, height
            ),
            ConvertError::CropOutOfRange { source, dest } => write!(
                f,
                "Output {}x{} does not fit inside source {}x{}",
                dest.0, dest.1, source.0, source.1
            ),
            ConvertError::StrideTooSmall { stride, minimum } => {
                write!(f, "Row stride {} is below the minimum of {}", stride, minimum)
            }
            ConvertError::UnsupportedFormat(fourcc) => {
                write!(f, "Unsupported pixel format: {}", fourcc)
            }
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::OpenFailed { device, reason } => {
                write!(f, "Cannot open '{}': {}", device, reason)
            }
            CaptureError::Unsupported { device, reason } => write!(f, "{} {}", device, reason),
            CaptureError::NegotiationFailed(msg) => write!(f, "Format negotiation failed: {}", msg),
            CaptureError::Format(e) => write!(f, "{}", e),
            CaptureError::Stream(msg) => write!(f, "Stream error: {}", msg),
            CaptureError::Timeout { device, waited_ms } => {
                write!(f, "No frame from {} within {} ms", device, waited_ms)
            }
            CaptureError::SampleSize { expected, actual } => write!(
                f,
                "Sample is {} bytes, negotiated format requires {}",
                actual, expected
            ),
            CaptureError::ThreadPanicked(msg) => write!(f, "Capture thread panicked: {}", msg),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Terminal(msg) => write!(f, "Terminal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for ConvertError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for RenderError {}

impl From<ConvertError> for AppError {
    fn from(err: ConvertError) -> Self {
        AppError::Convert(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Render(err)
    }
}

impl From<ConvertError> for CaptureError {
    fn from(err: ConvertError) -> Self {
        CaptureError::Format(err)
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Terminal(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}
