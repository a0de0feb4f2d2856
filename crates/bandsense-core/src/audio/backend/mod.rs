//! Audio capture backends
//!
//! A backend owns the platform stream and pushes every captured buffer into a
//! callback on its own thread. Delivery is serialized: the callback is never
//! re-entered.

#[cfg(feature = "audio")]
pub mod cpal_backend;
pub mod mock;

use thiserror::Error;

/// Negotiated stream format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
}

impl StreamFormat {
    /// Create a format
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }
}

/// Per-buffer callback: stream format and interleaved LE `f32` bytes
pub type BufferCallback = Box<dyn FnMut(&StreamFormat, &[u8]) + Send + 'static>;

/// Capture errors
#[derive(Error, Debug)]
pub enum CaptureError {
    /// No usable device
    #[error("No audio device: {0}")]
    NoDevice(String),

    /// Device format cannot be handled
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Stream could not be built, started or stopped
    #[error("Stream error: {0}")]
    Stream(String),

    /// Stream already running
    #[error("Capture already running")]
    AlreadyRunning,
}

/// A source of captured audio
pub trait AudioBackend {
    /// Start streaming into `callback`. Returns the negotiated format.
    fn start(&mut self, callback: BufferCallback) -> Result<StreamFormat, CaptureError>;

    /// Stop streaming. The stream is released even when this returns an error.
    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Whether a stream is active
    fn is_running(&self) -> bool;

    /// Human readable device name
    fn device_name(&self) -> String {
        "unknown".to_string()
    }
}
