//! Error types for the detection core
use thiserror::Error;

use crate::audio::backend::CaptureError;

/// Core errors
#[derive(Error, Debug)]
pub enum CoreError {
    /// Filter design parameters are out of range
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Audio buffer does not have the expected shape
    #[error("Malformed buffer: {0}")]
    MalformedBuffer(String),

    /// Audio capture failed
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Event could not be delivered to the sink
    #[error("Event sink error: {0}")]
    Sink(String),

    /// Invalid configuration value
    #[error("Invalid config: {0}")]
    Config(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
