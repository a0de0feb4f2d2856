//! Error types for the metrics surface
use thiserror::Error;

/// Control surface errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// HTTP server error (bad address, bind failure, serve failure)
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
