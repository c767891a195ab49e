//! Error types for headwire

use thiserror::Error;

/// Failures while opening or reading an attitude source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("motion source unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures in the tracking session itself.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("display rotation requested before calibration")]
    NotCalibrated,
}

/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
