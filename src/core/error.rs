//! Error types for the dotplot library
//!
//! Every fallible operation in the engine returns [`Result`]. Executors never
//! hand back a partial matrix: a missing row or chunk surfaces as
//! [`Error::WorkerFailed`].

use std::path::PathBuf;

/// Main error type for dotplot operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Sequence source missing or unreadable
    #[error("Sequence file '{}' not found, check the path", .0.display())]
    SequenceNotFound(PathBuf),

    /// Malformed sequence file
    #[error("Parse error: {0}")]
    ParseError(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid configuration or parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A pool worker or distributed participant did not deliver its share
    #[error("Worker failed: {0}")]
    WorkerFailed(String),

    /// Image encoding failure
    #[error("Image error: {0}")]
    ImageError(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::IoError(err.into())
    }
}

/// Convenience result type for dotplot operations
pub type Result<T> = std::result::Result<T, Error>;
