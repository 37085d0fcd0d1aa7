//! Error types for media operations.

use bridge_core::FfiError;
use thiserror::Error;

/// Errors that can occur while producing or consuming media.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The engine rejected a captured frame.
    #[error("Failed to capture frame: {0}")]
    CaptureFrame(String),

    /// Frame data does not match its declared layout.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Talking to the engine failed.
    #[error(transparent)]
    Ffi(#[from] FfiError),
}
