//! Error types for the bridge core.

use bridge_proto::ProtoError;
use thiserror::Error;

use crate::queue::QueueError;

/// Errors that can occur while talking to the engine.
#[derive(Debug, Error)]
pub enum FfiError {
    /// The native call itself failed. Never retried here.
    #[error("Native call failed: {0}")]
    Transport(String),

    /// Encoding or decoding an envelope failed.
    #[error(transparent)]
    Codec(#[from] ProtoError),

    /// The engine answered with a different response kind.
    #[error("Unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse {
        expected: &'static str,
        actual: &'static str,
    },

    /// An asynchronous request came back without a correlation id.
    #[error("Response to {0} carries no async id")]
    MissingAsyncId(&'static str),

    /// The handle was already released.
    #[error("Handle already released")]
    HandleReleased,

    /// Waiting for an event failed.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A background task was requested outside of a tokio runtime.
    #[error("No tokio runtime available")]
    NoRuntime,
}
