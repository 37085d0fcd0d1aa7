//! Error types for envelope encoding.

use thiserror::Error;

/// Errors that can occur while encoding or decoding envelopes.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// A message could not be serialized.
    #[error("Failed to encode {kind}: {message}")]
    Encode {
        /// Envelope kind being encoded.
        kind: &'static str,

        /// Underlying codec message.
        message: String,
    },

    /// A payload could not be parsed.
    #[error("Failed to decode {kind}: {message}")]
    Decode {
        /// Envelope kind being decoded.
        kind: &'static str,

        /// Underlying codec message.
        message: String,
    },
}
