//! Audio and video frames, sources and streams.
//!
//! Sources push locally produced frames into the engine. Streams pull
//! decoded frames of a remote track out of it: each stream correlates the
//! engine's stream events by handle and buffers frames in a [`RingQueue`]
//! so a slow reader only ever sees the most recent ones.
//!
//! [`RingQueue`]: bridge_core::RingQueue

mod error;
mod frame;
mod source;
mod stream;

pub use error::MediaError;
pub use frame::{AudioFrame, VideoFrame, VideoFrameBuffer};
pub use source::{AudioSource, VideoSource};
pub use stream::{AudioStream, VideoStream};

/// Frames buffered per stream before the oldest is dropped (0 = unbounded).
pub const DEFAULT_STREAM_CAPACITY: usize = 0;

/// Size of one PCM sample in bytes (signed 16-bit).
pub const BYTES_PER_SAMPLE: usize = 2;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;
