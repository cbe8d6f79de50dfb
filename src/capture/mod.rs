//! Continuous audio capture.
//!
//! Maintains a bounded per-session buffer of raw audio chunks and emits
//! overlapping contextual windows so chunk boundaries never clip speech.

pub mod buffer;
pub mod chunk;

pub use buffer::{CaptureBuffer, CaptureConfig};
pub use chunk::{AudioChunk, ContextualWindow, TimeSpan, WindowMetadata, pcm_s16le_to_f32, rms};
