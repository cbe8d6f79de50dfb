//! Chunk and window types for continuous audio capture.

use crate::defaults;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A span of time on the session clock, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: f64,
    pub end: f64,
}

impl TimeSpan {
    /// Creates a span; a reversed span is normalized so `start <= end`.
    pub fn new(start: f64, end: f64) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// Duration of the span in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Overlapping seconds between this span and another (zero if disjoint).
    pub fn overlap_seconds(&self, other: &TimeSpan) -> f64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (end - start).max(0.0)
    }

    /// Overlap as a fraction of the shorter span, in [0, 1].
    ///
    /// Degenerate (zero-length) spans yield 0.0 rather than dividing by zero.
    pub fn overlap_ratio(&self, other: &TimeSpan) -> f64 {
        let shorter = self.duration().min(other.duration());
        if shorter <= f64::from(defaults::EPSILON) {
            return 0.0;
        }
        self.overlap_seconds(other) / shorter
    }

    /// The smallest span covering both spans.
    pub fn union(&self, other: &TimeSpan) -> TimeSpan {
        TimeSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Absolute distance between the two start times, in seconds.
    pub fn start_distance(&self, other: &TimeSpan) -> f64 {
        (self.start - other.start).abs()
    }
}

/// A single chunk of raw audio as delivered by the upstream producer.
///
/// Owned exclusively by the capture buffer: created on ingest, evicted by
/// the buffer's age/size bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioChunk {
    /// Unique identifier for this chunk.
    pub id: Uuid,
    /// Raw audio bytes (assumed 16kHz mono s16le unless mime says otherwise).
    pub data: Vec<u8>,
    /// Position on the session clock, in seconds.
    pub timestamp: f64,
    /// Duration in seconds, supplied by the producer or estimated from size.
    pub duration: f64,
    /// MIME type reported by the producer.
    pub mime_type: String,
    /// RMS level reported by the producer (0.0 to 1.0).
    pub rms_level: f32,
}

impl AudioChunk {
    /// The time span this chunk covers.
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.timestamp, self.timestamp + self.duration)
    }

    /// Estimates a chunk duration from its byte length under the assumed
    /// PCM parameters.
    pub fn estimate_duration(byte_len: usize) -> f64 {
        byte_len as f64 / defaults::BYTES_PER_SECOND
    }
}

/// Metadata attached to a contextual window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowMetadata {
    /// Whether this window overlaps the previously emitted window.
    pub has_overlap: bool,
    /// Ids of the chunks concatenated into this window.
    pub chunk_ids: Vec<Uuid>,
    /// Mean of the contributing chunks' RMS levels.
    pub mean_rms: f32,
    /// True when the window is quiet enough that the recognizer can skip it.
    pub low_energy: bool,
}

/// An ephemeral overlapping window of buffered audio, built on demand for
/// the recognizer and never stored.
#[derive(Debug, Clone)]
pub struct ContextualWindow {
    pub data: Vec<u8>,
    pub span: TimeSpan,
    pub metadata: WindowMetadata,
}

impl ContextualWindow {
    /// Decodes the window bytes as 16-bit little-endian PCM into f32 samples
    /// in [-1.0, 1.0]. A trailing odd byte is ignored.
    pub fn samples(&self) -> Vec<f32> {
        pcm_s16le_to_f32(&self.data)
    }
}

/// Converts s16le bytes to normalized f32 samples.
pub fn pcm_s16le_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| {
            let sample = i16::from_le_bytes([pair[0], pair[1]]);
            f32::from(sample) / f32::from(i16::MAX)
        })
        .collect()
}

/// RMS of a sample buffer; 0.0 for empty input.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}
