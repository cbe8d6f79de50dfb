//! Bounded per-session audio buffer with overlapping contextual windows.
//!
//! Keeps recently ingested chunks so the recognizer can be handed a window
//! that reaches back over the previous context — utterances are never cut at
//! arbitrary chunk boundaries. Memory is bounded: breaching the byte ceiling
//! evicts the oldest chunks (graceful quality degradation, not failure).

use crate::capture::chunk::{AudioChunk, ContextualWindow, TimeSpan, WindowMetadata};
use crate::defaults;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;
use uuid::Uuid;

/// Configuration for the capture buffer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Per-session byte ceiling; oldest chunks evict past this.
    pub max_buffer_bytes: usize,
    /// Overlap between consecutive contextual windows, in seconds.
    pub overlap_seconds: f64,
    /// Mean RMS below which a window is flagged low-energy.
    pub min_window_rms: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_buffer_bytes: defaults::MAX_BUFFER_BYTES,
            overlap_seconds: defaults::WINDOW_OVERLAP_SECONDS,
            min_window_rms: defaults::MIN_WINDOW_RMS,
        }
    }
}

/// Per-session buffer of raw audio chunks.
///
/// Timestamps are derived from the running sum of chunk durations, so arrival
/// order is the session clock and the buffer is deterministic under test.
pub struct CaptureBuffer {
    config: CaptureConfig,
    chunks: VecDeque<AudioChunk>,
    total_bytes: usize,
    /// Running end of the session clock (where the next chunk starts).
    clock: f64,
    /// End of the last emitted contextual window.
    last_context_end: f64,
    evicted_chunks: u64,
}

impl CaptureBuffer {
    /// Creates a buffer with default configuration.
    pub fn new() -> Self {
        Self::with_config(CaptureConfig::default())
    }

    /// Creates a buffer with custom configuration.
    pub fn with_config(config: CaptureConfig) -> Self {
        Self {
            config,
            chunks: VecDeque::new(),
            total_bytes: 0,
            clock: 0.0,
            last_context_end: 0.0,
            evicted_chunks: 0,
        }
    }

    /// Ingests one chunk of raw audio. Always succeeds.
    ///
    /// Duration is estimated from byte length under the assumed PCM
    /// parameters when the producer does not supply one.
    pub fn add_audio_chunk(
        &mut self,
        data: Vec<u8>,
        mime_type: &str,
        rms_level: f32,
        duration: Option<f64>,
    ) -> AudioChunk {
        let duration = duration.unwrap_or_else(|| AudioChunk::estimate_duration(data.len()));
        let chunk = AudioChunk {
            id: Uuid::new_v4(),
            timestamp: self.clock,
            duration,
            mime_type: mime_type.to_string(),
            rms_level,
            data,
        };
        self.clock += duration;
        self.total_bytes += chunk.data.len();
        self.chunks.push_back(chunk.clone());
        self.enforce_byte_ceiling();
        chunk
    }

    /// Evicts oldest chunks until the buffer fits the ceiling again.
    fn enforce_byte_ceiling(&mut self) {
        while self.total_bytes > self.config.max_buffer_bytes {
            let Some(evicted) = self.chunks.pop_front() else {
                break;
            };
            self.total_bytes -= evicted.data.len();
            self.evicted_chunks += 1;
            debug!(
                chunk_id = %evicted.id,
                evicted_total = self.evicted_chunks,
                "capture buffer ceiling reached, evicting oldest chunk"
            );
        }
    }

    /// Builds an overlapping contextual window covering at least
    /// `target_duration` seconds, walking backward from the newest chunk to
    /// just before the end of the previous window.
    ///
    /// When more than `target_duration` of audio accumulated since the
    /// previous window, the window grows to cover all of it; nothing between
    /// consecutive windows is dropped.
    ///
    /// Returns `None` when the buffer is empty. The window's end becomes the
    /// new context end.
    pub fn contextual_window(&mut self, target_duration: f64) -> Option<ContextualWindow> {
        if self.chunks.is_empty() {
            return None;
        }

        let window_start = (self.last_context_end - self.config.overlap_seconds).max(0.0);

        // Walk backward collecting chunks until the target duration is
        // covered AND the walk has reached back to the overlap point. The
        // second condition keeps a backlog larger than the target from being
        // skipped: every chunk after `window_start` is included even when
        // that makes the window longer than `target_duration`.
        let mut selected: Vec<&AudioChunk> = Vec::new();
        let mut covered = 0.0;
        for chunk in self.chunks.iter().rev() {
            if covered >= target_duration && chunk.span().end <= window_start {
                break;
            }
            selected.push(chunk);
            covered += chunk.duration;
        }
        selected.reverse();

        let first = selected.first()?;
        let last = selected.last()?;
        let span = TimeSpan::new(first.timestamp, last.span().end);

        let mut data = Vec::with_capacity(selected.iter().map(|c| c.data.len()).sum());
        let mut chunk_ids = Vec::with_capacity(selected.len());
        let mut rms_sum = 0.0f32;
        for chunk in &selected {
            data.extend_from_slice(&chunk.data);
            chunk_ids.push(chunk.id);
            rms_sum += chunk.rms_level;
        }
        let mean_rms = rms_sum / selected.len() as f32;

        let has_overlap = self.last_context_end > 0.0 && span.start < self.last_context_end;
        self.last_context_end = span.end;

        Some(ContextualWindow {
            data,
            span,
            metadata: WindowMetadata {
                has_overlap,
                chunk_ids,
                mean_rms,
                low_energy: mean_rms < self.config.min_window_rms,
            },
        })
    }

    /// Explicitly evicts chunks whose span ends at or before `before_timestamp`.
    ///
    /// Called once a window has been consumed downstream.
    pub fn cleanup_processed(&mut self, before_timestamp: f64) {
        while let Some(front) = self.chunks.front() {
            if front.span().end > before_timestamp {
                break;
            }
            let removed = self
                .chunks
                .pop_front()
                .map(|c| c.data.len())
                .unwrap_or(0);
            self.total_bytes -= removed;
        }
    }

    /// Number of buffered chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total buffered bytes.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Chunks evicted by the byte ceiling since the session started.
    pub fn evicted_chunks(&self) -> u64 {
        self.evicted_chunks
    }

    /// Current position of the session clock, in seconds.
    pub fn clock(&self) -> f64 {
        self.clock
    }
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        Self::new()
    }
}
