//! meetscribe - Session core for live meeting transcription
//!
//! Turns a stream of raw audio chunks and noisy, overlapping speech-to-text
//! results into a stable, speaker-attributed, confidence-scored transcript.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod capture;
pub mod confidence;
pub mod config;
pub mod dedup;
pub mod defaults;
pub mod diarization;
pub mod error;
pub mod pipeline;
pub mod session;

// Core traits (source → process → sink)
pub use pipeline::{CollectorSink, CommitSink, Recognizer};

// Pipeline
pub use pipeline::{ChunkReceipt, CommittedSegment, Recognition, TranscriptionPipeline};

// Per-session engines
pub use capture::{AudioChunk, CaptureBuffer, CaptureConfig, ContextualWindow, TimeSpan};
pub use confidence::{
    AssessmentInput, ConfidenceAssessment, ConfidenceConfig, ConfidenceEngine, ConfidenceLevel,
};
pub use dedup::{DedupConfig, DedupEngine, TextSegment, TranscriptionResult};
pub use diarization::{
    DiarizationConfig, DiarizationEngine, SpeakerProfile, SpeakerStatistics, SpeakerTurn,
};
pub use session::{SessionRegistry, SessionSnapshot, SessionState};

// Error handling
pub use error::{MeetscribeError, Result};

// Config
pub use config::Config;
