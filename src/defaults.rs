//! Default configuration constants for meetscribe.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
pub const SAMPLE_RATE: u32 = 16000;

/// Bytes per second of buffered audio under the assumed PCM parameters
/// (16kHz, mono, signed 16-bit little-endian).
///
/// Used to estimate chunk duration when the producer does not supply one.
pub const BYTES_PER_SECOND: f64 = 32_000.0;

/// Default per-session audio buffer ceiling in bytes (10 MiB ≈ 5 minutes).
///
/// Breaching the ceiling evicts the oldest chunks; eviction is counted and
/// logged, never an error.
pub const MAX_BUFFER_BYTES: usize = 10 * 1024 * 1024;

/// Default overlap carried between consecutive contextual windows, in seconds.
///
/// The recognizer sees each chunk boundary twice so utterances are never
/// clipped mid-word.
pub const WINDOW_OVERLAP_SECONDS: f64 = 1.0;

/// Minimum mean RMS for a contextual window to be worth transcribing.
///
/// Windows below this are silence/ambient noise — the recognizer boundary can
/// skip them entirely.
pub const MIN_WINDOW_RMS: f32 = 0.001;

/// Normalized edit-distance similarity required to treat two texts as the
/// same utterance.
pub const SIMILARITY_THRESHOLD: f32 = 0.75;

/// Minimum temporal overlap ratio for two spans to corroborate each other.
pub const OVERLAP_RATIO_THRESHOLD: f64 = 0.3;

/// Maximum start-time distance (seconds) for non-overlapping spans to still
/// count as the same utterance.
pub const START_PROXIMITY_SECONDS: f64 = 3.0;

/// Confirmations required before a candidate segment commits.
pub const CONFIRMATION_THRESHOLD: u32 = 2;

/// Recognizer confidence above which a multi-word result commits immediately,
/// without waiting for confirmations.
pub const FAST_COMMIT_CONFIDENCE: f32 = 0.9;

/// Minimum word count for the fast-commit path.
pub const FAST_COMMIT_MIN_WORDS: usize = 3;

/// Overlap ratio beyond which two committed segments are considered the same
/// speech and exactly one must survive.
pub const RESOLUTION_OVERLAP_THRESHOLD: f64 = 0.5;

/// Stability window in seconds: how long a candidate is expected to keep
/// accumulating confirmations.
pub const STABILITY_WINDOW_SECONDS: f64 = 5.0;

/// Multiple of the stability window after which an untouched, uncommitted
/// candidate is discarded.
pub const STALE_MULTIPLIER: f64 = 3.0;

/// Minimum weighted similarity for an audio segment to match an existing
/// speaker profile; below this a new profile is created.
pub const MIN_MATCH_CONFIDENCE: f32 = 0.6;

/// Continuity factor applied to a candidate speaker who was NOT the
/// immediately preceding speaker. Same-speaker candidates get 1.0.
pub const SWITCH_PENALTY: f32 = 0.85;

/// Confidence reported when a segment creates a new speaker profile.
///
/// A new voice has no match evidence behind it yet, so the assignment is
/// reported as neutral.
pub const NEW_SPEAKER_CONFIDENCE: f32 = 0.5;

/// Hard cap on distinct speaker profiles per session.
///
/// Real meetings rarely exceed this; past the cap an unmatched voice folds
/// into its closest existing profile instead of allocating a new one.
pub const MAX_SPEAKERS: usize = 12;

/// Bound on every rolling history (session confidence, per-factor, per-speaker)
/// so memory stays flat over arbitrarily long sessions.
pub const HISTORY_CAPACITY: usize = 100;

/// Overall confidence below which a transcription is flagged as insufficient
/// for downstream display without review.
pub const SUFFICIENCY_THRESHOLD: f32 = 0.6;

/// Analysis frame length in samples (32ms at 16kHz).
pub const FRAME_SIZE: usize = 512;

/// Hop between analysis frames in samples.
pub const HOP_SIZE: usize = 256;

/// Lower bound of the fundamental frequency search range, in Hz.
pub const F0_MIN: f32 = 50.0;

/// Upper bound of the fundamental frequency search range, in Hz.
pub const F0_MAX: f32 = 500.0;

/// Number of MFCC coefficients kept per segment.
pub const MFCC_COEFFS: usize = 13;

/// Number of mel filters in the MFCC filterbank.
pub const MEL_FILTERS: usize = 26;

/// Guard value added to denominators in ratio/variance computations so
/// degenerate input degrades to defaults instead of dividing by zero.
pub const EPSILON: f32 = 1e-6;
