//! Deduplication / stabilization of the recognizer result stream.
//!
//! Decides which of many overlapping partial/final recognizer outputs is
//! stable enough to commit, and resolves overlapping committed text.

pub mod engine;
pub mod segment;
pub mod similarity;

pub use engine::{DedupConfig, DedupEngine};
pub use segment::{ProcessOutcome, SegmentAction, TextSegment, TranscriptionResult};
