//! Segment types for the deduplication / stabilization engine.

use crate::capture::TimeSpan;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One output of the external recognizer, consumed exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Transcribed text.
    pub text: String,
    /// Raw recognizer confidence (0.0 to 1.0).
    pub confidence: f32,
    /// Span the recognizer attributed to this text.
    pub span: TimeSpan,
    /// Chunk the contextual window ended on, when known.
    pub chunk_id: Option<Uuid>,
    /// Whether the recognizer considers this result final.
    pub is_final: bool,
    /// Speaker id, when diarization ran before deduplication.
    pub speaker_id: Option<String>,
    /// Detected language, when the recognizer reports one.
    pub language: Option<String>,
}

impl TranscriptionResult {
    /// Creates an interim result with no speaker or language attribution.
    pub fn new(text: impl Into<String>, confidence: f32, span: TimeSpan) -> Self {
        Self {
            text: text.into(),
            confidence,
            span,
            chunk_id: None,
            is_final: false,
            speaker_id: None,
            language: None,
        }
    }

    /// Marks the result final.
    pub fn finalized(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Attaches a speaker id.
    pub fn with_speaker(mut self, speaker_id: impl Into<String>) -> Self {
        self.speaker_id = Some(speaker_id.into());
        self
    }
}

/// The central mutable transcript entity: a candidate utterance accumulating
/// confirmations until it commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSegment {
    pub id: Uuid,
    pub text: String,
    pub span: TimeSpan,
    pub confidence: f32,
    /// Chunks that contributed evidence for this segment.
    pub chunk_ids: Vec<Uuid>,
    /// How many recognizer results have reinforced this segment.
    pub confirmation_count: u32,
    /// Session-clock time this segment was last reinforced.
    pub last_seen: f64,
    /// Once true, text/timing/confidence never revert; the span may only
    /// extend via overlap resolution.
    pub is_committed: bool,
    pub speaker_id: Option<String>,
}

impl TextSegment {
    /// Creates a fresh candidate from an unmatched recognizer result.
    pub fn from_result(result: &TranscriptionResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: result.text.clone(),
            span: result.span,
            confidence: result.confidence,
            chunk_ids: result.chunk_id.into_iter().collect(),
            confirmation_count: 1,
            last_seen: result.span.end,
            is_committed: false,
            speaker_id: result.speaker_id.clone(),
        }
    }

    /// Word count of the segment text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Score used to pick the survivor when two committed segments overlap:
    /// confidence, length and corroboration each weigh in.
    pub fn weighted_score(&self) -> f32 {
        0.4 * self.confidence
            + 0.3 * (self.word_count() as f32 / 10.0).min(1.0)
            + 0.3 * (self.confirmation_count as f32 / 5.0).min(1.0)
    }
}

/// What the engine did with one recognizer result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentAction {
    /// An unmatched result created a new candidate.
    Created,
    /// The result reinforced an existing candidate.
    Merged,
    /// The result pushed a candidate over the commitment bar.
    Committed,
    /// The result duplicated an already-committed segment.
    Ignored,
}

/// Outcome of [`DedupEngine::process_result`](crate::dedup::DedupEngine::process_result).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub segment_id: Uuid,
    pub is_committed: bool,
    pub is_duplicate: bool,
    pub action: SegmentAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(text: &str, confidence: f32) -> TranscriptionResult {
        TranscriptionResult::new(text, confidence, TimeSpan::new(0.0, 2.0))
    }

    #[test]
    fn test_segment_from_result() {
        let seg = TextSegment::from_result(&result("Hello world", 0.8));
        assert_eq!(seg.text, "Hello world");
        assert_eq!(seg.confirmation_count, 1);
        assert!(!seg.is_committed);
        assert_eq!(seg.last_seen, 2.0);
    }

    #[test]
    fn test_word_count() {
        let seg = TextSegment::from_result(&result("one two three", 0.5));
        assert_eq!(seg.word_count(), 3);
    }

    #[test]
    fn test_weighted_score_caps_word_and_confirmation_terms() {
        let mut seg = TextSegment::from_result(&result(
            "a b c d e f g h i j k l m n o p q r s t",
            1.0,
        ));
        seg.confirmation_count = 50;
        // 0.4·1.0 + 0.3·1.0 + 0.3·1.0
        assert!((seg.weighted_score() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_weighted_score_ordering() {
        let strong = {
            let mut s = TextSegment::from_result(&result("a longer confirmed utterance here", 0.9));
            s.confirmation_count = 4;
            s
        };
        let weak = TextSegment::from_result(&result("hm", 0.3));
        assert!(strong.weighted_score() > weak.weighted_score());
    }

    #[test]
    fn test_builder_helpers() {
        let r = result("hi", 0.9).finalized().with_speaker("speaker_1");
        assert!(r.is_final);
        assert_eq!(r.speaker_id.as_deref(), Some("speaker_1"));
    }
}
