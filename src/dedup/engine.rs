//! Deduplication / stabilization engine.
//!
//! Collapses the noisy, overlapping stream of partial and final recognizer
//! results for one session into a small set of stable, non-duplicated
//! segments. Nothing here errors: unmatched results become new candidates,
//! duplicates of committed text are absorbed, and stale candidates age out.

use crate::capture::TimeSpan;
use crate::dedup::segment::{ProcessOutcome, SegmentAction, TextSegment, TranscriptionResult};
use crate::dedup::similarity::{temporally_close, text_similarity};
use crate::defaults;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Configuration for the deduplication engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DedupConfig {
    /// Normalized edit-distance similarity required to match two texts.
    pub similarity_threshold: f32,
    /// Temporal overlap ratio above which spans corroborate each other.
    pub overlap_ratio_threshold: f64,
    /// Maximum start-time distance for non-overlapping spans to match.
    pub start_proximity_seconds: f64,
    /// Confirmations required before a candidate commits.
    pub confirmation_threshold: u32,
    /// Confidence for the fast-commit path on multi-word results.
    pub fast_commit_confidence: f32,
    /// Minimum word count for the fast-commit path.
    pub fast_commit_min_words: usize,
    /// Overlap ratio beyond which two committed segments must be resolved
    /// down to one.
    pub resolution_overlap_threshold: f64,
    /// Expected confirmation window for a candidate, in seconds.
    pub stability_window_seconds: f64,
    /// Multiple of the stability window after which an untouched candidate
    /// is discarded.
    pub stale_multiplier: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: defaults::SIMILARITY_THRESHOLD,
            overlap_ratio_threshold: defaults::OVERLAP_RATIO_THRESHOLD,
            start_proximity_seconds: defaults::START_PROXIMITY_SECONDS,
            confirmation_threshold: defaults::CONFIRMATION_THRESHOLD,
            fast_commit_confidence: defaults::FAST_COMMIT_CONFIDENCE,
            fast_commit_min_words: defaults::FAST_COMMIT_MIN_WORDS,
            resolution_overlap_threshold: defaults::RESOLUTION_OVERLAP_THRESHOLD,
            stability_window_seconds: defaults::STABILITY_WINDOW_SECONDS,
            stale_multiplier: defaults::STALE_MULTIPLIER,
        }
    }
}

/// Per-session deduplication state.
pub struct DedupEngine {
    config: DedupConfig,
    segments: Vec<TextSegment>,
}

impl DedupEngine {
    /// Creates an engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(DedupConfig::default())
    }

    /// Creates an engine with custom configuration.
    pub fn with_config(config: DedupConfig) -> Self {
        Self {
            config,
            segments: Vec::new(),
        }
    }

    /// Folds one recognizer result into the session's candidate segments.
    pub fn process_result(&mut self, result: TranscriptionResult) -> ProcessOutcome {
        // A result that duplicates already-committed text only reinforces it;
        // committed fields are append-only.
        if let Some(idx) = self.best_match(&result, true) {
            let segment = &mut self.segments[idx];
            segment.confirmation_count += 1;
            segment.last_seen = segment.last_seen.max(result.span.end);
            return ProcessOutcome {
                segment_id: segment.id,
                is_committed: true,
                is_duplicate: true,
                action: SegmentAction::Ignored,
            };
        }

        let (idx, mut action) = match self.best_match(&result, false) {
            Some(idx) => {
                self.merge_into(idx, &result);
                (idx, SegmentAction::Merged)
            }
            None => {
                self.segments.push(TextSegment::from_result(&result));
                (self.segments.len() - 1, SegmentAction::Created)
            }
        };

        // Commitment policy, first match wins: enough confirmations, or an
        // unambiguous multi-word result at high confidence.
        let segment = &mut self.segments[idx];
        if segment.confirmation_count >= self.config.confirmation_threshold {
            segment.is_committed = true;
            action = SegmentAction::Committed;
        } else if segment.word_count() >= self.config.fast_commit_min_words
            && segment.confidence >= self.config.fast_commit_confidence
        {
            segment.is_committed = true;
            action = SegmentAction::Committed;
        }

        if action == SegmentAction::Committed {
            debug!(
                segment_id = %self.segments[idx].id,
                confirmations = self.segments[idx].confirmation_count,
                "segment committed"
            );
        }

        let outcome = ProcessOutcome {
            segment_id: self.segments[idx].id,
            is_committed: self.segments[idx].is_committed,
            is_duplicate: false,
            action,
        };

        if result.is_final {
            self.resolve_overlaps();
        }

        outcome
    }

    /// Index of the most similar segment in the requested commitment class,
    /// or `None` when nothing clears the similarity and temporal bars.
    fn best_match(&self, result: &TranscriptionResult, committed: bool) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, segment) in self.segments.iter().enumerate() {
            if segment.is_committed != committed {
                continue;
            }
            if !temporally_close(
                &segment.span,
                &result.span,
                self.config.overlap_ratio_threshold,
                self.config.start_proximity_seconds,
            ) {
                continue;
            }
            let similarity = text_similarity(&segment.text, &result.text);
            if similarity < self.config.similarity_threshold {
                continue;
            }
            if best.map(|(_, s)| similarity > s).unwrap_or(true) {
                best = Some((idx, similarity));
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Merges a near-duplicate result into an existing candidate.
    fn merge_into(&mut self, idx: usize, result: &TranscriptionResult) {
        let segment = &mut self.segments[idx];
        if result.confidence > segment.confidence {
            segment.text = result.text.clone();
            segment.confidence = result.confidence;
        }
        segment.span = segment.span.union(&result.span);
        segment.confirmation_count += 1;
        segment.last_seen = segment.last_seen.max(result.span.end);
        if let Some(chunk_id) = result.chunk_id {
            if !segment.chunk_ids.contains(&chunk_id) {
                segment.chunk_ids.push(chunk_id);
            }
        }
        if segment.speaker_id.is_none() {
            segment.speaker_id = result.speaker_id.clone();
        }
    }

    /// Resolves committed segments that overlap beyond the threshold: exactly
    /// one survives, chosen by weighted score, and its span widens to cover
    /// the loser.
    fn resolve_overlaps(&mut self) {
        let mut removed: Vec<Uuid> = Vec::new();
        loop {
            let mut resolved_one = false;
            let committed: Vec<(usize, Uuid, TimeSpan, f32)> = self
                .segments
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_committed && !removed.contains(&s.id))
                .map(|(i, s)| (i, s.id, s.span, s.weighted_score()))
                .collect();

            'pairs: for a in 0..committed.len() {
                for b in (a + 1)..committed.len() {
                    let (ia, _, span_a, score_a) = committed[a];
                    let (ib, _, span_b, score_b) = committed[b];
                    if span_a.overlap_ratio(&span_b) <= self.config.resolution_overlap_threshold {
                        continue;
                    }
                    let (winner, loser) = if score_a >= score_b { (ia, ib) } else { (ib, ia) };
                    let loser_span = self.segments[loser].span;
                    removed.push(self.segments[loser].id);
                    self.segments[winner].span = self.segments[winner].span.union(&loser_span);
                    debug!(
                        winner = %self.segments[winner].id,
                        loser = %self.segments[loser].id,
                        "resolved overlapping committed segments"
                    );
                    resolved_one = true;
                    break 'pairs;
                }
            }

            if !resolved_one {
                break;
            }
        }
        self.segments.retain(|s| !removed.contains(&s.id));
    }

    /// Discards uncommitted candidates untouched for longer than the stale
    /// bound. `now` is the session clock.
    pub fn cleanup_stale(&mut self, now: f64) -> usize {
        let stale_after = self.config.stale_multiplier * self.config.stability_window_seconds;
        let before = self.segments.len();
        self.segments
            .retain(|s| s.is_committed || now - s.last_seen <= stale_after);
        let dropped = before - self.segments.len();
        if dropped > 0 {
            debug!(dropped, "discarded stale uncommitted candidates");
        }
        dropped
    }

    /// The canonical transcript view: committed segments in time order.
    pub fn committed_transcript(&self) -> String {
        let mut committed: Vec<&TextSegment> =
            self.segments.iter().filter(|s| s.is_committed).collect();
        committed.sort_by(|a, b| a.span.start.total_cmp(&b.span.start));
        committed
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Committed segments in time order.
    pub fn committed_segments(&self) -> Vec<&TextSegment> {
        let mut committed: Vec<&TextSegment> =
            self.segments.iter().filter(|s| s.is_committed).collect();
        committed.sort_by(|a, b| a.span.start.total_cmp(&b.span.start));
        committed
    }

    /// Looks up any segment (candidate or committed) by id.
    pub fn segment(&self, id: Uuid) -> Option<&TextSegment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Number of tracked segments, committed or not.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

impl Default for DedupEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(text: &str, confidence: f32, start: f64, end: f64) -> TranscriptionResult {
        TranscriptionResult::new(text, confidence, TimeSpan::new(start, end))
    }

    #[test]
    fn test_unmatched_result_creates_candidate() {
        let mut engine = DedupEngine::new();
        let outcome = engine.process_result(result("hello there", 0.5, 0.0, 2.0));
        assert_eq!(outcome.action, SegmentAction::Created);
        assert!(!outcome.is_committed);
        assert_eq!(engine.segment_count(), 1);
    }

    #[test]
    fn test_interim_then_final_merges_and_commits() {
        // Interim "Hello wor" refined by the final "Hello world"
        let mut engine = DedupEngine::new();
        engine.process_result(result("Hello wor", 0.6, 0.0, 1.5));
        let outcome = engine.process_result(result("Hello world", 0.95, 0.5, 2.0).finalized());

        assert_eq!(outcome.action, SegmentAction::Committed);
        assert!(outcome.is_committed);

        let segment = engine.segment(outcome.segment_id).unwrap();
        assert_eq!(segment.text, "Hello world");
        assert!(segment.confirmation_count >= 2);
        assert_eq!(engine.committed_transcript(), "Hello world");
    }

    #[test]
    fn test_merge_keeps_higher_confidence_text() {
        let mut engine = DedupEngine::new();
        engine.process_result(result("hello world", 0.9, 0.0, 2.0));
        let outcome = engine.process_result(result("hello word", 0.3, 0.2, 2.1));

        let segment = engine.segment(outcome.segment_id).unwrap();
        assert_eq!(segment.text, "hello world");
        assert!((segment.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_merge_widens_span_to_union() {
        let mut engine = DedupEngine::new();
        engine.process_result(result("testing one two", 0.5, 1.0, 2.0));
        let outcome = engine.process_result(result("testing one two", 0.5, 0.5, 3.0));

        let segment = engine.segment(outcome.segment_id).unwrap();
        assert_eq!(segment.span.start, 0.5);
        assert_eq!(segment.span.end, 3.0);
    }

    #[test]
    fn test_fast_commit_path() {
        let mut engine = DedupEngine::new();
        let outcome = engine.process_result(result("this is unambiguous", 0.95, 0.0, 2.0));
        assert_eq!(outcome.action, SegmentAction::Committed);
    }

    #[test]
    fn test_no_fast_commit_below_three_words() {
        let mut engine = DedupEngine::new();
        let outcome = engine.process_result(result("hello world", 0.99, 0.0, 2.0));
        assert!(!outcome.is_committed);
    }

    #[test]
    fn test_resubmitting_committed_text_is_idempotent() {
        let mut engine = DedupEngine::new();
        let committed = engine.process_result(result("this is final text", 0.95, 0.0, 2.0));
        assert!(committed.is_committed);

        let before = engine.segment(committed.segment_id).unwrap().clone();
        let dup = engine.process_result(result("this is final text", 0.95, 0.0, 2.0));

        assert!(dup.is_duplicate);
        assert_eq!(dup.action, SegmentAction::Ignored);
        assert_eq!(dup.segment_id, committed.segment_id);

        let after = engine.segment(committed.segment_id).unwrap();
        assert_eq!(after.text, before.text);
        assert_eq!(after.confirmation_count, before.confirmation_count + 1);
        assert_eq!(engine.segment_count(), 1);
    }

    #[test]
    fn test_distant_results_stay_separate() {
        let mut engine = DedupEngine::new();
        engine.process_result(result("first utterance entirely", 0.95, 0.0, 2.0));
        engine.process_result(result("second thought completely different", 0.95, 10.0, 12.0));
        assert_eq!(engine.segment_count(), 2);
        assert_eq!(engine.committed_segments().len(), 2);
    }

    #[test]
    fn test_overlap_resolution_keeps_higher_score() {
        let mut engine = DedupEngine::new();
        // Two committed segments with nearly identical spans but different
        // text, so they dodge the duplicate check and collide at resolution.
        engine.process_result(result("we should review the budget", 0.95, 0.0, 3.0));
        engine.process_result(result("completely unrelated words here", 0.91, 0.2, 3.1));
        assert_eq!(engine.committed_segments().len(), 2);

        // A final result triggers resolution.
        engine.process_result(result("and now something else", 0.95, 20.0, 22.0).finalized());

        let committed = engine.committed_segments();
        let early: Vec<_> = committed.iter().filter(|s| s.span.start < 5.0).collect();
        assert_eq!(early.len(), 1, "exactly one overlapping segment survives");
        assert_eq!(early[0].text, "we should review the budget");
        // Survivor span widened over the loser
        assert!(early[0].span.end >= 3.1);
    }

    #[test]
    fn test_cleanup_discards_stale_uncommitted() {
        let mut engine = DedupEngine::new();
        engine.process_result(result("fleeting fragment", 0.3, 0.0, 1.0));
        engine.process_result(result("this commits for sure", 0.95, 2.0, 4.0));

        // Default stale bound is 15s after last_seen
        let dropped = engine.cleanup_stale(30.0);
        assert_eq!(dropped, 1);
        assert_eq!(engine.segment_count(), 1);
        assert_eq!(engine.committed_transcript(), "this commits for sure");
    }

    #[test]
    fn test_cleanup_keeps_fresh_candidates() {
        let mut engine = DedupEngine::new();
        engine.process_result(result("still warming up", 0.3, 0.0, 1.0));
        assert_eq!(engine.cleanup_stale(5.0), 0);
        assert_eq!(engine.segment_count(), 1);
    }

    #[test]
    fn test_merge_adopts_missing_speaker() {
        let mut engine = DedupEngine::new();
        engine.process_result(result("who is speaking now", 0.5, 0.0, 2.0));
        let outcome = engine
            .process_result(result("who is speaking now", 0.6, 0.2, 2.2).with_speaker("speaker_1"));

        let segment = engine.segment(outcome.segment_id).unwrap();
        assert_eq!(segment.speaker_id.as_deref(), Some("speaker_1"));
    }

    #[test]
    fn test_transcript_is_time_ordered() {
        let mut engine = DedupEngine::new();
        engine.process_result(result("second committed utterance", 0.95, 10.0, 12.0));
        engine.process_result(result("first committed utterance", 0.95, 0.0, 2.0));
        assert_eq!(
            engine.committed_transcript(),
            "first committed utterance second committed utterance"
        );
    }
}
