//! The transcription pipeline facade.
//!
//! Ties the four per-session engines together behind session-keyed calls:
//! audio in, contextual windows out to the recognizer, recognizer results
//! back in through diarization, dedup and confidence, committed segments out
//! to a `CommitSink`.
//!
//! The recognizer is the only slow collaborator; it is always invoked with
//! the session lock released.

use crate::capture::{ContextualWindow, TimeSpan, pcm_s16le_to_f32, rms};
use crate::confidence::{AssessmentInput, ConfidenceAssessment, SpeakerInfo};
use crate::config::Config;
use crate::dedup::{ProcessOutcome, SegmentAction, TranscriptionResult};
use crate::diarization::{SpeakerStatistics, TimelineEntry};
use crate::error::Result;
use crate::session::{SessionRegistry, SessionSnapshot};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One recognizer answer for a contextual window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recognition {
    pub text: String,
    pub confidence: f32,
    pub is_final: bool,
    pub language: Option<String>,
}

/// The external speech-to-text collaborator.
///
/// May take hundreds of milliseconds; the pipeline never holds a session
/// lock across this call.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, window: &ContextualWindow) -> Result<Recognition>;
}

/// A segment the dedup engine decided to commit, enriched with speaker and
/// confidence data. This is the unit handed to persistence and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommittedSegment {
    pub session_id: String,
    pub text: String,
    pub span: TimeSpan,
    pub speaker_id: Option<String>,
    pub speaker_label: Option<String>,
    pub assessment: ConfidenceAssessment,
}

/// Pluggable output handler for committed segments.
pub trait CommitSink: Send + Sync {
    /// Handle one committed segment. Called once per commit, in commit order.
    fn deliver(&self, commit: CommittedSegment);

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Sink that accumulates commits in memory. Useful for tests and for callers
/// that drain commits on their own schedule.
#[derive(Default)]
pub struct CollectorSink {
    commits: Mutex<Vec<CommittedSegment>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commits(&self) -> Vec<CommittedSegment> {
        self.commits.lock().clone()
    }

    /// Drains and returns all accumulated commits.
    pub fn take(&self) -> Vec<CommittedSegment> {
        std::mem::take(&mut self.commits.lock())
    }
}

impl CommitSink for CollectorSink {
    fn deliver(&self, commit: CommittedSegment) {
        self.commits.lock().push(commit);
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

/// Sink that serializes each commit as one JSON line to a writer.
pub struct JsonLinesSink<W: std::io::Write + Send> {
    writer: Mutex<W>,
}

impl<W: std::io::Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: std::io::Write + Send> CommitSink for JsonLinesSink<W> {
    fn deliver(&self, commit: CommittedSegment) {
        let mut writer = self.writer.lock();
        match serde_json::to_string(&commit) {
            Ok(line) => {
                if let Err(e) = writeln!(writer, "{}", line) {
                    warn!(error = %e, "failed to write committed segment");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize committed segment"),
        }
    }

    fn name(&self) -> &'static str {
        "json-lines"
    }
}

/// Receipt for one ingested audio chunk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkReceipt {
    pub chunk_id: Uuid,
    /// Session-clock timestamp assigned to the chunk.
    pub timestamp: f64,
    pub duration: f64,
}

/// Session-keyed facade over capture, diarization, dedup and confidence.
pub struct TranscriptionPipeline {
    registry: SessionRegistry,
    sink: Arc<dyn CommitSink>,
}

impl TranscriptionPipeline {
    pub fn new(config: Config, sink: Arc<dyn CommitSink>) -> Self {
        Self {
            registry: SessionRegistry::new(config),
            sink,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Appends one audio chunk to the session's capture buffer, creating the
    /// session on first touch.
    pub fn ingest_chunk(
        &self,
        session_id: &str,
        data: Vec<u8>,
        mime_type: &str,
        duration: Option<f64>,
    ) -> ChunkReceipt {
        let rms_level = rms(&pcm_s16le_to_f32(&data));
        let session = self.registry.session(session_id);
        let mut state = session.lock();
        let chunk = state
            .capture
            .add_audio_chunk(data, mime_type, rms_level, duration);
        ChunkReceipt {
            chunk_id: chunk.id,
            timestamp: chunk.timestamp,
            duration: chunk.duration,
        }
    }

    /// Builds the next contextual window for the recognizer, or `None` when
    /// the buffer holds no new audio.
    pub fn next_window(&self, session_id: &str, target_duration: f64) -> Option<ContextualWindow> {
        let session = self.registry.session(session_id);
        let mut state = session.lock();
        state.capture.contextual_window(target_duration)
    }

    /// One full recognition cycle: build a window, call the recognizer with
    /// the session lock released, then fold the result back in.
    ///
    /// Returns `Ok(None)` when there is no window to process or the window is
    /// too quiet to be worth a recognizer round-trip. A recognizer error
    /// means "no candidate this cycle" and is propagated for the caller to
    /// log.
    pub async fn process_window(
        &self,
        session_id: &str,
        target_duration: f64,
        recognizer: &dyn Recognizer,
    ) -> Result<Option<ProcessOutcome>> {
        let Some(window) = self.next_window(session_id, target_duration) else {
            return Ok(None);
        };
        if window.metadata.low_energy {
            debug!(session_id, "skipping low-energy window");
            return Ok(None);
        }

        // No session lock held across the recognizer call
        let recognition = match recognizer.recognize(&window).await {
            Ok(recognition) => recognition,
            Err(e) => {
                warn!(session_id, error = %e, "recognizer failed, dropping window");
                return Err(e);
            }
        };
        if recognition.text.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(self.ingest_result(session_id, &window, recognition)))
    }

    /// Folds one recognizer result into the session: diarize, dedup, and on
    /// commit assess confidence and deliver to the sink.
    pub fn ingest_result(
        &self,
        session_id: &str,
        window: &ContextualWindow,
        recognition: Recognition,
    ) -> ProcessOutcome {
        let session = self.registry.session(session_id);
        let overlap = self.registry.config().capture.overlap_seconds;

        let (outcome, commit) = {
            let mut state = session.lock();
            let samples = window.samples();

            let turn = state.diarization.process_segment(
                &samples,
                window.span.start,
                window.span.end,
                &recognition.text,
            );
            let speaker_info = state.diarization.profile(&turn.speaker_id).map(|p| {
                SpeakerInfo {
                    confidence: turn.confidence,
                    consistency: p.mean_confidence(),
                    voice_quality: p.features.voice_quality,
                }
            });

            let mut result = TranscriptionResult::new(
                recognition.text.clone(),
                recognition.confidence,
                window.span,
            )
            .with_speaker(turn.speaker_id.clone());
            result.chunk_id = window.metadata.chunk_ids.first().copied();
            result.language = recognition.language.clone();
            if recognition.is_final {
                result = result.finalized();
            }

            let outcome = state.dedup.process_result(result);

            let commit = if outcome.action == SegmentAction::Committed {
                let input = AssessmentInput {
                    text: &recognition.text,
                    audio: Some(&samples),
                    acoustic_confidence: Some(recognition.confidence),
                    linguistic_confidence: None,
                    audio_quality: None,
                    speaker: speaker_info,
                    environment: None,
                    duration: window.span.duration(),
                };
                let assessment = state.confidence.assess(&input);

                state.dedup.segment(outcome.segment_id).map(|segment| {
                    CommittedSegment {
                        session_id: session_id.to_string(),
                        text: segment.text.clone(),
                        span: segment.span,
                        speaker_id: segment.speaker_id.clone(),
                        speaker_label: Some(turn.label.clone()),
                        assessment,
                    }
                })
            } else {
                None
            };

            // Free audio the recognizer no longer needs, keeping the overlap
            // tail, and drop stale uncommitted candidates
            let clock = state.capture.clock();
            state.capture.cleanup_processed(window.span.end - overlap);
            state.dedup.cleanup_stale(clock);

            (outcome, commit)
        };

        if let Some(commit) = commit {
            info!(
                session_id,
                text_len = commit.text.len(),
                speaker = ?commit.speaker_id,
                "segment committed"
            );
            self.sink.deliver(commit);
        }

        outcome
    }

    /// Stable committed transcript so far, in time order.
    pub fn transcript(&self, session_id: &str) -> String {
        let session = self.registry.session(session_id);
        let state = session.lock();
        state.dedup.committed_transcript()
    }

    /// Ordered speaker timeline for the session.
    pub fn timeline(&self, session_id: &str) -> Vec<TimelineEntry> {
        let session = self.registry.session(session_id);
        let state = session.lock();
        state.diarization.session_timeline()
    }

    pub fn speaker_statistics(&self, session_id: &str) -> Vec<SpeakerStatistics> {
        let session = self.registry.session(session_id);
        let state = session.lock();
        state.diarization.speaker_statistics()
    }

    /// Display-only speaker relabeling.
    pub fn label_speaker(&self, session_id: &str, speaker_id: &str, name: &str) -> bool {
        let session = self.registry.session(session_id);
        let mut state = session.lock();
        state.diarization.label_speaker(speaker_id, name)
    }

    /// Ends the session, dropping its state and returning a final snapshot.
    pub fn end_session(&self, session_id: &str) -> Option<SessionSnapshot> {
        self.registry.end_session(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRecognizer {
        text: String,
        confidence: f32,
        is_final: bool,
    }

    #[async_trait]
    impl Recognizer for FixedRecognizer {
        async fn recognize(&self, _window: &ContextualWindow) -> Result<Recognition> {
            Ok(Recognition {
                text: self.text.clone(),
                confidence: self.confidence,
                is_final: self.is_final,
                language: Some("en".to_string()),
            })
        }
    }

    struct FailingRecognizer;

    #[async_trait]
    impl Recognizer for FailingRecognizer {
        async fn recognize(&self, _window: &ContextualWindow) -> Result<Recognition> {
            Err(crate::error::MeetscribeError::Recognizer {
                message: "backend unavailable".to_string(),
            })
        }
    }

    /// One second of 16 kHz speech-level PCM (s16le sine).
    fn pcm_second(freq: f32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(32_000);
        for i in 0..16_000 {
            let t = i as f32 / 16_000.0;
            let sample = (2.0 * std::f32::consts::PI * freq * t).sin() * 0.4;
            let value = (sample * 32767.0) as i16;
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    fn pipeline_with_sink() -> (TranscriptionPipeline, Arc<CollectorSink>) {
        let sink = Arc::new(CollectorSink::new());
        let pipeline = TranscriptionPipeline::new(Config::default(), sink.clone());
        (pipeline, sink)
    }

    #[tokio::test]
    async fn test_empty_session_has_no_window() {
        let (pipeline, _sink) = pipeline_with_sink();
        let recognizer = FixedRecognizer {
            text: "hello".to_string(),
            confidence: 0.9,
            is_final: false,
        };
        let outcome = pipeline
            .process_window("meeting-1", 5.0, &recognizer)
            .await
            .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_recognizer_error_propagates_without_commit() {
        let (pipeline, sink) = pipeline_with_sink();
        pipeline.ingest_chunk("meeting-1", pcm_second(150.0), "audio/pcm", None);

        let result = pipeline
            .process_window("meeting-1", 5.0, &FailingRecognizer)
            .await;
        assert!(result.is_err());
        assert!(sink.commits().is_empty());
    }

    #[tokio::test]
    async fn test_fast_commit_reaches_sink() {
        let (pipeline, sink) = pipeline_with_sink();
        pipeline.ingest_chunk("meeting-1", pcm_second(150.0), "audio/pcm", None);

        let recognizer = FixedRecognizer {
            text: "we should review the budget".to_string(),
            confidence: 0.95,
            is_final: true,
        };
        let outcome = pipeline
            .process_window("meeting-1", 5.0, &recognizer)
            .await
            .unwrap()
            .unwrap();
        assert!(outcome.is_committed);

        let commits = sink.commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].text, "we should review the budget");
        assert_eq!(commits[0].session_id, "meeting-1");
        assert!(commits[0].speaker_id.is_some());
        let overall = commits[0].assessment.overall_confidence;
        assert!((0.0..=1.0).contains(&overall));
    }

    #[tokio::test]
    async fn test_low_confidence_partial_is_tracked_not_committed() {
        let (pipeline, sink) = pipeline_with_sink();
        pipeline.ingest_chunk("meeting-1", pcm_second(150.0), "audio/pcm", None);

        let recognizer = FixedRecognizer {
            text: "hello wor".to_string(),
            confidence: 0.6,
            is_final: false,
        };
        let outcome = pipeline
            .process_window("meeting-1", 5.0, &recognizer)
            .await
            .unwrap()
            .unwrap();
        assert!(!outcome.is_committed);
        assert!(sink.commits().is_empty());
        assert!(pipeline.transcript("meeting-1").is_empty());
    }

    #[tokio::test]
    async fn test_end_session_snapshot_carries_transcript() {
        let (pipeline, _sink) = pipeline_with_sink();
        pipeline.ingest_chunk("meeting-1", pcm_second(150.0), "audio/pcm", None);

        let recognizer = FixedRecognizer {
            text: "final decision recorded here".to_string(),
            confidence: 0.95,
            is_final: true,
        };
        pipeline
            .process_window("meeting-1", 5.0, &recognizer)
            .await
            .unwrap();

        let snapshot = pipeline.end_session("meeting-1").unwrap();
        assert_eq!(snapshot.transcript, "final decision recorded here");
        assert!(!snapshot.speaker_statistics.is_empty());
        assert!(!pipeline.registry().contains("meeting-1"));
    }

    #[test]
    fn test_collector_sink_take_drains() {
        let sink = CollectorSink::new();
        assert_eq!(sink.name(), "collector");
        assert!(sink.take().is_empty());
    }

    #[test]
    fn test_json_lines_sink_writes_one_line_per_commit() {
        let mut engine = crate::confidence::ConfidenceEngine::new();
        let assessment = engine.assess(&AssessmentInput::for_text("hello world", 1.0));
        let commit = CommittedSegment {
            session_id: "meeting-1".to_string(),
            text: "hello world".to_string(),
            span: TimeSpan::new(0.0, 1.0),
            speaker_id: Some("speaker_0".to_string()),
            speaker_label: Some("Speaker 1".to_string()),
            assessment,
        };

        let sink = JsonLinesSink::new(Vec::new());
        sink.deliver(commit);
        let written = String::from_utf8(sink.into_inner()).unwrap();
        assert!(written.ends_with('\n'));
        assert!(written.contains("\"session_id\":\"meeting-1\""));
        assert_eq!(written.lines().count(), 1);
    }
}
