//! Per-session state and the session registry.
//!
//! Each meeting session owns one capture buffer, one dedup engine, one
//! diarization engine and one confidence engine. All four live and die
//! together under a single coarse lock.

use crate::capture::CaptureBuffer;
use crate::confidence::ConfidenceEngine;
use crate::config::Config;
use crate::dedup::DedupEngine;
use crate::diarization::{DiarizationEngine, SpeakerStatistics};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything one meeting session owns.
pub struct SessionState {
    pub capture: CaptureBuffer,
    pub dedup: DedupEngine,
    pub diarization: DiarizationEngine,
    pub confidence: ConfidenceEngine,
}

impl SessionState {
    fn new(config: &Config, expected_names: &[String]) -> Self {
        Self {
            capture: CaptureBuffer::with_config(config.capture.clone()),
            dedup: DedupEngine::with_config(config.dedup.clone()),
            diarization: DiarizationEngine::with_config(
                config.diarization.clone(),
                expected_names,
            ),
            confidence: ConfidenceEngine::with_config(config.confidence.clone()),
        }
    }
}

/// Final state handed to the persistence collaborator when a session ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub transcript: String,
    pub speaker_statistics: Vec<SpeakerStatistics>,
}

/// Session-keyed registry over the per-session engines.
///
/// Sessions initialize lazily on first touch and are dropped as a unit by
/// `end_session`.
pub struct SessionRegistry {
    config: Config,
    sessions: DashMap<String, Arc<Mutex<SessionState>>>,
}

impl SessionRegistry {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the session's state, creating it on first touch.
    pub fn session(&self, session_id: &str) -> Arc<Mutex<SessionState>> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!(session_id, "session created");
                Arc::new(Mutex::new(SessionState::new(&self.config, &[])))
            })
            .clone()
    }

    /// Creates a session with pre-seeded speaker slots for the expected
    /// participant names. Returns the existing state if the session already
    /// exists.
    pub fn create_session(
        &self,
        session_id: &str,
        expected_names: &[String],
    ) -> Arc<Mutex<SessionState>> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!(
                    session_id,
                    expected = expected_names.len(),
                    "session created with expected speakers"
                );
                Arc::new(Mutex::new(SessionState::new(&self.config, expected_names)))
            })
            .clone()
    }

    /// Removes the session, dropping all of its engine state, and returns a
    /// final snapshot for the checkpoint collaborator.
    pub fn end_session(&self, session_id: &str) -> Option<SessionSnapshot> {
        let (_, state) = self.sessions.remove(session_id)?;
        let state = state.lock();
        let snapshot = SessionSnapshot {
            session_id: session_id.to_string(),
            transcript: state.dedup.committed_transcript(),
            speaker_statistics: state.diarization.speaker_statistics(),
        };
        info!(
            session_id,
            speakers = snapshot.speaker_statistics.len(),
            "session ended"
        );
        Some(snapshot)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn active_sessions(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
