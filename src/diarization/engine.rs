//! Per-session speaker diarization.
//!
//! Assigns a stable speaker identity to each speech segment without
//! enrollment data: extract voice features, match against the session's
//! known profiles, create a new profile when nothing is close enough.

use crate::capture::TimeSpan;
use crate::defaults;
use crate::diarization::features::{FeatureExtractor, VoiceFeatures};
use crate::diarization::matching::{MatchWeights, voice_similarity};
use crate::diarization::profile::SpeakerProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the diarization engine.
///
/// The matching weights and thresholds are deliberately exposed so the
/// matcher can be tuned and tested independently of feature extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiarizationConfig {
    /// Relative weight of each feature family in the match score.
    pub weights: MatchWeights,
    /// Continuity factor applied to candidates other than the previous
    /// speaker.
    pub switch_penalty: f32,
    /// Minimum weighted similarity to match an existing profile.
    pub min_match_confidence: f32,
    /// Hard cap on distinct profiles per session; once reached, unmatched
    /// voices fold into the closest existing profile.
    pub max_speakers: usize,
    /// Sample rate of the audio handed to `process_segment`.
    pub sample_rate: u32,
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            weights: MatchWeights::default(),
            switch_penalty: defaults::SWITCH_PENALTY,
            min_match_confidence: defaults::MIN_MATCH_CONFIDENCE,
            max_speakers: defaults::MAX_SPEAKERS,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

/// Speaker assignment for one processed segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerTurn {
    pub speaker_id: String,
    pub label: String,
    /// Match confidence, or the neutral new-speaker value.
    pub confidence: f32,
    /// True when the speaker differs from the immediately preceding segment.
    pub is_speaker_switch: bool,
}

/// One entry in the session timeline projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub span: TimeSpan,
    pub speaker_id: String,
    pub label: String,
    pub confidence: f32,
    pub text: String,
}

/// Read-only per-speaker statistics projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerStatistics {
    pub speaker_id: String,
    pub label: String,
    pub total_speaking_time: f64,
    pub segment_count: u32,
    /// Fraction of the session's total speaking time.
    pub speaking_share: f64,
    pub mean_confidence: f32,
    pub first_detected: DateTime<Utc>,
    pub last_detected: DateTime<Utc>,
}

/// Internal per-segment record backing the timeline projection.
#[derive(Debug, Clone)]
struct SegmentRecord {
    span: TimeSpan,
    speaker_id: String,
    confidence: f32,
    text: String,
}

/// Per-session diarization state.
pub struct DiarizationEngine {
    config: DiarizationConfig,
    extractor: FeatureExtractor,
    profiles: Vec<SpeakerProfile>,
    next_index: u32,
    last_speaker: Option<String>,
    records: Vec<SegmentRecord>,
}

impl DiarizationEngine {
    /// Creates an engine with default configuration and no pre-seeded
    /// speakers.
    pub fn new() -> Self {
        Self::with_config(DiarizationConfig::default(), &[])
    }

    /// Creates an engine, optionally pre-seeding named speaker slots.
    ///
    /// Expected names bind in order of first appearance: the first unmatched
    /// voice fills the first empty slot.
    pub fn with_config(config: DiarizationConfig, expected_names: &[String]) -> Self {
        let profiles: Vec<SpeakerProfile> = expected_names
            .iter()
            .enumerate()
            .map(|(i, name)| SpeakerProfile::new(format!("speaker_{}", i + 1), name.clone()))
            .collect();
        let next_index = profiles.len() as u32 + 1;
        let extractor = FeatureExtractor::new(config.sample_rate);
        Self {
            config,
            extractor,
            profiles,
            next_index,
            last_speaker: None,
            records: Vec::new(),
        }
    }

    /// Assigns a speaker to one speech segment and updates the matched (or
    /// newly created) profile.
    pub fn process_segment(
        &mut self,
        samples: &[f32],
        start: f64,
        end: f64,
        text: &str,
    ) -> SpeakerTurn {
        let span = TimeSpan::new(start, end);
        let mut features = self.extractor.extract(samples);

        // Words per second corroborates the energy-envelope estimate when
        // text is available for the same span; average the two, with the
        // lexical rate standing alone when the envelope saw nothing.
        let word_count = text.split_whitespace().count();
        if word_count > 0 && span.duration() > 1e-3 {
            let lexical_rate = word_count as f32 / span.duration() as f32;
            features.speaking_rate = if features.speaking_rate > 0.0 {
                0.5 * (features.speaking_rate + lexical_rate)
            } else {
                lexical_rate
            };
        }

        let (speaker_idx, confidence) = match self.best_match(&features) {
            Some((idx, score)) => (idx, score),
            None => self.allocate_profile(&features),
        };

        let duration = span.duration();
        self.profiles[speaker_idx].record_segment(&features, duration, confidence);

        let speaker_id = self.profiles[speaker_idx].id.clone();
        let label = self.profiles[speaker_idx].label.clone();
        let is_speaker_switch = self
            .last_speaker
            .as_ref()
            .is_some_and(|prev| *prev != speaker_id);
        self.last_speaker = Some(speaker_id.clone());

        self.records.push(SegmentRecord {
            span,
            speaker_id: speaker_id.clone(),
            confidence,
            text: text.to_string(),
        });

        SpeakerTurn {
            speaker_id,
            label,
            confidence,
            is_speaker_switch,
        }
    }

    /// Best-scoring known profile above the match threshold, with temporal
    /// continuity applied.
    fn best_match(&self, features: &VoiceFeatures) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, profile) in self.profiles.iter().enumerate() {
            if profile.is_empty() {
                continue;
            }
            let similarity = voice_similarity(features, &profile.features, &self.config.weights);
            let continuity = match &self.last_speaker {
                Some(prev) if *prev == profile.id => 1.0,
                Some(_) => self.config.switch_penalty,
                None => 1.0,
            };
            let score = similarity * continuity;
            if score >= self.config.min_match_confidence
                && best.map(|(_, s)| score > s).unwrap_or(true)
            {
                best = Some((idx, score));
            }
        }
        best
    }

    /// Fills the first pre-seeded empty slot, or creates a fresh profile.
    /// At the profile cap the unmatched voice folds into its closest
    /// existing profile instead.
    fn allocate_profile(&mut self, features: &VoiceFeatures) -> (usize, f32) {
        if let Some(idx) = self.profiles.iter().position(|p| p.is_empty()) {
            return (idx, defaults::NEW_SPEAKER_CONFIDENCE);
        }
        if self.profiles.len() >= self.config.max_speakers {
            let closest = self
                .profiles
                .iter()
                .enumerate()
                .map(|(idx, p)| {
                    (
                        idx,
                        voice_similarity(features, &p.features, &self.config.weights),
                    )
                })
                .max_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((idx, score)) = closest {
                debug!(
                    speaker_id = %self.profiles[idx].id,
                    score,
                    "speaker cap reached, folding into closest profile"
                );
                return (idx, score.min(defaults::NEW_SPEAKER_CONFIDENCE));
            }
        }
        let id = format!("speaker_{}", self.next_index);
        self.next_index += 1;
        debug!(speaker_id = %id, "new speaker profile created");
        self.profiles.push(SpeakerProfile::new(id.clone(), id));
        (self.profiles.len() - 1, defaults::NEW_SPEAKER_CONFIDENCE)
    }

    /// Display-only manual override; never affects matching.
    pub fn label_speaker(&mut self, speaker_id: &str, name: &str) -> bool {
        match self.profiles.iter_mut().find(|p| p.id == speaker_id) {
            Some(profile) => {
                profile.label = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Ordered timeline of speaker turns, with current labels resolved.
    pub fn session_timeline(&self) -> Vec<TimelineEntry> {
        self.records
            .iter()
            .map(|r| TimelineEntry {
                span: r.span,
                speaker_id: r.speaker_id.clone(),
                label: self
                    .profiles
                    .iter()
                    .find(|p| p.id == r.speaker_id)
                    .map(|p| p.label.clone())
                    .unwrap_or_else(|| r.speaker_id.clone()),
                confidence: r.confidence,
                text: r.text.clone(),
            })
            .collect()
    }

    /// Per-speaker statistics over profiles that have received segments.
    pub fn speaker_statistics(&self) -> Vec<SpeakerStatistics> {
        let total_time: f64 = self
            .profiles
            .iter()
            .map(|p| p.total_speaking_time)
            .sum::<f64>()
            .max(f64::from(defaults::EPSILON));

        self.profiles
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| SpeakerStatistics {
                speaker_id: p.id.clone(),
                label: p.label.clone(),
                total_speaking_time: p.total_speaking_time,
                segment_count: p.segment_count,
                speaking_share: p.total_speaking_time / total_time,
                mean_confidence: p.mean_confidence(),
                first_detected: p.first_detected,
                last_detected: p.last_detected,
            })
            .collect()
    }

    /// Number of profiles that have received at least one segment.
    pub fn speaker_count(&self) -> usize {
        self.profiles.iter().filter(|p| !p.is_empty()).count()
    }

    /// Looks up a profile by id.
    pub fn profile(&self, speaker_id: &str) -> Option<&SpeakerProfile> {
        self.profiles.iter().find(|p| p.id == speaker_id)
    }
}

impl Default for DiarizationEngine {
    fn default() -> Self {
        Self::new()
    }
}
