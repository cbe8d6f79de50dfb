//! Speaker profiles: one per distinct voice per session.

use crate::defaults;
use crate::diarization::features::VoiceFeatures;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A persistent per-session speaker identity.
///
/// The feature vector is always the running average of every segment
/// assigned to this speaker, weighted by segment count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerProfile {
    /// Stable id within the session ("speaker_1", "speaker_2", ...).
    pub id: String,
    /// Display label; starts as the id or a pre-seeded expected name.
    pub label: String,
    /// Running-average voice feature vector.
    pub features: VoiceFeatures,
    pub first_detected: DateTime<Utc>,
    pub last_detected: DateTime<Utc>,
    /// Accumulated speaking time in seconds.
    pub total_speaking_time: f64,
    pub segment_count: u32,
    /// Recent match confidences, bounded.
    pub confidence_history: VecDeque<f32>,
}

impl SpeakerProfile {
    /// Creates an empty profile (no segments assigned yet).
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            label: label.into(),
            features: VoiceFeatures::default(),
            first_detected: now,
            last_detected: now,
            total_speaking_time: 0.0,
            segment_count: 0,
            confidence_history: VecDeque::new(),
        }
    }

    /// True when no segment has been assigned yet (a pre-seeded slot).
    pub fn is_empty(&self) -> bool {
        self.segment_count == 0
    }

    /// Folds one assigned segment into the profile: count-weighted running
    /// average of every feature, plus speaking time and confidence history.
    pub fn record_segment(&mut self, features: &VoiceFeatures, duration: f64, confidence: f32) {
        if self.segment_count == 0 {
            self.features = features.clone();
        } else {
            let n = self.segment_count as f32;
            let avg = |old: f32, new: f32| (old * n + new) / (n + 1.0);

            let f = &mut self.features;
            f.energy = avg(f.energy, features.energy);
            f.zero_crossing_rate = avg(f.zero_crossing_rate, features.zero_crossing_rate);
            f.spectral_centroid = avg(f.spectral_centroid, features.spectral_centroid);
            f.spectral_rolloff = avg(f.spectral_rolloff, features.spectral_rolloff);
            f.spectral_bandwidth = avg(f.spectral_bandwidth, features.spectral_bandwidth);
            f.fundamental_freq = avg(f.fundamental_freq, features.fundamental_freq);
            for (slot, new) in f.formants.iter_mut().zip(features.formants) {
                *slot = avg(*slot, new);
            }
            for (slot, new) in f.mfcc.iter_mut().zip(&features.mfcc) {
                *slot = avg(*slot, *new);
            }
            f.speaking_rate = avg(f.speaking_rate, features.speaking_rate);
            f.pause_ratio = avg(f.pause_ratio, features.pause_ratio);
            f.hnr = avg(f.hnr, features.hnr);
            f.jitter = avg(f.jitter, features.jitter);
            f.shimmer = avg(f.shimmer, features.shimmer);
            f.voice_quality = avg(f.voice_quality, features.voice_quality);
            // The categorical estimate follows the newest evidence only when
            // the running one is undecided
            if f.gender == crate::diarization::features::GenderEstimate::Unknown {
                f.gender = features.gender;
            }
        }

        self.segment_count += 1;
        self.total_speaking_time += duration.max(0.0);
        self.last_detected = Utc::now();
        self.confidence_history.push_back(confidence);
        while self.confidence_history.len() > defaults::HISTORY_CAPACITY {
            self.confidence_history.pop_front();
        }
    }

    /// Mean of the recent match confidences; 0.0 with no history.
    pub fn mean_confidence(&self) -> f32 {
        if self.confidence_history.is_empty() {
            return 0.0;
        }
        self.confidence_history.iter().sum::<f32>() / self.confidence_history.len() as f32
    }
}
