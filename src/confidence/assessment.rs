//! Types produced and consumed by the confidence scoring engine.

use serde::{Deserialize, Serialize};

/// Five ordered confidence levels forming a strict partition of [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    /// Classifies a score against the given boundaries.
    pub fn from_score(score: f32, thresholds: &LevelThresholds) -> Self {
        if score < thresholds.very_low {
            Self::VeryLow
        } else if score < thresholds.low {
            Self::Low
        } else if score < thresholds.medium {
            Self::Medium
        } else if score < thresholds.high {
            Self::High
        } else {
            Self::VeryHigh
        }
    }
}

/// Boundaries between the five confidence levels.
///
/// Each field is the exclusive upper bound of the level it is named after.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LevelThresholds {
    pub very_low: f32,
    pub low: f32,
    pub medium: f32,
    pub high: f32,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            very_low: 0.2,
            low: 0.4,
            medium: 0.6,
            high: 0.8,
        }
    }
}

/// Raw audio quality metrics, supplied by the caller or estimated from
/// samples.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AudioQualityMetrics {
    pub snr_db: f32,
    /// Percentage of samples at or near full scale, 0..100.
    pub clipping_percent: f32,
    /// Optional external intelligibility estimate in [0, 1].
    pub intelligibility: Option<f32>,
}

/// Speaker evidence handed over from diarization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpeakerInfo {
    /// Diarization match confidence for this segment.
    pub confidence: f32,
    /// Agreement of recent match confidences for the same speaker.
    pub consistency: f32,
    pub voice_quality: f32,
}

/// Coarse acoustic environment classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    Quiet,
    Office,
    Noisy,
    Outdoor,
    Unknown,
}

/// Environment evidence for the environmental factor and for per-environment
/// calibration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentalContext {
    pub environment: Environment,
    /// Normalized background noise level in [0, 1], if measured.
    pub noise_level: Option<f32>,
    /// Environment stability in [0, 1]; low values mean changing conditions.
    pub stability: Option<f32>,
}

/// One independent confidence signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceFactor {
    pub name: String,
    /// The factor's own confidence estimate in [0, 1].
    pub raw_score: f32,
    /// Relative weight in the integrated score.
    pub weight: f32,
    /// How much this factor's raw score can be trusted given its inputs.
    pub reliability: f32,
    /// Spread of the raw score, in the same [0, 1] scale.
    pub uncertainty: f32,
    /// How much real evidence backs the factor, independent of its value.
    pub evidence_strength: f32,
}

/// Everything known about one segment at assessment time.
///
/// Every field except `text` and `duration` is optional; missing evidence
/// degrades the relevant factor to a neutral score with low reliability
/// instead of failing.
#[derive(Debug, Clone, Default)]
pub struct AssessmentInput<'a> {
    pub text: &'a str,
    pub audio: Option<&'a [f32]>,
    pub acoustic_confidence: Option<f32>,
    pub linguistic_confidence: Option<f32>,
    pub audio_quality: Option<AudioQualityMetrics>,
    pub speaker: Option<SpeakerInfo>,
    pub environment: Option<EnvironmentalContext>,
    pub duration: f64,
}

impl<'a> AssessmentInput<'a> {
    /// Minimal input: text and duration only.
    pub fn for_text(text: &'a str, duration: f64) -> Self {
        Self {
            text,
            duration,
            ..Self::default()
        }
    }
}

/// The per-segment output of the confidence engine. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceAssessment {
    pub overall_confidence: f32,
    pub confidence_level: ConfidenceLevel,
    pub factors: Vec<ConfidenceFactor>,
    /// Score derived from raw audio-quality metrics, in [0, 1].
    pub audio_quality_score: f32,
    /// Estimated transcription quality from the text-based factors.
    pub transcription_quality: f32,
    /// Two-sided 95% interval around the recent session mean.
    pub confidence_interval: (f32, f32),
    /// RMS-combined uncertainty across factors and history spread.
    pub uncertainty: f32,
    /// Whether the session mean differs significantly from the 0.5 baseline.
    pub statistically_significant: bool,
    /// Whether the score clears the sufficiency threshold.
    pub confidence_sufficient: bool,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_partition_is_strict() {
        let t = LevelThresholds::default();
        assert_eq!(ConfidenceLevel::from_score(0.0, &t), ConfidenceLevel::VeryLow);
        assert_eq!(ConfidenceLevel::from_score(0.19, &t), ConfidenceLevel::VeryLow);
        assert_eq!(ConfidenceLevel::from_score(0.2, &t), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.4, &t), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.6, &t), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.8, &t), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_score(1.0, &t), ConfidenceLevel::VeryHigh);
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(ConfidenceLevel::VeryLow < ConfidenceLevel::Low);
        assert!(ConfidenceLevel::High < ConfidenceLevel::VeryHigh);
    }

    #[test]
    fn test_minimal_input_has_no_evidence() {
        let input = AssessmentInput::for_text("hello", 1.0);
        assert!(input.audio.is_none());
        assert!(input.audio_quality.is_none());
        assert!(input.speaker.is_none());
    }
}
