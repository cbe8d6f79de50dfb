//! Weighted voice similarity for speaker matching.
//!
//! Each feature family contributes a closeness score in [0, 1]; the weighted
//! combination, multiplied by a temporal-continuity factor, decides whether a
//! segment belongs to a known speaker. Missing evidence on either side scores
//! a neutral 0.5 so one absent feature never vetoes a match.

use crate::defaults;
use crate::diarization::features::VoiceFeatures;
use serde::{Deserialize, Serialize};

/// Relative weight of each feature family in the match score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchWeights {
    pub f0: f32,
    pub formants: f32,
    pub spectral: f32,
    pub mfcc: f32,
    pub rate: f32,
    pub quality: f32,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            f0: 0.30,
            formants: 0.20,
            spectral: 0.15,
            mfcc: 0.15,
            rate: 0.10,
            quality: 0.10,
        }
    }
}

/// Weighted similarity of two voice feature vectors, in [0, 1].
pub fn voice_similarity(a: &VoiceFeatures, b: &VoiceFeatures, weights: &MatchWeights) -> f32 {
    let total = weights.f0
        + weights.formants
        + weights.spectral
        + weights.mfcc
        + weights.rate
        + weights.quality;
    if total < defaults::EPSILON {
        return 0.0;
    }

    let score = weights.f0 * f0_closeness(a.fundamental_freq, b.fundamental_freq)
        + weights.formants * formant_closeness(&a.formants, &b.formants)
        + weights.spectral * spectral_closeness(a, b)
        + weights.mfcc * mfcc_closeness(&a.mfcc, &b.mfcc)
        + weights.rate * rate_closeness(a, b)
        + weights.quality * (1.0 - (a.voice_quality - b.voice_quality).abs()).clamp(0.0, 1.0);

    (score / total).clamp(0.0, 1.0)
}

/// Pitch closeness on a log scale: one octave apart scores zero.
fn f0_closeness(a: f32, b: f32) -> f32 {
    if a < defaults::EPSILON || b < defaults::EPSILON {
        return 0.5;
    }
    let octaves = (a / b).ln().abs() / std::f32::consts::LN_2;
    (1.0 - octaves).clamp(0.0, 1.0)
}

/// Mean per-formant closeness, each normalized by its band width.
fn formant_closeness(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    const BAND_WIDTHS: [f32; 3] = [650.0, 1650.0, 1200.0];
    let mut sum = 0.0;
    let mut count = 0;
    for ((fa, fb), width) in a.iter().zip(b).zip(BAND_WIDTHS) {
        if *fa < defaults::EPSILON || *fb < defaults::EPSILON {
            continue;
        }
        sum += (1.0 - (fa - fb).abs() / width).clamp(0.0, 1.0);
        count += 1;
    }
    if count == 0 { 0.5 } else { sum / count as f32 }
}

/// Closeness of the spectral shape descriptors.
fn spectral_closeness(a: &VoiceFeatures, b: &VoiceFeatures) -> f32 {
    // Reference scales for "completely different" speech spectra
    const CENTROID_REF: f32 = 2000.0;
    const ROLLOFF_REF: f32 = 4000.0;
    const BANDWIDTH_REF: f32 = 2000.0;

    let centroid = 1.0 - ((a.spectral_centroid - b.spectral_centroid).abs() / CENTROID_REF);
    let rolloff = 1.0 - ((a.spectral_rolloff - b.spectral_rolloff).abs() / ROLLOFF_REF);
    let bandwidth = 1.0 - ((a.spectral_bandwidth - b.spectral_bandwidth).abs() / BANDWIDTH_REF);
    ((centroid.clamp(0.0, 1.0) + rolloff.clamp(0.0, 1.0) + bandwidth.clamp(0.0, 1.0)) / 3.0)
        .clamp(0.0, 1.0)
}

/// Cosine similarity of the MFCC vectors, mapped into [0, 1].
fn mfcc_closeness(a: &[f32], b: &[f32]) -> f32 {
    let cos = cosine_similarity(a, b);
    if cos == 0.0 && (a.iter().all(|v| *v == 0.0) || b.iter().all(|v| *v == 0.0)) {
        return 0.5;
    }
    ((cos + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Speaking-rate and pause-ratio closeness.
fn rate_closeness(a: &VoiceFeatures, b: &VoiceFeatures) -> f32 {
    const RATE_REF: f32 = 4.0;
    let rate = 1.0 - ((a.speaking_rate - b.speaking_rate).abs() / RATE_REF).clamp(0.0, 1.0);
    let pause = 1.0 - (a.pause_ratio - b.pause_ratio).abs().clamp(0.0, 1.0);
    (rate + pause) / 2.0
}

/// Cosine similarity of two vectors; 0.0 for mismatched or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a < defaults::EPSILON || norm_b < defaults::EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(f0: f32, centroid: f32) -> VoiceFeatures {
        VoiceFeatures {
            energy: 0.1,
            fundamental_freq: f0,
            spectral_centroid: centroid,
            spectral_rolloff: centroid * 1.5,
            spectral_bandwidth: 800.0,
            formants: [500.0, 1500.0, 2800.0],
            mfcc: vec![1.0, 0.5, -0.2, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            voice_quality: 0.7,
            speaking_rate: 3.0,
            pause_ratio: 0.2,
            ..VoiceFeatures::default()
        }
    }

    #[test]
    fn test_identical_voices_score_near_one() {
        let a = voice(120.0, 1200.0);
        let sim = voice_similarity(&a, &a, &MatchWeights::default());
        assert!(sim > 0.95, "expected near 1.0, got {}", sim);
    }

    #[test]
    fn test_different_voices_score_lower() {
        let a = voice(110.0, 900.0);
        let mut b = voice(230.0, 2400.0);
        b.formants = [750.0, 2200.0, 3400.0];
        b.mfcc = vec![-1.0, 0.8, 0.9, -0.5, 0.3, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        b.voice_quality = 0.3;
        b.speaking_rate = 6.0;
        b.pause_ratio = 0.6;

        let same = voice_similarity(&a, &a, &MatchWeights::default());
        let different = voice_similarity(&a, &b, &MatchWeights::default());
        assert!(different < same);
        assert!(different < 0.6, "expected < 0.6, got {}", different);
    }

    #[test]
    fn test_f0_closeness_octave_apart_is_zero() {
        assert_eq!(f0_closeness(100.0, 200.0), 0.0);
        assert!((f0_closeness(100.0, 100.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_f0_closeness_missing_is_neutral() {
        assert_eq!(f0_closeness(0.0, 150.0), 0.5);
    }

    #[test]
    fn test_formant_closeness_missing_is_neutral() {
        assert_eq!(formant_closeness(&[0.0; 3], &[500.0, 1500.0, 2800.0]), 0.5);
    }

    #[test]
    fn test_cosine_similarity_basics() {
        let a = [1.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0];
        let c = [-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
        assert!((cosine_similarity(&a, &c) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_similarity_is_bounded() {
        let a = voice(110.0, 900.0);
        let b = VoiceFeatures::default();
        let sim = voice_similarity(&a, &b, &MatchWeights::default());
        assert!((0.0..=1.0).contains(&sim));
    }

    #[test]
    fn test_zero_weights_score_zero() {
        let weights = MatchWeights {
            f0: 0.0,
            formants: 0.0,
            spectral: 0.0,
            mfcc: 0.0,
            rate: 0.0,
            quality: 0.0,
        };
        let a = voice(120.0, 1200.0);
        assert_eq!(voice_similarity(&a, &a, &weights), 0.0);
    }
}
