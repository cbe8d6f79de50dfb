//! The seven independent confidence factors.
//!
//! Each constructor turns whatever evidence is available into a
//! `ConfidenceFactor`. Missing evidence never fails: the factor degrades to
//! a neutral score with low reliability and low evidence strength, so the
//! integration step discounts it naturally.

use crate::confidence::assessment::{
    AudioQualityMetrics, ConfidenceFactor, Environment, EnvironmentalContext, SpeakerInfo,
};
use crate::defaults;
use std::collections::VecDeque;

const NEUTRAL: f32 = 0.5;

/// Common filler words that suggest hesitant or misrecognized speech.
const FILLERS: &[&str] = &["um", "uh", "er", "ah", "hmm", "like", "actually", "basically"];

/// High-frequency English words used as a cheap lexical plausibility check.
const COMMON_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "to", "of", "in", "on", "at", "for", "is", "are", "was",
    "were", "be", "it", "this", "that", "we", "you", "i", "they", "he", "she", "have", "has", "do",
    "will", "can", "not", "with", "as", "so",
];

/// Discourse connectives that indicate coherent running speech.
const TRANSITIONS: &[&str] = &[
    "however", "therefore", "because", "although", "also", "then", "next", "finally", "first",
    "second", "meanwhile", "instead",
];

/// Acoustic factor: the recognizer's own confidence, penalized by poor SNR
/// and clipping.
pub fn acoustic(
    acoustic_confidence: Option<f32>,
    metrics: Option<&AudioQualityMetrics>,
    weight: f32,
) -> ConfidenceFactor {
    let base = acoustic_confidence.unwrap_or(NEUTRAL);
    let mut raw = base;
    if let Some(m) = metrics {
        raw -= (10.0 - m.snr_db).max(0.0) * 0.02;
        raw -= (m.clipping_percent * 0.02).min(0.2);
    }
    let has_evidence = acoustic_confidence.is_some();
    ConfidenceFactor {
        name: "acoustic".to_string(),
        raw_score: raw.clamp(0.0, 1.0),
        weight,
        reliability: if has_evidence { 0.9 } else { 0.4 },
        uncertainty: if has_evidence { 0.1 } else { 0.3 },
        evidence_strength: if has_evidence || metrics.is_some() {
            0.8
        } else {
            0.2
        },
    }
}

/// Audio-quality factor: starts from a perfect score and subtracts SNR and
/// clipping penalties; an external intelligibility estimate blends in.
pub fn audio_quality(metrics: Option<&AudioQualityMetrics>, weight: f32) -> ConfidenceFactor {
    let (raw, reliability, uncertainty, evidence) = match metrics {
        Some(m) => {
            let mut score = 1.0;
            score -= (10.0 - m.snr_db).max(0.0) * 0.05;
            score -= (m.clipping_percent * 0.05).min(0.5);
            let mut score = score.clamp(0.0, 1.0);
            if let Some(intel) = m.intelligibility {
                score = score * 0.7 + intel.clamp(0.0, 1.0) * 0.3;
            }
            (score, 0.85, 0.1, 0.9)
        }
        None => (NEUTRAL, 0.3, 0.35, 0.1),
    };
    ConfidenceFactor {
        name: "audio_quality".to_string(),
        raw_score: raw,
        weight,
        reliability,
        uncertainty,
        evidence_strength: evidence,
    }
}

/// Linguistic factor: the language model's confidence where available,
/// penalized by repetition, filler density, and extreme segment lengths.
pub fn linguistic(
    linguistic_confidence: Option<f32>,
    text: &str,
    weight: f32,
) -> ConfidenceFactor {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    let mut raw = linguistic_confidence.unwrap_or(0.7);

    if !words.is_empty() {
        let repeated = words
            .windows(2)
            .filter(|pair| pair[0] == pair[1])
            .count() as f32;
        raw -= (repeated / words.len() as f32) * 0.5;

        let fillers = words.iter().filter(|w| FILLERS.contains(&w.as_str())).count() as f32;
        raw -= (fillers / words.len() as f32) * 0.4;
    }
    if words.len() < 2 || words.len() > 60 {
        raw -= 0.1;
    }

    let has_text = !words.is_empty();
    ConfidenceFactor {
        name: "linguistic".to_string(),
        raw_score: raw.clamp(0.0, 1.0),
        weight,
        reliability: if linguistic_confidence.is_some() { 0.85 } else { 0.6 },
        uncertainty: if linguistic_confidence.is_some() { 0.1 } else { 0.2 },
        evidence_strength: if has_text { 0.7 } else { 0.1 },
    }
}

/// Contextual factor: a cheap coherence heuristic over punctuation,
/// capitalization, common-word ratio and discourse transitions.
pub fn contextual(text: &str, weight: f32) -> ConfidenceFactor {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return ConfidenceFactor {
            name: "contextual".to_string(),
            raw_score: NEUTRAL,
            weight,
            reliability: 0.2,
            uncertainty: 0.35,
            evidence_strength: 0.1,
        };
    }

    let words: Vec<String> = trimmed
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    let mut raw = 0.4;
    if trimmed.ends_with(['.', '?', '!']) {
        raw += 0.1;
    }
    if trimmed.chars().next().is_some_and(char::is_uppercase) {
        raw += 0.1;
    }
    if !words.is_empty() {
        let common = words
            .iter()
            .filter(|w| COMMON_WORDS.contains(&w.as_str()))
            .count() as f32;
        raw += (common / words.len() as f32).min(0.5) * 0.6;
        if words.iter().any(|w| TRANSITIONS.contains(&w.as_str())) {
            raw += 0.1;
        }
    }

    ConfidenceFactor {
        name: "contextual".to_string(),
        raw_score: raw.clamp(0.0, 1.0),
        weight,
        reliability: 0.5,
        uncertainty: 0.25,
        evidence_strength: 0.4,
    }
}

/// Temporal factor: variance and trend of the session's recent confidence
/// history. With too little history it stays neutral.
pub fn temporal(history: &VecDeque<f32>, weight: f32) -> ConfidenceFactor {
    if history.len() < 3 {
        return ConfidenceFactor {
            name: "temporal".to_string(),
            raw_score: NEUTRAL,
            weight,
            reliability: 0.2,
            uncertainty: 0.35,
            evidence_strength: 0.1,
        };
    }

    let recent: Vec<f32> = history.iter().rev().take(10).copied().collect();
    let n = recent.len() as f32;
    let mean = recent.iter().sum::<f32>() / n;
    let variance = recent.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;

    // Trend: recent half relative to the older half (list is newest-first)
    let half = recent.len() / 2;
    let newer = recent[..half].iter().sum::<f32>() / half.max(1) as f32;
    let older = recent[half..].iter().sum::<f32>() / (recent.len() - half).max(1) as f32;
    let trend = (newer - older).clamp(-0.2, 0.2);

    let raw = (mean - variance.sqrt() * 0.5 + trend * 0.5).clamp(0.0, 1.0);
    ConfidenceFactor {
        name: "temporal".to_string(),
        raw_score: raw,
        weight,
        reliability: 0.7,
        uncertainty: variance.sqrt().clamp(0.05, 0.4),
        evidence_strength: 0.6,
    }
}

/// Speaker factor: diarization match confidence, consistency and voice
/// quality combined.
pub fn speaker(info: Option<&SpeakerInfo>, weight: f32) -> ConfidenceFactor {
    let (raw, reliability, uncertainty, evidence) = match info {
        Some(s) => {
            let raw = s.confidence * 0.5 + s.consistency * 0.25 + s.voice_quality * 0.25;
            (raw.clamp(0.0, 1.0), 0.75, 0.15, 0.7)
        }
        None => (NEUTRAL, 0.25, 0.3, 0.1),
    };
    ConfidenceFactor {
        name: "speaker".to_string(),
        raw_score: raw,
        weight,
        reliability,
        uncertainty,
        evidence_strength: evidence,
    }
}

/// Environmental factor: base score per environment type, adjusted by
/// measured noise and stability, and by SNR when the environment is unknown.
pub fn environmental(
    context: Option<&EnvironmentalContext>,
    metrics: Option<&AudioQualityMetrics>,
    weight: f32,
) -> ConfidenceFactor {
    let Some(ctx) = context else {
        // Fall back to SNR alone when nothing else is known
        let raw = metrics
            .map(|m| ((m.snr_db / 30.0) + 0.2).clamp(0.0, 1.0))
            .unwrap_or(NEUTRAL);
        return ConfidenceFactor {
            name: "environmental".to_string(),
            raw_score: raw,
            weight,
            reliability: if metrics.is_some() { 0.5 } else { 0.2 },
            uncertainty: 0.3,
            evidence_strength: if metrics.is_some() { 0.4 } else { 0.1 },
        };
    };

    let base = match ctx.environment {
        Environment::Quiet => 0.9,
        Environment::Office => 0.75,
        Environment::Outdoor => 0.55,
        Environment::Noisy => 0.45,
        Environment::Unknown => 0.6,
    };
    let mut raw = base;
    if let Some(noise) = ctx.noise_level {
        raw -= noise.clamp(0.0, 1.0) * 0.3;
    }
    if let Some(stability) = ctx.stability {
        raw *= 0.7 + stability.clamp(0.0, 1.0) * 0.3;
    }

    ConfidenceFactor {
        name: "environmental".to_string(),
        raw_score: raw.clamp(0.0, 1.0),
        weight,
        reliability: 0.65,
        uncertainty: 0.2,
        evidence_strength: 0.6,
    }
}

/// Estimates SNR and clipping directly from samples when the caller supplies
/// audio but no metrics.
///
/// The noise floor is taken from the quietest tenth of short frames, the
/// signal level from the loudest tenth.
pub fn estimate_metrics_from_audio(samples: &[f32]) -> AudioQualityMetrics {
    const FRAME: usize = 400;
    if samples.is_empty() {
        return AudioQualityMetrics {
            snr_db: 0.0,
            clipping_percent: 0.0,
            intelligibility: None,
        };
    }

    let clipped = samples.iter().filter(|s| s.abs() >= 0.99).count();
    let clipping_percent = clipped as f32 / samples.len() as f32 * 100.0;

    let mut energies: Vec<f32> = samples
        .chunks(FRAME)
        .map(|frame| frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32)
        .collect();
    energies.sort_by(|a, b| a.total_cmp(b));

    let decile = (energies.len() / 10).max(1);
    let noise = energies[..decile].iter().sum::<f32>() / decile as f32;
    let signal = energies[energies.len() - decile..].iter().sum::<f32>() / decile as f32;

    let snr_db = if noise < defaults::EPSILON {
        30.0
    } else {
        (10.0 * (signal / noise).log10()).clamp(0.0, 60.0)
    };

    AudioQualityMetrics {
        snr_db,
        clipping_percent,
        intelligibility: None,
    }
}
