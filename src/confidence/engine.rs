//! Per-session confidence scoring.
//!
//! Fuses the seven factor scores into one calibrated estimate with
//! uncertainty bounds, tracks session history for the statistical pass, and
//! slowly adapts calibration and level thresholds per environment.

use crate::confidence::assessment::{
    AssessmentInput, AudioQualityMetrics, ConfidenceAssessment, ConfidenceFactor, ConfidenceLevel,
    Environment, LevelThresholds,
};
use crate::confidence::factors;
use crate::defaults;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::trace;

/// Relative weight of each factor in the integrated score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FactorWeights {
    pub acoustic: f32,
    pub audio_quality: f32,
    pub linguistic: f32,
    pub contextual: f32,
    pub temporal: f32,
    pub speaker: f32,
    pub environmental: f32,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            acoustic: 0.25,
            audio_quality: 0.15,
            linguistic: 0.20,
            contextual: 0.10,
            temporal: 0.10,
            speaker: 0.10,
            environmental: 0.10,
        }
    }
}

/// Configuration for the confidence engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub weights: FactorWeights,
    /// Ring-buffer capacity for the session and per-factor histories.
    pub history_capacity: usize,
    /// Minimum overall confidence to mark a segment sufficient.
    pub sufficiency_threshold: f32,
    /// EMA rate for the per-environment calibration multiplier.
    pub calibration_rate: f32,
    /// Rate at which level thresholds drift toward the observed session mean.
    pub threshold_tune_rate: f32,
    /// Initial level boundaries for every environment.
    pub thresholds: LevelThresholds,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
            history_capacity: defaults::HISTORY_CAPACITY,
            sufficiency_threshold: defaults::SUFFICIENCY_THRESHOLD,
            calibration_rate: 0.05,
            threshold_tune_rate: 0.02,
            thresholds: LevelThresholds::default(),
        }
    }
}

/// Minimum evidence strength for a factor to enter the evidence-weighted
/// estimator.
const EVIDENCE_FLOOR: f32 = 0.25;

/// Mixing weights for the three integration estimators.
const BLEND: (f32, f32, f32) = (0.5, 0.3, 0.2);

/// Two-sided 95% t critical values for df 1..=30; 1.96 beyond.
const T_TABLE: [f32; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179, 2.160,
    2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, 2.080, 2.074, 2.069, 2.064, 2.060, 2.056,
    2.052, 2.048, 2.045, 2.042,
];

fn t_value(df: usize) -> f32 {
    if df == 0 {
        T_TABLE[0]
    } else if df <= T_TABLE.len() {
        T_TABLE[df - 1]
    } else {
        1.96
    }
}

/// Per-session confidence scoring state.
pub struct ConfidenceEngine {
    config: ConfidenceConfig,
    history: VecDeque<f32>,
    factor_histories: HashMap<String, VecDeque<f32>>,
    env_thresholds: HashMap<Environment, LevelThresholds>,
    env_calibration: HashMap<Environment, f32>,
}

impl ConfidenceEngine {
    pub fn new() -> Self {
        Self::with_config(ConfidenceConfig::default())
    }

    pub fn with_config(config: ConfidenceConfig) -> Self {
        Self {
            config,
            history: VecDeque::new(),
            factor_histories: HashMap::new(),
            env_thresholds: HashMap::new(),
            env_calibration: HashMap::new(),
        }
    }

    /// Produces one assessment for a segment and folds it into the session
    /// history.
    pub fn assess(&mut self, input: &AssessmentInput<'_>) -> ConfidenceAssessment {
        let metrics: Option<AudioQualityMetrics> = input
            .audio_quality
            .or_else(|| input.audio.map(factors::estimate_metrics_from_audio));
        let environment = input
            .environment
            .map(|c| c.environment)
            .unwrap_or(Environment::Unknown);

        let w = self.config.weights;
        let assessed = [
            factors::acoustic(input.acoustic_confidence, metrics.as_ref(), w.acoustic),
            factors::audio_quality(metrics.as_ref(), w.audio_quality),
            factors::linguistic(input.linguistic_confidence, input.text, w.linguistic),
            factors::contextual(input.text, w.contextual),
            factors::temporal(&self.history, w.temporal),
            factors::speaker(input.speaker.as_ref(), w.speaker),
            factors::environmental(input.environment.as_ref(), metrics.as_ref(), w.environmental),
        ];

        let blended = integrate(&assessed);
        let audio_quality_score = assessed[1].raw_score;

        // Quality pass: only applied when real metrics back the score
        let quality_multiplier = if metrics.is_some() {
            0.85 + 0.3 * audio_quality_score
        } else {
            1.0
        };

        let calibration = *self.env_calibration.get(&environment).unwrap_or(&1.0);
        let overall = (blended * quality_multiplier * calibration).clamp(0.0, 1.0);

        self.push_history(overall, &assessed);
        let stats = self.statistics(overall, &assessed);

        let thresholds = *self
            .env_thresholds
            .entry(environment)
            .or_insert(self.config.thresholds);
        let confidence_level = ConfidenceLevel::from_score(overall, &thresholds);
        self.tune_thresholds(environment);
        self.update_calibration(environment, metrics.as_ref(), audio_quality_score);

        let confidence_sufficient = overall >= self.config.sufficiency_threshold;
        let (recommendations, warnings) =
            advice(&assessed, metrics.as_ref(), overall, confidence_sufficient);

        let transcription_quality = (0.5 * overall
            + 0.25 * assessed[2].raw_score
            + 0.25 * assessed[3].raw_score)
            .clamp(0.0, 1.0);

        trace!(
            overall,
            level = ?confidence_level,
            sufficient = confidence_sufficient,
            "segment assessed"
        );

        ConfidenceAssessment {
            overall_confidence: overall,
            confidence_level,
            factors: assessed.to_vec(),
            audio_quality_score,
            transcription_quality,
            confidence_interval: stats.interval,
            uncertainty: stats.uncertainty,
            statistically_significant: stats.significant,
            confidence_sufficient,
            recommendations,
            warnings,
        }
    }

    /// Current level boundaries for an environment.
    pub fn level_thresholds(&self, environment: Environment) -> LevelThresholds {
        *self
            .env_thresholds
            .get(&environment)
            .unwrap_or(&self.config.thresholds)
    }

    /// Number of assessments in the session history.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Mean of the recent session confidence; 0.5 with no history.
    pub fn session_mean(&self) -> f32 {
        if self.history.is_empty() {
            return 0.5;
        }
        self.history.iter().sum::<f32>() / self.history.len() as f32
    }

    fn push_history(&mut self, overall: f32, assessed: &[ConfidenceFactor]) {
        self.history.push_back(overall);
        while self.history.len() > self.config.history_capacity {
            self.history.pop_front();
        }
        for factor in assessed {
            let entry = self
                .factor_histories
                .entry(factor.name.clone())
                .or_default();
            entry.push_back(factor.raw_score);
            while entry.len() > self.config.history_capacity {
                entry.pop_front();
            }
        }
    }

    /// Statistical pass over the session history, including the current score.
    fn statistics(&self, overall: f32, assessed: &[ConfidenceFactor]) -> Statistics {
        let factor_rms = (assessed
            .iter()
            .map(|f| f.uncertainty * f.uncertainty)
            .sum::<f32>()
            / assessed.len() as f32)
            .sqrt();

        let n = self.history.len();
        if n < 5 {
            return Statistics {
                interval: ((overall - 0.3).max(0.0), (overall + 0.3).min(1.0)),
                uncertainty: factor_rms.clamp(0.0, 1.0),
                significant: false,
            };
        }

        let mean = self.history.iter().sum::<f32>() / n as f32;
        let variance =
            self.history.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / (n as f32 - 1.0);
        let stderr = (variance / n as f32).sqrt();
        let t = t_value(n - 1);

        let half_width = t * stderr;
        let interval = ((mean - half_width).max(0.0), (mean + half_width).min(1.0));
        let uncertainty = (factor_rms * factor_rms + stderr * stderr).sqrt().clamp(0.0, 1.0);
        let significant = if stderr < defaults::EPSILON {
            (mean - 0.5).abs() > 0.05
        } else {
            (mean - 0.5).abs() / stderr > t
        };

        Statistics {
            interval,
            uncertainty,
            significant,
        }
    }

    /// Drifts the environment's level boundaries toward the observed session
    /// distribution.
    fn tune_thresholds(&mut self, environment: Environment) {
        let mean = self.session_mean();
        let offset = (mean - 0.5) * self.config.threshold_tune_rate;
        let t = self
            .env_thresholds
            .entry(environment)
            .or_insert(self.config.thresholds);
        t.very_low = (t.very_low + offset).clamp(0.05, 0.3);
        t.low = (t.low + offset).clamp(0.25, 0.5);
        t.medium = (t.medium + offset).clamp(0.45, 0.7);
        t.high = (t.high + offset).clamp(0.65, 0.9);
    }

    /// Slow multiplicative calibration per environment, driven by observed
    /// audio quality and bounded so it can never dominate the score.
    fn update_calibration(
        &mut self,
        environment: Environment,
        metrics: Option<&AudioQualityMetrics>,
        audio_quality_score: f32,
    ) {
        if metrics.is_none() {
            return;
        }
        let target = (1.0 + (audio_quality_score - 0.5) * 0.2).clamp(0.8, 1.2);
        let rate = self.config.calibration_rate;
        let cal = self.env_calibration.entry(environment).or_insert(1.0);
        *cal += rate * (target - *cal);
        *cal = cal.clamp(0.8, 1.2);
    }
}

impl Default for ConfidenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

struct Statistics {
    interval: (f32, f32),
    uncertainty: f32,
    significant: bool,
}

/// Blends the reliability-weighted, evidence-weighted, and
/// uncertainty-inverse estimators.
fn integrate(assessed: &[ConfidenceFactor]) -> f32 {
    let reliability = weighted(assessed, |f| f.weight * f.reliability);

    let evidenced: Vec<&ConfidenceFactor> = assessed
        .iter()
        .filter(|f| f.evidence_strength >= EVIDENCE_FLOOR)
        .collect();
    let evidence = if evidenced.is_empty() {
        weighted(assessed, |f| f.weight * f.evidence_strength)
    } else {
        let num: f32 = evidenced
            .iter()
            .map(|f| f.raw_score * f.weight * f.evidence_strength)
            .sum();
        let den: f32 = evidenced
            .iter()
            .map(|f| f.weight * f.evidence_strength)
            .sum();
        if den < defaults::EPSILON { 0.5 } else { num / den }
    };

    let inverse = weighted(assessed, |f| f.weight / f.uncertainty.max(0.05));

    (BLEND.0 * reliability + BLEND.1 * evidence + BLEND.2 * inverse).clamp(0.0, 1.0)
}

fn weighted(assessed: &[ConfidenceFactor], factor_weight: impl Fn(&ConfidenceFactor) -> f32) -> f32 {
    let den: f32 = assessed.iter().map(&factor_weight).sum();
    if den < defaults::EPSILON {
        return 0.5;
    }
    let num: f32 = assessed
        .iter()
        .map(|f| f.raw_score * factor_weight(f))
        .sum();
    num / den
}

/// Recommendations and warnings from individually weak factors.
fn advice(
    assessed: &[ConfidenceFactor],
    metrics: Option<&AudioQualityMetrics>,
    overall: f32,
    sufficient: bool,
) -> (Vec<String>, Vec<String>) {
    let mut recommendations = Vec::new();
    let mut warnings = Vec::new();

    if let Some(m) = metrics {
        if m.snr_db < 10.0 {
            warnings.push(format!("low signal-to-noise ratio ({:.1} dB)", m.snr_db));
        }
        if m.clipping_percent > 5.0 {
            warnings.push(format!(
                "audio clipping detected ({:.1}% of samples)",
                m.clipping_percent
            ));
        }
    }

    for factor in assessed {
        if factor.evidence_strength < EVIDENCE_FLOOR {
            continue;
        }
        if factor.raw_score < 0.4 {
            match factor.name.as_str() {
                "acoustic" | "audio_quality" => {
                    recommendations
                        .push("check microphone placement and input level".to_string());
                }
                "linguistic" | "contextual" => {
                    recommendations.push("transcribed text may be unreliable".to_string());
                }
                "speaker" => {
                    recommendations.push("speaker attribution is uncertain".to_string());
                }
                _ => {}
            }
        }
    }
    recommendations.dedup();

    if !sufficient && overall < 0.4 {
        recommendations.push("manual review recommended for this segment".to_string());
    }

    (recommendations, warnings)
}
