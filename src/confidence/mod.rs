//! Confidence scoring: per-segment calibrated confidence with uncertainty.

pub mod assessment;
pub mod engine;
pub mod factors;

pub use assessment::{
    AssessmentInput, AudioQualityMetrics, ConfidenceAssessment, ConfidenceFactor, ConfidenceLevel,
    Environment, EnvironmentalContext, LevelThresholds, SpeakerInfo,
};
pub use engine::{ConfidenceConfig, ConfidenceEngine, FactorWeights};
