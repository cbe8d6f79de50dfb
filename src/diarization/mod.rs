//! Speaker diarization: voice feature extraction, profile matching, and
//! per-session speaker assignment.

pub mod engine;
pub mod features;
pub mod matching;
pub mod profile;

pub use engine::{
    DiarizationConfig, DiarizationEngine, SpeakerStatistics, SpeakerTurn, TimelineEntry,
};
pub use features::{FeatureExtractor, GenderEstimate, VoiceFeatures};
pub use matching::{MatchWeights, cosine_similarity, voice_similarity};
pub use profile::SpeakerProfile;
