use crate::capture::CaptureConfig;
use crate::confidence::ConfidenceConfig;
use crate::dedup::DedupConfig;
use crate::diarization::DiarizationConfig;
use crate::error::{MeetscribeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub dedup: DedupConfig,
    pub diarization: DiarizationConfig,
    pub confidence: ConfidenceConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MeetscribeError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                MeetscribeError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Panics on invalid TOML so a broken deployment is caught at startup.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(MeetscribeError::ConfigFileNotFound { .. }) => Self::default(),
            Err(e) => panic!("Failed to load config from {}: {}", path.display(), e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - MEETSCRIBE_SUFFICIENCY_THRESHOLD → confidence.sufficiency_threshold
    /// - MEETSCRIBE_MIN_MATCH_CONFIDENCE → diarization.min_match_confidence
    /// - MEETSCRIBE_SAMPLE_RATE → diarization.sample_rate
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("MEETSCRIBE_SUFFICIENCY_THRESHOLD")
            && let Ok(threshold) = value.parse::<f32>()
        {
            self.confidence.sufficiency_threshold = threshold.clamp(0.0, 1.0);
        }

        if let Ok(value) = std::env::var("MEETSCRIBE_MIN_MATCH_CONFIDENCE")
            && let Ok(threshold) = value.parse::<f32>()
        {
            self.diarization.min_match_confidence = threshold.clamp(0.0, 1.0);
        }

        if let Ok(value) = std::env::var("MEETSCRIBE_SAMPLE_RATE")
            && let Ok(rate) = value.parse::<u32>()
            && rate > 0
        {
            self.diarization.sample_rate = rate;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/meetscribe/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("meetscribe")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_meetscribe_env() {
        remove_env("MEETSCRIBE_SUFFICIENCY_THRESHOLD");
        remove_env("MEETSCRIBE_MIN_MATCH_CONFIDENCE");
        remove_env("MEETSCRIBE_SAMPLE_RATE");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.capture.max_buffer_bytes, defaults::MAX_BUFFER_BYTES);
        assert_eq!(config.capture.overlap_seconds, defaults::WINDOW_OVERLAP_SECONDS);

        assert_eq!(config.dedup.similarity_threshold, defaults::SIMILARITY_THRESHOLD);
        assert_eq!(config.dedup.confirmation_threshold, defaults::CONFIRMATION_THRESHOLD);

        assert_eq!(config.diarization.min_match_confidence, defaults::MIN_MATCH_CONFIDENCE);
        assert_eq!(config.diarization.sample_rate, defaults::SAMPLE_RATE);

        assert_eq!(
            config.confidence.sufficiency_threshold,
            defaults::SUFFICIENCY_THRESHOLD
        );
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [capture]
            overlap_seconds = 2.0

            [dedup]
            similarity_threshold = 0.8

            [diarization]
            min_match_confidence = 0.7
            sample_rate = 48000

            [confidence]
            sufficiency_threshold = 0.5
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.capture.overlap_seconds, 2.0);
        assert_eq!(config.dedup.similarity_threshold, 0.8);
        assert_eq!(config.diarization.min_match_confidence, 0.7);
        assert_eq!(config.diarization.sample_rate, 48000);
        assert_eq!(config.confidence.sufficiency_threshold, 0.5);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let toml_content = r#"
            [dedup]
            similarity_threshold = 0.9
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        // Only the similarity threshold should be overridden
        assert_eq!(config.dedup.similarity_threshold, 0.9);

        // Everything else should be defaults
        assert_eq!(config.capture.max_buffer_bytes, defaults::MAX_BUFFER_BYTES);
        assert_eq!(config.diarization.min_match_confidence, defaults::MIN_MATCH_CONFIDENCE);
        assert_eq!(
            config.confidence.sufficiency_threshold,
            defaults::SUFFICIENCY_THRESHOLD
        );
    }

    #[test]
    fn test_env_override_sufficiency_threshold() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_meetscribe_env();

        set_env("MEETSCRIBE_SUFFICIENCY_THRESHOLD", "0.75");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.confidence.sufficiency_threshold, 0.75);
        // Not overridden
        assert_eq!(config.diarization.min_match_confidence, defaults::MIN_MATCH_CONFIDENCE);

        clear_meetscribe_env();
    }

    #[test]
    fn test_env_override_all() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_meetscribe_env();

        set_env("MEETSCRIBE_SUFFICIENCY_THRESHOLD", "0.55");
        set_env("MEETSCRIBE_MIN_MATCH_CONFIDENCE", "0.65");
        set_env("MEETSCRIBE_SAMPLE_RATE", "44100");

        let config = Config::default().with_env_overrides();

        assert_eq!(config.confidence.sufficiency_threshold, 0.55);
        assert_eq!(config.diarization.min_match_confidence, 0.65);
        assert_eq!(config.diarization.sample_rate, 44100);

        clear_meetscribe_env();
    }

    #[test]
    fn test_env_override_unparseable_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_meetscribe_env();

        set_env("MEETSCRIBE_SUFFICIENCY_THRESHOLD", "not-a-number");
        let config = Config::default().with_env_overrides();

        assert_eq!(
            config.confidence.sufficiency_threshold,
            defaults::SUFFICIENCY_THRESHOLD
        );

        clear_meetscribe_env();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let invalid_toml = r#"
            [capture
            overlap_seconds = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        let result = Config::load(temp_file.path());

        assert!(result.is_err());
    }

    #[test]
    fn test_default_path_is_xdg_compliant() {
        let path = Config::default_path();
        let path_str = path.to_string_lossy();

        assert!(path_str.contains("meetscribe"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_meetscribe_config_12345.toml");
        let config = Config::load_or_default(missing_path);

        assert_eq!(config, Config::default());
    }

    #[test]
    #[should_panic(expected = "Failed to load config")]
    fn test_load_or_default_panics_on_invalid_toml() {
        let invalid_toml = r#"
            [capture
            overlap_seconds = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        // Should panic on invalid TOML, not return defaults
        Config::load_or_default(temp_file.path());
    }
}
