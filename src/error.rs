//! Error types for meetscribe.
//!
//! The transcription core itself has no fatal errors: degenerate input
//! degrades to neutral scores, unknown sessions lazily initialize, and
//! bounded buffers evict instead of failing. The only propagated failure is
//! the recognizer round-trip, which belongs to the external collaborator.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeetscribeError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Recognizer boundary — the one external call that can fail
    #[error("Recognizer call failed: {message}")]
    Recognizer { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, MeetscribeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = MeetscribeError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_recognizer_display() {
        let error = MeetscribeError::Recognizer {
            message: "connection reset".to_string(),
        };
        assert_eq!(error.to_string(), "Recognizer call failed: connection reset");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: MeetscribeError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: MeetscribeError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<MeetscribeError>();
        assert_sync::<MeetscribeError>();
    }
}
