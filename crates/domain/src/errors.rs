//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Beamline
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum BeamlineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Beamline operations
pub type Result<T> = std::result::Result<T, BeamlineError>;

#[cfg(test)]
mod tests {
    //! Unit tests for errors.
    use super::*;

    /// Validates `BeamlineError` display formatting for each variant.
    ///
    /// Assertions:
    /// - Confirms the variant prefix appears in the rendered message.
    #[test]
    fn test_error_display() {
        let err = BeamlineError::Auth("missing refresh token".to_string());
        assert_eq!(err.to_string(), "Authentication error: missing refresh token");

        let err = BeamlineError::Config("BEAMLINE_OAUTH_CLIENT_ID not set".to_string());
        assert!(err.to_string().starts_with("Configuration error:"));
    }

    /// Validates serde round-trip of the tagged error representation.
    ///
    /// Assertions:
    /// - Ensures the serialized form carries `type` and `message` fields.
    /// - Confirms deserialization restores the same variant.
    #[test]
    fn test_error_serde_tagging() {
        let err = BeamlineError::Network("connection refused".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"Network\""));
        assert!(json.contains("\"message\":\"connection refused\""));

        let back: BeamlineError = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, BeamlineError::Network(msg) if msg == "connection refused"));
    }
}
