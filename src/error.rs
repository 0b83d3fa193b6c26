//! Error types for the PlayWell engine

use thiserror::Error;

/// Errors that can occur while scoring sessions or building submissions
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse observations payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unsupported game: {0}")]
    UnsupportedGame(String),

    #[error("Invalid observations: {0}")]
    InvalidObservations(String),

    #[error("Session state error: {0}")]
    SessionState(String),

    #[error("Classification call failed: {0}")]
    ClassificationFailed(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
