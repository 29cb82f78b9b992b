//! Error types for Tubecoach.

use thiserror::Error;

/// Library-level error type for Tubecoach operations.
#[derive(Error, Debug)]
pub enum TubecoachError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not fetch transcript: {0}")]
    Acquisition(String),

    #[error("Document is not valid UTF-8 text: {0}")]
    Decode(String),

    #[error("Chat completion failed: {0}")]
    Inference(String),

    #[error("Illustration generation failed: {0}")]
    Generation(String),

    #[error("Transcript export failed: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

impl TubecoachError {
    /// Whether this error aborts the user action that raised it.
    ///
    /// Illustration failures only suppress the image; everything else is
    /// reported to the user and leaves the session history untouched.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TubecoachError::Generation(_))
    }
}

/// Result type alias for Tubecoach operations.
pub type Result<T> = std::result::Result<T, TubecoachError>;
