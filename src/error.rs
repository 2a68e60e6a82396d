//! Error types for Tolk.

use thiserror::Error;

/// Library-level error type for Tolk operations.
#[derive(Error, Debug)]
pub enum TolkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Audio conversion failed: {0}")]
    Conversion(String),

    #[error("Audio probe failed: {0}")]
    Probe(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Diarization submit failed: {0}")]
    DiarizationSubmit(String),

    #[error("Diarization job failed: {0}")]
    DiarizationFailed(String),

    #[error("Diarization polling timed out after {0} attempts")]
    DiarizationTimeout(u32),

    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Result store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),
}

/// Result type alias for Tolk operations.
pub type Result<T> = std::result::Result<T, TolkError>;
