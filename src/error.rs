//! Error types for the call explorer.

use std::path::PathBuf;

/// Top-level error type for the explorer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Telephony error: {0}")]
    Telephony(#[from] TelephonyError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Transcription error: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Seed error: {0}")]
    Seed(#[from] SeedError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the remote telephony service.
#[derive(Debug, thiserror::Error)]
pub enum TelephonyError {
    /// The service refused to place the call.
    #[error("Call placement rejected ({status}): {body}")]
    PlacementFailed { status: u16, body: String },

    /// The recording for a completed call could not be fetched.
    #[error("Recording fetch for call {call_id} failed ({status}): {body}")]
    RetrievalFailed {
        call_id: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from telephony service: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Completion service errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Speech-to-text errors. Never fatal to the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("Transcription request failed ({status}): {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Audio payload is empty")]
    EmptyAudio,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Artifact persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact {0} already exists and is immutable")]
    AlreadyExists(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures loading a seed tree at startup. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Cannot read seed tree {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Seed tree {path} is not a valid decision tree: {reason}")]
    Unparsable { path: PathBuf, reason: String },
}

/// Result type alias for the explorer.
pub type Result<T> = std::result::Result<T, Error>;
