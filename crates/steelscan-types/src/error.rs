//! Error types for steelscan

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

/// Persisted store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store IO error on '{key}': {message}")]
    Io { key: String, message: String },

    #[error("Stored value for '{key}' is not valid JSON: {message}")]
    Corrupted { key: String, message: String },
}

/// Rejections of the analysis gateway.
///
/// The `Display` text is what the operator sees as the analysis error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("Analysis request failed: {0}")]
    Transport(String),

    #[error("Analysis service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Analysis service returned an empty response")]
    Empty,

    #[error("Analysis response could not be parsed: {0}")]
    Malformed(String),

    #[error("Analysis timed out after {0}s")]
    Timeout(u64),

    #[error("No API key configured (set GEMINI_API_KEY or config api_key)")]
    MissingCredentials,

    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid image format: {0}")]
    InvalidImageFormat(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Session error: {0}")]
    Session(String),
}

pub type Result<T> = std::result::Result<T, Error>;
