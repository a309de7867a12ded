//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>s, <number>m, <number>h or a combination (e.g., 30s, 1m, 1h30m)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a MIME type string cannot be used for recording
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid MIME type: \"{input}\". Expected video/webm or video/mp4, optionally with ;codecs=...")]
pub struct MimeTypeParseError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
