//! Error handling module for Clipdeck

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for Clipdeck I/O and adapter operations
#[derive(Error, Debug)]
pub enum ClipdeckError {
    /// Session file not found or inaccessible
    #[error("Session file not found: {path}")]
    SessionNotFound { path: String },

    /// Config file named explicitly but missing
    #[error("Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// Transcript file could not be interpreted
    #[error("Invalid transcript: {message}")]
    InvalidTranscript { message: String },

    /// Logging could not be set up
    #[error("Failed to initialize logging: {message}")]
    LoggingInit { message: String },

    /// Rejected input
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML parse error
    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias for Clipdeck operations
pub type ClipdeckResult<T> = std::result::Result<T, ClipdeckError>;
